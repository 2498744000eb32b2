//! CLI argument parsing with clap

use crate::config::Config;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// When to color log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Color when writing to a terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl ColorMode {
    pub fn use_ansi(&self, is_terminal: bool) -> bool {
        match self {
            ColorMode::Auto => is_terminal,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Classifies photos in the given folders by date based on their EXIF information.
///
/// Each file directly inside a folder is moved into a sub-folder named after
/// its capture date, as reported by exiftool (CreationDate, DateTimeCreated,
/// then DateTimeOriginal), or its last modified time when exiftool has none.
/// Files whose destination already exists are left where they are.
#[derive(Parser, Debug)]
#[command(name = "date-folder-sorter")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Folders whose files should be classified by date [default: .]
    pub folders: Vec<PathBuf>,

    /// Date format for the classification folders, using strftime codes
    #[arg(short, long, visible_alias = "folder-date-format", value_name = "PATTERN")]
    pub format: Option<String>,

    /// Verbose output (-v: info, -vv: debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Color log output
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// exiftool executable to run
    #[arg(long, env = "EXIFTOOL", value_name = "PATH")]
    pub exiftool: Option<PathBuf>,

    /// Files resolved concurrently per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Worker threads (0 = one per batch slot)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Only classify files with this extension (repeatable)
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Show what would be moved without moving anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Do not show the progress line
    #[arg(long)]
    pub no_progress: bool,

    /// Path to configuration file (TOML format)
    ///
    /// Command-line arguments override values from the file.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Write the log file as JSON
    #[arg(long, requires = "log_file")]
    pub json_log: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if !self.folders.is_empty() {
            config.folders = self.folders.clone();
        }
        if let Some(ref format) = self.format {
            config.date_format = format.clone();
        }
        if let Some(ref exiftool) = self.exiftool {
            config.exiftool = exiftool.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if !self.extensions.is_empty() {
            config.extensions = self.extensions.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
