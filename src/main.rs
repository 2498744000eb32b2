//! Date Folder Sorter - move photos into folders named after their capture date
//!
//! Each file directly inside the given folders is moved into a sub-folder
//! named after the date exiftool reports for it, or its last modified date.

use anyhow::{Context, Result};
use clap::Parser;
use date_folder_sorter::{
    Cli, Config, ConsoleProgress, LogWriter, MoveOutcome, NoProgress, ProgressSink, RunReport,
    Sorter,
};
use std::fs::{self, OpenOptions};
use std::io::{IsTerminal, stderr};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Summary output with optional colors

    use crossterm::style::{Color, Stylize, style};

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    /// Prints to stdout, colored only when enabled
    pub struct CliOutput {
        color: bool,
    }

    impl CliOutput {
        pub fn new(color: bool) -> Self {
            Self { color }
        }

        fn paint(&self, text: &str, color: Color, bold: bool) -> String {
            if !self.color {
                return text.to_string();
            }
            let styled = style(text).with(color);
            if bold {
                styled.bold().to_string()
            } else {
                styled.to_string()
            }
        }

        pub fn print_separator(&self) {
            println!("{}", "─".repeat(60));
        }

        pub fn print_title(&self, title: &str) {
            let padding = 60usize.saturating_sub(title.len()) / 2;
            println!("{}{}", " ".repeat(padding), self.paint(title, CliTheme::ACCENT, true));
        }

        pub fn print_warning(&self, msg: &str) {
            println!("{}{}", self.paint("⚠ ", CliTheme::WARNING, true), msg);
        }

        pub fn print_stat(&self, key: &str, value: usize, color: Color) {
            println!(
                "  {}: {}",
                self.paint(key, CliTheme::HINT, false),
                self.paint(&value.to_string(), color, true)
            );
        }

        pub fn print_result(&self, icon: &str, color: Color, source: &str, detail: &str) {
            println!(
                "  {} {} {}",
                self.paint(icon, color, true),
                source,
                self.paint(detail, CliTheme::HINT, false)
            );
        }

        pub fn print_blank(&self) {
            println!();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Date folder sorter starting"
    );

    let config = load_config(&cli)?;
    info!(?config, "Configuration loaded");

    let sorter = Sorter::new(config)?;

    let console = ConsoleProgress;
    let progress: &dyn ProgressSink = if !cli.no_progress && stderr().is_terminal() {
        &console
    } else {
        &NoProgress
    };

    match sorter.run(progress) {
        Ok(report) => {
            let color = cli.color.use_ansi(std::io::stdout().is_terminal());
            print_summary(&report, sorter.config().dry_run, color);
            Ok(())
        }
        Err(e) => {
            progress.finish();
            error!(error = %e, "Processing failed");
            std::process::exit(1);
        }
    }
}

/// Load configuration from file and/or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        info!(config_file = %config_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(config_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    if config.folders.is_empty() && cli.config.is_none() {
        info!("No folders given, classifying the current directory");
    }

    Ok(config)
}

/// Setup logging: stderr, plus an optional log file
fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let console = fmt::layer()
        .with_target(false)
        .with_ansi(cli.color.use_ansi(stderr().is_terminal()))
        .with_writer(LogWriter);

    let (file_layer, guard) = match cli.log_file {
        Some(ref log_path) => {
            if let Some(parent) = log_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating log folder {}", parent.display()))?;
            }

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
                .with_context(|| format!("opening log file {}", log_path.display()))?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = if cli.json_log {
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .boxed()
            } else {
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Print per-run counts and the files that stayed in place
fn print_summary(report: &RunReport, dry_run: bool, color: bool) {
    use cli_output::*;

    let out = CliOutput::new(color);
    let collisions = report.collisions();

    out.print_separator();
    out.print_title(if dry_run { "Dry run complete" } else { "Classification complete" });
    out.print_separator();
    out.print_blank();
    out.print_stat("Files found", report.files(), CliTheme::ACCENT);
    out.print_stat(
        if dry_run { "Would move" } else { "Moved" },
        report.moved(),
        CliTheme::SUCCESS,
    );
    out.print_stat("Left in place", collisions.len(), CliTheme::WARNING);
    out.print_stat("Dated by modified time", report.fallbacks(), CliTheme::HINT);

    let invalid: Vec<_> = report.invalid_folders().collect();
    if !invalid.is_empty() {
        out.print_blank();
        for folder in invalid {
            out.print_warning(&format!("Not a directory: {}", folder.display()));
        }
    }

    if !collisions.is_empty() {
        out.print_blank();
        for entry in collisions {
            if let MoveOutcome::Skipped { occupied } = &entry.outcome {
                out.print_result(
                    "⊘",
                    CliTheme::WARNING,
                    &entry.source.display().to_string(),
                    &format!("({} already exists)", occupied.display()),
                );
            }
        }
    }

    out.print_blank();
}
