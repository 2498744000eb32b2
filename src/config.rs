//! Configuration types for the date folder sorter

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::classify::{DEFAULT_DATE_FORMAT, DateFolderFormat};
use crate::error::{Error, Result};
use crate::time::exiftool::DEFAULT_EXIFTOOL;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Run configuration
///
/// Read from an optional TOML file, then overridden by command-line flags.
/// Every key may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Folders whose top-level files get classified
    pub folders: Vec<PathBuf>,

    /// strftime pattern for date folder names
    pub date_format: String,

    /// exiftool executable (name looked up in PATH, or a path)
    pub exiftool: PathBuf,

    /// Files resolved concurrently per batch
    pub batch_size: usize,

    /// Worker threads (0 = one per batch slot)
    pub threads: usize,

    /// Only classify files with these extensions (empty = all files)
    pub extensions: Vec<String>,

    /// Report moves without touching the file system
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folders: vec![],
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            exiftool: PathBuf::from(DEFAULT_EXIFTOOL),
            batch_size: DEFAULT_BATCH_SIZE,
            threads: 0,
            extensions: vec![],
            dry_run: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Folders to process, the current directory when none were given
    pub fn folders_or_current(&self) -> Vec<PathBuf> {
        if self.folders.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.folders.clone()
        }
    }

    /// Parsed date folder format
    pub fn date_folder_format(&self) -> Result<DateFolderFormat> {
        DateFolderFormat::new(self.date_format.as_str())
    }

    /// Check values that would otherwise fail mid-run
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be at least 1".into()));
        }
        if self.exiftool.as_os_str().is_empty() {
            return Err(Error::Config("exiftool path must not be empty".into()));
        }
        self.date_folder_format()?;
        Ok(())
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}
