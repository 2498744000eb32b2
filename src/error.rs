//! Error types for the date folder sorter

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sorter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the date folder sorter
///
/// Everything here is fatal for the run. The two recoverable conditions
/// (a folder argument that is not a directory, an occupied destination)
/// are reported as outcomes, not errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to run metadata tool '{tool}' for {path}: {source}")]
    ToolInvocation {
        tool: PathBuf,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Metadata tool '{tool}' failed on {path} ({status}): {stderr}")]
    ToolFailed {
        tool: PathBuf,
        path: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Metadata tool returned non UTF-8 output for {path}")]
    ToolOutput { path: PathBuf },

    #[error("Failed to parse date '{text}' reported for {path}")]
    DateParse { path: PathBuf, text: String },

    #[error("Failed to read modification time of {path}: {source}")]
    ModifiedTime {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to move {source_path} to {destination}: {source}")]
    Move {
        source_path: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },

    #[error("{files} file names but {dates} resolved dates")]
    LengthMismatch { files: usize, dates: usize },

    #[error("Invalid date folder format '{0}'")]
    InvalidFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}
