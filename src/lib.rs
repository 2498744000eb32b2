//! Date Folder Sorter - move photos into folders named after their capture date
//!
//! This library provides:
//! - Capture date lookup through exiftool, with modification time fallback
//! - Bounded, order-preserving batch resolution with Rayon
//! - Collision-safe moves into date-named sub-folders
//! - Progress reporting through a pluggable sink

pub mod batch;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod progress;
pub mod scan;
pub mod time;

pub use batch::BatchScheduler;
pub use classify::{ClassifyReport, DateFolderFormat, MoveOutcome, classify};
pub use cli::{Cli, ColorMode};
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use process::{RunReport, Sorter};
pub use progress::{ConsoleProgress, LogWriter, NoProgress, ProgressSink};
pub use time::{ExifTool, MetadataTool, ResolvedDate, TimeSource, resolve_date};
