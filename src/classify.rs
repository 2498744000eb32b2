//! Moving files into date folders
//!
//! Moves run one at a time, after every date is known. Several files can map
//! to the same folder, and the collision check must see the real file system
//! state right before each move.

use crate::error::{Error, Result};
use crate::time::ResolvedDate;
use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use std::ffi::OsStr;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default folder name layout: 2023-06-26
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// strftime pattern turning a date into a folder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFolderFormat {
    pattern: String,
}

impl Default for DateFolderFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl fmt::Display for DateFolderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl DateFolderFormat {
    /// Validate a strftime pattern
    ///
    /// Rejects patterns chrono cannot interpret and patterns whose output
    /// would not be a single, non-empty path component.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();

        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Error::InvalidFormat(pattern));
        }

        let format = Self { pattern };
        let sample = format.folder_name(&NaiveDateTime::default())?;
        if sample.trim().is_empty()
            || sample == "."
            || sample == ".."
            || sample.contains(['/', '\\'])
        {
            return Err(Error::InvalidFormat(format.pattern));
        }

        Ok(format)
    }

    /// Folder name for a date
    ///
    /// Timestamps carry no offset, so `%z` and `%Z` cannot be rendered.
    pub fn folder_name(&self, timestamp: &NaiveDateTime) -> Result<String> {
        let mut name = String::new();
        write!(name, "{}", timestamp.format(&self.pattern))
            .map_err(|_| Error::InvalidFormat(self.pattern.clone()))?;
        Ok(name)
    }
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Renamed into its date folder
    Moved { destination: PathBuf },
    /// Dry run: would have been renamed
    WouldMove { destination: PathBuf },
    /// Destination already occupied, source left in place
    Skipped { occupied: PathBuf },
}

/// Per-file record of a classification pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMove {
    pub source: PathBuf,
    pub date: ResolvedDate,
    pub outcome: MoveOutcome,
}

/// Result of classifying one directory
#[derive(Debug, Clone, Default)]
pub struct ClassifyReport {
    pub moves: Vec<FileMove>,
    pub folders_created: usize,
}

impl ClassifyReport {
    pub fn moved(&self) -> usize {
        self.moves
            .iter()
            .filter(|m| {
                matches!(
                    m.outcome,
                    MoveOutcome::Moved { .. } | MoveOutcome::WouldMove { .. }
                )
            })
            .count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileMove> {
        self.moves
            .iter()
            .filter(|m| matches!(m.outcome, MoveOutcome::Skipped { .. }))
    }
}

/// Move each `directory/files[i]` into `directory/<format(dates[i])>/`
///
/// An occupied destination is never overwritten: the file stays where it is
/// and a warning is logged. Any other file system failure aborts the pass;
/// files moved before the failure stay moved.
pub fn classify<S: AsRef<OsStr>>(
    directory: &Path,
    files: &[S],
    dates: &[ResolvedDate],
    format: &DateFolderFormat,
    dry_run: bool,
) -> Result<ClassifyReport> {
    if files.len() != dates.len() {
        return Err(Error::LengthMismatch {
            files: files.len(),
            dates: dates.len(),
        });
    }

    let mut report = ClassifyReport::default();

    for (file, date) in files.iter().zip(dates) {
        let file = file.as_ref();
        let source = directory.join(file);
        let date_folder = directory.join(format.folder_name(&date.timestamp)?);

        if !date_folder.is_dir() && !dry_run {
            fs::create_dir(&date_folder).map_err(|e| Error::CreateFolder {
                path: date_folder.clone(),
                source: e,
            })?;
            debug!(folder = %date_folder.display(), "Created date folder");
            report.folders_created += 1;
        }

        let destination = date_folder.join(file);
        if destination.exists() {
            warn!(
                source = %source.display(),
                destination = %destination.display(),
                "Destination is already taken, file will not be moved"
            );
            report.moves.push(FileMove {
                source,
                date: *date,
                outcome: MoveOutcome::Skipped {
                    occupied: destination,
                },
            });
            continue;
        }

        let outcome = if dry_run {
            info!(
                source = %source.display(),
                destination = %destination.display(),
                "Would move file"
            );
            MoveOutcome::WouldMove { destination }
        } else {
            fs::rename(&source, &destination).map_err(|e| Error::Move {
                source_path: source.clone(),
                destination: destination.clone(),
                source: e,
            })?;
            debug!(
                source = %source.display(),
                destination = %destination.display(),
                timestamp = %date.timestamp,
                "Moved file"
            );
            MoveOutcome::Moved { destination }
        };

        report.moves.push(FileMove {
            source,
            date: *date,
            outcome,
        });
    }

    Ok(report)
}
