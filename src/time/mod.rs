//! Capture date resolution
//!
//! Dates come from the external metadata tool, trying these fields in order:
//! - CreationDate
//! - DateTimeCreated
//! - DateTimeOriginal
//!
//! When the tool has none of them, the file system modification time is used.

pub mod exiftool;

pub use exiftool::{DateField, ExifTool, MetadataTool, parse_exiftool_datetime};

use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Source of a resolved date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Reported by the metadata tool for this field
    MetadataTool(DateField),
    /// File system modification time
    FileSystem,
}

/// Capture date of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    /// Local date and time, whole seconds
    pub timestamp: NaiveDateTime,
    /// Where the timestamp came from
    pub source: TimeSource,
}

impl ResolvedDate {
    pub fn is_fallback(&self) -> bool {
        self.source == TimeSource::FileSystem
    }
}

/// Resolve the capture date of `path`
///
/// Each field is a separate tool invocation. Anything the tool reports that
/// is not the no-value marker must parse, otherwise the whole run fails.
pub fn resolve_date(tool: &dyn MetadataTool, path: &Path) -> Result<ResolvedDate> {
    for field in DateField::PRIORITY {
        let Some(text) = tool.query(path, field)? else {
            debug!(?path, field = field.tag_name(), "No value reported");
            continue;
        };

        let timestamp = parse_exiftool_datetime(&text).ok_or_else(|| Error::DateParse {
            path: path.to_path_buf(),
            text: text.clone(),
        })?;
        debug!(?path, field = field.tag_name(), %timestamp, "Resolved date from metadata");

        return Ok(ResolvedDate {
            timestamp,
            source: TimeSource::MetadataTool(field),
        });
    }

    let timestamp = modified_time(path)?;
    info!(
        ?path,
        last_modified = %timestamp.format("%Y:%m:%d %H:%M:%S"),
        "Metadata tool did not give a date, using last modified date instead"
    );

    Ok(ResolvedDate {
        timestamp,
        source: TimeSource::FileSystem,
    })
}

/// Last-modified time in the local timezone, truncated to whole seconds
pub fn modified_time(path: &Path) -> Result<NaiveDateTime> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::ModifiedTime {
            path: path.to_path_buf(),
            source: e,
        })?;

    let local: DateTime<Local> = modified.into();
    let naive = local.naive_local();
    Ok(naive.with_nanosecond(0).unwrap_or(naive))
}
