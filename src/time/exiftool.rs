//! Date lookups through the external `exiftool` executable

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tracing::trace;

/// Default executable name, looked up in PATH
pub const DEFAULT_EXIFTOOL: &str = "exiftool";

/// What exiftool prints in table mode for a tag it cannot find
pub const NO_VALUE: &str = "-";

/// Length of "YYYY:MM:DD HH:MM:SS"
const DATE_TIME_LEN: usize = 19;

/// Layout of exiftool date values
static DATE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn date_pattern() -> &'static Regex {
    DATE_PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4}):(\d{2}):(\d{2}) (\d{2}):(\d{2}):(\d{2})$")
            .expect("date pattern is a valid regex")
    })
}

/// Date fields queried for each file, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    /// QuickTime/iPhone creation date
    CreationDate,
    /// IPTC/XMP date-time created
    DateTimeCreated,
    /// EXIF capture time
    DateTimeOriginal,
}

impl DateField {
    /// All fields, in the order they are tried
    pub const PRIORITY: [DateField; 3] = [
        DateField::CreationDate,
        DateField::DateTimeCreated,
        DateField::DateTimeOriginal,
    ];

    /// Tag name as exiftool expects it
    pub fn tag_name(&self) -> &'static str {
        match self {
            DateField::CreationDate => "CreationDate",
            DateField::DateTimeCreated => "DateTimeCreated",
            DateField::DateTimeOriginal => "DateTimeOriginal",
        }
    }
}

/// A source of embedded date fields
///
/// `Ok(None)` means the tool answered with its no-value marker.
pub trait MetadataTool: Sync {
    fn query(&self, path: &Path, field: DateField) -> Result<Option<String>>;
}

/// Runs `<exiftool> -T <file> -<Field>` once per query
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: PathBuf,
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new(DEFAULT_EXIFTOOL)
    }
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl MetadataTool for ExifTool {
    fn query(&self, path: &Path, field: DateField) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .arg("-T")
            .arg(path)
            .arg(format!("-{}", field.tag_name()))
            .output()
            .map_err(|e| Error::ToolInvocation {
                tool: self.program.clone(),
                path: path.to_path_buf(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(Error::ToolFailed {
                tool: self.program.clone(),
                path: path.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| Error::ToolOutput {
            path: path.to_path_buf(),
        })?;
        let value = first_line(&stdout);
        trace!(?path, field = field.tag_name(), value, "exiftool answered");

        if value == NO_VALUE {
            Ok(None)
        } else {
            Ok(Some(value.to_string()))
        }
    }
}

/// First line of tool output, without the line terminator
fn first_line(output: &str) -> &str {
    output.lines().next().unwrap_or("").trim_end()
}

/// Drop a trailing timezone: "+02:00", "-05:00" or "Z" after the time part
fn strip_offset(text: &str) -> &str {
    let text = text.split('+').next().unwrap_or(text).trim();
    match text.get(DATE_TIME_LEN..) {
        Some(rest) if rest.starts_with('-') || rest.starts_with('Z') => &text[..DATE_TIME_LEN],
        _ => text,
    }
}

/// Parse an exiftool date value: "YYYY:MM:DD HH:MM:SS", optional offset
pub fn parse_exiftool_datetime(text: &str) -> Option<NaiveDateTime> {
    let caps = date_pattern().captures(strip_offset(text))?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = i32::try_from(field(1)?).ok()?;
    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?.and_hms_opt(field(4)?, field(5)?, field(6)?)
}
