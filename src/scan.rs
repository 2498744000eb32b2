//! Listing the candidate files of one folder

use crate::error::Result;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Names of the regular files directly inside `dir`, sorted by name
///
/// Sub-folders are not entered; symlinks count as what they point to. An
/// empty `extensions` list accepts every file, otherwise the extension must
/// match one entry case-insensitively.
pub fn list_files(dir: &Path, extensions: &[String]) -> Result<Vec<OsString>> {
    let mut names = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            // Dangling symlinks and the like; the folder itself must be readable
            Err(e) if e.depth() > 0 => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if !has_wanted_extension(entry.path(), extensions) {
            debug!(path = ?entry.path(), "Skipping file with unlisted extension");
            continue;
        }

        names.push(entry.file_name().to_os_string());
    }

    debug!(dir = ?dir, count = names.len(), "Listed files");
    Ok(names)
}

fn has_wanted_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }

    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
}
