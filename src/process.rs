//! Run loop over the requested folders
//!
//! For each folder:
//! - list its top-level files
//! - resolve every capture date (batched, concurrent)
//! - move the files into date folders (sequential)
//!
//! A folder argument that is not a directory is skipped with a warning.
//! Any other error stops the run.

use crate::batch::BatchScheduler;
use crate::classify::{ClassifyReport, DateFolderFormat, FileMove, classify};
use crate::config::Config;
use crate::error::Result;
use crate::progress::ProgressSink;
use crate::scan::list_files;
use crate::time::{ExifTool, MetadataTool};
use std::path::{Path, PathBuf};
use tracing::{Level, info, span, warn};

/// What happened to one folder argument
#[derive(Debug, Clone)]
pub enum FolderOutcome {
    /// Not a directory, skipped
    NotADirectory,
    /// Files were listed, dated and classified
    Classified(ClassifyReport),
}

#[derive(Debug, Clone)]
pub struct FolderReport {
    pub folder: PathBuf,
    pub outcome: FolderOutcome,
}

/// Results of a whole run, one entry per folder argument
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub folders: Vec<FolderReport>,
}

impl RunReport {
    fn classified(&self) -> impl Iterator<Item = &ClassifyReport> {
        self.folders.iter().filter_map(|f| match &f.outcome {
            FolderOutcome::Classified(report) => Some(report),
            FolderOutcome::NotADirectory => None,
        })
    }

    pub fn files(&self) -> usize {
        self.classified().map(|r| r.moves.len()).sum()
    }

    pub fn moved(&self) -> usize {
        self.classified().map(|r| r.moved()).sum()
    }

    /// Files left in place because their destination was taken
    pub fn collisions(&self) -> Vec<&FileMove> {
        self.classified().flat_map(|r| r.skipped()).collect()
    }

    /// Files dated by modification time
    pub fn fallbacks(&self) -> usize {
        self.classified()
            .flat_map(|r| r.moves.iter())
            .filter(|m| m.date.is_fallback())
            .count()
    }

    pub fn invalid_folders(&self) -> impl Iterator<Item = &Path> {
        self.folders
            .iter()
            .filter(|f| matches!(f.outcome, FolderOutcome::NotADirectory))
            .map(|f| f.folder.as_path())
    }

    pub fn summary(&self) -> String {
        format!(
            "Files: {}, Moved: {}, Skipped: {}, Modified-time dates: {}",
            self.files(),
            self.moved(),
            self.collisions().len(),
            self.fallbacks()
        )
    }
}

/// Classifies the files of each configured folder by date
pub struct Sorter {
    config: Config,
    format: DateFolderFormat,
    scheduler: BatchScheduler,
    tool: Box<dyn MetadataTool>,
}

impl Sorter {
    /// Create a sorter that runs the configured exiftool
    pub fn new(config: Config) -> Result<Self> {
        let tool = ExifTool::new(config.exiftool.clone());
        info!(exiftool = %tool.program().display(), "Using exiftool");
        Self::with_tool(config, Box::new(tool))
    }

    /// Create a sorter with a custom metadata source
    pub fn with_tool(config: Config, tool: Box<dyn MetadataTool>) -> Result<Self> {
        config.validate()?;
        let format = config.date_folder_format()?;
        let scheduler = BatchScheduler::new(config.batch_size, config.threads)?;
        info!(
            format = %format,
            batch_size = scheduler.batch_size(),
            dry_run = config.dry_run,
            "Sorter ready"
        );

        Ok(Self {
            config,
            format,
            scheduler,
            tool,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every folder in order
    pub fn run(&self, progress: &dyn ProgressSink) -> Result<RunReport> {
        let _span = span!(Level::INFO, "sorter_run").entered();
        let mut report = RunReport::default();

        for folder in self.config.folders_or_current() {
            if !folder.is_dir() {
                warn!(folder = %folder.display(), "Path given is not a directory");
                report.folders.push(FolderReport {
                    folder,
                    outcome: FolderOutcome::NotADirectory,
                });
                continue;
            }

            let classified = self.process_folder(&folder, progress)?;
            report.folders.push(FolderReport {
                folder,
                outcome: FolderOutcome::Classified(classified),
            });
        }

        info!("{}", report.summary());
        Ok(report)
    }

    /// List, date and classify one directory
    pub fn process_folder(
        &self,
        folder: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<ClassifyReport> {
        let _span = span!(Level::INFO, "folder", path = %folder.display()).entered();

        let names = list_files(folder, &self.config.extensions)?;
        info!(count = names.len(), "Found files");

        let paths: Vec<PathBuf> = names.iter().map(|name| folder.join(name)).collect();
        let dates = self
            .scheduler
            .resolve_all(self.tool.as_ref(), &paths, progress)?;

        let report = classify(folder, &names, &dates, &self.format, self.config.dry_run)?;
        info!(
            moved = report.moved(),
            skipped = report.skipped().count(),
            folders_created = report.folders_created,
            "Folder classified"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::progress::NoProgress;
    use crate::time::DateField;
    use crate::time::testing::FakeTool;
    use chrono::{Local, NaiveDate, TimeZone};
    use filetime::{FileTime, set_file_mtime};
    use std::fs;
    use tempfile::tempdir;
    use walkdir::WalkDir;

    fn config_for(folders: &[&Path]) -> Config {
        Config {
            folders: folders.iter().map(|p| p.to_path_buf()).collect(),
            batch_size: 4,
            ..Config::default()
        }
    }

    fn set_local_mtime(path: &Path, y: i32, m: u32, d: u32, h: u32) {
        let naive = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap();
        let local = Local.from_local_datetime(&naive).single().unwrap();
        set_file_mtime(path, FileTime::from_unix_time(local.timestamp(), 0)).unwrap();
    }

    /// Every file under `dir`, by file name
    fn all_file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_metadata_and_fallback_dates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();
        fs::write(dir.path().join("b.jpg"), b"b").unwrap();
        set_local_mtime(&dir.path().join("b.jpg"), 2022, 3, 1, 8);

        let tool = FakeTool::new().with("a.jpg", DateField::CreationDate, "2023:06:26 10:15:00");
        let sorter = Sorter::with_tool(config_for(&[dir.path()]), Box::new(tool)).unwrap();

        let report = sorter.run(&NoProgress).unwrap();

        assert!(dir.path().join("2023-06-26/a.jpg").is_file());
        assert!(dir.path().join("2022-03-01/b.jpg").is_file());
        assert!(!dir.path().join("a.jpg").exists());
        assert!(!dir.path().join("b.jpg").exists());
        assert_eq!(report.moved(), 2);
        assert_eq!(report.fallbacks(), 1);
    }

    #[test]
    fn test_custom_format() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();

        let tool = FakeTool::new().with("a.jpg", DateField::CreationDate, "2023:06:26 10:15:00");
        let config = Config {
            date_format: "%Y-%m".into(),
            ..config_for(&[dir.path()])
        };
        let sorter = Sorter::with_tool(config, Box::new(tool)).unwrap();
        sorter.run(&NoProgress).unwrap();

        assert!(dir.path().join("2023-06/a.jpg").is_file());
        assert!(!dir.path().join("2023-06-26").exists());
    }

    #[test]
    fn test_no_file_lost_and_rerun_is_noop() {
        let dir = tempdir().unwrap();
        let mut tool = FakeTool::new();
        for i in 0..10 {
            let name = format!("img_{}.jpg", i);
            fs::write(dir.path().join(&name), name.as_bytes()).unwrap();
            let value = format!("2024:01:{:02} 09:00:00", i % 3 + 1);
            tool = tool.with(&name, DateField::DateTimeOriginal, &value);
        }
        // A collision: same name already sorted into its target folder
        fs::create_dir(dir.path().join("2024-01-01")).unwrap();
        fs::write(dir.path().join("2024-01-01/img_0.jpg"), b"older copy").unwrap();

        let before = all_file_names(dir.path());
        let sorter = Sorter::with_tool(config_for(&[dir.path()]), Box::new(tool)).unwrap();

        let first = sorter.run(&NoProgress).unwrap();
        assert_eq!(first.moved(), 9);
        assert_eq!(first.collisions().len(), 1);
        assert_eq!(all_file_names(dir.path()), before);
        assert!(dir.path().join("img_0.jpg").is_file());

        let second = sorter.run(&NoProgress).unwrap();
        assert_eq!(second.moved(), 0);
        assert_eq!(second.files(), 1);
        assert_eq!(all_file_names(dir.path()), before);
    }

    #[test]
    fn test_non_directory_argument_is_skipped() {
        let dir = tempdir().unwrap();
        let photos = dir.path().join("photos");
        fs::create_dir(&photos).unwrap();
        fs::write(photos.join("a.jpg"), b"a").unwrap();
        let stray_file = dir.path().join("not-a-folder.txt");
        fs::write(&stray_file, b"x").unwrap();
        let missing = dir.path().join("missing");

        let tool = FakeTool::new().with("a.jpg", DateField::CreationDate, "2023:06:26 10:15:00");
        let sorter = Sorter::with_tool(
            config_for(&[stray_file.as_path(), missing.as_path(), photos.as_path()]),
            Box::new(tool),
        )
        .unwrap();

        let report = sorter.run(&NoProgress).unwrap();
        let invalid: Vec<_> = report.invalid_folders().collect();
        assert_eq!(invalid, [stray_file.as_path(), missing.as_path()]);
        assert!(photos.join("2023-06-26/a.jpg").is_file());
        assert!(stray_file.is_file());
    }

    #[test]
    fn test_unparseable_date_aborts_before_moving() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();
        fs::write(dir.path().join("b.jpg"), b"b").unwrap();

        let tool = FakeTool::new()
            .with("a.jpg", DateField::CreationDate, "2023:06:26 10:15:00")
            .with("b.jpg", DateField::CreationDate, "not a date");
        let sorter = Sorter::with_tool(config_for(&[dir.path()]), Box::new(tool)).unwrap();

        let err = sorter.run(&NoProgress).unwrap_err();
        assert!(matches!(err, Error::DateParse { .. }));
        assert!(dir.path().join("a.jpg").is_file());
        assert!(!dir.path().join("2023-06-26").exists());
    }

    #[test]
    fn test_dry_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();

        let tool = FakeTool::new().with("a.jpg", DateField::CreationDate, "2023:06:26 10:15:00");
        let config = Config {
            dry_run: true,
            ..config_for(&[dir.path()])
        };
        let sorter = Sorter::with_tool(config, Box::new(tool)).unwrap();

        let report = sorter.run(&NoProgress).unwrap();
        assert_eq!(report.moved(), 1);
        assert!(dir.path().join("a.jpg").is_file());
        assert!(!dir.path().join("2023-06-26").exists());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            date_format: "%Y-%".into(),
            ..Config::default()
        };
        let result = Sorter::with_tool(config, Box::new(FakeTool::new()));
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_summary() {
        let report = RunReport {
            folders: vec![FolderReport {
                folder: PathBuf::from("nowhere"),
                outcome: FolderOutcome::NotADirectory,
            }],
        };
        assert_eq!(
            report.summary(),
            "Files: 0, Moved: 0, Skipped: 0, Modified-time dates: 0"
        );
    }
}
