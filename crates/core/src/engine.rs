//! One run: load the prior snapshot, scan, classify, persist

use crate::clock::Clock;
use crate::config::Config;
use crate::diff::TreeDiff;
use crate::error::Result;
use crate::scan::{scan_tree, ScanOptions, SkippedEntry};
use crate::store::{SnapshotRef, SnapshotStore};
use crate::tree::Tree;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Root that was scanned
    pub root: PathBuf,
    /// Snapshot the current state was compared against
    pub previous: Option<SnapshotRef>,
    /// Snapshot written by this run (absent in dry-run mode)
    pub snapshot: Option<SnapshotRef>,
    /// Classified changes since `previous`
    pub diff: TreeDiff,
    /// Number of files fingerprinted
    pub files: usize,
    /// Entries the scan could not read
    pub skipped: Vec<SkippedEntry>,
}

impl RunReport {
    /// True when this is the first run against the root
    pub fn is_first_run(&self) -> bool {
        self.previous.is_none()
    }
}

/// Snapshot directory for `root` under `config`
pub fn snapshot_dir(root: &Path, config: &Config) -> PathBuf {
    root.join(&config.snapshot_dir)
}

/// Execute one snapshot/diff run against `root`
///
/// A corrupt prior snapshot aborts the run before anything is written.
pub fn run(root: &Path, config: &Config, clock: Box<dyn Clock>) -> Result<RunReport> {
    config.validate()?;

    let dir = snapshot_dir(root, config);
    let store = SnapshotStore::new(&dir)
        .with_format(config.format)
        .with_clock(clock);

    let previous = store.latest()?;
    let before = match &previous {
        Some(snapshot) => store.load(snapshot)?,
        None => Tree::new(),
    };

    let options = ScanOptions {
        exclude: Some(dir),
        follow_links: config.follow_links,
        allow_missing_root: config.allow_missing_root,
    };
    let outcome = scan_tree(root, &options)?;

    let diff = TreeDiff::diff(&before, &outcome.tree);
    info!(
        "{}: {} added, {} deleted, {} modified",
        root.display(),
        diff.added.len(),
        diff.deleted.len(),
        diff.modified.len()
    );

    let snapshot = if config.dry_run {
        None
    } else {
        Some(store.persist(&outcome.tree)?)
    };

    Ok(RunReport {
        root: root.to_path_buf(),
        previous,
        snapshot,
        diff,
        files: outcome.tree.len(),
        skipped: outcome.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, SystemClock};
    use crate::config::SnapshotFormat;
    use crate::error::Error;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn clock(secs: u32) -> Box<dyn Clock> {
        Box::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, secs).unwrap()))
    }

    fn names(list: &[crate::tree::PathKey]) -> Vec<String> {
        list.iter()
            .map(|k| String::from_utf8_lossy(k).into_owned())
            .collect()
    }

    #[test]
    fn test_first_run_on_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let report = run(temp_dir.path(), &Config::default(), clock(0)).unwrap();

        assert!(report.is_first_run());
        assert!(report.diff.is_empty());
        assert_eq!(report.files, 0);
        assert!(report.snapshot.is_some());
        assert!(temp_dir.path().join(".freeze").is_dir());
    }

    #[test]
    fn test_second_run_without_changes_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), b"a").unwrap();

        let first = run(root, &Config::default(), Box::new(SystemClock)).unwrap();
        assert_eq!(names(&first.diff.added), vec!["a.txt"]);

        let second = run(root, &Config::default(), Box::new(SystemClock)).unwrap();
        assert!(second.diff.is_empty());
        assert_eq!(second.previous, first.snapshot);
        assert_ne!(second.snapshot, first.snapshot);
    }

    #[test]
    fn test_detects_all_three_kinds() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("keep.txt"), b"same").unwrap();
        fs::write(root.join("edit.txt"), b"before").unwrap();
        fs::write(root.join("drop.txt"), b"bye").unwrap();
        run(root, &Config::default(), clock(1)).unwrap();

        fs::write(root.join("edit.txt"), b"after").unwrap();
        fs::remove_file(root.join("drop.txt")).unwrap();
        fs::create_dir_all(root.join("new")).unwrap();
        fs::write(root.join("new/file.txt"), b"hi").unwrap();

        let report = run(root, &Config::default(), clock(2)).unwrap();
        assert_eq!(names(&report.diff.added), vec!["new/file.txt"]);
        assert_eq!(names(&report.diff.deleted), vec!["drop.txt"]);
        assert_eq!(names(&report.diff.modified), vec!["edit.txt"]);
        assert_eq!(report.files, 3);
    }

    #[test]
    fn test_dry_run_does_not_persist() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), b"a").unwrap();

        let config = Config {
            dry_run: true,
            ..Config::default()
        };
        let report = run(root, &config, clock(0)).unwrap();
        assert!(report.snapshot.is_none());
        assert_eq!(report.diff.added.len(), 1);

        let again = run(root, &config, clock(1)).unwrap();
        assert!(again.is_first_run());
        assert_eq!(again.diff.added.len(), 1);
    }

    #[test]
    fn test_corrupt_baseline_aborts_without_persisting() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let dir = root.join(".freeze");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("20240309T120000.000000Z"), b"garbage line\n").unwrap();

        let err = run(root, &Config::default(), clock(5)).unwrap_err();
        assert!(matches!(err, Error::CorruptSnapshot { .. }));
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_root_modes() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("not-yet");

        let err = run(&missing, &Config::default(), clock(0)).unwrap_err();
        assert!(matches!(err, Error::RootNotFound(_)));
        assert!(!missing.exists());

        let config = Config {
            allow_missing_root: true,
            ..Config::default()
        };
        let report = run(&missing, &config, clock(0)).unwrap();
        assert!(report.diff.is_empty());
        assert!(report.snapshot.is_some());
    }

    #[test]
    fn test_custom_snapshot_dir_and_lines_format() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("x"), b"x").unwrap();

        let config = Config {
            snapshot_dir: ".snaps".to_string(),
            format: SnapshotFormat::Lines,
            ..Config::default()
        };
        let first = run(root, &config, clock(0)).unwrap();
        let written = fs::read_to_string(first.snapshot.unwrap().path).unwrap();
        assert!(written.starts_with("x\t"));

        let second = run(root, &config, clock(1)).unwrap();
        assert!(second.diff.is_empty(), "snapshot dir leaked into scan: {:?}", second.diff);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            snapshot_dir: "../outside".to_string(),
            ..Config::default()
        };
        let err = run(temp_dir.path(), &config, clock(0)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
