//! Tree scanner: fingerprints every regular file under a root

use crate::error::{Error, Result};
use crate::hash::fingerprint_file;
use crate::tree::Tree;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Scanner settings
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Directory pruned from the walk, matched by path containment
    pub exclude: Option<PathBuf>,
    /// Resolve symbolic links and fingerprint their targets
    pub follow_links: bool,
    /// Yield an empty tree instead of failing when the root is missing
    pub allow_missing_root: bool,
}

/// An entry the scan could not fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a scan
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Fingerprints keyed by root-relative path
    pub tree: Tree,
    /// Entries left out because they could not be read
    pub skipped: Vec<SkippedEntry>,
}

/// Walk `root` and fingerprint every regular file beneath it
///
/// Directories are descended but not recorded. Per-entry failures are
/// collected in [`ScanOutcome::skipped`] and never abort the walk.
pub fn scan_tree(root: &Path, options: &ScanOptions) -> Result<ScanOutcome> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(Error::RootNotDirectory(root.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if options.allow_missing_root {
                info!("Root {} does not exist, treating it as empty", root.display());
                return Ok(ScanOutcome::default());
            }
            return Err(Error::RootNotFound(root.to_path_buf()));
        }
        Err(e) => return Err(Error::io(format!("failed to stat root {}", root.display()), e)),
    }

    let exclude = options.exclude.as_deref();
    // Followed links can reach the excluded dir under another name
    let resolved_exclude = match exclude {
        Some(dir) if options.follow_links => std::fs::canonicalize(dir).ok(),
        _ => None,
    };
    let mut outcome = ScanOutcome::default();

    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .into_iter()
        .filter_entry(|e| !is_excluded(e, exclude, resolved_exclude.as_deref()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                skip(&mut outcome, path, e.to_string());
                continue;
            }
        };

        // Directories, unfollowed symlinks, sockets, fifos
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        let len = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                skip(&mut outcome, entry.path().to_path_buf(), e.to_string());
                continue;
            }
        };

        match fingerprint_file(entry.path(), len) {
            Ok(hash) => {
                outcome.tree.insert(relative, hash);
            }
            Err(e) => skip(&mut outcome, entry.path().to_path_buf(), e.to_string()),
        }
    }

    debug!(
        "Scanned {}: {} files, {} skipped",
        root.display(),
        outcome.tree.len(),
        outcome.skipped.len()
    );

    Ok(outcome)
}

fn is_excluded(entry: &DirEntry, exclude: Option<&Path>, resolved: Option<&Path>) -> bool {
    let Some(dir) = exclude else {
        return false;
    };
    if entry.path().starts_with(dir) {
        return true;
    }

    let Some(resolved) = resolved else {
        return false;
    };
    if !entry.path_is_symlink() && !entry.file_type().is_dir() {
        return false;
    }
    match std::fs::canonicalize(entry.path()) {
        Ok(target) if target.starts_with(resolved) => {
            debug!("Pruning {}: resolves into {}", entry.path().display(), dir.display());
            true
        }
        _ => false,
    }
}

fn skip(outcome: &mut ScanOutcome, path: PathBuf, reason: String) {
    warn!("Skipping {}: {}", path.display(), reason);
    outcome.skipped.push(SkippedEntry { path, reason });
}
