//! Snapshot directory management: persist, load and select snapshots

use crate::clock::{Clock, SystemClock};
use crate::config::SnapshotFormat;
use crate::error::{Error, Result};
use crate::format;
use crate::name::SnapshotName;
use crate::tree::Tree;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Upper bound on `-N` suffixes tried for a single instant
const MAX_SEQ: u32 = 10_000;

/// A snapshot file in the snapshot directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    pub name: SnapshotName,
    pub path: PathBuf,
}

/// Owner of one snapshot directory
///
/// ```text
/// <root>/.freeze/
///   20240309T140507.123456Z
///   20240309T151200.000001Z
///   20240309T151200.000001Z-1
/// ```
///
/// Snapshots are written once and never modified or deleted.
pub struct SnapshotStore {
    dir: PathBuf,
    format: SnapshotFormat,
    clock: Box<dyn Clock>,
}

impl SnapshotStore {
    /// Store rooted at `dir`, binary format, wall-clock naming
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            format: SnapshotFormat::default(),
            clock: Box::new(SystemClock),
        }
    }

    /// Use a different encoding for new snapshots
    pub fn with_format(mut self, format: SnapshotFormat) -> Self {
        self.format = format;
        self
    }

    /// Use a different time source for naming
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the snapshot directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Encoding used by [`SnapshotStore::persist`]
    pub fn format(&self) -> SnapshotFormat {
        self.format
    }

    /// Create the snapshot directory if it does not exist
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::io(
                format!("failed to create snapshot directory {}", self.dir.display()),
                e,
            )
        })
    }

    /// Write `tree` as a new snapshot named after the current instant
    ///
    /// The data goes to a temp file in the snapshot directory which is then
    /// renamed into place without clobbering; an existing name at the same
    /// instant bumps the `-N` suffix instead of being overwritten.
    pub fn persist(&self, tree: &Tree) -> Result<SnapshotRef> {
        let bytes = format::encode(tree, self.format)?;
        self.ensure_dir()?;

        let write_err = |e: io::Error| {
            Error::io(
                format!("failed to write snapshot in {}", self.dir.display()),
                e,
            )
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        let mut name = SnapshotName::new(self.clock.now());
        loop {
            let path = self.dir.join(name.to_string());
            match tmp.persist_noclobber(&path) {
                Ok(_) => {
                    info!("Wrote snapshot {} ({} files)", name, tree.len());
                    return Ok(SnapshotRef { name, path });
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists && name.seq() < MAX_SEQ => {
                    debug!("Snapshot name {} taken, trying next suffix", name);
                    tmp = e.file;
                    name = name.next();
                }
                Err(e) => return Err(write_err(e.error)),
            }
        }
    }

    /// Read and decode a snapshot
    ///
    /// Any malformed record fails the whole load.
    pub fn load(&self, snapshot: &SnapshotRef) -> Result<Tree> {
        load_snapshot(&snapshot.path)
    }

    /// All snapshots, oldest first
    ///
    /// Subdirectories and files whose names do not parse as snapshot names
    /// are ignored. A missing directory has no snapshots.
    pub fn list(&self) -> Result<Vec<SnapshotRef>> {
        let mut snapshots = self.candidates()?;
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(snapshots)
    }

    /// The most recently created snapshot, if any
    pub fn latest(&self) -> Result<Option<SnapshotRef>> {
        let latest = self
            .candidates()?
            .into_iter()
            .max_by(|a, b| a.name.cmp(&b.name));

        match &latest {
            Some(snapshot) => debug!("Latest snapshot: {}", snapshot.name),
            None => debug!("No prior snapshot in {}", self.dir.display()),
        }
        Ok(latest)
    }

    fn candidates(&self) -> Result<Vec<SnapshotRef>> {
        let read_err = |e: io::Error| {
            Error::io(
                format!("failed to read snapshot directory {}", self.dir.display()),
                e,
            )
        };

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_err(e)),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry.map_err(read_err)?;
            if !entry.file_type().map_err(read_err)?.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let parsed = file_name.to_str().and_then(SnapshotName::parse);
            match parsed {
                Some(name) => snapshots.push(SnapshotRef {
                    name,
                    path: entry.path(),
                }),
                None => debug!("Ignoring stray file {:?} in snapshot directory", file_name),
            }
        }

        Ok(snapshots)
    }
}

/// Read and decode the snapshot file at `path`
pub fn load_snapshot(path: &Path) -> Result<Tree> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::io(format!("failed to read snapshot {}", path.display()), e))?;
    let tree = format::decode(&bytes, path)?;
    debug!("Loaded snapshot {} ({} files)", path.display(), tree.len());
    Ok(tree)
}
