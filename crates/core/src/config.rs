//! Engine configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// Default name of the snapshot directory under the scanned root
pub const DEFAULT_SNAPSHOT_DIR: &str = ".freeze";

/// On-disk encoding for new snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Length-prefixed binary records (`FRZ1`)
    #[default]
    Binary,
    /// One `path<TAB>hex-digest` line per file
    Lines,
}

impl std::str::FromStr for SnapshotFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "binary" => Ok(Self::Binary),
            "lines" => Ok(Self::Lines),
            other => Err(Error::Config(format!(
                "unknown snapshot format '{other}' (expected 'binary' or 'lines')"
            ))),
        }
    }
}

/// Settings for one run of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the snapshot directory, relative to the root
    pub snapshot_dir: String,
    /// Encoding used when persisting
    pub format: SnapshotFormat,
    /// Treat a missing root as an empty tree instead of failing
    pub allow_missing_root: bool,
    /// Follow symbolic links while scanning
    pub follow_links: bool,
    /// Compare without persisting a new snapshot
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_dir: DEFAULT_SNAPSHOT_DIR.to_string(),
            format: SnapshotFormat::default(),
            allow_missing_root: false,
            follow_links: false,
            dry_run: false,
        }
    }
}

impl Config {
    /// Parse a TOML document, filling unspecified keys with defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read config {}", path.display()), e))?;
        Self::from_toml_str(&text)
    }

    /// Check invariants that serde cannot express
    ///
    /// The snapshot directory must be exactly one normal path component so
    /// it always lives directly under the root and can be pruned from scans.
    pub fn validate(&self) -> Result<()> {
        let mut components = Path::new(&self.snapshot_dir).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(Error::Config(format!(
                "snapshot_dir must be a single directory name, got '{}'",
                self.snapshot_dir
            ))),
        }
    }
}
