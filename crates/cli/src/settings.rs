//! Configuration loading and command-line overrides

use anyhow::{Context, Result};
use freeze_core::{Config, SnapshotFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, Level};

/// Location of the per-user config file, if the platform has one
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("freeze").join("config.toml"))
}

/// Load the config file
///
/// An explicit path must exist. The per-user default is optional and
/// silently skipped when absent.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    match default_config_path() {
        Some(path) if path.is_file() => {
            debug!("Using config {}", path.display());
            Config::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        _ => Ok(Config::default()),
    }
}

/// Command-line settings that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub snapshot_dir: Option<String>,
    pub format: Option<SnapshotFormat>,
    pub allow_missing_root: bool,
    pub follow_links: bool,
    pub dry_run: bool,
}

impl Overrides {
    /// Apply onto a loaded config; switches only ever turn options on
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.snapshot_dir {
            config.snapshot_dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        config.allow_missing_root |= self.allow_missing_root;
        config.follow_links |= self.follow_links;
        config.dry_run |= self.dry_run;
    }
}

/// Log level for the `-v`/`-q` flags
pub fn log_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
