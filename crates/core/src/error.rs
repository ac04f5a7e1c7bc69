//! Error taxonomy for the snapshot/diff engine

use std::path::PathBuf;

/// Errors surfaced by the engine
///
/// Per-file read failures during a scan are not errors; they are collected
/// as [`crate::scan::SkippedEntry`] values and the scan continues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The root handed to the scanner does not exist
    #[error("root directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The root exists but is a file or something other than a directory
    #[error("root is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    /// A snapshot file could not be decoded
    #[error("corrupt snapshot {}: {reason}", path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },

    /// The selected snapshot encoding cannot represent a path
    #[error("cannot encode path {path:?}: {reason}")]
    UnencodablePath { path: String, reason: &'static str },

    /// Filesystem failure while reading or writing snapshot data
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout freeze-core
pub type Result<T> = std::result::Result<T, Error>;
