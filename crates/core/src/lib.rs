//! Directory snapshot and change detection
//!
//! This crate provides:
//! - BLAKE3 content fingerprints
//! - Path-keyed trees of fingerprints and their set difference
//! - Recursive tree scanning
//! - Timestamp-named, write-once snapshot files (binary or line encoded)
//! - A single-run engine tying the pieces together

pub mod clock;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod format;
pub mod hash;
pub mod name;
pub mod scan;
pub mod store;
pub mod tree;

// Re-exports
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, SnapshotFormat};
pub use diff::{Change, TreeDiff};
pub use engine::{run, RunReport};
pub use error::{Error, Result};
pub use hash::Blake3Hash;
pub use name::SnapshotName;
pub use scan::{scan_tree, ScanOptions, ScanOutcome, SkippedEntry};
pub use store::{SnapshotRef, SnapshotStore};
pub use tree::{PathKey, Tree};
