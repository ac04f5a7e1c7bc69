//! Common utilities for integration tests

#[allow(dead_code)]
pub mod cli;

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Scratch project directory with a few files
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (path, content) in files {
        write(dir.path(), path, content);
    }
    dir
}

/// Write a file under `root`, creating parent directories
pub fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(full, content).expect("Failed to write file");
}
