//! Three-way classification of changes between two fingerprint stores

use crate::tree::{display_key, PathKey, Tree};
use std::borrow::Cow;

/// A single classified change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<'a> {
    /// Present only in the newer store
    Added(&'a [u8]),
    /// Present only in the older store
    Deleted(&'a [u8]),
    /// Present in both with differing digests
    Modified(&'a [u8]),
}

impl<'a> Change<'a> {
    /// Path bytes this change refers to
    pub fn path(&self) -> &'a [u8] {
        match self {
            Change::Added(p) | Change::Deleted(p) | Change::Modified(p) => *p,
        }
    }

    /// Path rendered for display
    pub fn display_path(&self) -> Cow<'a, str> {
        display_key(self.path())
    }

    /// Short lowercase label for the change kind
    pub fn label(&self) -> &'static str {
        match self {
            Change::Added(_) => "added",
            Change::Deleted(_) => "deleted",
            Change::Modified(_) => "modified",
        }
    }
}

/// Differences between two trees
///
/// Each list is sorted lexicographically by path bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// Paths present in `after` but not in `before`
    pub added: Vec<PathKey>,
    /// Paths present in `before` but not in `after`
    pub deleted: Vec<PathKey>,
    /// Paths present in both with a different digest
    pub modified: Vec<PathKey>,
}

impl TreeDiff {
    /// Compute the diff between two trees
    pub fn diff(before: &Tree, after: &Tree) -> Self {
        let mut diff = TreeDiff::default();

        for (path, before_hash) in before.iter() {
            match after.get_key(path) {
                Some(after_hash) if after_hash != before_hash => {
                    diff.modified.push(PathKey::from_slice(path));
                }
                Some(_) => {}
                None => diff.deleted.push(PathKey::from_slice(path)),
            }
        }

        for (path, _) in after.iter() {
            if before.get_key(path).is_none() {
                diff.added.push(PathKey::from_slice(path));
            }
        }

        diff.added.sort_unstable();
        diff.deleted.sort_unstable();
        diff.modified.sort_unstable();
        diff
    }

    /// Check if there are any changes
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// Total number of changes
    pub fn len(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }

    /// All changes as records: modified, then deleted, then added
    pub fn changes(&self) -> impl Iterator<Item = Change<'_>> {
        self.modified
            .iter()
            .map(|p| Change::Modified(p.as_slice()))
            .chain(self.deleted.iter().map(|p| Change::Deleted(p.as_slice())))
            .chain(self.added.iter().map(|p| Change::Added(p.as_slice())))
    }
}
