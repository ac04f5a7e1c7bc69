//! Fingerprint store: the path -> digest map a snapshot persists

use crate::hash::Blake3Hash;
use ahash::AHashMap;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// Normalized path key, stack-allocated for short paths (< 64 bytes)
pub type PathKey = SmallVec<[u8; 64]>;

/// Fingerprints of every regular file under a root at one point in time
///
/// Keys are root-relative paths with `/` separators, kept as raw bytes so
/// non-UTF-8 Unix file names round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: AHashMap<PathKey, Blake3Hash>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }

    /// Insert a fingerprint, returning the previous digest for that path
    pub fn insert(&mut self, path: &Path, hash: Blake3Hash) -> Option<Blake3Hash> {
        self.entries.insert(path_key(path), hash)
    }

    /// Insert a fingerprint under an already-normalized key
    pub fn insert_key(&mut self, key: &[u8], hash: Blake3Hash) -> Option<Blake3Hash> {
        self.entries.insert(PathKey::from_slice(key), hash)
    }

    /// Get the digest recorded for a path
    pub fn get(&self, path: &Path) -> Option<&Blake3Hash> {
        self.entries.get(path_key(path).as_slice())
    }

    /// Get the digest recorded under a normalized key
    pub fn get_key(&self, key: &[u8]) -> Option<&Blake3Hash> {
        self.entries.get(key)
    }

    /// Remove an entry from the tree
    pub fn remove(&mut self, path: &Path) -> Option<Blake3Hash> {
        self.entries.remove(path_key(path).as_slice())
    }

    /// Get the number of entries in the tree
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Blake3Hash)> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Entries sorted lexicographically by path bytes
    pub fn sorted(&self) -> Vec<(&[u8], &Blake3Hash)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<P: AsRef<Path>> FromIterator<(P, Blake3Hash)> for Tree {
    fn from_iter<I: IntoIterator<Item = (P, Blake3Hash)>>(iter: I) -> Self {
        let mut tree = Tree::new();
        for (path, hash) in iter {
            tree.insert(path.as_ref(), hash);
        }
        tree
    }
}

/// Normalize a path into a tree key
///
/// - Joins components with `/` regardless of platform
/// - Drops `./`, root and drive prefixes (keys are root-relative)
/// - Keeps `..` verbatim; the scanner never produces it
pub fn path_key(path: &Path) -> PathKey {
    let mut key = PathKey::new();
    for component in path.components() {
        let part: Cow<'_, [u8]> = match component {
            Component::Normal(name) => os_bytes(name),
            Component::ParentDir => Cow::Borrowed(b".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => continue,
        };
        if !key.is_empty() {
            key.push(b'/');
        }
        key.extend_from_slice(&part);
    }
    key
}

/// Convert a tree key back into a platform path
pub fn key_to_path(key: &[u8]) -> PathBuf {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(std::ffi::OsStr::from_bytes(key))
    }
    #[cfg(not(unix))]
    {
        PathBuf::from(String::from_utf8_lossy(key).into_owned())
    }
}

/// Render a tree key for humans (lossy for non-UTF-8 names)
pub fn display_key(key: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(key)
}

#[cfg(unix)]
fn os_bytes(name: &std::ffi::OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(name.as_bytes())
}

#[cfg(not(unix))]
fn os_bytes(name: &std::ffi::OsStr) -> Cow<'_, [u8]> {
    match name.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;

    #[test]
    fn test_path_key_normalization() {
        assert_eq!(path_key(Path::new("src/main.rs")).as_slice(), b"src/main.rs");
        assert_eq!(path_key(Path::new("./src/./main.rs")).as_slice(), b"src/main.rs");
        assert_eq!(path_key(Path::new("/abs/file")).as_slice(), b"abs/file");
        assert_eq!(path_key(Path::new("a/../b")).as_slice(), b"a/../b");
        assert!(path_key(Path::new("")).is_empty());
    }

    #[test]
    fn test_insert_get_remove() {
        let mut tree = Tree::new();
        let h1 = hash_bytes(b"one");
        let h2 = hash_bytes(b"two");

        assert_eq!(tree.insert(Path::new("a.txt"), h1), None);
        assert_eq!(tree.insert(Path::new("./a.txt"), h2), Some(h1));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(Path::new("a.txt")), Some(&h2));
        assert_eq!(tree.get_key(b"a.txt"), Some(&h2));

        assert_eq!(tree.remove(Path::new("a.txt")), Some(h2));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let h1 = hash_bytes(b"1");
        let h2 = hash_bytes(b"2");
        let a: Tree = [("x", h1), ("y", h2)].into_iter().collect();
        let b: Tree = [("y", h2), ("x", h1)].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sorted_is_lexicographic() {
        let h = hash_bytes(b"");
        let tree: Tree = [("b/z", h), ("a", h), ("b/a", h), ("B", h)].into_iter().collect();
        let keys: Vec<&[u8]> = tree.sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"B"[..], b"a", b"b/a", b"b/z"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_key_roundtrip() {
        use std::os::unix::ffi::OsStrExt;

        let raw = b"caf\xe9.txt";
        let path = Path::new(std::ffi::OsStr::from_bytes(raw));
        let key = path_key(path);
        assert_eq!(key.as_slice(), raw);
        assert_eq!(key_to_path(&key), path);
        assert_eq!(display_key(&key), "caf\u{fffd}.txt");
    }
}
