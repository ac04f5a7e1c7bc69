//! Snapshot file encodings
//!
//! Binary (`FRZ1`, default):
//! - magic: "FRZ1\0" (5 bytes)
//! - entry_count: u32 LE
//! - entries (sorted lexicographically by path):
//!   - path_len: u32 LE
//!   - path_bytes: [u8; path_len]
//!   - digest: [u8; 32]
//!
//! Lines: one `path<TAB>hex-digest\n` record per file, sorted by path.
//! The digest is hex rather than raw bytes because a raw digest can
//! contain `\n` and would break line framing.
//! A record is split on the first TAB, so paths containing TAB or newline
//! are refused at encode time.
//!
//! The magic ends in NUL, which no path can contain, so a lines snapshot is
//! never mistaken for a binary one.

use crate::config::SnapshotFormat;
use crate::error::{Error, Result};
use crate::hash::Blake3Hash;
use crate::tree::{display_key, Tree};
use std::path::Path;

/// Leading bytes of a binary snapshot
pub const MAGIC: [u8; 5] = *b"FRZ1\0";

/// Field separator of the lines encoding
pub const SEPARATOR: u8 = b'\t';

/// Encode a tree with the given format
pub fn encode(tree: &Tree, format: SnapshotFormat) -> Result<Vec<u8>> {
    match format {
        SnapshotFormat::Binary => encode_binary(tree),
        SnapshotFormat::Lines => encode_lines(tree),
    }
}

/// Decode a snapshot, detecting its format from the leading bytes
///
/// `source` only labels errors.
pub fn decode(bytes: &[u8], source: &Path) -> Result<Tree> {
    match bytes.strip_prefix(&MAGIC[..]) {
        Some(body) => decode_binary(body, source),
        None => decode_lines(bytes, source),
    }
}

fn encode_binary(tree: &Tree) -> Result<Vec<u8>> {
    let entries = tree.sorted();
    let count = u32::try_from(entries.len()).map_err(|_| Error::UnencodablePath {
        path: String::from("<tree>"),
        reason: "more than u32::MAX entries",
    })?;

    let body: usize = entries.iter().map(|(p, _)| 4 + p.len() + Blake3Hash::LEN).sum();
    let mut out = Vec::with_capacity(MAGIC.len() + 4 + body);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&count.to_le_bytes());

    for (path, hash) in entries {
        let len = u32::try_from(path.len()).map_err(|_| Error::UnencodablePath {
            path: display_key(path).into_owned(),
            reason: "path longer than 4 GiB",
        })?;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(path);
        out.extend_from_slice(hash.as_bytes());
    }

    Ok(out)
}

fn decode_binary(body: &[u8], source: &Path) -> Result<Tree> {
    let mut reader = Reader { buf: body, pos: 0 };

    let count = reader
        .u32()
        .ok_or_else(|| Error::corrupt(source, "truncated header"))?;

    let mut tree = Tree::new();
    for index in 0..count {
        let truncated = || Error::corrupt(source, format!("truncated entry {index}"));

        let len = reader.u32().ok_or_else(truncated)? as usize;
        let path = reader.take(len).ok_or_else(truncated)?;
        let digest = reader.take(Blake3Hash::LEN).ok_or_else(truncated)?;

        if path.is_empty() {
            return Err(Error::corrupt(source, format!("entry {index} has an empty path")));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(digest);
        if tree.insert_key(path, Blake3Hash::from_bytes(bytes)).is_some() {
            return Err(Error::corrupt(
                source,
                format!("duplicate path {:?}", display_key(path)),
            ));
        }
    }

    if reader.remaining() > 0 {
        return Err(Error::corrupt(
            source,
            format!("{} trailing bytes after {count} entries", reader.remaining()),
        ));
    }

    Ok(tree)
}

fn encode_lines(tree: &Tree) -> Result<Vec<u8>> {
    let entries = tree.sorted();
    let mut out = Vec::with_capacity(entries.len() * 96);

    for (path, hash) in entries {
        if path.contains(&SEPARATOR) {
            return Err(Error::UnencodablePath {
                path: display_key(path).into_owned(),
                reason: "contains the TAB separator",
            });
        }
        if path.contains(&b'\n') {
            return Err(Error::UnencodablePath {
                path: display_key(path).into_owned(),
                reason: "contains a newline",
            });
        }

        out.extend_from_slice(path);
        out.push(SEPARATOR);
        out.extend_from_slice(hash.to_hex().as_bytes());
        out.push(b'\n');
    }

    Ok(out)
}

fn decode_lines(bytes: &[u8], source: &Path) -> Result<Tree> {
    let mut tree = Tree::new();
    if bytes.is_empty() {
        return Ok(tree);
    }

    let Some(body) = bytes.strip_suffix(b"\n") else {
        return Err(Error::corrupt(source, "last record is not newline-terminated"));
    };

    for (index, line) in body.split(|&b| b == b'\n').enumerate() {
        let line_no = index + 1;

        let Some(split) = line.iter().position(|&b| b == SEPARATOR) else {
            return Err(Error::corrupt(source, format!("line {line_no}: missing separator")));
        };
        let (path, digest) = (&line[..split], &line[split + 1..]);

        if path.is_empty() {
            return Err(Error::corrupt(source, format!("line {line_no}: empty path")));
        }

        let hash = std::str::from_utf8(digest)
            .ok()
            .and_then(|hex| Blake3Hash::from_hex(hex).ok())
            .ok_or_else(|| Error::corrupt(source, format!("line {line_no}: invalid digest")))?;

        if tree.insert_key(path, hash).is_some() {
            return Err(Error::corrupt(
                source,
                format!("line {line_no}: duplicate path {:?}", display_key(path)),
            ));
        }
    }

    Ok(tree)
}

/// Bounds-checked cursor over a byte slice
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u32(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}
