//! Sortable timestamp names for snapshot files
//!
//! Format: `YYYYMMDDTHHMMSS.ffffffZ` (ISO-8601 basic, UTC, microseconds),
//! with an optional `-N` suffix when several snapshots share an instant.
//! Names of distinct instants sort lexically in chronological order; the
//! selector compares parsed names, so suffixes past 9 still order correctly.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use std::fmt;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";
const PARSE_FORMAT: &str = "%Y%m%dT%H%M%S%.fZ";

/// Name of one snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotName {
    timestamp: DateTime<Utc>,
    seq: u32,
}

impl SnapshotName {
    /// Name for an instant, truncated to microsecond resolution
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        let micros = timestamp.nanosecond() / 1_000 * 1_000;
        Self {
            timestamp: timestamp.with_nanosecond(micros).unwrap_or(timestamp),
            seq: 0,
        }
    }

    /// Same instant, next disambiguation suffix
    pub fn next(self) -> Self {
        Self {
            seq: self.seq + 1,
            ..self
        }
    }

    /// Instant the snapshot was taken
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Disambiguation suffix (0 when absent)
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Parse a file name; `None` for anything that is not a canonical name
    pub fn parse(name: &str) -> Option<Self> {
        let (stamp, seq) = match name.split_once('-') {
            Some((stamp, suffix)) => {
                let seq: u32 = suffix.parse().ok()?;
                if seq == 0 {
                    return None;
                }
                (stamp, seq)
            }
            None => (name, 0),
        };

        let naive = NaiveDateTime::parse_from_str(stamp, PARSE_FORMAT).ok()?;
        let parsed = Self {
            timestamp: naive.and_utc(),
            seq,
        };

        // Reject variants that would not round-trip (e.g. "-01", 3-digit fractions)
        (parsed.to_string() == name).then_some(parsed)
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.timestamp.format(TIMESTAMP_FORMAT))?;
        if self.seq > 0 {
            write!(f, "-{}", self.seq)?;
        }
        Ok(())
    }
}
