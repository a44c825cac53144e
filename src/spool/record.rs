//! # Spooled Records
//!
//! One record per offline write. Records are append-only: every write
//! produces a new timestamped file, and "latest" queries pick the most recent
//! by creation order. File names encode kind, creation time, and a monotonic
//! sequence number so same-millisecond writes never collide.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Millisecond-resolution timestamp segment, fixed width for lexicographic
/// ordering.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";
const TIMESTAMP_WIDTH: usize = 17;
const SEQUENCE_WIDTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpooledRecord {
    pub owner_id: Uuid,
    pub kind: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
}

impl SpooledRecord {
    pub fn new(owner_id: Uuid, kind: impl Into<String>, payload: Value) -> Self {
        Self {
            owner_id,
            kind: kind.into(),
            payload,
            created_at: Utc::now(),
            synced: false,
        }
    }
}

/// Build the file name for a record: `{kind}_{timestamp}_{sequence}.json`.
pub fn record_file_name(kind: &str, created_at: DateTime<Utc>, sequence: u64) -> String {
    format!(
        "{kind}_{}_{:0width$}.json",
        created_at.format(TIMESTAMP_FORMAT),
        sequence % 1_000_000,
        width = SEQUENCE_WIDTH,
    )
}

/// Split a record file name into its kind and a sort key that orders records
/// by (creation time, sequence). Returns `None` for names the spool did not
/// produce, e.g. stray files dropped into a partition.
///
/// Kinds may themselves contain underscores, so the name is parsed from the
/// right: the last two `_`-separated segments are the timestamp and sequence.
pub fn parse_file_name(name: &str) -> Option<(&str, &str)> {
    let stem = name.strip_suffix(".json")?;

    let (rest, sequence) = stem.rsplit_once('_')?;
    let (kind, timestamp) = rest.rsplit_once('_')?;

    if kind.is_empty()
        || sequence.len() != SEQUENCE_WIDTH
        || timestamp.len() != TIMESTAMP_WIDTH
        || !sequence.bytes().all(|b| b.is_ascii_digit())
        || !timestamp.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    // Fixed-width digit segments, so the remainder of the stem after the kind
    // compares lexicographically in creation order.
    let sort_key = &stem[kind.len() + 1..];
    Some((kind, sort_key))
}
