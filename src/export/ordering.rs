//! Chronological ordering of stream-partitioned results
//!
//! The service returns one value list per label set; lists are ordered
//! internally but interleave arbitrarily with each other.

use crate::client::StreamResult;
use crate::types::LogEntry;
use crate::utils::parse_unix_nanos;

/// Entries in ascending timestamp order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordered {
    pub entries: Vec<LogEntry>,
    /// Values dropped because their timestamp did not parse
    pub skipped: usize,
}

/// Flatten `streams` into one ascending sequence.
///
/// Equal timestamps keep their encounter order (stream order, then value
/// order within the stream).
pub fn order_streams(streams: &[StreamResult]) -> Ordered {
    let mut skipped = 0;
    let mut entries = Vec::with_capacity(streams.iter().map(|s| s.values.len()).sum());

    for stream in streams {
        for value in &stream.values {
            match parse_unix_nanos(&value.timestamp) {
                Some(timestamp) => entries.push(LogEntry::new(timestamp, value.line.clone())),
                None => skipped += 1,
            }
        }
    }

    Ordered {
        entries: order_entries(entries),
        skipped,
    }
}

/// Stable sort by timestamp
pub fn order_entries(mut entries: Vec<LogEntry>) -> Vec<LogEntry> {
    entries.sort_by_key(|entry| entry.timestamp);
    entries
}
