//! Log entries and pages returned by the remote query service

use chrono::{DateTime, Utc};

/// A single log line with the timestamp it was ingested at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Timestamp used for ordering and cursor advancement only
    pub timestamp: DateTime<Utc>,
    /// Opaque payload, written to the output verbatim
    pub line: String,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, line: impl Into<String>) -> Self {
        Self {
            timestamp,
            line: line.into(),
        }
    }
}

/// Where the next page of a chunk starts, as reported by the last page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    /// The service returned no entries
    Empty,
    /// Timestamp of the chronologically latest entry on the page
    At(DateTime<Utc>),
    /// Entries came back but none of their timestamps could be parsed
    Unreadable,
    /// The body did not parse; the page carries a synthetic entry instead
    Malformed,
}

/// One bounded query result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Entries in ascending timestamp order
    pub entries: Vec<LogEntry>,
    /// Number of values the service returned, before any were dropped
    pub returned: usize,
    pub cursor: PageCursor,
}

impl Page {
    /// A page with no entries
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            returned: 0,
            cursor: PageCursor::Empty,
        }
    }

    /// Build a page from already ordered entries, deriving the cursor
    /// from the last one
    pub fn from_ordered(entries: Vec<LogEntry>) -> Self {
        let cursor = match entries.last() {
            Some(entry) => PageCursor::At(entry.timestamp),
            None => PageCursor::Empty,
        };
        Self {
            returned: entries.len(),
            entries,
            cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
