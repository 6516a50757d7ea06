//! Time spans and the fixed-size chunks they are exported in

use chrono::{DateTime, Duration, Utc};

/// Half-open interval `[start, end)` still to be exported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Span to cover for a stored position, pulled back by `buffer` to
    /// absorb ingestion lag at the source
    pub fn from_position(position: DateTime<Utc>, buffer: Duration, now: DateTime<Utc>) -> Self {
        Self::new(position - buffer, now)
    }

    /// True when there is nothing to export
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Split the span into consecutive chunks of at most `size`.
    ///
    /// The final chunk is clipped to `end`. A non-positive `size` yields
    /// no chunks.
    pub fn chunks(&self, size: Duration) -> Chunks {
        Chunks {
            next: self.start,
            end: self.end,
            size,
        }
    }
}

/// A bounded sub-span processed in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Iterator over the chunks of a [`TimeSpan`]
#[derive(Debug, Clone)]
pub struct Chunks {
    next: DateTime<Utc>,
    end: DateTime<Utc>,
    size: Duration,
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.next >= self.end || self.size <= Duration::zero() {
            return None;
        }
        let start = self.next;
        let end = match start.checked_add_signed(self.size) {
            Some(end) if end < self.end => end,
            _ => self.end,
        };
        self.next = end;
        Some(Chunk { start, end })
    }
}
