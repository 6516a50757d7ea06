//! Terminal outcome of a failed export invocation

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::client::QueryError;

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Every variant aborts the current invocation. The checkpoint stays at the
/// last completed chunk, so the next invocation retries from there.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error("failed to fetch logs from {start} to {end}: {source}")]
    Query {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        #[source]
        source: QueryError,
    },
    #[error("failed to write logs: {0}")]
    Write(#[source] std::io::Error),
    #[error("full page from {start} to {end} has no readable timestamp, cannot paginate")]
    CursorUnreadable {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("pagination cursor did not advance past {cursor} (next would be {next})")]
    CursorStalled {
        cursor: DateTime<Utc>,
        next: DateTime<Utc>,
    },
}
