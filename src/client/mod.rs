//! Remote query client
//!
//! `LogSource` is the seam between the export loop and the log service;
//! `LokiClient` speaks the Loki `query_range` HTTP API.

mod loki;
mod response;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::Page;

pub use loki::{LokiClient, DEFAULT_QUERY_TIMEOUT, QUERY_RANGE_PATH};
pub use response::{QueryData, QueryRangeResponse, StreamResult, StreamValue, MALFORMED_PREFIX};

/// One bounded query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Overrides `start` when paginating inside a chunk
    pub cursor: Option<DateTime<Utc>>,
    /// Maximum number of entries the service may return
    pub limit: usize,
}

impl QueryWindow {
    pub fn effective_start(&self) -> DateTime<Utc> {
        self.cursor.unwrap_or(self.start)
    }
}

/// Errors returned by a [`LogSource`]. All of them are retryable by the
/// next scheduled invocation.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    #[error("log service returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Source of log pages
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch entries in `[window.effective_start(), window.end)`, at most
    /// `window.limit` of them, ordered by timestamp
    async fn query(&self, window: &QueryWindow) -> Result<Page, QueryError>;
}
