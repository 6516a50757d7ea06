//! Loki `query_range` client

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::response::parse_page;
use super::{LogSource, QueryError, QueryWindow};
use crate::types::Page;
use crate::utils::to_unix_nanos;

/// Path of the range query endpoint, relative to the service address
pub const QUERY_RANGE_PATH: &str = "/loki/api/v1/query_range";

/// Per-call deadline for a range query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for one Loki endpoint and query expression.
///
/// Owns a pooled `reqwest::Client`; clone it to share connections.
#[derive(Debug, Clone)]
pub struct LokiClient {
    http: reqwest::Client,
    endpoint: String,
    query: String,
    timeout: Duration,
}

impl LokiClient {
    /// Build a client for `base_url` (e.g. `http://loki-gateway:80`)
    pub fn new(
        base_url: &str,
        query: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self::with_http(http, base_url, query, timeout))
    }

    /// Build a client around an existing connection pool
    pub fn with_http(
        http: reqwest::Client,
        base_url: &str,
        query: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), QUERY_RANGE_PATH),
            query: query.into(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn query_expression(&self) -> &str {
        &self.query
    }

    fn classify(&self, err: reqwest::Error) -> QueryError {
        if err.is_timeout() {
            QueryError::Timeout(self.timeout)
        } else {
            QueryError::Http(err)
        }
    }
}

#[async_trait]
impl LogSource for LokiClient {
    async fn query(&self, window: &QueryWindow) -> Result<Page, QueryError> {
        let start = to_unix_nanos(window.effective_start());
        let end = to_unix_nanos(window.end);
        debug!(start, end, limit = window.limit, "querying log service");

        let params = [
            ("query", self.query.clone()),
            ("start", start.to_string()),
            ("end", end.to_string()),
            ("limit", window.limit.to_string()),
            ("direction", "forward".to_string()),
        ];

        let response = self
            .http
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_page(&body, Utc::now()))
    }
}
