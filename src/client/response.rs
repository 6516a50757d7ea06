//! `query_range` response body

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::export::ordering::order_streams;
use crate::types::{LogEntry, Page, PageCursor};
use crate::utils::parse_unix_nanos;

/// Prefix of the synthetic entry emitted for an unparseable body
pub const MALFORMED_PREFIX: &str = "[ERROR: Failed to parse Loki response]";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRangeResponse {
    #[serde(default)]
    pub data: QueryData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryData {
    #[serde(default)]
    pub result: Vec<StreamResult>,
}

/// Entries of one labelled stream
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamResult {
    #[serde(default)]
    pub stream: HashMap<String, String>,
    #[serde(default)]
    pub values: Vec<StreamValue>,
}

/// `[timestamp, line]` pair. Trailing elements (structured metadata) are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<serde_json::Value>")]
pub struct StreamValue {
    pub timestamp: String,
    pub line: String,
}

impl TryFrom<Vec<serde_json::Value>> for StreamValue {
    type Error = String;

    fn try_from(raw: Vec<serde_json::Value>) -> Result<Self, Self::Error> {
        let mut fields = raw.into_iter();
        match (fields.next(), fields.next()) {
            (Some(serde_json::Value::String(timestamp)), Some(serde_json::Value::String(line))) => {
                Ok(Self { timestamp, line })
            }
            _ => Err("expected [timestamp, line] string pair".to_string()),
        }
    }
}

impl QueryRangeResponse {
    /// Parse a response body
    pub fn from_body(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Number of values across all streams
    pub fn value_count(&self) -> usize {
        self.data.result.iter().map(|s| s.values.len()).sum()
    }

    /// Latest parseable timestamp across every stream
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.data
            .result
            .iter()
            .flat_map(|stream| stream.values.iter())
            .filter_map(|value| parse_unix_nanos(&value.timestamp))
            .max()
    }

    /// Order the entries and derive the page cursor
    pub fn into_page(self) -> Page {
        let returned = self.value_count();
        let cursor = match (returned, self.latest_timestamp()) {
            (0, _) => PageCursor::Empty,
            (_, Some(ts)) => PageCursor::At(ts),
            (_, None) => PageCursor::Unreadable,
        };

        let ordered = order_streams(&self.data.result);
        if ordered.skipped > 0 {
            warn!(
                skipped = ordered.skipped,
                "dropped entries with unparseable timestamps"
            );
        }

        Page {
            entries: ordered.entries,
            returned,
            cursor,
        }
    }
}

/// Turn a successful response body into a page.
///
/// A body that does not parse becomes a single synthetic entry stamped with
/// `received_at`, so the failure shows up in the output.
pub(crate) fn parse_page(body: &str, received_at: DateTime<Utc>) -> Page {
    match QueryRangeResponse::from_body(body) {
        Ok(response) => response.into_page(),
        Err(e) => {
            warn!(error = %e, "failed to parse query response, keeping raw body");
            Page {
                entries: vec![LogEntry::new(
                    received_at,
                    format!("{} {}", MALFORMED_PREFIX, body),
                )],
                returned: 1,
                cursor: PageCursor::Malformed,
            }
        }
    }
}
