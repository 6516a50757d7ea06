//! Shared fakes for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use loki_exporter::client::{LogSource, QueryError, QueryWindow};
use loki_exporter::types::{LogEntry, Page};

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
}

/// In-memory log service honouring windows and limits like Loki does
pub struct FakeLoki {
    entries: Vec<LogEntry>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    windows: Mutex<Vec<QueryWindow>>,
}

impl FakeLoki {
    pub fn new(mut entries: Vec<LogEntry>) -> Self {
        entries.sort_by_key(|e| e.timestamp);
        Self {
            entries,
            calls: AtomicUsize::new(0),
            fail_on_call: None,
            windows: Mutex::new(Vec::new()),
        }
    }

    /// Entries every `step_ms` milliseconds in `[from, to)`, named by offset
    pub fn every(from: i64, to: i64, step_ms: i64) -> Self {
        let start = at(from);
        let end = at(to);
        let mut entries = Vec::new();
        let mut ts = start;
        while ts < end {
            entries.push(LogEntry::new(ts, line_for(ts)));
            ts = ts + Duration::milliseconds(step_ms);
        }
        Self::new(entries)
    }

    /// Fail the `n`th query (1-based) with a 503
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn windows(&self) -> Vec<QueryWindow> {
        self.windows.lock().clone()
    }
}

pub fn line_for(ts: DateTime<Utc>) -> String {
    format!("ts={}", ts.timestamp_nanos_opt().unwrap())
}

#[async_trait]
impl LogSource for FakeLoki {
    async fn query(&self, window: &QueryWindow) -> Result<Page, QueryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.windows.lock().push(*window);
        if self.fail_on_call == Some(call) {
            return Err(QueryError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }

        let start = window.effective_start();
        let entries: Vec<LogEntry> = self
            .entries
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp < window.end)
            .take(window.limit)
            .cloned()
            .collect();
        Ok(Page::from_ordered(entries))
    }
}
