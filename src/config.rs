//! Command-line and environment configuration
//!
//! Every flag falls back to an environment variable, then to the default of
//! the deployed exporter.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use thiserror::Error;
use tracing::info;

use crate::checkpoint::{FileCheckpointStore, RecoveryPolicy, DEFAULT_LOOKBACK_MINUTES};
use crate::export::{ExportConfig, OutputLayout};

/// Default stream selector
pub const DEFAULT_QUERY: &str = r#"{namespace="namespace1", app!="api1", app!="api2"} |= "" "#;

/// Longest window any duration setting may describe, roughly a century
const MAX_WINDOW_MINUTES: i64 = 100 * 366 * 24 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{0} is out of range")]
    TooLarge(&'static str),
}

#[derive(Parser, Debug, Clone)]
#[command(name = "loki-exporter", version, about = "Export Loki log streams to local files")]
pub struct Config {
    /// Loki base address
    #[arg(long = "addr", env = "LOKI_ADDR", default_value = "http://scaledloki-gateway:80")]
    pub loki_addr: String,

    /// LogQL stream selector to export
    #[arg(long = "ns", env = "NAMESPACE_QUERY", default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Root directory of the exported files
    #[arg(long = "logpath", env = "DIR_LOG_PATHS", default_value = "/data/export")]
    pub log_dir: PathBuf,

    /// Checkpoint file
    #[arg(long = "checkpoint", env = "CHECKPOINT", default_value = "/data/checkpoint.json")]
    pub checkpoint: PathBuf,

    /// Minutes between export runs
    #[arg(long = "scheduleint", env = "SCHEDULE_INTERVAL", default_value_t = 15)]
    pub schedule_minutes: u64,

    /// Minutes covered by one chunk
    #[arg(long = "chunk", env = "LOKI_CHUNK_SIZE", default_value_t = 3)]
    pub chunk_minutes: i64,

    /// Enable debug logging; the variable takes 1/0, t/f, true/false, yes/no
    #[arg(
        long = "debug",
        env = "DEBUGFLAG",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub debug: bool,

    /// Maximum entries per query
    #[arg(long = "maxquerylogs", env = "MAXLOGSQUERY", default_value_t = 5000)]
    pub max_query_logs: usize,

    /// Minutes exported on the first run, when no checkpoint exists
    #[arg(long = "lookback", env = "LOOKBACK_MINUTES", default_value_t = DEFAULT_LOOKBACK_MINUTES)]
    pub lookback_minutes: i64,

    /// Seconds re-read before the checkpoint to catch late ingestion
    #[arg(long = "buffer", env = "INGEST_BUFFER_SECS", default_value_t = 10)]
    pub buffer_secs: i64,

    /// Seconds to pause between chunks
    #[arg(long = "pace", env = "CHUNK_PACE_SECS", default_value_t = 2)]
    pub pace_secs: u64,

    /// Per-query timeout in seconds
    #[arg(long = "timeout", env = "QUERY_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,

    /// Run a single export and exit
    #[arg(long)]
    pub once: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loki_addr.trim().is_empty() {
            return Err(ConfigError::Empty("addr"));
        }
        if self.query.trim().is_empty() {
            return Err(ConfigError::Empty("ns"));
        }
        if self.schedule_minutes == 0 {
            return Err(ConfigError::NotPositive("scheduleint"));
        }
        if self.chunk_minutes <= 0 {
            return Err(ConfigError::NotPositive("chunk"));
        }
        if self.max_query_logs == 0 {
            return Err(ConfigError::NotPositive("maxquerylogs"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::NotPositive("timeout"));
        }
        if self.lookback_minutes < 0 {
            return Err(ConfigError::NotPositive("lookback"));
        }
        if self.buffer_secs < 0 {
            return Err(ConfigError::NotPositive("buffer"));
        }
        if self.schedule_minutes > MAX_WINDOW_MINUTES as u64 {
            return Err(ConfigError::TooLarge("scheduleint"));
        }
        if self.chunk_minutes > MAX_WINDOW_MINUTES {
            return Err(ConfigError::TooLarge("chunk"));
        }
        if self.lookback_minutes > MAX_WINDOW_MINUTES {
            return Err(ConfigError::TooLarge("lookback"));
        }
        if self.buffer_secs > MAX_WINDOW_MINUTES * 60 {
            return Err(ConfigError::TooLarge("buffer"));
        }
        Ok(())
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_minutes.saturating_mul(60))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            chunk_duration: chrono::Duration::minutes(self.chunk_minutes),
            page_limit: self.max_query_logs,
            buffer: chrono::Duration::seconds(self.buffer_secs),
            pace: Duration::from_secs(self.pace_secs),
            recovery: RecoveryPolicy::default(),
        }
    }

    pub fn checkpoint_store(&self) -> FileCheckpointStore {
        FileCheckpointStore::new(&self.checkpoint)
            .with_lookback(chrono::Duration::minutes(self.lookback_minutes))
    }

    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::new(&self.log_dir)
    }

    /// Log the effective settings at startup
    pub fn log_summary(&self) {
        info!(
            addr = %self.loki_addr,
            query = %self.query,
            log_dir = %self.log_dir.display(),
            checkpoint = %self.checkpoint.display(),
            schedule_minutes = self.schedule_minutes,
            chunk_minutes = self.chunk_minutes,
            lookback_minutes = self.lookback_minutes,
            buffer_secs = self.buffer_secs,
            max_query_logs = self.max_query_logs,
            debug = self.debug,
            "exporter configured"
        );
    }
}
