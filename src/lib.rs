//! Loki Exporter
//!
//! Periodically pulls new log lines from a Loki `query_range` endpoint and
//! appends them to local daily files, keeping a durable checkpoint so a
//! restart resumes where the last run stopped.
//!
//! # Modules
//!
//! - `checkpoint`: durable export position, recovery and run lock
//! - `client`: `LogSource` trait and the Loki HTTP client
//! - `export`: ordering, output files and the chunked export loop
//! - `scheduler`: fixed-interval trigger with graceful shutdown
//! - `config`: command-line / environment configuration
//! - `types`: entries, pages, spans and chunks
//! - `utils`: atomic writes and timestamp helpers
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use loki_exporter::checkpoint::FileCheckpointStore;
//! use loki_exporter::client::LokiClient;
//! use loki_exporter::export::{ExportConfig, OutputLayout};
//! use loki_exporter::scheduler::Scheduler;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = LokiClient::new("http://loki:3100", r#"{app="api"}"#, Duration::from_secs(120))?;
//! let scheduler = Scheduler::new(
//!     client,
//!     FileCheckpointStore::new("/data/checkpoint.json"),
//!     OutputLayout::new("/data/export"),
//!     ExportConfig::default(),
//!     Duration::from_secs(15 * 60),
//! );
//! scheduler.run_once(&CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod scheduler;
pub mod types;
pub mod utils;

pub use checkpoint::{CheckpointStore, FileCheckpointStore, LoadOutcome};
pub use client::{LogSource, LokiClient, QueryWindow};
pub use config::Config;
pub use error::{ExportError, ExportResult};
pub use export::{ExportConfig, ExportSummary, Exporter};
pub use scheduler::Scheduler;
pub use types::{LogEntry, Page, PageCursor, TimeSpan};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
