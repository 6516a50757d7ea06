//! Fixed-interval trigger for export runs
//!
//! Runs execute inline on the scheduler task, so a slow run delays the next
//! tick instead of overlapping with it; missed ticks are skipped. Each run
//! also holds the checkpoint lock, which rejects a second exporter process
//! pointed at the same checkpoint.

use std::time::Duration;

use chrono::{Local, Utc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::checkpoint::{CheckpointLock, FileCheckpointStore};
use crate::client::LogSource;
use crate::error::{ExportError, ExportResult};
use crate::export::{ExportConfig, ExportSummary, Exporter, FileSink, OutputLayout};

pub struct Scheduler<S> {
    source: S,
    store: FileCheckpointStore,
    layout: OutputLayout,
    export: ExportConfig,
    interval: Duration,
}

impl<S: LogSource> Scheduler<S> {
    pub fn new(
        source: S,
        store: FileCheckpointStore,
        layout: OutputLayout,
        export: ExportConfig,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            layout,
            export,
            interval,
        }
    }

    pub fn store(&self) -> &FileCheckpointStore {
        &self.store
    }

    /// One export invocation into today's output file
    pub async fn run_once(&self, cancel: &CancellationToken) -> ExportResult<ExportSummary> {
        let _lock = CheckpointLock::acquire(self.store.path())?;

        let now = Local::now();
        let path = self.layout.prepare(&now).map_err(ExportError::Write)?;
        let mut sink = FileSink::new(&path);

        let summary = Exporter::new(&self.source, &self.store, &self.export)
            .run(&mut sink, now.with_timezone(&Utc), cancel)
            .await?;

        info!(
            file = %path.display(),
            chunks = summary.chunks,
            pages = summary.pages,
            entries = summary.entries,
            position = %summary.position,
            "export run finished"
        );
        Ok(summary)
    }

    /// Run until `cancel` fires. The first run starts one interval from now.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = self.interval.as_secs(), "scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.run_once(&cancel).await {
                error!(error = %e, "export run failed, retrying next interval");
            }
        }

        info!("scheduler stopped");
    }
}
