//! The fetch-chunk-paginate-checkpoint loop

use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sink::EntrySink;
use crate::checkpoint::{load_position, CheckpointStore, RecoveryPolicy};
use crate::client::{LogSource, QueryWindow};
use crate::error::{ExportError, ExportResult};
use crate::types::{Chunk, Page, PageCursor, TimeSpan};

/// Tuning of one export invocation
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Maximum time covered by one chunk
    pub chunk_duration: Duration,
    /// Maximum entries per query; a full page means more may follow
    pub page_limit: usize,
    /// Subtracted from the stored position to absorb ingestion lag
    pub buffer: Duration,
    /// Pause between chunks
    pub pace: std::time::Duration,
    pub recovery: RecoveryPolicy,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_duration: Duration::minutes(3),
            page_limit: 5000,
            buffer: Duration::seconds(10),
            pace: std::time::Duration::from_secs(2),
            recovery: RecoveryPolicy::default(),
        }
    }
}

/// What one invocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Chunks fully exported and checkpointed
    pub chunks: usize,
    pub pages: usize,
    pub entries: usize,
    /// Position persisted when the run ended
    pub position: DateTime<Utc>,
    pub cold_start: bool,
    /// Shutdown was requested before the span was covered
    pub cancelled: bool,
}

enum ChunkOutcome {
    Exhausted,
    Cancelled,
}

/// One export invocation over a source, a checkpoint and a sink
pub struct Exporter<'a> {
    source: &'a dyn LogSource,
    store: &'a dyn CheckpointStore,
    config: &'a ExportConfig,
}

impl<'a> Exporter<'a> {
    pub fn new(
        source: &'a dyn LogSource,
        store: &'a dyn CheckpointStore,
        config: &'a ExportConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Export everything between the stored position and `now`.
    ///
    /// The checkpoint advances to each chunk's end once all of its pages
    /// were appended to `sink`. Any error aborts the run; chunks after the
    /// last checkpoint are fetched again by the next invocation.
    pub async fn run(
        &self,
        sink: &mut dyn EntrySink,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> ExportResult<ExportSummary> {
        let loaded = load_position(self.store, self.config.recovery, now)?;
        let mut position = loaded.position();
        let mut summary = ExportSummary {
            chunks: 0,
            pages: 0,
            entries: 0,
            position,
            cold_start: loaded.is_cold_start(),
            cancelled: false,
        };

        let span = TimeSpan::from_position(position, self.config.buffer, now);
        if span.is_empty() {
            debug!(%position, %now, "nothing to export");
            return Ok(summary);
        }
        info!(start = %span.start, end = %span.end, cold_start = summary.cold_start, "exporting span");

        let mut chunks = span.chunks(self.config.chunk_duration).peekable();
        while let Some(chunk) = chunks.next() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            debug!(start = %chunk.start, end = %chunk.end, "starting chunk");
            if let ChunkOutcome::Cancelled = self.export_chunk(chunk, sink, cancel, &mut summary).await? {
                summary.cancelled = true;
                break;
            }

            if chunk.end > position {
                self.store.save(chunk.end)?;
                position = chunk.end;
                summary.position = position;
                info!(%position, "checkpoint advanced");
            } else {
                debug!(end = %chunk.end, %position, "chunk ends before stored position, checkpoint kept");
            }
            summary.chunks += 1;

            if chunks.peek().is_some() && !self.config.pace.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.config.pace) => {}
                }
            }
        }

        if summary.cancelled {
            warn!(position = %summary.position, "export interrupted by shutdown");
        }
        Ok(summary)
    }

    async fn export_chunk(
        &self,
        chunk: Chunk,
        sink: &mut dyn EntrySink,
        cancel: &CancellationToken,
        summary: &mut ExportSummary,
    ) -> ExportResult<ChunkOutcome> {
        let mut cursor = chunk.start;

        loop {
            if cancel.is_cancelled() {
                return Ok(ChunkOutcome::Cancelled);
            }

            let window = QueryWindow {
                start: chunk.start,
                end: chunk.end,
                cursor: Some(cursor),
                limit: self.config.page_limit,
            };
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(ChunkOutcome::Cancelled),
                result = self.source.query(&window) => result.map_err(|source| ExportError::Query {
                    start: cursor,
                    end: chunk.end,
                    source,
                })?,
            };

            sink.append(&page.entries).map_err(ExportError::Write)?;
            summary.pages += 1;
            summary.entries += page.entries.len();
            debug!(%cursor, returned = page.returned, written = page.entries.len(), "page written");

            match next_cursor(&page, cursor, chunk, self.config.page_limit)? {
                Some(next) => cursor = next,
                None => return Ok(ChunkOutcome::Exhausted),
            }
        }
    }
}

/// Start of the next page, or `None` once the chunk is exhausted
fn next_cursor(
    page: &Page,
    cursor: DateTime<Utc>,
    chunk: Chunk,
    limit: usize,
) -> ExportResult<Option<DateTime<Utc>>> {
    let last = match page.cursor {
        PageCursor::Empty => return Ok(None),
        PageCursor::Malformed => {
            warn!(%cursor, end = %chunk.end, "malformed response, closing chunk");
            return Ok(None);
        }
        PageCursor::Unreadable if page.returned < limit => {
            warn!(%cursor, end = %chunk.end, "page timestamps unreadable, closing chunk");
            return Ok(None);
        }
        PageCursor::Unreadable => {
            return Err(ExportError::CursorUnreadable {
                start: cursor,
                end: chunk.end,
            })
        }
        PageCursor::At(ts) => ts,
    };

    if page.returned < limit || last >= chunk.end {
        return Ok(None);
    }

    let next = last + Duration::nanoseconds(1);
    if next <= cursor {
        return Err(ExportError::CursorStalled { cursor, next });
    }
    Ok(Some(next))
}
