//! Checkpoint store - persisted export position

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::utils::{atomic_write, remove_if_exists, temp_path_for};

/// How far back a cold start begins when no record exists
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 35;

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Errors that can occur while reading or writing the checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("checkpoint {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("checkpoint unreadable after {attempts} attempts: {last}")]
    RecoveryExhausted {
        attempts: u32,
        #[source]
        last: Box<CheckpointError>,
    },
    #[error("checkpoint {} is locked by another export run", .path.display())]
    Locked { path: PathBuf },
}

impl CheckpointError {
    /// True when the record exists but could not be parsed
    pub fn is_corrupt(&self) -> bool {
        matches!(self, CheckpointError::Corrupt { .. })
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk shape of the checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    #[serde(rename = "lastTimestamp")]
    pub last_timestamp: DateTime<Utc>,
}

/// Outcome of a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A record existed and parsed
    Restored(DateTime<Utc>),
    /// No record existed; the position defaults to `now - lookback`
    ColdStart(DateTime<Utc>),
}

impl LoadOutcome {
    pub fn position(&self) -> DateTime<Utc> {
        match self {
            LoadOutcome::Restored(ts) | LoadOutcome::ColdStart(ts) => *ts,
        }
    }

    pub fn is_cold_start(&self) -> bool {
        matches!(self, LoadOutcome::ColdStart(_))
    }
}

/// Durable storage for the export position
pub trait CheckpointStore: Send + Sync {
    /// Read the position. A missing record is a cold start, not an error.
    fn load(&self, now: DateTime<Utc>) -> CheckpointResult<LoadOutcome>;

    /// Persist `position`. Either fully replaces the record or leaves the
    /// previous one readable.
    fn save(&self, position: DateTime<Utc>) -> CheckpointResult<()>;

    /// Delete the record so the next load cold-starts. Returns whether a
    /// record existed.
    fn reset(&self) -> CheckpointResult<bool>;
}

/// Checkpoint kept as a small JSON file
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
    lookback: Duration,
}

impl FileCheckpointStore {
    /// Create a store at `path` with the default 35 minute lookback
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lookback: Duration::minutes(DEFAULT_LOOKBACK_MINUTES),
        }
    }

    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self, now: DateTime<Utc>) -> CheckpointResult<LoadOutcome> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let position = now - self.lookback;
                warn!(
                    path = %self.path.display(),
                    %position,
                    "checkpoint does not exist, starting from lookback window"
                );
                return Ok(LoadOutcome::ColdStart(position));
            }
            Err(e) => return Err(CheckpointError::io(&self.path, e)),
        };

        let record: CheckpointRecord =
            serde_json::from_str(&data).map_err(|e| CheckpointError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = %self.path.display(), position = %record.last_timestamp, "checkpoint loaded");
        Ok(LoadOutcome::Restored(record.last_timestamp))
    }

    fn save(&self, position: DateTime<Utc>) -> CheckpointResult<()> {
        let record = CheckpointRecord {
            last_timestamp: position,
        };
        let data = serde_json::to_vec(&record).map_err(|e| {
            CheckpointError::io(&self.path, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        atomic_write(&self.path, &data).map_err(|e| CheckpointError::io(&self.path, e))
    }

    fn reset(&self) -> CheckpointResult<bool> {
        remove_if_exists(temp_path_for(&self.path))
            .map_err(|e| CheckpointError::io(&self.path, e))?;
        remove_if_exists(&self.path).map_err(|e| CheckpointError::io(&self.path, e))
    }
}
