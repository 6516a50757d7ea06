//! In-memory checkpoint store

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use super::store::{
    CheckpointResult, CheckpointStore, LoadOutcome, DEFAULT_LOOKBACK_MINUTES,
};

/// Checkpoint held in process memory.
///
/// Counts saves so callers can assert on durability boundaries.
#[derive(Debug)]
pub struct MemoryCheckpointStore {
    position: Mutex<Option<DateTime<Utc>>>,
    lookback: Duration,
    saves: AtomicUsize,
}

impl MemoryCheckpointStore {
    /// Empty store: the first load is a cold start
    pub fn new() -> Self {
        Self {
            position: Mutex::new(None),
            lookback: Duration::minutes(DEFAULT_LOOKBACK_MINUTES),
            saves: AtomicUsize::new(0),
        }
    }

    /// Store that already holds `position`
    pub fn with_position(position: DateTime<Utc>) -> Self {
        let store = Self::new();
        *store.position.lock() = Some(position);
        store
    }

    /// Currently stored position
    pub fn position(&self) -> Option<DateTime<Utc>> {
        *self.position.lock()
    }

    /// Number of successful saves so far
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Default for MemoryCheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, now: DateTime<Utc>) -> CheckpointResult<LoadOutcome> {
        Ok(match *self.position.lock() {
            Some(position) => LoadOutcome::Restored(position),
            None => LoadOutcome::ColdStart(now - self.lookback),
        })
    }

    fn save(&self, position: DateTime<Utc>) -> CheckpointResult<()> {
        *self.position.lock() = Some(position);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn reset(&self) -> CheckpointResult<bool> {
        Ok(self.position.lock().take().is_some())
    }
}
