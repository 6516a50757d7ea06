//! Bounded recovery of an unreadable checkpoint
//!
//! A corrupt record is retried a fixed number of times, then deleted once so
//! the next load takes the cold-start path. If that last load still fails
//! the invocation gives up; there is no unbounded retry loop.

use chrono::{DateTime, Utc};
use tracing::{error, warn};

use super::store::{CheckpointError, CheckpointResult, CheckpointStore, LoadOutcome};

/// How many consecutive failed loads are tolerated before the record is reset
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    pub max_attempts: u32,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RecoveryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

/// Load the position, resetting a persistently corrupt record.
///
/// Non-corruption failures (permissions, I/O) are never "fixed" by deleting
/// the record; they exhaust the retries and surface as
/// [`CheckpointError::RecoveryExhausted`].
pub fn load_position(
    store: &dyn CheckpointStore,
    policy: RecoveryPolicy,
    now: DateTime<Utc>,
) -> CheckpointResult<LoadOutcome> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    let last = loop {
        match store.load(now) {
            Ok(outcome) => return Ok(outcome),
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "failed to load checkpoint");
                if attempt >= max_attempts {
                    break e;
                }
            }
        }
        attempt += 1;
    };

    if !last.is_corrupt() {
        return Err(CheckpointError::RecoveryExhausted {
            attempts: max_attempts,
            last: Box::new(last),
        });
    }

    error!(error = %last, "checkpoint is unrecoverable, deleting it");
    store.reset()?;

    store
        .load(now)
        .map_err(|e| CheckpointError::RecoveryExhausted {
            attempts: max_attempts + 1,
            last: Box::new(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration, TimeZone};
    use parking_lot::Mutex;

    /// Store that fails a scripted number of loads before behaving
    struct FlakyStore {
        failures: Mutex<Vec<CheckpointError>>,
        loads: AtomicUsize,
        resets: AtomicUsize,
        corrupt_after_reset: bool,
    }

    impl FlakyStore {
        fn new(failures: Vec<CheckpointError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                loads: AtomicUsize::new(0),
                resets: AtomicUsize::new(0),
                corrupt_after_reset: false,
            }
        }
    }

    fn corrupt() -> CheckpointError {
        CheckpointError::Corrupt {
            path: PathBuf::from("checkpoint.json"),
            reason: "expected value".to_string(),
        }
    }

    fn denied() -> CheckpointError {
        CheckpointError::Io {
            path: PathBuf::from("checkpoint.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
    }

    impl CheckpointStore for FlakyStore {
        fn load(&self, now: DateTime<Utc>) -> CheckpointResult<LoadOutcome> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.resets.load(Ordering::SeqCst) > 0 {
                if self.corrupt_after_reset {
                    return Err(corrupt());
                }
                return Ok(LoadOutcome::ColdStart(now - Duration::minutes(35)));
            }
            let mut failures = self.failures.lock();
            if failures.is_empty() {
                Ok(LoadOutcome::Restored(now - Duration::minutes(1)))
            } else {
                Err(failures.remove(0))
            }
        }

        fn save(&self, _position: DateTime<Utc>) -> CheckpointResult<()> {
            Ok(())
        }

        fn reset(&self) -> CheckpointResult<bool> {
            self.resets.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_transient_failure_is_retried() {
        let store = FlakyStore::new(vec![corrupt(), corrupt()]);

        let outcome = load_position(&store, RecoveryPolicy::default(), now()).unwrap();

        assert_eq!(outcome, LoadOutcome::Restored(now() - Duration::minutes(1)));
        assert_eq!(store.loads.load(Ordering::SeqCst), 3);
        assert_eq!(store.resets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_three_corrupt_loads_reset_to_cold_start() {
        let store = FlakyStore::new(vec![corrupt(), corrupt(), corrupt()]);

        let outcome = load_position(&store, RecoveryPolicy::default(), now()).unwrap();

        assert!(outcome.is_cold_start());
        assert_eq!(store.loads.load(Ordering::SeqCst), 4);
        assert_eq!(store.resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_after_reset_is_fatal() {
        let mut store = FlakyStore::new(vec![corrupt(), corrupt(), corrupt()]);
        store.corrupt_after_reset = true;

        let err = load_position(&store, RecoveryPolicy::default(), now()).unwrap_err();

        assert!(matches!(err, CheckpointError::RecoveryExhausted { attempts: 4, .. }));
        assert_eq!(store.resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_io_errors_do_not_delete_record() {
        let store = FlakyStore::new(vec![denied(), denied(), denied()]);

        let err = load_position(&store, RecoveryPolicy::default(), now()).unwrap_err();

        assert!(matches!(err, CheckpointError::RecoveryExhausted { attempts: 3, .. }));
        assert_eq!(store.resets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_attempts_still_loads_once() {
        let store = FlakyStore::new(Vec::new());
        let outcome = load_position(&store, RecoveryPolicy::new(0), now()).unwrap();
        assert!(!outcome.is_cold_start());
    }
}
