//! Durable export position
//!
//! The checkpoint is a single timestamp meaning "everything before this has
//! been written to the output". This module provides:
//! - `CheckpointStore`: load/save/reset of the position record
//! - `FileCheckpointStore`: JSON record on disk, replaced atomically
//! - `MemoryCheckpointStore`: in-process store for tests and dry runs
//! - `RecoveryPolicy`: bounded retry of corrupt loads, then a one-shot reset
//! - `CheckpointLock`: advisory lock rejecting overlapping invocations
//!
//! # Load path
//!
//! ```text
//! ┌──────────┐  not found   ┌────────────────────────┐
//! │  load()  │─────────────►│ ColdStart(now-lookback)│
//! └────┬─────┘              └────────────────────────┘
//!      │ corrupt (x3)       ┌─────────┐   ┌──────────┐
//!      └───────────────────►│ reset() │──►│  load()  │──► ColdStart
//!                           └─────────┘   └──────────┘
//! ```

mod lock;
mod memory;
mod recovery;
mod store;

pub use lock::CheckpointLock;
pub use memory::MemoryCheckpointStore;
pub use recovery::{load_position, RecoveryPolicy};
pub use store::{
    CheckpointError, CheckpointRecord, CheckpointResult, CheckpointStore, FileCheckpointStore,
    LoadOutcome, DEFAULT_LOOKBACK_MINUTES,
};
