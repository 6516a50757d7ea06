//! Utility functions and helpers
//!
//! Atomic file replacement and timestamp helpers.

pub mod atomic;
pub mod time;

pub use atomic::{atomic_write, remove_if_exists, temp_path_for};
pub use time::{day_file_name, month_dir_name, parse_unix_nanos, to_unix_nanos};
