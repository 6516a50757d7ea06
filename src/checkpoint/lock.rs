//! Advisory lock guarding the checkpoint against overlapping runs

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::store::{CheckpointError, CheckpointResult};

/// Exclusive lock on `<checkpoint>.lock`, held for one export invocation.
///
/// The lock is released when the guard is dropped (closing the descriptor
/// drops the `flock`). The lock file itself is left in place.
#[derive(Debug)]
pub struct CheckpointLock {
    path: PathBuf,
    _file: File,
}

impl CheckpointLock {
    /// Lock file path for a checkpoint record
    pub fn lock_path_for(checkpoint: &Path) -> PathBuf {
        let mut name = checkpoint
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("checkpoint"));
        name.push(".lock");
        checkpoint.with_file_name(name)
    }

    /// Take the lock without blocking. Fails with
    /// [`CheckpointError::Locked`] if another run holds it.
    pub fn acquire(checkpoint: &Path) -> CheckpointResult<Self> {
        let path = Self::lock_path_for(checkpoint);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CheckpointError::io(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| CheckpointError::io(&path, e))?;

        match try_lock(&file) {
            Ok(true) => {
                debug!(path = %path.display(), "checkpoint lock acquired");
                Ok(Self { path, _file: file })
            }
            Ok(false) => Err(CheckpointError::Locked { path }),
            Err(e) => Err(CheckpointError::io(&path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    let res = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if res == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        return Ok(false);
    }
    Err(err)
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> io::Result<bool> {
    Ok(true)
}
