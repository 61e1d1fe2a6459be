//! Process exclusivity via an advisory file lock.
//!
//! Two engines running against the same pair would double-upload and race
//! on the persisted snapshot. The guard takes an OS-level exclusive lock
//! on a lock file at start; the lock is released when the guard (and with
//! it the file handle) is dropped, which the OS also guarantees on crash.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs4::FileExt;
use tracing::debug;

/// Holds the run lock for the lifetime of the value.
#[derive(Debug)]
pub struct RunGuard {
    // Held only for its lock; closing the handle releases it.
    _file: std::fs::File,
    path: PathBuf,
}

impl RunGuard {
    /// Attempts to take the lock without blocking.
    ///
    /// `Ok(None)` means another run already holds it. The file's content
    /// is irrelevant; only the lock matters.
    pub fn try_acquire(path: &Path) -> std::io::Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "acquired run lock");
                Ok(Some(Self {
                    _file: file,
                    path: path.to_path_buf(),
                }))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
