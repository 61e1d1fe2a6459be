//! Sync engine error types.
//!
//! Only fatal conditions surface here; a failed upload or delete unit is
//! data in the run summary, not an error.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Fatal errors that abort a run before or instead of dispatching units.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("another sync run holds the lock at {0}")]
    AlreadyRunning(String),

    #[error("cannot acquire run lock at {path}: {source}")]
    Lock {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] dirsync_index::IndexError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
