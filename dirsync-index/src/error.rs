//! Local index error types.

use thiserror::Error;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while building or persisting the local index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot read root directory {path}: {source}")]
    RootUnreadable {
        path: String,
        #[source]
        source: walkdir::Error,
    },

    #[error("root directory {0} does not exist or is not a directory")]
    RootMissing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
