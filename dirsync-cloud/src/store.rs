//! The remote object store capability.
//!
//! The engine never talks to S3 directly; it is constructed over an
//! [`ObjectStore`] so tests can substitute an in-memory double and no
//! process-wide client handles exist.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Hard S3 limit on keys per DeleteObjects request; callers chunk to it.
pub const MAX_DELETE_BATCH: usize = 1000;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("listing failed: {0}")]
    List(String),

    #[error("upload failed for {key}: {reason}")]
    Put { key: String, reason: String },

    #[error("delete request failed: {0}")]
    Delete(String),
}

/// One object as reported by the remote listing. Transient; never
/// persisted locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub size: u64,
    /// ETag with surrounding quotes stripped.
    pub etag: String,
}

/// Per-key result of a bulk delete.
#[derive(Clone, Debug)]
pub struct DeleteOutcome {
    pub key: String,
    /// `None` on success; the store's message otherwise.
    pub error: Option<String>,
}

/// List/put/delete against a remote object store.
///
/// Implementations own their transport, auth, and per-call timeouts; the
/// engine layers no timeout of its own on top.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists every object in the store.
    async fn list(&self) -> StoreResult<Vec<RemoteObject>>;

    /// Uploads one local file under `key`, replacing any existing object.
    async fn put(&self, key: &str, local_path: &Path) -> StoreResult<()>;

    /// Deletes up to [`MAX_DELETE_BATCH`] keys in one request, reporting
    /// per-key success. An `Err` means the request itself failed and no
    /// per-key information is available.
    async fn delete_batch(&self, keys: &[String]) -> StoreResult<Vec<DeleteOutcome>>;
}

/// Object key for an absolute local path (leading separator stripped).
pub fn key_for_path(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

/// Local path a key maps back to.
pub fn path_for_key(key: &str) -> String {
    format!("/{key}")
}
