//! Shared test helpers: an in-memory object store double and tree builders.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use md5::{Digest, Md5};

use dirsync_cloud::store::{DeleteOutcome, ObjectStore, RemoteObject, StoreError, StoreResult};
use dirsync_index::{IndexSnapshot, LocalIndexer, PathFilter};

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub etag: String,
}

/// In-memory [`ObjectStore`] with failure injection and concurrency counters.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    fail_put_keys: Mutex<HashSet<String>>,
    fail_delete_keys: Mutex<HashSet<String>>,
    fail_delete_batches_with: Mutex<HashSet<String>>,
    /// Keys in the order `put` accepted them.
    pub put_order: Mutex<Vec<String>>,
    pub delete_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    /// Artificial latency per operation, to make overlap observable.
    pub op_delay: Option<Duration>,
}

pub fn etag_of(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            op_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn insert_raw(&self, key: &str, bytes: &[u8]) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                etag: etag_of(bytes),
                bytes: bytes.to_vec(),
            },
        );
    }

    /// Registers a key whose uploads will fail.
    pub fn fail_puts_for(&self, key: &str) {
        self.fail_put_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn clear_put_failures(&self) {
        self.fail_put_keys.lock().unwrap().clear();
    }

    /// Registers a key whose per-key delete outcome will carry an error.
    pub fn fail_deletes_for(&self, key: &str) {
        self.fail_delete_keys.lock().unwrap().insert(key.to_string());
    }

    /// Makes any `delete_batch` call containing the key fail as a whole.
    pub fn fail_delete_batches_with(&self, key: &str) {
        self.fail_delete_batches_with
            .lock()
            .unwrap()
            .insert(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    async fn track<T>(&self, work: impl std::future::Future<Output = T>) -> T {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.op_delay {
            tokio::time::sleep(delay).await;
        }
        let out = work.await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<RemoteObject>> {
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .iter()
            .map(|(key, obj)| RemoteObject {
                key: key.clone(),
                size: obj.bytes.len() as u64,
                etag: obj.etag.clone(),
            })
            .collect())
    }

    async fn put(&self, key: &str, local_path: &Path) -> StoreResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.track(async {
            if self.fail_put_keys.lock().unwrap().contains(key) {
                return Err(StoreError::Put {
                    key: key.to_string(),
                    reason: "injected failure".into(),
                });
            }
            let bytes = std::fs::read(local_path).map_err(|e| StoreError::Put {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
            self.insert_raw(key, &bytes);
            self.put_order.lock().unwrap().push(key.to_string());
            Ok(())
        })
        .await
    }

    async fn delete_batch(&self, keys: &[String]) -> StoreResult<Vec<DeleteOutcome>> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.track(async {
            {
                let poisoned = self.fail_delete_batches_with.lock().unwrap();
                if keys.iter().any(|key| poisoned.contains(key)) {
                    return Err(StoreError::Delete("injected request failure".into()));
                }
            }
            let failing = self.fail_delete_keys.lock().unwrap().clone();
            let mut objects = self.objects.lock().unwrap();
            Ok(keys
                .iter()
                .map(|key| {
                    if failing.contains(key) {
                        return DeleteOutcome {
                            key: key.clone(),
                            error: Some("injected failure".into()),
                        };
                    }
                    objects.remove(key);
                    DeleteOutcome {
                        key: key.clone(),
                        error: None,
                    }
                })
                .collect())
        })
        .await
    }
}

/// A store whose listing always fails, for fatal-path tests.
pub struct BrokenStore;

#[async_trait]
impl ObjectStore for BrokenStore {
    async fn list(&self) -> StoreResult<Vec<RemoteObject>> {
        Err(StoreError::List("listing unavailable".into()))
    }

    async fn put(&self, key: &str, _local_path: &Path) -> StoreResult<()> {
        Err(StoreError::Put {
            key: key.to_string(),
            reason: "store unavailable".into(),
        })
    }

    async fn delete_batch(&self, _keys: &[String]) -> StoreResult<Vec<DeleteOutcome>> {
        Err(StoreError::Delete("store unavailable".into()))
    }
}

pub fn write_file(root: &Path, rel: &str, contents: &[u8]) -> String {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

/// Indexes a tree the way the engine does, with no exclusions.
pub fn index_tree(root: &Path) -> IndexSnapshot {
    LocalIndexer::new(PathFilter::default())
        .index_root(root)
        .unwrap()
}

pub fn remote(key: &str, size: u64, etag: &str) -> RemoteObject {
    RemoteObject {
        key: key.to_string(),
        size,
        etag: etag.to_string(),
    }
}
