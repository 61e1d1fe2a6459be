//! Bounded-concurrency execution of a [`SyncPlan`].
//!
//! Each delete chunk and each upload is an independent unit of work.
//! Admission is a semaphore sized to the concurrency cap, so at most that
//! many units are in flight and a unit waits for a permit instead of
//! polling. A unit's failure is logged and counted; it never cancels its
//! siblings or aborts the run.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, warn};

use dirsync_index::stat_record;

use crate::planner::{ChangeKind, SyncPlan, UploadItem};
use crate::report::RunSummary;
use crate::store::{key_for_path, ObjectStore};

/// What execution produced, beyond the aggregate counts: the engine needs
/// to know which paths did *not* make it so the persisted snapshot only
/// confirms successful units.
#[derive(Debug, Default)]
pub struct ExecutionOutcome {
    pub summary: RunSummary,
    /// Paths whose upload unit failed.
    pub failed_uploads: Vec<String>,
    /// Paths redirected to deletion because the file was gone at use time.
    pub vanished: Vec<String>,
}

enum UnitResult {
    Upload {
        path: String,
        kind: ChangeKind,
        ok: bool,
    },
    /// Upload redirected to a single-key delete.
    Vanished { path: String, deleted: bool },
    DeleteChunk { deleted: u64, failed: u64 },
}

/// Executes sync plans against an [`ObjectStore`] under a concurrency cap.
pub struct SyncScheduler {
    store: Arc<dyn ObjectStore>,
    concurrency: usize,
}

impl SyncScheduler {
    pub fn new(store: Arc<dyn ObjectStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs every unit in the plan to completion and tallies the results.
    pub async fn execute(&self, plan: SyncPlan) -> ExecutionOutcome {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut units: JoinSet<UnitResult> = JoinSet::new();

        for chunk in plan.delete_chunks() {
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            units.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return UnitResult::DeleteChunk {
                        deleted: 0,
                        failed: chunk.len() as u64,
                    };
                };
                delete_chunk(store.as_ref(), chunk).await
            });
        }

        // Smallest files first: under a deadline or interruption this
        // maximizes the number of completed transfers. The size lookups
        // are filesystem stats, so they run on a blocking task.
        let paths: Vec<String> = plan.to_upload.iter().map(|item| item.path.clone()).collect();
        let sizes = tokio::task::spawn_blocking(move || {
            paths
                .into_iter()
                .map(|path| {
                    let size = stat_record(Path::new(&path)).map_or(0, |r| r.size);
                    (path, size)
                })
                .collect::<HashMap<String, u64>>()
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "size lookup task failed, keeping plan order");
            HashMap::new()
        });

        let mut uploads = plan.to_upload;
        uploads.sort_by_key(|item| sizes.get(&item.path).copied().unwrap_or(0));

        for item in uploads {
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            units.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return UnitResult::Upload {
                        path: item.path,
                        kind: item.kind,
                        ok: false,
                    };
                };
                upload_unit(store.as_ref(), item).await
            });
        }

        let mut outcome = ExecutionOutcome::default();
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(UnitResult::Upload { path, kind, ok }) => {
                    if ok {
                        match kind {
                            ChangeKind::Created => outcome.summary.created += 1,
                            ChangeKind::Modified => outcome.summary.modified += 1,
                        }
                    } else {
                        outcome.summary.failed += 1;
                        outcome.failed_uploads.push(path);
                    }
                }
                Ok(UnitResult::Vanished { path, deleted }) => {
                    outcome.summary.skipped += 1;
                    if deleted {
                        outcome.summary.deleted += 1;
                    }
                    outcome.vanished.push(path);
                }
                Ok(UnitResult::DeleteChunk { deleted, failed }) => {
                    outcome.summary.deleted += deleted;
                    outcome.summary.failed += failed;
                }
                Err(e) => {
                    error!(error = %e, "sync unit panicked");
                    outcome.summary.failed += 1;
                }
            }
        }

        outcome.summary.elapsed = started.elapsed();
        outcome
    }
}

async fn upload_unit(store: &dyn ObjectStore, item: UploadItem) -> UnitResult {
    let key = key_for_path(&item.path);

    // Re-check at use: the file may have been deleted after it was staged.
    // A missing path becomes a remote delete, never an upload attempt.
    if stat_record(Path::new(&item.path)).is_none() {
        warn!(path = %item.path, "staged file vanished, deleting remote object");
        let deleted = match store.delete_batch(std::slice::from_ref(&key)).await {
            Ok(outcomes) => outcomes.iter().all(|o| o.error.is_none()),
            Err(e) => {
                warn!(key, error = %e, "cleanup delete failed");
                false
            }
        };
        return UnitResult::Vanished {
            path: item.path,
            deleted,
        };
    }

    match store.put(&key, Path::new(&item.path)).await {
        Ok(()) => UnitResult::Upload {
            path: item.path,
            kind: item.kind,
            ok: true,
        },
        Err(e) => {
            error!(path = %item.path, error = %e, "upload failed");
            UnitResult::Upload {
                path: item.path,
                kind: item.kind,
                ok: false,
            }
        }
    }
}

async fn delete_chunk(store: &dyn ObjectStore, chunk: Vec<String>) -> UnitResult {
    let total = chunk.len() as u64;
    match store.delete_batch(&chunk).await {
        Ok(outcomes) => {
            let mut failed = 0;
            for outcome in &outcomes {
                if let Some(reason) = &outcome.error {
                    error!(key = %outcome.key, reason, "delete failed");
                    failed += 1;
                }
            }
            UnitResult::DeleteChunk {
                deleted: total - failed,
                failed,
            }
        }
        Err(e) => {
            error!(keys = chunk.len(), error = %e, "delete batch failed");
            UnitResult::DeleteChunk {
                deleted: 0,
                failed: total,
            }
        }
    }
}
