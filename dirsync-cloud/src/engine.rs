//! Run orchestration.
//!
//! One run: acquire the lock, index every root in parallel, compute the
//! plan for the configured strategy, execute it under the concurrency
//! cap, persist the confirmed snapshot, report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{info, warn};

use dirsync_index::{IndexSnapshot, LocalIndexer, PathFilter};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::planner::{self, DetectionStrategy, SyncPlan};
use crate::report::{self, RunSummary};
use crate::run_guard::RunGuard;
use crate::scheduler::SyncScheduler;
use crate::store::ObjectStore;

/// The synchronization engine for one local/remote pair.
///
/// Built over an injected [`ObjectStore`] rather than any process-wide
/// client handle, so tests and alternative stores plug in directly.
pub struct SyncEngine {
    store: Arc<dyn ObjectStore>,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn ObjectStore>, config: SyncConfig) -> Self {
        Self { store, config }
    }

    /// Performs one full sync run.
    ///
    /// Fatal conditions (lock held, unreadable root, failed listing)
    /// return an error before any unit is dispatched; individual unit
    /// failures only show up in the summary.
    pub async fn run(&self) -> SyncResult<RunSummary> {
        let started = Instant::now();
        self.config.validate()?;

        let _guard = RunGuard::try_acquire(&self.config.lock_path)
            .map_err(|e| SyncError::Lock {
                path: self.config.lock_path.display().to_string(),
                source: e,
            })?
            .ok_or_else(|| {
                SyncError::AlreadyRunning(self.config.lock_path.display().to_string())
            })?;

        let new_index = self.index_roots().await?;
        info!(files = new_index.len(), "local index built");

        let plan = match self.config.strategy {
            DetectionStrategy::SnapshotDiff => {
                let old_index = IndexSnapshot::load(&self.config.index_path)?;
                if new_index == old_index {
                    info!("no local changes since last run");
                    let summary = RunSummary {
                        elapsed: started.elapsed(),
                        ..RunSummary::default()
                    };
                    report::log_summary(&summary);
                    return Ok(summary);
                }
                let remote = self.store.list().await?;
                planner::snapshot_diff(&new_index, &old_index, &remote)
            }
            DetectionStrategy::Live => {
                let remote = self.store.list().await?;
                // Digesting every candidate reads whole files; keep that
                // off the runtime threads like the walks above.
                let index = new_index.clone();
                tokio::task::spawn_blocking(move || planner::live_diff(&index, &remote)).await?
            }
        };

        let mut summary = self.execute_and_confirm(plan, new_index).await?;
        summary.elapsed = started.elapsed();
        report::log_summary(&summary);
        Ok(summary)
    }

    /// Walks each configured root on its own blocking task and merges the
    /// partial snapshots, so indexing costs the slowest root, not the sum.
    async fn index_roots(&self) -> SyncResult<IndexSnapshot> {
        let filter = PathFilter::new(
            self.config.exclude_prefixes.clone(),
            self.config.exclude_suffixes.clone(),
        );

        let walks = self.config.directories.iter().cloned().map(|root: PathBuf| {
            let indexer = LocalIndexer::new(filter.clone());
            tokio::task::spawn_blocking(move || indexer.index_root(&root))
        });

        let mut merged = IndexSnapshot::new();
        for joined in join_all(walks).await {
            merged.merge(joined??);
        }
        Ok(merged)
    }

    /// Executes the plan and persists the confirmed snapshot: the new
    /// index minus every path whose unit did not succeed, so failed or
    /// vanished files reappear in the next run's plan.
    async fn execute_and_confirm(
        &self,
        plan: SyncPlan,
        new_index: IndexSnapshot,
    ) -> SyncResult<RunSummary> {
        if plan.is_empty() {
            self.persist(new_index)?;
            return Ok(RunSummary::default());
        }

        info!(
            uploads = plan.to_upload.len(),
            deletions = plan.to_delete.len(),
            concurrency = self.config.concurrency(),
            "executing sync plan"
        );

        let scheduler = SyncScheduler::new(Arc::clone(&self.store), self.config.concurrency());
        let outcome = scheduler.execute(plan).await;

        let mut confirmed = new_index;
        for path in outcome
            .failed_uploads
            .iter()
            .chain(outcome.vanished.iter())
        {
            confirmed.remove(path);
        }
        self.persist(confirmed)?;

        if !outcome.summary.is_clean() {
            warn!(failed = outcome.summary.failed, "run finished with failed units");
        }
        Ok(outcome.summary)
    }

    /// The snapshot only matters to the snapshot-diff strategy; a live
    /// configuration keeps no state between runs.
    fn persist(&self, snapshot: IndexSnapshot) -> SyncResult<()> {
        if self.config.strategy == DetectionStrategy::SnapshotDiff {
            snapshot.store(&self.config.index_path)?;
        }
        Ok(())
    }
}
