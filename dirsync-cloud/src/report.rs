//! End-of-run summary reporting.

use std::time::Duration;

use tracing::info;

/// Aggregate counts for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Objects uploaded for paths with no prior remote counterpart.
    pub created: u64,
    /// Objects re-uploaded over an existing key.
    pub modified: u64,
    /// Keys removed from the store.
    pub deleted: u64,
    /// Units that failed; the run itself still completes.
    pub failed: u64,
    /// Staged uploads whose file had vanished by execution time.
    pub skipped: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn uploaded(&self) -> u64 {
        self.created + self.modified
    }

    /// True when every dispatched unit succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Emits the structured end-of-run record. Log-only; never fails.
pub fn log_summary(summary: &RunSummary) {
    info!(
        created = summary.created,
        modified = summary.modified,
        deleted = summary.deleted,
        failed = summary.failed,
        skipped = summary.skipped,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "sync run complete"
    );
}
