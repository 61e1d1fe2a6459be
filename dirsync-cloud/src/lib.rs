//! Directory-to-object-store sync engine.
//!
//! Determines which objects must be created, updated, or removed for a
//! local subtree and a remote bucket to converge, then executes that plan
//! under a bounded-concurrency policy:
//! - Two change-detection strategies (snapshot diff, live comparison)
//! - Semaphore-bounded scheduler tolerating per-unit failure
//! - Advisory-lock run guard against overlapping runs
//! - Confirmed-snapshot persistence between runs

pub mod config;
pub mod engine;
pub mod error;
pub mod planner;
pub mod report;
pub mod run_guard;
pub mod s3;
pub mod scheduler;
pub mod store;

pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use planner::{ChangeKind, DetectionStrategy, SyncPlan, UploadItem};
pub use report::RunSummary;
pub use run_guard::RunGuard;
pub use s3::S3ObjectStore;
pub use scheduler::{ExecutionOutcome, SyncScheduler};
pub use store::{DeleteOutcome, ObjectStore, RemoteObject, StoreError, MAX_DELETE_BATCH};
