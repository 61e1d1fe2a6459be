//! Change detection: turns local snapshots and remote listings into a plan.
//!
//! Two strategies exist and are never merged:
//!
//! - [`DetectionStrategy::SnapshotDiff`] trusts the previously persisted
//!   snapshot as ground truth for "already synced". Cheap (no digests, and
//!   the engine can skip the remote listing when nothing changed locally),
//!   but blind to out-of-band bucket mutation.
//! - [`DetectionStrategy::Live`] ignores the persisted snapshot and
//!   verifies every remote object against the file on disk by size and MD5
//!   digest. Self-healing against drift at one digest per candidate file.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use dirsync_index::{digest, stat_record, IndexSnapshot};

use crate::store::{key_for_path, path_for_key, RemoteObject, MAX_DELETE_BATCH};

/// Which comparison the planner runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    #[default]
    SnapshotDiff,
    Live,
}

/// Why a path is staged for upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// No object exists for this path yet.
    Created,
    /// An object exists but its identity no longer matches.
    Modified,
}

/// One staged upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadItem {
    pub path: String,
    pub kind: ChangeKind,
}

/// The work a run must perform. Derived once, consumed exactly once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub to_upload: Vec<UploadItem>,
    /// Remote keys with no admitted local counterpart.
    pub to_delete: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_upload.is_empty() && self.to_delete.is_empty()
    }

    /// Splits deletions into independent sub-batches within the store's
    /// per-request limit.
    pub fn delete_chunks(&self) -> Vec<Vec<String>> {
        self.to_delete
            .chunks(MAX_DELETE_BATCH)
            .map(<[String]>::to_vec)
            .collect()
    }
}

/// Snapshot-diff strategy.
///
/// `deleted` = remote keys absent from the new index; `created` = new
/// paths absent from the remote listing; `modified` = paths in both the
/// old and new index whose mtimes differ (bit-equal comparison).
pub fn snapshot_diff(
    new: &IndexSnapshot,
    old: &IndexSnapshot,
    remote: &[RemoteObject],
) -> SyncPlan {
    let remote_keys: BTreeSet<&str> = remote.iter().map(|o| o.key.as_str()).collect();

    let to_delete: Vec<String> = remote_keys
        .iter()
        .filter(|key| !new.contains(&path_for_key(key)))
        .map(|key| (*key).to_string())
        .collect();

    let mut to_upload = Vec::new();
    for (path, record) in new.iter() {
        if !remote_keys.contains(key_for_path(path).as_str()) {
            to_upload.push(UploadItem {
                path: path.to_string(),
                kind: ChangeKind::Created,
            });
        } else if old.get(path).is_some_and(|o| o.mtime_ns != record.mtime_ns) {
            to_upload.push(UploadItem {
                path: path.to_string(),
                kind: ChangeKind::Modified,
            });
        }
    }

    debug!(
        uploads = to_upload.len(),
        deletions = to_delete.len(),
        "computed snapshot-diff plan"
    );
    SyncPlan { to_upload, to_delete }
}

/// Live-comparison strategy.
///
/// Every remote object is checked against the file on disk: unmatched or
/// vanished locally means deletion, a size or digest mismatch means
/// re-upload, a full match means no-op. Local paths with no remote
/// counterpart are uploaded.
pub fn live_diff(new: &IndexSnapshot, remote: &[RemoteObject]) -> SyncPlan {
    // Candidate set: everything local, whittled down per remote object.
    let mut upload_paths: BTreeSet<&str> = new.paths().collect();
    let mut matched: BTreeSet<String> = BTreeSet::new();
    let mut to_delete = Vec::new();

    for obj in remote {
        let path = path_for_key(&obj.key);

        if !new.contains(&path) {
            to_delete.push(obj.key.clone());
            continue;
        }

        // The file may be gone or rewritten since the walk; judge against
        // the disk, not the snapshot.
        let Some(current) = stat_record(Path::new(&path)) else {
            to_delete.push(obj.key.clone());
            upload_paths.remove(path.as_str());
            continue;
        };
        matched.insert(path.clone());

        let identical = current.size == obj.size
            && digest::file_md5(Path::new(&path)).is_ok_and(|d| d == obj.etag);
        if identical {
            upload_paths.remove(path.as_str());
        }
    }

    let to_upload = upload_paths
        .into_iter()
        .map(|path| UploadItem {
            kind: if matched.contains(path) {
                ChangeKind::Modified
            } else {
                ChangeKind::Created
            },
            path: path.to_string(),
        })
        .collect();

    let plan = SyncPlan { to_upload, to_delete };
    debug!(
        uploads = plan.to_upload.len(),
        deletions = plan.to_delete.len(),
        "computed live-comparison plan"
    );
    plan
}
