//! Recursive directory walking into an [`IndexSnapshot`].

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{IndexError, IndexResult};
use crate::filter::PathFilter;
use crate::snapshot::{FileRecord, IndexSnapshot};

/// Walks directory trees, applying a [`PathFilter`] at every level.
#[derive(Clone, Debug, Default)]
pub struct LocalIndexer {
    filter: PathFilter,
}

impl LocalIndexer {
    pub fn new(filter: PathFilter) -> Self {
        Self { filter }
    }

    /// Indexes a single root subtree.
    ///
    /// Filtered directories are pruned before descent. A file that
    /// vanishes between being listed and being stat'ed is omitted from
    /// the snapshot; an unreadable root is a hard error.
    pub fn index_root(&self, root: &Path) -> IndexResult<IndexSnapshot> {
        if !root.is_dir() {
            return Err(IndexError::RootMissing(root.display().to_string()));
        }

        let mut snapshot = IndexSnapshot::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                // The root itself is always admitted; the filter only
                // judges names below it.
                e.depth() == 0
                    || e.file_name()
                        .to_str()
                        .is_some_and(|name| self.filter.permitted(name))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(IndexError::RootUnreadable {
                        path: root.display().to_string(),
                        source: e,
                    });
                }
                Err(e) => {
                    // Entry disappeared or became unreadable mid-walk.
                    debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(path) = entry.path().to_str() else {
                warn!(path = %entry.path().display(), "skipping non-UTF-8 path");
                continue;
            };

            // Stat races with concurrent writers are expected; a file
            // gone by now simply stays out of this run's snapshot.
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    debug!(path, error = %e, "file vanished during walk");
                    continue;
                }
            };

            let mtime_ns = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| d.as_nanos() as u64);

            snapshot.insert(
                path.to_string(),
                FileRecord {
                    mtime_ns,
                    size: metadata.len(),
                },
            );
        }

        debug!(root = %root.display(), files = snapshot.len(), "indexed root");
        Ok(snapshot)
    }
}

/// Current mtime/size of a single file, used for re-checks at upload time.
pub fn stat_record(path: &Path) -> Option<FileRecord> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }
    let mtime_ns = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos() as u64);
    Some(FileRecord {
        mtime_ns,
        size: metadata.len(),
    })
}
