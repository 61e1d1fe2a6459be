//! The local file index snapshot and its on-disk persistence.
//!
//! A snapshot maps canonical local paths to the identity recorded at walk
//! time (mtime + size). It is immutable once built; each run produces a
//! fresh one and atomically supersedes the persisted copy.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::IndexResult;

/// Identity of one local file at index time.
///
/// `mtime_ns` is nanoseconds since the Unix epoch; the snapshot-diff
/// strategy compares it bit-equal, never with a tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub mtime_ns: u64,
    pub size: u64,
}

/// Mapping of path -> [`FileRecord`] for every admitted file under the
/// configured roots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    files: BTreeMap<String, FileRecord>,
}

impl IndexSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: String, record: FileRecord) {
        self.files.insert(path, record);
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<FileRecord> {
        self.files.remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRecord)> {
        self.files.iter().map(|(p, r)| (p.as_str(), r))
    }

    /// Union with another snapshot; entries of `other` win on collision.
    ///
    /// Collisions are only possible when configured roots overlap, which
    /// is a configuration error rather than a supported layout.
    pub fn merge(&mut self, other: IndexSnapshot) {
        self.files.extend(other.files);
    }

    /// Reads a persisted snapshot. A missing file is an empty snapshot,
    /// not an error: the first run starts from nothing.
    pub fn load(path: &Path) -> IndexResult<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no persisted snapshot, starting empty");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persists the snapshot atomically: written to a temp file in the
    /// target directory, then renamed over the old copy.
    pub fn store(&self, path: &Path) -> IndexResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(tmp.as_file(), self)?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!(path = %path.display(), entries = self.len(), "persisted snapshot");
        Ok(())
    }
}

impl FromIterator<(String, FileRecord)> for IndexSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, FileRecord)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
