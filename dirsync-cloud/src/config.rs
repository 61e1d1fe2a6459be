//! Sync engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::planner::DetectionStrategy;

/// Configuration for one local/remote sync pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root directories to index and mirror into the bucket.
    pub directories: Vec<PathBuf>,

    /// S3 bucket name.
    pub bucket: String,

    /// AWS region for the bucket.
    pub region: String,

    /// Optional S3 endpoint override (for MinIO in testing).
    pub endpoint_override: Option<String>,

    /// Storage class hint passed through on every upload.
    pub storage_class: Option<String>,

    /// Name prefixes excluded from the walk (files and directories).
    pub exclude_prefixes: Vec<String>,

    /// Name suffixes excluded from the walk (files and directories).
    pub exclude_suffixes: Vec<String>,

    /// Maximum transfer units in flight; 0 means host CPU count.
    pub max_active_tasks: usize,

    /// How local and remote state are compared.
    pub strategy: DetectionStrategy,

    /// Where the index snapshot is persisted between runs.
    pub index_path: PathBuf,

    /// Lock file guarding against overlapping runs.
    pub lock_path: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint_override: None,
            storage_class: Some("STANDARD_IA".to_string()),
            exclude_prefixes: Vec::new(),
            exclude_suffixes: Vec::new(),
            max_active_tasks: 0,
            strategy: DetectionStrategy::SnapshotDiff,
            index_path: PathBuf::from("logs/index.json"),
            lock_path: PathBuf::from("logs/dirsync.lock"),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from a JSON file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.directories.is_empty() {
            return Err(SyncError::Config("no directories configured".into()));
        }
        // Object keys are local paths minus the leading separator, so a
        // relative root would index paths that never match any key.
        for dir in &self.directories {
            if !dir.is_absolute() {
                return Err(SyncError::Config(format!(
                    "root directory {} is not absolute",
                    dir.display()
                )));
            }
        }
        if self.bucket.is_empty() {
            return Err(SyncError::Config("bucket name is empty".into()));
        }
        Ok(())
    }

    /// Concurrency cap, defaulting to the host's available parallelism.
    pub fn concurrency(&self) -> usize {
        if self.max_active_tasks > 0 {
            self.max_active_tasks
        } else {
            std::thread::available_parallelism().map_or(4, usize::from)
        }
    }
}
