//! Local file index for dirsync.
//!
//! Provides the local half of the sync engine:
//! - Prefix/suffix exclusion rules applied during the walk
//! - Recursive tree walking with subtree pruning
//! - The path -> (mtime, size) snapshot and its atomic JSON persistence
//! - MD5 content digests for ETag comparison

pub mod digest;
pub mod error;
pub mod filter;
pub mod indexer;
pub mod snapshot;

pub use error::{IndexError, IndexResult};
pub use filter::PathFilter;
pub use indexer::{stat_record, LocalIndexer};
pub use snapshot::{FileRecord, IndexSnapshot};
