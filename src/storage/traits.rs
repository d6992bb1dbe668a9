//! Storage trait definitions

use crate::paper::PaperRecord;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store backends
///
/// A store holds at most one record per non-empty `id`. Loading never
/// fails; writing does, and write failures must reach the caller.
pub trait RecordStore: Send + Sync {
    /// Load every stored record. A missing or unreadable store is empty.
    fn load(&self) -> Vec<PaperRecord>;

    /// Merge `new_records` into the store (last write wins per id) and
    /// persist the whole result. Returns the total record count.
    fn merge_and_persist(&self, new_records: Vec<PaperRecord>) -> StorageResult<usize>;

    /// Ids currently stored, for cheap membership tests.
    fn known_ids(&self) -> HashSet<String> {
        self.load().into_iter().map(|r| r.id).collect()
    }
}
