//! In-memory storage backend (useful for testing)

use super::merge::merge_records;
use super::traits::{RecordStore, StorageResult};
use crate::paper::PaperRecord;
use std::sync::Mutex;

/// Record store kept entirely in memory, with the same merge semantics
/// as the file backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<PaperRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of records (merged, so ids are unique).
    pub fn with_records(records: Vec<PaperRecord>) -> Self {
        Self {
            records: Mutex::new(merge_records(Vec::new(), records)),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Vec<PaperRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn merge_and_persist(&self, new_records: Vec<PaperRecord>) -> StorageResult<usize> {
        let mut guard = match self.records.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let existing = std::mem::take(&mut *guard);
        *guard = merge_records(existing, new_records);
        Ok(guard.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_merges_like_file_store() {
        let store = MemoryStore::with_records(vec![PaperRecord::new("a", "A")]);
        let count = store
            .merge_and_persist(vec![PaperRecord::new("a", "A2"), PaperRecord::new("b", "B")])
            .unwrap();
        assert_eq!(count, 2);
        assert!(store.known_ids().contains("b"));
        assert_eq!(
            store.load().iter().find(|r| r.id == "a").unwrap().title,
            "A2"
        );
    }
}
