//! Storage backends for the paper database
//!
//! Backends implement the `RecordStore` trait. The primary implementation is
//! `JsonlStore` (newline-delimited JSON on disk); `MemoryStore` is for tests.

mod jsonl;
mod memory;
mod merge;
mod traits;

pub use jsonl::{load_jsonl, write_atomic, JsonlStore};
pub use memory::MemoryStore;
pub use merge::{merge_records, persisted_order};
pub use traits::{RecordStore, StorageError, StorageResult};
