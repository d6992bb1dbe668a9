//! Keyed merge shared by all store backends

use crate::paper::PaperRecord;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Merge `new_records` over `existing`, keyed by `id`.
///
/// - records with an empty id are dropped from both inputs
/// - a new record replaces the stored record with the same id wholesale
/// - within `existing`, a later duplicate wins as well
///
/// The result is in persisted order (see [`persisted_order`]).
pub fn merge_records(
    existing: Vec<PaperRecord>,
    new_records: Vec<PaperRecord>,
) -> Vec<PaperRecord> {
    let mut by_id: HashMap<String, PaperRecord> = HashMap::new();
    for record in existing.into_iter().chain(new_records) {
        if record.id.is_empty() {
            continue;
        }
        by_id.insert(record.id.clone(), record);
    }

    let mut merged: Vec<PaperRecord> = by_id.into_values().collect();
    merged.sort_by(persisted_order);
    merged
}

/// Persisted ordering: `(published, title)` ascending, then `id`.
///
/// Purely cosmetic (stable diffs); nothing downstream depends on it.
pub fn persisted_order(a: &PaperRecord, b: &PaperRecord) -> Ordering {
    a.published
        .cmp(&b.published)
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}
