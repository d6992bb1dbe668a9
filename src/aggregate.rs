//! Grouping of records by design phase

use crate::paper::{DesignPhase, PaperRecord};
use std::collections::BTreeMap;

/// Records bucketed by design phase.
///
/// All six phases are always present, possibly empty. Buckets borrow the
/// records: a paper tagged with two phases is the same value in both.
#[derive(Debug, Clone)]
pub struct PhaseBuckets<'a> {
    buckets: BTreeMap<DesignPhase, Vec<&'a PaperRecord>>,
}

impl<'a> PhaseBuckets<'a> {
    /// Records in the given phase, in input order.
    pub fn get(&self, phase: DesignPhase) -> &[&'a PaperRecord] {
        self.buckets.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate buckets in canonical phase order.
    pub fn iter(&self) -> impl Iterator<Item = (DesignPhase, &[&'a PaperRecord])> {
        self.buckets.iter().map(|(phase, records)| (*phase, records.as_slice()))
    }

    /// Bucket sizes in canonical phase order.
    pub fn counts(&self) -> Vec<(DesignPhase, usize)> {
        self.iter().map(|(phase, records)| (phase, records.len())).collect()
    }

    /// Total bucket entries (a two-phase record counts twice).
    pub fn total_entries(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// Group records into the six phase buckets.
///
/// Records without a recognized phase land in no bucket. Unknown labels are
/// dropped silently.
pub fn group_by_phase(records: &[PaperRecord]) -> PhaseBuckets<'_> {
    let mut buckets: BTreeMap<DesignPhase, Vec<&PaperRecord>> = DesignPhase::ALL
        .into_iter()
        .map(|phase| (phase, Vec::new()))
        .collect();

    for record in records {
        for phase in record.phases() {
            if let Some(bucket) = buckets.get_mut(&phase) {
                bucket.push(record);
            }
        }
    }

    PhaseBuckets { buckets }
}
