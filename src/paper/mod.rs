//! Paper records and the design phase taxonomy

pub(crate) mod fields;
mod phase;
mod record;

pub use phase::DesignPhase;
pub(crate) use record::ENRICHMENT_KEYS;
pub use record::{excerpt, Enrichment, EnrichmentStatus, PaperRecord, ABSTRACT_EXCERPT_CHARS};
