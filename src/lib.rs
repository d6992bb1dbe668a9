//! design-lit: a living literature review of AI in design research
//!
//! Harvests paper metadata from an arXiv feed and a BibTeX export, has a
//! language model classify each new paper against the six design phases of
//! Howard et al. (2008), keeps the results in an append-and-replace JSONL
//! store, and regenerates two markdown synthesis documents over the whole
//! store on every run.
//!
//! # Core Concepts
//!
//! - **Paper records**: metadata plus an optional enrichment, keyed by `id`
//! - **Record store**: at most one record per id; a later write replaces
//! - **Phase buckets**: records grouped by design phase, one bucket per phase
//! - **Synthesis**: `overview.md` and `by_design_phase.md`, fully rewritten
//!
//! # Example
//!
//! ```
//! use design_lit::{group_by_phase, DesignPhase, Enrichment, PaperRecord};
//!
//! let mut enrichment = Enrichment::fallback("");
//! enrichment.design_phase = vec!["Concept design".into(), "Detail design".into()];
//! let records = vec![PaperRecord::new("arxiv:1", "Sketching with AI").with_enrichment(enrichment)];
//!
//! let buckets = group_by_phase(&records);
//! assert_eq!(buckets.get(DesignPhase::ConceptDesign).len(), 1);
//! assert!(buckets.get(DesignPhase::Implementation).is_empty());
//! ```

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod llm;
mod paper;
pub mod pipeline;
pub mod sources;
pub mod storage;
pub mod synthesis;

pub use aggregate::{group_by_phase, PhaseBuckets};
pub use classify::{Classifier, ClassifyRequest, LlmClassifier};
pub use config::{Config, ConfigError};
pub use llm::{LlmClient, LlmError, LlmTask, MockClient, OpenAiClient};
pub use paper::{excerpt, DesignPhase, Enrichment, EnrichmentStatus, PaperRecord, ABSTRACT_EXCERPT_CHARS};
pub use pipeline::{
    DocumentOutcome, DocumentReport, EnrichmentOutcome, IngestionCoordinator, PipelineError,
    RecordOutcome, RunReport,
};
pub use sources::{ArxivSource, BibtexSource, PaperSource, StaticSource};
pub use storage::{JsonlStore, MemoryStore, RecordStore, StorageError, StorageResult};
pub use synthesis::Synthesizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
