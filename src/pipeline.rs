//! Ingestion pipeline
//!
//! Single run endpoint: `run() -> RunReport`.
//!
//! Pipeline steps:
//! 1. Load the ids already in the store
//! 2. Fetch candidates from each registered source
//! 3. Drop known ids, empty ids and duplicates within the batch
//! 4. Cap new records per source; the excess is deferred to a later run
//! 5. Classify each retained record
//! 6. Merge the enriched records into the store
//! 7. Regenerate both synthesis documents over the whole store

use crate::classify::{Classifier, ClassifyRequest, LlmClassifier};
use crate::config::Config;
use crate::llm::{LlmClient, LlmError};
use crate::paper::PaperRecord;
use crate::sources::{ArxivSource, BibtexSource, PaperSource};
use crate::storage::{write_atomic, JsonlStore, RecordStore, StorageError};
use crate::synthesis::{Synthesizer, BY_PHASE_FILE, OVERVIEW_FILE};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Conditions that stop a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("model collaborator unusable: {0}")]
    Collaborator(LlmError),
}

/// What happened to one candidate that reached classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// Classified from a well-formed model answer
    Enriched,
    /// Stored with the deterministic fallback enrichment
    Fallback,
    /// Not stored; eligible again next run
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub id: String,
    pub source: String,
    pub outcome: EnrichmentOutcome,
}

/// What happened to one output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Written,
    /// Rendering failed; the previous file was left in place
    Kept { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub outcome: DocumentOutcome,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Candidates returned by all sources
    pub fetched: usize,
    /// Candidates dropped because their id was stored or already seen this run
    pub already_known: usize,
    /// Candidates without an id
    pub rejected: usize,
    /// New candidates left for a later run by the per-source cap
    pub deferred: usize,
    pub records: Vec<RecordOutcome>,
    /// Store size after the merge; `None` when nothing was merged
    pub stored_total: Option<usize>,
    pub documents: Vec<DocumentReport>,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&EnrichmentOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn enriched(&self) -> usize {
        self.count(|o| *o == EnrichmentOutcome::Enriched)
    }

    pub fn fallback(&self) -> usize {
        self.count(|o| *o == EnrichmentOutcome::Fallback)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, EnrichmentOutcome::Skipped { .. }))
    }

    /// Records written to the store this run.
    pub fn merged(&self) -> usize {
        self.enriched() + self.fallback()
    }
}

/// The ingestion coordinator.
///
/// Owns the only side-effecting orchestration in the crate: everything it
/// drives (store, sources, classifier, synthesizer) is injected.
pub struct IngestionCoordinator {
    store: Arc<dyn RecordStore>,
    sources: Vec<Arc<dyn PaperSource>>,
    classifier: Arc<dyn Classifier>,
    synthesizer: Synthesizer,
    output_dir: PathBuf,
    max_new_per_source: usize,
}

impl IngestionCoordinator {
    /// Create a coordinator with no sources.
    pub fn new(
        store: Arc<dyn RecordStore>,
        classifier: Arc<dyn Classifier>,
        synthesizer: Synthesizer,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            sources: Vec::new(),
            classifier,
            synthesizer,
            output_dir: output_dir.into(),
            max_new_per_source: Config::default().max_new_per_source,
        }
    }

    /// Wire up the production store, sources and collaborators.
    pub fn from_config(config: &Config, client: Arc<dyn LlmClient>) -> Self {
        let store = Arc::new(JsonlStore::new(config.store_path.clone()));
        let classifier = Arc::new(LlmClassifier::new(client.clone()));
        let synthesizer = Synthesizer::new(client, config.synthesis.clone());

        let mut coordinator = Self::new(store, classifier, synthesizer, config.output_dir.clone())
            .with_max_new_per_source(config.max_new_per_source);
        if config.bibtex.enabled {
            coordinator.register_source(Arc::new(BibtexSource::new(config.bibtex.clone())));
        }
        if config.arxiv.enabled {
            coordinator.register_source(Arc::new(ArxivSource::new(config.arxiv.clone())));
        }
        coordinator
    }

    /// Register a source. Sources are polled in registration order.
    pub fn register_source(&mut self, source: Arc<dyn PaperSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Arc<dyn PaperSource>) -> Self {
        self.register_source(source);
        self
    }

    pub fn with_max_new_per_source(mut self, max: usize) -> Self {
        self.max_new_per_source = max;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the whole pipeline once.
    ///
    /// Per-record and per-source problems are recorded in the report;
    /// only storage write failures and fatal collaborator errors abort.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();

        // Step 1: Known ids
        let mut seen: HashSet<String> = self.store.known_ids();
        debug!(stored = seen.len(), "loaded known ids");

        let mut enriched: Vec<PaperRecord> = Vec::new();
        for source in &self.sources {
            // Step 2: Fetch
            let candidates = source.fetch().await;
            report.fetched += candidates.len();

            // Step 3: Filter
            let mut fresh = Vec::new();
            for record in candidates {
                if record.id.trim().is_empty() {
                    debug!(source = source.name(), title = %record.title, "dropping candidate without id");
                    report.rejected += 1;
                    continue;
                }
                if !seen.insert(record.id.clone()) {
                    report.already_known += 1;
                    continue;
                }
                fresh.push(record);
            }

            // Step 4: Cap
            if fresh.len() > self.max_new_per_source {
                let deferred = fresh.len() - self.max_new_per_source;
                info!(source = source.name(), deferred, "per-source cap reached, deferring the rest");
                report.deferred += deferred;
                fresh.truncate(self.max_new_per_source);
            }
            info!(source = source.name(), new = fresh.len(), "candidates to classify");

            // Step 5: Classify
            for record in fresh {
                let (id, outcome) = self.enrich(record, &mut enriched).await?;
                report.records.push(RecordOutcome {
                    id,
                    source: source.name().to_string(),
                    outcome,
                });
            }
        }

        // Step 6: Merge
        if enriched.is_empty() {
            info!("no new records to merge");
        } else {
            let total = self.store.merge_and_persist(enriched)?;
            info!(merged = report.merged(), total, "store updated");
            report.stored_total = Some(total);
        }

        // Step 7: Regenerate
        report.documents = self.regenerate().await?;
        Ok(report)
    }

    async fn enrich(
        &self,
        mut record: PaperRecord,
        enriched: &mut Vec<PaperRecord>,
    ) -> Result<(String, EnrichmentOutcome), PipelineError> {
        let result = {
            let request = ClassifyRequest::from_record(&record);
            self.classifier.classify(&request).await
        };

        let outcome = match result {
            Ok(enrichment) => {
                let outcome = if enrichment.is_fallback() {
                    EnrichmentOutcome::Fallback
                } else {
                    EnrichmentOutcome::Enriched
                };
                record.enrichment = Some(enrichment);
                outcome
            }
            Err(e) if e.is_fatal() => return Err(PipelineError::Collaborator(e)),
            Err(e) => {
                warn!(id = %record.id, error = %e, "classification failed, skipping record");
                return Ok((record.id, EnrichmentOutcome::Skipped { reason: e.to_string() }));
            }
        };

        let id = record.id.clone();
        enriched.push(record);
        Ok((id, outcome))
    }

    /// Re-render `overview.md` and `by_design_phase.md` from the store.
    ///
    /// A document whose render fails with a non-fatal error keeps its
    /// previous contents on disk.
    pub async fn regenerate(&self) -> Result<Vec<DocumentReport>, PipelineError> {
        let records = self.store.load();
        debug!(records = records.len(), "regenerating synthesis documents");

        let overview = self.synthesizer.render_overview(&records).await;
        let mut documents = vec![self.write_document(OVERVIEW_FILE, overview)?];

        let by_phase = self.synthesizer.render_by_phase(&records).await;
        documents.push(self.write_document(BY_PHASE_FILE, by_phase)?);

        Ok(documents)
    }

    fn write_document(
        &self,
        file_name: &str,
        rendered: Result<String, LlmError>,
    ) -> Result<DocumentReport, PipelineError> {
        let path = self.output_dir.join(file_name);
        let outcome = match rendered {
            Ok(text) => {
                write_atomic(&path, text.as_bytes())?;
                info!(path = %path.display(), "document written");
                DocumentOutcome::Written
            }
            Err(e) if e.is_fatal() => return Err(PipelineError::Collaborator(e)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "render failed, keeping previous document");
                DocumentOutcome::Kept { reason: e.to_string() }
            }
        };
        Ok(DocumentReport { path, outcome })
    }
}
