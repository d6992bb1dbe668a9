//! Coordinator wired to a JSONL store and output directory in a temp dir

use design_lit::config::SynthesisConfig;
use design_lit::{
    IngestionCoordinator, JsonlStore, LlmClassifier, LlmTask, MockClient, PaperRecord,
    RecordStore, StaticSource, Synthesizer,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct Harness {
    pub dir: TempDir,
    pub store: Arc<JsonlStore>,
    pub client: Arc<MockClient>,
}

impl Harness {
    /// Empty store; `client` answers every model call.
    pub fn new(client: MockClient) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let store = Arc::new(JsonlStore::new(dir.path().join("data/papers.jsonl")));
        Self {
            dir,
            store,
            client: Arc::new(client),
        }
    }

    /// A client that classifies everything as `phases` and writes fixed prose.
    pub fn scripted(phases: &[&str]) -> Self {
        Self::new(
            MockClient::new()
                .with_default(LlmTask::Classify, super::classification_reply(phases))
                .with_default(LlmTask::Summarize, "Generated prose."),
        )
    }

    pub fn seed(&self, records: Vec<PaperRecord>) {
        self.store
            .merge_and_persist(records)
            .expect("seeding the store");
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("knowledge")
    }

    pub fn coordinator(&self, sources: Vec<StaticSource>, cap: usize) -> IngestionCoordinator {
        let mut coordinator = IngestionCoordinator::new(
            self.store.clone(),
            Arc::new(LlmClassifier::new(self.client.clone())),
            Synthesizer::new(self.client.clone(), SynthesisConfig::default()),
            self.output_dir(),
        )
        .with_max_new_per_source(cap);
        for source in sources {
            coordinator.register_source(Arc::new(source));
        }
        coordinator
    }

    pub fn stored_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.store.load().into_iter().map(|r| r.id).collect();
        ids.sort();
        ids
    }

    pub fn read_output(&self, file_name: &str) -> String {
        std::fs::read_to_string(self.output_dir().join(file_name)).expect("output document")
    }
}
