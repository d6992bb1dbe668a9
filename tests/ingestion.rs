//! End-to-end ingestion runs against a JSONL store
//!
//! Sources are static, the model is scripted, and the store and documents
//! live in a temp directory.

mod common;

use common::{candidate, classified, Harness};
use design_lit::sources::parse_bibtex;
use design_lit::synthesis::BY_PHASE_FILE;
use design_lit::{
    DocumentOutcome, EnrichmentOutcome, EnrichmentStatus, LlmError, LlmTask, MockClient,
    PipelineError, RecordStore, StaticSource,
};

#[tokio::test]
async fn only_unknown_ids_are_enriched() {
    let harness = Harness::scripted(&["Concept design"]);
    harness.seed(vec![classified("bib:A", "Known paper", 2020, &["Implementation"])]);

    let source = StaticSource::new(
        "mixed",
        vec![candidate("bib:A", "Known paper"), candidate("arxiv:B", "New paper")],
    );
    let report = harness.coordinator(vec![source], 25).run().await.unwrap();

    assert_eq!(report.already_known, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].id, "arxiv:B");
    assert_eq!(report.records[0].outcome, EnrichmentOutcome::Enriched);
    assert_eq!(report.stored_total, Some(2));
    assert_eq!(harness.stored_ids(), vec!["arxiv:B", "bib:A"]);
    assert_eq!(harness.client.call_count(LlmTask::Classify), 1);

    let known = harness
        .store
        .load()
        .into_iter()
        .find(|r| r.id == "bib:A")
        .unwrap();
    assert_eq!(known.phase_labels(), ["Implementation".to_string()]);
}

#[tokio::test]
async fn second_run_with_the_same_source_enriches_nothing() {
    let harness = Harness::scripted(&["Detail design"]);
    let batch = vec![candidate("arxiv:1", "One"), candidate("arxiv:2", "Two")];

    let first = harness
        .coordinator(vec![StaticSource::new("arxiv", batch.clone())], 25)
        .run()
        .await
        .unwrap();
    assert_eq!(first.merged(), 2);
    let store_after_first = std::fs::read(harness.store.path()).unwrap();

    let second = harness
        .coordinator(vec![StaticSource::new("arxiv", batch)], 25)
        .run()
        .await
        .unwrap();

    assert_eq!(second.records.len(), 0);
    assert_eq!(second.already_known, 2);
    assert_eq!(second.stored_total, None);
    assert_eq!(harness.client.call_count(LlmTask::Classify), 2);
    assert_eq!(std::fs::read(harness.store.path()).unwrap(), store_after_first);
}

#[tokio::test]
async fn per_source_cap_defers_the_rest_to_the_next_run() {
    let harness = Harness::scripted(&["Analysis of task"]);
    let batch = vec![candidate("bib:First", "First"), candidate("bib:Second", "Second")];

    let report = harness
        .coordinator(vec![StaticSource::new("bibtex", batch.clone())], 1)
        .run()
        .await
        .unwrap();

    assert_eq!(report.merged(), 1);
    assert_eq!(report.deferred, 1);
    assert_eq!(harness.stored_ids(), vec!["bib:First"]);

    let next = harness
        .coordinator(vec![StaticSource::new("bibtex", batch)], 1)
        .run()
        .await
        .unwrap();

    assert_eq!(next.merged(), 1);
    assert_eq!(next.deferred, 0);
    assert_eq!(harness.stored_ids(), vec!["bib:First", "bib:Second"]);
}

#[tokio::test]
async fn cap_applies_to_each_source_separately() {
    let harness = Harness::scripted(&[]);
    let bib = StaticSource::new("bibtex", vec![candidate("bib:1", "B1"), candidate("bib:2", "B2")]);
    let arxiv = StaticSource::new("arxiv", vec![candidate("arxiv:1", "A1"), candidate("arxiv:2", "A2")]);

    let report = harness.coordinator(vec![bib, arxiv], 1).run().await.unwrap();

    assert_eq!(report.deferred, 2);
    assert_eq!(harness.stored_ids(), vec!["arxiv:1", "bib:1"]);
    let sources: Vec<&str> = report.records.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(sources, vec!["bibtex", "arxiv"]);
}

#[tokio::test]
async fn unparsable_answers_are_stored_as_fallback_and_failures_skipped() {
    let client = MockClient::new()
        .with_task_response(LlmTask::Classify, "Rambling", "Sorry, I would rather talk about cats.")
        .with_failure("Flaky", LlmError::Api { status: 503, body: "busy".into() })
        .with_default(LlmTask::Classify, common::classification_reply(&["Concept design"]))
        .with_default(LlmTask::Summarize, "Generated prose.");
    let harness = Harness::new(client);
    let source = StaticSource::new(
        "arxiv",
        vec![
            candidate("arxiv:ok", "Solid"),
            candidate("arxiv:ramble", "Rambling"),
            candidate("arxiv:flaky", "Flaky"),
        ],
    );

    let report = harness.coordinator(vec![source], 25).run().await.unwrap();

    assert_eq!((report.enriched(), report.fallback(), report.skipped()), (1, 1, 1));
    assert_eq!(harness.stored_ids(), vec!["arxiv:ok", "arxiv:ramble"]);

    let rambled = harness
        .store
        .load()
        .into_iter()
        .find(|r| r.id == "arxiv:ramble")
        .unwrap();
    let enrichment = rambled.enrichment.unwrap();
    assert_eq!(enrichment.enrichment_status, EnrichmentStatus::Fallback);
    assert!(enrichment.design_phase.is_empty());
    assert_eq!(enrichment.summary_short, "Abstract of Rambling.");

    // The skipped record is picked up again once the model recovers.
    let recovered = Harness::scripted(&["Implementation"]);
    recovered.seed(harness.store.load());
    let retry = recovered
        .coordinator(vec![StaticSource::new("arxiv", vec![candidate("arxiv:flaky", "Flaky")])], 25)
        .run()
        .await
        .unwrap();
    assert_eq!(retry.enriched(), 1);
}

#[tokio::test]
async fn missing_credential_stops_the_run_and_leaves_the_store_alone() {
    let client = MockClient::new().with_failure(
        "",
        LlmError::MissingCredential("OPENAI_API_KEY is not set".into()),
    );
    let harness = Harness::new(client);
    harness.seed(vec![classified("bib:A", "Known", 2020, &[])]);
    let before = std::fs::read(harness.store.path()).unwrap();

    let err = harness
        .coordinator(vec![StaticSource::new("arxiv", vec![candidate("arxiv:new", "New")])], 25)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Collaborator(_)));
    assert_eq!(std::fs::read(harness.store.path()).unwrap(), before);
    assert!(!harness.output_dir().exists());
}

#[tokio::test]
async fn bibtex_export_flows_through_to_the_phase_document() {
    let bib = r#"
@inproceedings{Doe2024,
  title = {Prompting {CAD}: Generative Models in Detail Design},
  author = {Doe, Jane and Roe, Rick},
  booktitle = {Proc. DRS},
  year = {2024},
}
@misc{untitled,
  note = {ignored}
}
"#;
    let client = MockClient::new()
        .with_task_response(
            LlmTask::Classify,
            "Prompting CAD",
            common::classification_reply(&["Detail design", "Embodiment design"]),
        )
        .with_default(LlmTask::Summarize, "### Key themes\n- prompting");
    let harness = Harness::new(client);

    let report = harness
        .coordinator(vec![StaticSource::new("bibtex", parse_bibtex(bib))], 25)
        .run()
        .await
        .unwrap();

    assert_eq!(report.merged(), 1);
    assert!(report
        .documents
        .iter()
        .all(|d| d.outcome == DocumentOutcome::Written));
    assert_eq!(harness.stored_ids(), vec!["bib:Doe2024"]);

    let stored = &harness.store.load()[0];
    assert_eq!(stored.source, "Proc. DRS");
    assert_eq!(stored.authors, vec!["Doe, Jane", "Roe, Rick"]);

    let by_phase = harness.read_output(BY_PHASE_FILE);
    assert!(by_phase.contains("## Embodiment design\n\n### Key themes"));
    assert!(by_phase.contains("## Detail design\n\n### Key themes"));
    assert_eq!(harness.client.call_count(LlmTask::Summarize), 3);
}
