//! Paper classification via a language model
//!
//! The classifier sends one paper's metadata to the model and expects a
//! JSON object with the enrichment fields back. Models wrap JSON in prose
//! or code fences often enough that the outermost balanced `{...}` region
//! is extracted before parsing. If nothing usable comes back the result is
//! a deterministic fallback enrichment, marked as such. Transport and API
//! errors are returned to the caller instead.

use crate::llm::{LlmClient, LlmError, LlmTask};
use crate::paper::fields::Fields;
use crate::paper::{Enrichment, EnrichmentStatus, PaperRecord, ENRICHMENT_KEYS};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// The subset of a record sent for classification.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest<'a> {
    pub title: &'a str,
    #[serde(rename = "abstract")]
    pub abstract_text: &'a str,
    pub year: i32,
    pub source: &'a str,
    pub authors: &'a [String],
    pub categories: &'a [String],
}

impl<'a> ClassifyRequest<'a> {
    pub fn from_record(record: &'a PaperRecord) -> Self {
        Self {
            title: &record.title,
            abstract_text: &record.abstract_text,
            year: record.year,
            source: &record.source,
            authors: &record.authors,
            categories: &record.categories,
        }
    }
}

/// Classifier trait: one request in, one enrichment out.
///
/// An `Err` means the call itself failed (the record should be skipped);
/// an unparsable answer is not an error but a fallback enrichment.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest<'_>) -> Result<Enrichment, LlmError>;
}

pub(crate) const CLASSIFY_SYSTEM_PROMPT: &str = r#"You are an expert in AI and design research and know the six-stage design process of Howard et al. (2008).

You receive metadata about one research paper (title, abstract, year, authors, source, categories).
Answer with a single JSON object and nothing else, using exactly these keys:

- "design_phase": list of strings, a subset of
  ["Establishing a need", "Analysis of task", "Concept design",
   "Embodiment design", "Detail design", "Implementation"]
- "ai_roles": list of short strings naming the role(s) AI plays, e.g.
  "idea generation", "evaluation", "optimization", "simulation",
  "documentation", "analysis", "interaction", "co-creation"
- "representations": list of short strings naming the main design
  representations, e.g. "text", "sketch", "image", "3D model", "CAD",
  "code", "prototype", "interface", "behaviour", "data visualization"
- "research_type": list of short strings naming the research angle, e.g.
  "methodology", "tool development", "theory building", "protocol analysis",
  "lab study", "field study", "case study", "practice-based research"
- "summary_short": a 2-3 sentence English summary of the paper
- "implications_for_design_research": list of 2-4 plain strings (no bullet
  characters) on what the paper implies for design research
- "tags": list of 3-8 lowercase, hyphen-separated topical tags, e.g.
  "generative-design", "creativity-support"

Return only valid JSON. No comments, no surrounding text."#;

/// Classifier backed by an [`LlmClient`].
pub struct LlmClassifier {
    client: Arc<dyn LlmClient>,
}

impl LlmClassifier {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, request: &ClassifyRequest<'_>) -> Result<Enrichment, LlmError> {
        let user = build_user_message(request);
        let reply = self
            .client
            .complete(LlmTask::Classify, CLASSIFY_SYSTEM_PROMPT, &user)
            .await?;

        let enrichment = parse_enrichment(&reply, request.abstract_text);
        if enrichment.is_fallback() {
            warn!(title = request.title, "classifier response unparsable, using fallback");
        }
        Ok(enrichment)
    }
}

fn build_user_message(request: &ClassifyRequest<'_>) -> String {
    serde_json::json!({
        "title": request.title,
        "abstract": request.abstract_text,
        "year": request.year,
        "source": request.source,
        "authors": request.authors,
        "categories": request.categories,
    })
    .to_string()
}

/// Turn a raw model reply into an enrichment, falling back when no JSON
/// object with at least one enrichment key can be found.
///
/// The reply is read leniently: single strings are accepted where lists are
/// expected, and blank or non-string list items are ignored.
pub fn parse_enrichment(reply: &str, abstract_text: &str) -> Enrichment {
    let Some(Value::Object(payload)) = extract_payload(reply) else {
        return Enrichment::fallback(abstract_text);
    };

    let mut fields = Fields::new(payload);
    if !fields.contains_any(&ENRICHMENT_KEYS) {
        return Enrichment::fallback(abstract_text);
    }

    let mut enrichment = Enrichment::read(&mut fields);
    for list in [
        &mut enrichment.design_phase,
        &mut enrichment.ai_roles,
        &mut enrichment.representations,
        &mut enrichment.research_type,
        &mut enrichment.tags,
        &mut enrichment.implications_for_design_research,
    ] {
        list.retain(|item| !item.trim().is_empty());
    }
    enrichment.summary_short = enrichment.summary_short.trim().to_string();
    enrichment.enrichment_status = EnrichmentStatus::Classified;
    enrichment
}

/// Extract a JSON object from model output.
///
/// Tries a direct parse first, then scans for the outermost balanced
/// `{...}` regions (string- and escape-aware) left to right and returns
/// the first one that parses as an object.
pub fn extract_payload(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        if v.is_object() {
            return Some(v);
        }
    }

    let bytes = trimmed.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = trimmed[search_from..].find('{') {
        let start = search_from + offset;
        match balanced_end(bytes, start) {
            Some(end) => {
                if let Ok(v) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                    if v.is_object() {
                        return Some(v);
                    }
                }
            }
            None => return None,
        }
        search_from = start + 1;
    }
    None
}

/// Index of the `}` closing the `{` at `start`, if the region is balanced.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockClient;

    const GOOD: &str = r#"{
        "design_phase": ["Concept design", "Detail design"],
        "ai_roles": ["idea generation"],
        "representations": ["sketch"],
        "research_type": ["lab study"],
        "summary_short": "Sketch-based ideation with a diffusion model.",
        "implications_for_design_research": ["Ideation shifts", "New protocols"],
        "tags": ["generative-design"]
    }"#;

    #[test]
    fn extracts_object_wrapped_in_prose_and_fences() {
        let text = format!("Sure! Here is the JSON:\n```json\n{}\n```\nHope this helps {{:", GOOD);
        let v = extract_payload(&text).expect("payload found");
        assert_eq!(v["tags"][0], "generative-design");
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() {
        let text = r#"note {"summary_short": "uses {curly} and \"quoted\" } text", "tags": []} trailing"#;
        let v = extract_payload(text).unwrap();
        assert_eq!(v["summary_short"], "uses {curly} and \"quoted\" } text");
    }

    #[test]
    fn skips_unparsable_region_and_takes_next_object() {
        let text = r#"{not json} then {"tags": ["a"]}"#;
        let v = extract_payload(text).unwrap();
        assert_eq!(v["tags"][0], "a");
    }

    #[test]
    fn no_object_gives_none() {
        assert!(extract_payload("I cannot classify this paper.").is_none());
        assert!(extract_payload("[1, 2, 3]").is_none());
        assert!(extract_payload("{ unterminated").is_none());
    }

    #[test]
    fn parse_accepts_single_strings_for_lists() {
        let e = parse_enrichment(
            r#"{"design_phase": "Implementation", "tags": ["a", 3, ""], "summary_short": null}"#,
            "abstract",
        );
        assert_eq!(e.enrichment_status, EnrichmentStatus::Classified);
        assert_eq!(e.design_phase, vec!["Implementation"]);
        assert_eq!(e.tags, vec!["a"]);
        assert_eq!(e.summary_short, "");
    }

    #[test]
    fn unparsable_reply_gives_deterministic_fallback() {
        let abstract_text = "x".repeat(500);
        let a = parse_enrichment("no json here", &abstract_text);
        let b = parse_enrichment("{\"unrelated\": true}", &abstract_text);
        assert!(a.is_fallback());
        assert_eq!(a, b);
        assert_eq!(a.summary_short.len(), 300);
        assert!(a.design_phase.is_empty() && a.tags.is_empty());
    }

    #[tokio::test]
    async fn llm_classifier_sends_metadata_and_parses_reply() {
        let client = Arc::new(MockClient::new().with_response("Sketching with diffusion", GOOD));
        let classifier = LlmClassifier::new(client.clone());

        let record = PaperRecord::new("arxiv:1", "Sketching with diffusion")
            .with_abstract("We study sketches.")
            .with_year(2024)
            .with_authors(vec!["A. Author".into()]);
        let enrichment = classifier
            .classify(&ClassifyRequest::from_record(&record))
            .await
            .unwrap();

        assert_eq!(enrichment.design_phase, vec!["Concept design", "Detail design"]);
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].task, LlmTask::Classify);
        let sent: Value = serde_json::from_str(&calls[0].user).unwrap();
        assert_eq!(sent["abstract"], "We study sketches.");
        assert_eq!(sent["year"], 2024);
        assert!(sent.get("id").is_none());
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let client = Arc::new(MockClient::new().with_failure("t", LlmError::Transport("down".into())));
        let classifier = LlmClassifier::new(client);
        let record = PaperRecord::new("x", "t");
        let err = classifier
            .classify(&ClassifyRequest::from_record(&record))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
    }
}
