//! Paper record representation

use super::fields::Fields;
use super::phase::DesignPhase;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Number of abstract characters used wherever a summary is missing.
pub const ABSTRACT_EXCERPT_CHARS: usize = 300;

/// Whether an enrichment came from a parsed model response or the fallback path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// The model returned a parsable classification
    #[default]
    Classified,
    /// The model response could not be parsed; fields are the deterministic fallback
    Fallback,
}

/// Enrichment keys as they appear in a stored line or a model reply.
pub(crate) const ENRICHMENT_KEYS: [&str; 7] = [
    "design_phase",
    "ai_roles",
    "representations",
    "research_type",
    "tags",
    "summary_short",
    "implications_for_design_research",
];

const STATUS_KEY: &str = "enrichment_status";

/// Classification and summary fields attached by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrichment {
    /// Design phase labels. Not validated here; see [`DesignPhase::from_label`].
    pub design_phase: Vec<String>,
    pub ai_roles: Vec<String>,
    pub representations: Vec<String>,
    pub research_type: Vec<String>,
    pub tags: Vec<String>,
    pub summary_short: String,
    pub implications_for_design_research: Vec<String>,
    /// Lines written before the status marker existed load as `Classified`.
    pub enrichment_status: EnrichmentStatus,
}

impl Enrichment {
    /// The fallback used when a classifier response is unparsable:
    /// empty classification and an abstract excerpt as summary.
    pub fn fallback(abstract_text: &str) -> Self {
        Self {
            design_phase: Vec::new(),
            ai_roles: Vec::new(),
            representations: Vec::new(),
            research_type: Vec::new(),
            tags: Vec::new(),
            summary_short: excerpt(abstract_text, ABSTRACT_EXCERPT_CHARS),
            implications_for_design_research: Vec::new(),
            enrichment_status: EnrichmentStatus::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.enrichment_status == EnrichmentStatus::Fallback
    }

    /// Take the enrichment keys out of `fields`. Missing keys read as empty
    /// and are noted; an absent status reads as `Classified`.
    pub(crate) fn read(fields: &mut Fields) -> Self {
        for key in ENRICHMENT_KEYS {
            if !fields.contains(key) {
                fields.note(key);
            }
        }
        let enrichment_status = match fields.take(STATUS_KEY) {
            None => EnrichmentStatus::Classified,
            Some(value) => match serde_json::from_value(value) {
                Ok(status) => status,
                Err(_) => {
                    fields.note(STATUS_KEY);
                    EnrichmentStatus::Classified
                }
            },
        };
        Self {
            design_phase: fields.string_list("design_phase"),
            ai_roles: fields.string_list("ai_roles"),
            representations: fields.string_list("representations"),
            research_type: fields.string_list("research_type"),
            tags: fields.string_list("tags"),
            summary_short: fields.string("summary_short"),
            implications_for_design_research: fields.string_list("implications_for_design_research"),
            enrichment_status,
        }
    }
}

/// A research paper, as fetched and (later) enriched.
///
/// Deserialization is lenient: a `null` or mistyped field reads as its
/// default and is logged, any enrichment key marks the record as enriched,
/// and unknown keys are kept in `extra`. Only a non-object or a non-string
/// `id` is rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperRecord {
    /// Primary key. Records with an empty id are never stored.
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<String>,
    /// 0 when unknown
    pub year: i32,
    pub source: String,
    /// ISO-8601-like or year-only; only ever compared as a string
    pub published: String,
    pub categories: Vec<String>,
    /// Absent until the record has been through the classifier.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
    /// Keys not read by this crate, written back unchanged.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for PaperRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        PaperRecord::from_map(map).map_err(serde::de::Error::custom)
    }
}

impl PaperRecord {
    /// Create an unenriched record with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            abstract_text: String::new(),
            authors: Vec::new(),
            year: 0,
            source: String::new(),
            published: String::new(),
            categories: Vec::new(),
            enrichment: None,
            extra: Map::new(),
        }
    }

    fn from_map(map: Map<String, Value>) -> Result<Self, String> {
        let mut fields = Fields::new(map);
        let id = match fields.take("id") {
            None => String::new(),
            Some(Value::String(id)) => id,
            Some(other) => return Err(format!("id is not a string: {}", other)),
        };
        let enriched = fields.contains_any(&ENRICHMENT_KEYS) || fields.contains(STATUS_KEY);

        let title = fields.string("title");
        let abstract_text = fields.string("abstract");
        let authors = fields.string_list("authors");
        let year = fields.year("year");
        let source = fields.string("source");
        let published = fields.string("published");
        let categories = fields.string_list("categories");
        let enrichment = enriched.then(|| Enrichment::read(&mut fields));

        let (extra, coerced) = fields.finish();
        if !coerced.is_empty() {
            warn!(id = %id, fields = ?coerced, "record fields missing or malformed, read as defaults");
        }

        Ok(Self {
            id,
            title,
            abstract_text,
            authors,
            year,
            source,
            published,
            categories,
            enrichment,
            extra,
        })
    }

    pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = abstract_text.into();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = published.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    pub fn is_enriched(&self) -> bool {
        self.enrichment.is_some()
    }

    /// Recognized design phases, deduplicated, in the order they appear.
    /// Unrecognized labels are dropped.
    pub fn phases(&self) -> Vec<DesignPhase> {
        let mut phases = Vec::new();
        if let Some(enrichment) = &self.enrichment {
            for label in &enrichment.design_phase {
                if let Some(phase) = DesignPhase::from_label(label) {
                    if !phases.contains(&phase) {
                        phases.push(phase);
                    }
                }
            }
        }
        phases
    }

    /// Raw phase labels as stored (empty when unenriched).
    pub fn phase_labels(&self) -> &[String] {
        self.enrichment
            .as_ref()
            .map(|e| e.design_phase.as_slice())
            .unwrap_or(&[])
    }

    /// `summary_short`, or an abstract excerpt when the summary is missing or empty.
    pub fn summary_or_excerpt(&self) -> String {
        match &self.enrichment {
            Some(e) if !e.summary_short.trim().is_empty() => e.summary_short.clone(),
            _ => excerpt(&self.abstract_text, ABSTRACT_EXCERPT_CHARS),
        }
    }

    /// Implication bullets (empty when unenriched).
    pub fn implications(&self) -> &[String] {
        self.enrichment
            .as_ref()
            .map(|e| e.implications_for_design_research.as_slice())
            .unwrap_or(&[])
    }

    /// Title for display; "Untitled" when empty.
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            "Untitled"
        } else {
            title
        }
    }

    /// Year for display; "n.d." when unknown.
    pub fn display_year(&self) -> String {
        if self.year == 0 {
            "n.d.".to_string()
        } else {
            self.year.to_string()
        }
    }
}

/// First `max_chars` characters of `text` (char-boundary safe).
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enriched(phases: &[&str]) -> Enrichment {
        Enrichment {
            design_phase: phases.iter().map(|s| s.to_string()).collect(),
            ai_roles: vec!["evaluation".into()],
            representations: vec!["sketch".into()],
            research_type: vec!["lab study".into()],
            tags: vec!["creativity-support".into()],
            summary_short: "A study.".into(),
            implications_for_design_research: vec!["One".into(), "Two".into()],
            enrichment_status: EnrichmentStatus::Classified,
        }
    }

    #[test]
    fn unenriched_record_omits_enrichment_fields() {
        let record = PaperRecord::new("bib:a", "A");
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("design_phase").is_none());
        assert!(value.get("summary_short").is_none());
        assert_eq!(value["abstract"], json!(""));
    }

    #[test]
    fn enrichment_fields_are_flat_in_json() {
        let record = PaperRecord::new("bib:a", "A").with_enrichment(enriched(&["Concept design"]));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["design_phase"], json!(["Concept design"]));
        assert_eq!(value["enrichment_status"], json!("classified"));

        let back: PaperRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn absent_enrichment_is_distinct_from_empty_enrichment() {
        let bare: PaperRecord = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert!(bare.enrichment.is_none());

        let empty: PaperRecord = serde_json::from_value(json!({
            "id": "x",
            "design_phase": [],
            "ai_roles": [],
            "representations": [],
            "research_type": [],
            "tags": [],
            "summary_short": "",
            "implications_for_design_research": []
        }))
        .unwrap();
        let enrichment = empty.enrichment.expect("empty lists are still an enrichment");
        assert!(enrichment.design_phase.is_empty());
        assert_eq!(enrichment.enrichment_status, EnrichmentStatus::Classified);
    }

    #[test]
    fn partial_enrichment_is_kept_with_empty_defaults() {
        let record: PaperRecord = serde_json::from_value(json!({
            "id": "legacy",
            "design_phase": "Concept design",
            "summary_short": "kept",
            "ai_roles": null
        }))
        .unwrap();
        let enrichment = record.enrichment.expect("any enrichment key marks the record enriched");
        assert_eq!(enrichment.design_phase, vec!["Concept design"]);
        assert_eq!(enrichment.summary_short, "kept");
        assert!(enrichment.ai_roles.is_empty() && enrichment.tags.is_empty());
        assert_eq!(enrichment.enrichment_status, EnrichmentStatus::Classified);
    }

    #[test]
    fn null_base_fields_read_as_defaults() {
        let record: PaperRecord = serde_json::from_value(json!({
            "id": "bib:X",
            "title": null,
            "authors": null,
            "year": "1983",
            "published": null
        }))
        .unwrap();
        assert_eq!(record.title, "");
        assert!(record.authors.is_empty());
        assert_eq!(record.year, 1983);
        assert!(!record.is_enriched());
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let value = json!({"id": "x", "title": "X", "notes": {"by": "hand"}});
        let record: PaperRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.extra.get("notes"), Some(&json!({"by": "hand"})));

        let written = serde_json::to_value(&record).unwrap();
        assert_eq!(written["notes"], json!({"by": "hand"}));
        assert!(written.get("design_phase").is_none());
    }

    #[test]
    fn non_string_id_or_non_object_is_rejected() {
        assert!(serde_json::from_value::<PaperRecord>(json!({"id": 7, "title": "T"})).is_err());
        assert!(serde_json::from_value::<PaperRecord>(json!(["id", "x"])).is_err());
    }

    #[test]
    fn phases_drop_unknown_and_duplicate_labels() {
        let record = PaperRecord::new("x", "X").with_enrichment(enriched(&[
            "Detail design",
            "Prototyping",
            "detail design",
            "Establishing a need",
        ]));
        assert_eq!(
            record.phases(),
            vec![DesignPhase::DetailDesign, DesignPhase::EstablishingNeed]
        );
    }

    #[test]
    fn summary_falls_back_to_abstract_excerpt() {
        let long = "é".repeat(400);
        let record = PaperRecord::new("x", "X").with_abstract(long);
        assert_eq!(record.summary_or_excerpt().chars().count(), ABSTRACT_EXCERPT_CHARS);

        let mut e = enriched(&[]);
        e.summary_short = "  ".into();
        let record = PaperRecord::new("x", "X")
            .with_abstract("short abstract")
            .with_enrichment(e);
        assert_eq!(record.summary_or_excerpt(), "short abstract");
    }

    #[test]
    fn fallback_enrichment_is_marked() {
        let e = Enrichment::fallback("abc");
        assert!(e.is_fallback());
        assert_eq!(e.summary_short, "abc");
        assert!(e.design_phase.is_empty());
    }
}
