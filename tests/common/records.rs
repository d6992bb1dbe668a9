//! Record builders and model replies

use design_lit::{Enrichment, EnrichmentStatus, PaperRecord};

/// An unenriched candidate as a source would return it.
pub fn candidate(id: &str, title: &str) -> PaperRecord {
    PaperRecord::new(id, title)
        .with_abstract(format!("Abstract of {}.", title))
        .with_year(2024)
        .with_published("2024-05-01T00:00:00")
        .with_source("test")
        .with_authors(vec!["A. Author".to_string()])
        .with_categories(vec!["cs.HC".to_string()])
}

/// A stored record classified into `phases`.
pub fn classified(id: &str, title: &str, year: i32, phases: &[&str]) -> PaperRecord {
    let enrichment = Enrichment {
        design_phase: phases.iter().map(|p| p.to_string()).collect(),
        ai_roles: vec!["idea generation".to_string()],
        representations: vec!["sketch".to_string()],
        research_type: vec!["lab study".to_string()],
        tags: vec!["generative-design".to_string()],
        summary_short: format!("Summary of {}.", title),
        implications_for_design_research: vec![format!("{} matters.", title)],
        enrichment_status: EnrichmentStatus::Classified,
    };
    candidate(id, title).with_year(year).with_enrichment(enrichment)
}

/// A well-formed classifier answer, wrapped in prose the way models often do.
pub fn classification_reply(phases: &[&str]) -> String {
    let body = serde_json::json!({
        "design_phase": phases,
        "ai_roles": ["co-creation"],
        "representations": ["text"],
        "research_type": ["field study"],
        "summary_short": "A short summary.",
        "implications_for_design_research": ["One implication.", "Another."],
        "tags": ["creativity-support"],
    });
    format!("Here is the classification:\n```json\n{}\n```", body)
}
