//! Context selection and digests fed to the summarization model
//!
//! Selection and ordering here must be exactly reproducible for a given
//! record set, so every sort ends on `id`.

use crate::paper::PaperRecord;
use std::cmp::Ordering;

/// Implication bullets included per record in a phase digest.
pub const IMPLICATIONS_PER_RECORD: usize = 2;

fn chronological(a: &PaperRecord, b: &PaperRecord) -> Ordering {
    a.year
        .cmp(&b.year)
        .then_with(|| a.published.cmp(&b.published))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

fn newest_first(a: &PaperRecord, b: &PaperRecord) -> Ordering {
    b.year
        .cmp(&a.year)
        .then_with(|| b.published.cmp(&a.published))
        .then_with(|| a.id.cmp(&b.id))
}

/// The `limit` most recent records, oldest first.
pub fn select_for_overview(records: &[PaperRecord], limit: usize) -> Vec<&PaperRecord> {
    let mut sorted: Vec<&PaperRecord> = records.iter().collect();
    sorted.sort_by(|a, b| chronological(a, b));
    let skip = sorted.len().saturating_sub(limit);
    sorted.split_off(skip)
}

/// The `limit` most recent records of a bucket, newest first.
pub fn select_for_phase<'a>(bucket: &[&'a PaperRecord], limit: usize) -> Vec<&'a PaperRecord> {
    let mut sorted = bucket.to_vec();
    sorted.sort_by(|a, b| newest_first(a, b));
    sorted.truncate(limit);
    sorted
}

/// One block per record: year, title, phases, summary.
pub fn overview_digest(selected: &[&PaperRecord]) -> String {
    let mut lines = Vec::new();
    for record in selected {
        lines.push(format!(
            "- ({}) {}",
            record.display_year(),
            one_line(record.display_title())
        ));
        let phases = record.phase_labels();
        if !phases.is_empty() {
            lines.push(format!("  - Phases: {}", phases.join(", ")));
        }
        let summary = record.summary_or_excerpt();
        if !summary.trim().is_empty() {
            lines.push(format!("  - Summary: {}", one_line(&summary)));
        }
    }
    lines.join("\n")
}

/// One block per record: year, title, summary, first implications.
pub fn phase_digest(selected: &[&PaperRecord]) -> String {
    let mut lines = Vec::new();
    for record in selected {
        lines.push(format!(
            "- ({}) **{}**",
            record.display_year(),
            one_line(record.display_title())
        ));
        let summary = record.summary_or_excerpt();
        if !summary.trim().is_empty() {
            lines.push(format!("  - Summary: {}", one_line(&summary)));
        }
        for implication in record.implications().iter().take(IMPLICATIONS_PER_RECORD) {
            lines.push(format!("  - Implication: {}", one_line(implication)));
        }
    }
    lines.join("\n")
}

/// Collapse internal whitespace so multi-line abstracts stay in one bullet.
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
