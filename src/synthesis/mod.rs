//! Synthesis documents regenerated from the whole store
//!
//! Two markdown documents are derived from the current records:
//! - `overview.md`: a fixed preamble followed by model-written prose over
//!   the most recent papers
//! - `by_design_phase.md`: one section per design phase, in canonical order
//!
//! The model only ever sees digests built by [`digest`]; which records go
//! in and in what order is fully determined by the record set.

pub mod digest;
mod prompts;

use crate::aggregate::group_by_phase;
use crate::config::SynthesisConfig;
use crate::llm::{LlmClient, LlmError, LlmTask};
use crate::paper::{DesignPhase, PaperRecord};
use std::sync::Arc;
use tracing::debug;

pub const OVERVIEW_FILE: &str = "overview.md";
pub const BY_PHASE_FILE: &str = "by_design_phase.md";

/// Top-level heading of the per-phase document.
pub const BY_PHASE_HEADING: &str = "# AI & Design Research by Design Phase";

const NO_PAPERS_PLACEHOLDER: &str = "_No papers in the database yet._";

/// Section emitted for a phase with no classified papers.
pub fn empty_phase_section(phase: DesignPhase) -> String {
    format!(
        "## {}\n\n_There are currently no classified papers for this phase._\n",
        phase.label()
    )
}

/// Renders the synthesis documents using a summarization model.
pub struct Synthesizer {
    client: Arc<dyn LlmClient>,
    config: SynthesisConfig,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn LlmClient>, config: SynthesisConfig) -> Self {
        Self { client, config }
    }

    /// Preamble plus model prose over the most recent records.
    ///
    /// An empty record set yields the preamble and a placeholder without
    /// calling the model.
    pub async fn render_overview(&self, records: &[PaperRecord]) -> Result<String, LlmError> {
        let preamble = self.config.overview_preamble.trim_end();
        if records.is_empty() {
            return Ok(format!("{}\n\n{}\n", preamble, NO_PAPERS_PLACEHOLDER));
        }

        let selected = digest::select_for_overview(records, self.config.overview_limit);
        let context = digest::overview_digest(&selected);
        debug!(papers = selected.len(), "rendering overview");

        let prose = self
            .client
            .complete(
                LlmTask::Summarize,
                prompts::OVERVIEW_SYSTEM_PROMPT,
                &prompts::overview_user_prompt(&context),
            )
            .await?;

        Ok(format!("{}\n\n{}\n", preamble, prose.trim()))
    }

    /// One section per phase in canonical order under a single heading.
    ///
    /// Empty phases get a placeholder section and no model call. An empty
    /// record set yields the heading and a placeholder.
    pub async fn render_by_phase(&self, records: &[PaperRecord]) -> Result<String, LlmError> {
        if records.is_empty() {
            return Ok(format!("{}\n\n{}\n", BY_PHASE_HEADING, NO_PAPERS_PLACEHOLDER));
        }

        let buckets = group_by_phase(records);
        let mut sections = vec![format!("{}\n", BY_PHASE_HEADING)];

        for (phase, bucket) in buckets.iter() {
            if bucket.is_empty() {
                sections.push(empty_phase_section(phase));
                continue;
            }

            let selected = digest::select_for_phase(bucket, self.config.phase_limit);
            let context = digest::phase_digest(&selected);
            debug!(phase = phase.label(), papers = selected.len(), "rendering phase section");

            let prose = self
                .client
                .complete(
                    LlmTask::Summarize,
                    prompts::PHASE_SYSTEM_PROMPT,
                    &prompts::phase_user_prompt(phase.label(), &context),
                )
                .await?;
            sections.push(with_phase_heading(phase, &prose));
        }

        Ok(sections.join("\n\n"))
    }
}

/// Ensure a generated section starts with its `## <phase>` heading so the
/// document outline is fixed whatever the model writes.
fn with_phase_heading(phase: DesignPhase, prose: &str) -> String {
    let body = prose.trim();
    let heading = format!("## {}", phase.label());
    let first_line = body.lines().next().unwrap_or_default().trim();
    if first_line.eq_ignore_ascii_case(&heading) {
        format!("{}\n", body)
    } else {
        format!("{}\n\n{}\n", heading, body)
    }
}
