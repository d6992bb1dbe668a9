//! Instructions for the summarization model

pub(crate) const OVERVIEW_SYSTEM_PROMPT: &str = "\
You are an expert in AI and design research.
You receive compact notes on many papers spanning the design process.

Write a high-level Markdown overview with exactly these sections:

## Big picture
## Where AI is entering the design process
## Emerging research themes
## Methodological patterns
## Gaps and opportunities

Use bullet points under each section. Do not add a top-level (#) title.
The document is regenerated regularly: avoid mentioning specific dates and
focus on stable structure and slowly evolving trends, not individual papers.";

pub(crate) const PHASE_SYSTEM_PROMPT: &str = "\
You are an expert in design research and AI and know the six-stage design
process of Howard et al. (2008).
You receive notes on papers that relate to ONE design phase.
Write a concise, analytical Markdown section shaped like this:

## <phase name>

### Key themes
- ...

### Recent developments
- ...

### Open research questions
- ...

Assume the reader is an experienced design researcher. No filler.";

pub(crate) fn overview_user_prompt(digest: &str) -> String {
    format!(
        "Here is a sample of papers with year, title, phases and short summaries:\n\n{}\n\n\
         Using this as background, write the overview as specified.",
        digest
    )
}

pub(crate) fn phase_user_prompt(phase: &str, digest: &str) -> String {
    format!(
        "Design phase: {}\n\n\
         Related papers with short summaries and implications:\n\n{}\n\n\
         Write the section for this phase as specified. Use the notes as background \
         knowledge; do not refer to \"the list\" explicitly.",
        phase, digest
    )
}
