//! Paper sources
//!
//! A source returns unenriched candidate records. Sources never fail the
//! run: network or parse problems are logged and yield no records.

mod arxiv;
mod bibtex;

pub use arxiv::{build_search_query, parse_atom_feed, ArxivSource};
pub use bibtex::{parse_bibtex, BibtexSource};

use crate::paper::PaperRecord;
use async_trait::async_trait;

/// Something that can be polled for candidate papers.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Stable name used for per-source caps and diagnostics.
    fn name(&self) -> &str;

    /// Fetch candidates. Failures are logged and produce an empty list.
    async fn fetch(&self) -> Vec<PaperRecord>;
}

/// A source that always returns the same records (replays, tests).
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    records: Vec<PaperRecord>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, records: Vec<PaperRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

#[async_trait]
impl PaperSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Vec<PaperRecord> {
        self.records.clone()
    }
}
