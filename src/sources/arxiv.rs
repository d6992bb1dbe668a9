//! arXiv Atom API source

use super::PaperSource;
use crate::config::ArxivConfig;
use crate::paper::PaperRecord;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime, Utc};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

const PUBLISHED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const STORED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Polls the arXiv query API for recent papers matching the configured
/// categories and terms.
pub struct ArxivSource {
    config: ArxivConfig,
}

impl ArxivSource {
    pub fn new(config: ArxivConfig) -> Self {
        Self { config }
    }

    async fn fetch_feed(&self) -> Result<String, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?;
        let max_results = self.config.max_results.to_string();
        let query = build_search_query(&self.config);

        http.get(&self.config.endpoint)
            .query(&[
                ("search_query", query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl PaperSource for ArxivSource {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn fetch(&self) -> Vec<PaperRecord> {
        let body = match self.fetch_feed().await {
            Ok(body) => body,
            Err(e) => {
                warn!(source = "arxiv", error = %e, "feed request failed");
                return Vec::new();
            }
        };

        let papers = parse_atom_feed(&body, Utc::now().naive_utc(), &self.config);
        if papers.is_empty() {
            info!(source = "arxiv", "no recent entries from arXiv");
        } else {
            info!(source = "arxiv", count = papers.len(), "fetched recent papers");
        }
        papers
    }
}

/// `(cat:A OR cat:B ...) AND all:(term OR "multi word term" ...)`
pub fn build_search_query(config: &ArxivConfig) -> String {
    let categories = config
        .categories
        .iter()
        .map(|c| format!("cat:{}", c))
        .collect::<Vec<_>>()
        .join(" OR ");
    let terms = config
        .query_terms
        .iter()
        .map(|t| {
            if t.contains(char::is_whitespace) {
                format!("\"{}\"", t)
            } else {
                t.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ");

    match (categories.is_empty(), terms.is_empty()) {
        (false, false) => format!("({}) AND all:({})", categories, terms),
        (false, true) => format!("({})", categories),
        (true, false) => format!("all:({})", terms),
        (true, true) => "all:*".to_string(),
    }
}

struct AtomPatterns {
    entry: Regex,
    id: Regex,
    title: Regex,
    summary: Regex,
    published: Regex,
    author: Regex,
    category: Regex,
}

fn patterns() -> Option<&'static AtomPatterns> {
    static PATTERNS: OnceLock<Option<AtomPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let tag = |name: &str| Regex::new(&format!(r"(?s)<{0}\b[^>]*>(.*?)</{0}>", name)).ok();
            Some(AtomPatterns {
                entry: tag("entry")?,
                id: tag("id")?,
                title: tag("title")?,
                summary: tag("summary")?,
                published: tag("published")?,
                author: Regex::new(r"(?s)<author\b[^>]*>.*?<name>(.*?)</name>").ok()?,
                category: Regex::new(r#"<category\b[^>]*\bterm="([^"]*)""#).ok()?,
            })
        })
        .as_ref()
}

/// Parse an Atom feed body into candidate records.
///
/// Entries are dropped when their `published` timestamp is unparsable,
/// older than the lookback window, or fail the relevance filter.
pub fn parse_atom_feed(xml: &str, now: NaiveDateTime, config: &ArxivConfig) -> Vec<PaperRecord> {
    let Some(p) = patterns() else {
        warn!("Atom patterns failed to compile");
        return Vec::new();
    };
    let mut papers = Vec::new();

    for entry in p.entry.captures_iter(xml) {
        let body = entry.get(1).map(|m| m.as_str()).unwrap_or_default();
        let field = |re: &Regex| {
            re.captures(body)
                .and_then(|c| c.get(1))
                .map(|m| collapse(&unescape_xml(m.as_str())))
                .unwrap_or_default()
        };

        let id = field(&p.id);
        if id.is_empty() || id.contains("/api/errors") {
            continue;
        }

        let published_raw = field(&p.published);
        let published = match NaiveDateTime::parse_from_str(&published_raw, PUBLISHED_FORMAT) {
            Ok(dt) => dt,
            Err(_) => {
                debug!(id = %id, published = %published_raw, "skipping entry with unparsable date");
                continue;
            }
        };
        if (now - published).num_days() > config.lookback_days {
            continue;
        }

        let title = field(&p.title);
        let abstract_text = field(&p.summary);
        if !is_relevant(&title, &abstract_text, &config.relevance_terms) {
            debug!(id = %id, "skipping off-topic entry");
            continue;
        }

        let authors = p
            .author
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .map(|m| collapse(&unescape_xml(m.as_str())))
            .filter(|a| !a.is_empty())
            .collect();
        let categories = p
            .category
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .map(|m| unescape_xml(m.as_str()))
            .collect();

        papers.push(
            PaperRecord::new(id, title)
                .with_abstract(abstract_text)
                .with_authors(authors)
                .with_year(published.year())
                .with_source("arxiv")
                .with_published(published.format(STORED_FORMAT).to_string())
                .with_categories(categories),
        );
    }
    papers
}

/// Case-insensitive match of any term in title or abstract; no terms accepts all.
fn is_relevant(title: &str, abstract_text: &str, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let haystack = format!("{} {}", title, abstract_text).to_lowercase();
    terms
        .iter()
        .any(|t| !t.trim().is_empty() && haystack.contains(&t.trim().to_lowercase()))
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
