//! BibTeX export source
//!
//! Reads a reference-manager export, optionally refreshing it from a
//! download URL first. Entries without a title are ignored.

use super::PaperSource;
use crate::config::BibtexConfig;
use crate::paper::PaperRecord;
use crate::storage::{write_atomic, StorageError};
use async_trait::async_trait;
use regex_lite::{Captures, Regex};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
enum DownloadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Write(#[from] StorageError),
}

pub struct BibtexSource {
    config: BibtexConfig,
}

impl BibtexSource {
    pub fn new(config: BibtexConfig) -> Self {
        Self { config }
    }

    async fn download(&self, url: &str) -> Result<usize, DownloadError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?;
        let body = http.get(url).send().await?.error_for_status()?.bytes().await?;
        write_atomic(&self.config.path, &body)?;
        Ok(body.len())
    }
}

#[async_trait]
impl PaperSource for BibtexSource {
    fn name(&self) -> &str {
        "bibtex"
    }

    async fn fetch(&self) -> Vec<PaperRecord> {
        if let Some(url) = self.config.download_url.as_deref().filter(|u| !u.trim().is_empty()) {
            match self.download(url).await {
                Ok(bytes) => info!(path = %self.config.path.display(), bytes, "downloaded BibTeX export"),
                Err(e) => warn!(error = %e, "BibTeX download failed, using existing file"),
            }
        }

        let text = match tokio::fs::read_to_string(&self.config.path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %self.config.path.display(), error = %e, "BibTeX file not readable");
                return Vec::new();
            }
        };

        let papers = parse_bibtex(&text);
        info!(path = %self.config.path.display(), count = papers.len(), "loaded BibTeX entries");
        papers
    }
}

/// Convert BibTeX text into candidate records.
///
/// `@comment`, `@string` and `@preamble` blocks are skipped, as is any
/// entry without a title.
pub fn parse_bibtex(text: &str) -> Vec<PaperRecord> {
    parse_entries(text)
        .into_iter()
        .filter_map(|entry| {
            let record = entry.to_record();
            if record.is_none() {
                debug!(key = %entry.key, "skipping BibTeX entry without title");
            }
            record
        })
        .collect()
}

#[derive(Debug)]
struct RawEntry {
    key: String,
    fields: Vec<(String, String)>,
}

impl RawEntry {
    fn field(&self, name: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| clean_latex(v))
            .filter(|v| !v.is_empty())
    }

    fn to_record(&self) -> Option<PaperRecord> {
        let title = self.field("title")?;

        let base = if self.key.is_empty() { title.as_str() } else { self.key.as_str() };
        let id = format!("bib:{}", base.replace(' ', "_"));

        let authors = self
            .field("author")
            .map(|a| {
                a.split(" and ")
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let source = self
            .field("journal")
            .or_else(|| self.field("booktitle"))
            .or_else(|| self.field("publisher"))
            .unwrap_or_else(|| "bibtex".to_string());

        let year = self
            .field("year")
            .and_then(|y| y.parse::<i32>().ok())
            .unwrap_or(0);
        let published = if year != 0 { year.to_string() } else { String::new() };

        Some(
            PaperRecord::new(id, title)
                .with_abstract(self.field("abstract").unwrap_or_default())
                .with_authors(authors)
                .with_year(year)
                .with_source(source)
                .with_published(published)
                .with_categories(vec!["bibtex".to_string()]),
        )
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Advance past the matching `close`, assuming `open` was just consumed.
    fn skip_group(&mut self, open: char, close: char) {
        let mut depth = 1;
        while let Some(c) = self.bump() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Contents of a `{...}` group with nested braces kept; `{` already consumed.
    fn read_braced(&mut self) -> String {
        let mut out = String::new();
        let mut depth = 1;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            out.push(c);
        }
        out
    }

    /// Contents of a `"..."` string; quotes inside braces do not terminate it.
    fn read_quoted(&mut self) -> String {
        let mut out = String::new();
        let mut depth = 0;
        while let Some(c) = self.bump() {
            match c {
                '"' if depth == 0 => break,
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            out.push(c);
        }
        out
    }

    /// A field value: braced, quoted or bare parts joined with `#`.
    fn read_value(&mut self, close: char) -> String {
        let mut value = String::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('{') => {
                    self.pos += 1;
                    value.push_str(&self.read_braced());
                }
                Some('"') => {
                    self.pos += 1;
                    value.push_str(&self.read_quoted());
                }
                Some(_) => {
                    value.push_str(&self.take_while(|c| {
                        c != ',' && c != close && c != '#' && !c.is_whitespace()
                    }));
                }
                None => break,
            }
            self.skip_ws();
            if self.peek() == Some('#') {
                self.pos += 1;
            } else {
                break;
            }
        }
        value
    }
}

fn parse_entries(text: &str) -> Vec<RawEntry> {
    let mut cur = Cursor {
        chars: text.chars().collect(),
        pos: 0,
    };
    let mut entries = Vec::new();

    while let Some(c) = cur.bump() {
        if c != '@' {
            continue;
        }
        let kind = cur
            .take_while(|c| c.is_ascii_alphanumeric() || c == '_')
            .to_ascii_lowercase();
        cur.skip_ws();
        let (open, close) = match cur.peek() {
            Some('{') => ('{', '}'),
            Some('(') => ('(', ')'),
            _ => continue,
        };
        cur.pos += 1;

        if kind.is_empty() || matches!(kind.as_str(), "comment" | "string" | "preamble") {
            cur.skip_group(open, close);
            continue;
        }
        entries.push(parse_body(&mut cur, close));
    }
    entries
}

fn parse_body(cur: &mut Cursor, close: char) -> RawEntry {
    cur.skip_ws();
    let key = cur
        .take_while(|c| c != ',' && c != close)
        .trim()
        .to_string();
    let mut fields = Vec::new();

    if cur.bump() == Some(close) {
        return RawEntry { key, fields };
    }

    loop {
        cur.skip_ws();
        match cur.peek() {
            None => break,
            Some(c) if c == close => {
                cur.pos += 1;
                break;
            }
            _ => {}
        }

        let name = cur
            .take_while(|c| c != '=' && c != ',' && c != close)
            .trim()
            .to_ascii_lowercase();
        if cur.peek() == Some('=') {
            cur.pos += 1;
            let value = cur.read_value(close);
            if !name.is_empty() {
                fields.push((name, value));
            }
        }

        cur.skip_ws();
        if cur.peek() == Some(',') {
            cur.pos += 1;
        }
    }
    RawEntry { key, fields }
}

struct LatexPatterns {
    accent: Regex,
    font_switch: Regex,
    command_arg: Regex,
    bare_command: Regex,
}

fn latex_patterns() -> Option<&'static LatexPatterns> {
    static PATTERNS: OnceLock<Option<LatexPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(LatexPatterns {
                accent: Regex::new(r#"\\(["'`^~=.])\s*\{?\s*([A-Za-z])\}?"#).ok()?,
                font_switch: Regex::new(r"\{\\[A-Za-z]+\s+([^{}]*)\}").ok()?,
                command_arg: Regex::new(r"\\[A-Za-z]+\s*\{([^{}]*)\}").ok()?,
                bare_command: Regex::new(r"\\([A-Za-z]+)").ok()?,
            })
        })
        .as_ref()
}

fn accented(accent: &str, letter: char) -> Option<char> {
    let c = match (accent, letter) {
        ("\"", 'a') => 'ä',
        ("\"", 'o') => 'ö',
        ("\"", 'u') => 'ü',
        ("\"", 'e') => 'ë',
        ("\"", 'i') => 'ï',
        ("\"", 'A') => 'Ä',
        ("\"", 'O') => 'Ö',
        ("\"", 'U') => 'Ü',
        ("'", 'a') => 'á',
        ("'", 'e') => 'é',
        ("'", 'i') => 'í',
        ("'", 'o') => 'ó',
        ("'", 'u') => 'ú',
        ("'", 'E') => 'É',
        ("`", 'a') => 'à',
        ("`", 'e') => 'è',
        ("`", 'o') => 'ò',
        ("^", 'a') => 'â',
        ("^", 'e') => 'ê',
        ("^", 'o') => 'ô',
        ("~", 'n') => 'ñ',
        ("~", 'a') => 'ã',
        ("~", 'o') => 'õ',
        _ => return None,
    };
    Some(c)
}

/// Reduce LaTeX markup in a field value to plain text.
fn clean_latex(raw: &str) -> String {
    let text = match latex_patterns() {
        Some(p) => expand_macros(raw, p),
        None => raw.to_string(),
    };
    text.replace(['{', '}'], "")
        .replace('~', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn expand_macros(raw: &str, p: &LatexPatterns) -> String {
    let text = p.accent.replace_all(raw, |caps: &Captures| {
        let letter = caps[2].chars().next().unwrap_or_default();
        accented(&caps[1], letter).unwrap_or(letter).to_string()
    });
    let text = text
        .replace("\\ss", "ß")
        .replace("\\c{c}", "ç")
        .replace("\\&", "&")
        .replace("\\%", "%")
        .replace("\\_", "_")
        .replace("\\$", "$")
        .replace("---", "—")
        .replace("--", "–");

    let mut text = p.font_switch.replace_all(&text, "$1").into_owned();
    loop {
        let next = p.command_arg.replace_all(&text, "$1").into_owned();
        if next == text {
            break;
        }
        text = next;
    }
    p.bare_command.replace_all(&text, "$1").into_owned()
}
