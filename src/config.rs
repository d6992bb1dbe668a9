//! Pipeline configuration
//!
//! Everything is plain scalar configuration, loaded once from YAML and then
//! threaded into the coordinator. Only the binary reads the environment
//! (via [`Config::with_env_overrides`]); library components never do.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "design-lit.yaml";

/// Environment variable holding the model API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding the bibliography export URL.
pub const BIB_URL_ENV: &str = "PAPERPILE_BIB_URL";

/// Static framing block placed above the generated overview.
pub const DEFAULT_OVERVIEW_PREAMBLE: &str = "\
# AI & Design Research – Living Overview

> This overview is regenerated automatically from the classified paper
> database. Papers are classified into the six design phases of Howard et
> al. (2008): Establishing a need, Analysis of task, Concept design,
> Embodiment design, Detail design and Implementation. The sections below
> are machine-written and describe slowly evolving trends, not individual
> papers. See `by_design_phase.md` for the per-phase breakdown.
";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSONL record store
    pub store_path: PathBuf,
    /// Directory receiving `overview.md` and `by_design_phase.md`
    pub output_dir: PathBuf,
    /// Newly discovered records enriched per source per run; the rest wait
    pub max_new_per_source: usize,
    pub arxiv: ArxivConfig,
    pub bibtex: BibtexConfig,
    pub llm: LlmConfig,
    pub synthesis: SynthesisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/papers_structured.jsonl"),
            output_dir: PathBuf::from("knowledge"),
            max_new_per_source: 25,
            arxiv: ArxivConfig::default(),
            bibtex: BibtexConfig::default(),
            llm: LlmConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

/// arXiv Atom feed settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    pub enabled: bool,
    pub endpoint: String,
    /// Entries published more than this many days ago are ignored
    pub lookback_days: i64,
    /// Result cap requested from the feed
    pub max_results: usize,
    /// arXiv category filter, OR-ed together
    pub categories: Vec<String>,
    /// Search terms, OR-ed together and AND-ed with the categories
    pub query_terms: Vec<String>,
    /// Case-insensitive topical filter on title/abstract; empty accepts all
    pub relevance_terms: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        let terms: Vec<String> = [
            "design",
            "designer",
            "design research",
            "human-computer interaction",
            "creativity",
            "generative design",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            enabled: true,
            endpoint: "http://export.arxiv.org/api/query".to_string(),
            lookback_days: 365,
            max_results: 30,
            categories: ["cs.AI", "cs.HC", "cs.LG", "stat.ML"]
                .into_iter()
                .map(String::from)
                .collect(),
            query_terms: terms.clone(),
            relevance_terms: terms,
            timeout_secs: 30,
        }
    }
}

/// BibTeX export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BibtexConfig {
    pub enabled: bool,
    pub path: PathBuf,
    /// When set, the export is downloaded to `path` before parsing
    pub download_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BibtexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("data/paperpile.bib"),
            download_url: None,
            timeout_secs: 30,
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub classify_model: String,
    pub summarize_model: String,
    pub timeout_secs: u64,
    /// Filled from the environment; never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            classify_model: "gpt-4o-mini".to_string(),
            summarize_model: "gpt-4.1-mini".to_string(),
            timeout_secs: 60,
            api_key: None,
        }
    }
}

/// Synthesis document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Reproduced verbatim at the top of `overview.md`
    pub overview_preamble: String,
    /// Most recent records included in the overview digest
    pub overview_limit: usize,
    /// Most recent records included in each phase digest
    pub phase_limit: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            overview_preamble: DEFAULT_OVERVIEW_PREAMBLE.to_string(),
            overview_limit: 80,
            phase_limit: 30,
        }
    }
}

impl Config {
    /// Parse YAML; missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Resolve the config: an explicit path must exist; otherwise the first
    /// of `./design-lit.yaml` and `<config dir>/design-lit/config.yaml`
    /// that exists; otherwise defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        for candidate in Self::search_paths() {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("design-lit").join("config.yaml"));
        }
        paths
    }

    /// Overlay credentials and URLs from an environment lookup.
    ///
    /// Values already set in the file win for the download URL; the API
    /// key always comes from the environment when present.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if self.bibtex.download_url.is_none() {
            self.bibtex.download_url = lookup(BIB_URL_ENV).filter(|u| !u.trim().is_empty());
        }
        self
    }
}
