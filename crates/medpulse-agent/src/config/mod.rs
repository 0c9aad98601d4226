//! Configuration loading for Medpulse.
//! Reads medpulse.toml from the current directory, the path in the
//! MEDPULSE_CONFIG env var, or the path given on the command line.
//! Every field has a default, so a missing file means a default run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use medpulse_common::paper::KNOWN_FIELDS;
use medpulse_common::{MedpulseError, Result};
use medpulse_ingestion::aggregator::SourceSettings;
use medpulse_ingestion::topics::DEFAULT_TOPICS;
use medpulse_ingestion::SearchSettings;
use medpulse_llm::huggingface::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL};
use medpulse_llm::{BackendRegistry, HuggingFaceSettings};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "medpulse.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
    #[serde(default = "default_limit_per_source")]
    pub limit_per_source: usize,
    #[serde(default = "default_topic_delay_ms")]
    pub topic_delay_ms: u64,
    /// PubMed publication-date window; 0 disables it.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
    #[serde(default = "default_true")]
    pub dedupe_across_topics: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_topics() -> Vec<String> {
    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
}
fn default_limit_per_source()     -> usize { 3 }
fn default_topic_delay_ms()       -> u64   { 1000 }
fn default_lookback_days()        -> u32   { 1 }
fn default_request_timeout_secs() -> u64   { 30 }
fn default_true()                 -> bool  { true }
fn default_required_fields() -> Vec<String> {
    vec!["title".to_string(), "abstract".to_string()]
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            topics: default_topics(),
            limit_per_source: default_limit_per_source(),
            topic_delay_ms: default_topic_delay_ms(),
            lookback_days: default_lookback_days(),
            required_fields: default_required_fields(),
            dedupe_across_topics: true,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_true")]
    pub pubmed: bool,
    #[serde(default = "default_true")]
    pub clinicaltrials: bool,
    #[serde(default = "default_true")]
    pub medrxiv: bool,
    pub pubmed_api_key: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self { pubmed: true, clinicaltrials: true, medrxiv: true, pubmed_api_key: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Pool keys, e.g. `huggingface_flan_t5`.
    #[serde(default = "BackendRegistry::default_keys")]
    pub models: Vec<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_api_key_env()      -> String { DEFAULT_API_KEY_ENV.to_string() }
fn default_base_url()         -> String { DEFAULT_BASE_URL.to_string() }
fn default_chunk_size()       -> usize  { 1500 }
fn default_max_input_chars()  -> usize  { 2048 }
fn default_retry_delay_secs() -> u64    { 20 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            models: BackendRegistry::default_keys(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            chunk_size: default_chunk_size(),
            max_input_chars: default_max_input_chars(),
            retry_delay_secs: default_retry_delay_secs(),
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_true")]
    pub pdf: bool,
    #[serde(default = "default_true")]
    pub csv: bool,
}

fn default_output_dir() -> PathBuf { PathBuf::from("results") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir(), pdf: true, csv: true }
    }
}

#[cfg(test)]
mod tests;

impl Config {
    /// Resolves the config path: explicit argument, then MEDPULSE_CONFIG,
    /// then `medpulse.toml` in the working directory.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(p) => p.to_path_buf(),
            None => std::env::var("MEDPULSE_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    /// Loads and validates the configuration. A missing file yields the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file not found: {}; using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| MedpulseError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| MedpulseError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(MedpulseError::Config(msg));

        if self.search.topics.is_empty() {
            return invalid("search.topics must not be empty".into());
        }
        if self.search.topics.iter().any(|t| t.trim().is_empty()) {
            return invalid("search.topics contains a blank topic".into());
        }
        if self.search.limit_per_source == 0 {
            return invalid("search.limit_per_source must be at least 1".into());
        }
        if self.search.request_timeout_secs == 0 {
            return invalid("search.request_timeout_secs must be positive".into());
        }
        if let Some(f) = self
            .search
            .required_fields
            .iter()
            .find(|f| !KNOWN_FIELDS.contains(&f.as_str()))
        {
            return invalid(format!(
                "search.required_fields: unknown field '{f}' (expected one of {})",
                KNOWN_FIELDS.join(", ")
            ));
        }
        if !(self.sources.pubmed || self.sources.clinicaltrials || self.sources.medrxiv) {
            return invalid("at least one source must be enabled".into());
        }
        if self.llm.models.is_empty() {
            return invalid("llm.models must not be empty".into());
        }
        if self.llm.chunk_size == 0 || self.llm.max_input_chars == 0 {
            return invalid("llm.chunk_size and llm.max_input_chars must be positive".into());
        }
        if self.llm.chunk_size > self.llm.max_input_chars {
            return invalid(format!(
                "llm.chunk_size ({}) must not exceed llm.max_input_chars ({})",
                self.llm.chunk_size, self.llm.max_input_chars
            ));
        }
        if self.llm.api_key_env.trim().is_empty() {
            return invalid("llm.api_key_env must name an environment variable".into());
        }
        if self.output.dir.as_os_str().is_empty() {
            return invalid("output.dir must not be empty".into());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.search.request_timeout_secs)
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            topics: self.search.topics.clone(),
            limit_per_source: self.search.limit_per_source,
            topic_delay: Duration::from_millis(self.search.topic_delay_ms),
            required_fields: self.search.required_fields.clone(),
            dedupe_across_topics: self.search.dedupe_across_topics,
        }
    }

    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            pubmed: self.sources.pubmed,
            clinicaltrials: self.sources.clinicaltrials,
            medrxiv: self.sources.medrxiv,
            pubmed_api_key: self.sources.pubmed_api_key.clone(),
            lookback_days: Some(self.search.lookback_days).filter(|d| *d > 0),
            timeout: self.request_timeout(),
        }
    }

    pub fn huggingface_settings(&self) -> HuggingFaceSettings {
        HuggingFaceSettings {
            base_url: self.llm.base_url.clone(),
            api_key_env: self.llm.api_key_env.clone(),
            chunk_size: self.llm.chunk_size,
            max_input_chars: self.llm.max_input_chars,
            retry_delay: Duration::from_secs(self.llm.retry_delay_secs),
            timeout: self.request_timeout(),
        }
    }
}
