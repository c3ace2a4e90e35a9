use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Directory holding one JSON record per processed document.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./data/documents")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnrichmentConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            summary_max_tokens: default_summary_max_tokens(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_summary_max_tokens() -> u32 {
    500
}

impl EnrichmentConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeConfig {
    /// Maximum entries returned by a knowledge search.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
        }
    }
}

fn default_search_limit() -> usize {
    20
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.knowledge.search_limit < 1 {
        anyhow::bail!("knowledge.search_limit must be >= 1");
    }

    if config.enrichment.timeout_secs == 0 {
        anyhow::bail!("enrichment.timeout_secs must be > 0");
    }

    match config.enrichment.provider.as_str() {
        "disabled" => {}
        "openai" => {
            if config.enrichment.model.trim().is_empty() {
                anyhow::bail!("enrichment.model must be specified when provider is 'openai'");
            }
            if std::env::var("OPENAI_API_KEY").is_err() {
                anyhow::bail!("OPENAI_API_KEY environment variable not set");
            }
        }
        other => anyhow::bail!(
            "Unknown enrichment provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}
