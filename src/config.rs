//! TOML configuration parsing and validation.
//!
//! Every section is optional. A missing config file is not an error: the
//! caller gets [`Config::default`] and a warning, so `coursebot` runs with
//! a local Ollama out of the box.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use coursebot_core::backend::BackendKind;
use coursebot_core::strategy::{StrategyKind, StrategyParams, DEFAULT_TOP_N, DEFAULT_WINDOW_SIZE};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("courses.jsonl")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            top_n: default_top_n(),
            window_size: default_window_size(),
        }
    }
}

impl RetrievalConfig {
    pub fn params(&self) -> StrategyParams {
        StrategyParams {
            top_n: self.top_n,
            window_size: self.window_size,
        }
    }
}

fn default_strategy() -> String {
    "top_n".to_string()
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            url: None,
            batch_size: default_batch_size(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_embedding_retries(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_embedding_provider() -> String {
    "ollama".to_string()
}
fn default_embedding_model() -> Option<String> {
    Some("nomic-embed-text".to_string())
}
fn default_batch_size() -> usize {
    64
}
fn default_embedding_timeout() -> u64 {
    30
}
fn default_embedding_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_generation_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub ollama: OllamaGenerationConfig,
    #[serde(default = "RemoteApiConfig::openai")]
    pub openai: RemoteApiConfig,
    #[serde(default = "RemoteApiConfig::gemini")]
    pub gemini: RemoteApiConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            timeout_secs: default_generation_timeout(),
            max_retries: default_generation_retries(),
            ollama: OllamaGenerationConfig::default(),
            openai: RemoteApiConfig::openai(),
            gemini: RemoteApiConfig::gemini(),
        }
    }
}

fn default_backend() -> String {
    "ollama".to_string()
}
fn default_generation_timeout() -> u64 {
    60
}
fn default_generation_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct OllamaGenerationConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaGenerationConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}
fn default_ollama_model() -> String {
    "phi3".to_string()
}

/// Endpoint, model and API-key variable for a hosted completion API.
///
/// Defaults apply only when the whole table is omitted; a table that is
/// present must set all three fields.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteApiConfig {
    pub url: String,
    pub model: String,
    pub api_key_env: String,
}

impl RemoteApiConfig {
    fn openai() -> Self {
        Self {
            url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }

    fn gemini() -> Self {
        Self {
            url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }

    /// The API key, if its environment variable is set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn strategy_kind(&self) -> Result<StrategyKind> {
        Ok(self.retrieval.strategy.parse()?)
    }

    pub fn backend_kind(&self) -> Result<BackendKind> {
        Ok(self.generation.backend.parse()?)
    }

    /// Check value ranges and closed name sets.
    pub fn validate(&self) -> Result<()> {
        self.strategy_kind()
            .context("retrieval.strategy is invalid")?;
        self.backend_kind()
            .context("generation.backend is invalid")?;

        if self.retrieval.top_n == 0 {
            bail!("retrieval.top_n must be >= 1");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "ollama" | "openai" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be disabled, ollama, or openai.",
                other
            ),
        }

        if self.embedding.is_enabled() {
            if self.embedding.model.as_deref().map_or(true, str::is_empty) {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.batch_size == 0 {
                bail!("embedding.batch_size must be >= 1");
            }
            if self.embedding.timeout_secs == 0 {
                bail!("embedding.timeout_secs must be > 0");
            }
        }

        if self.generation.timeout_secs == 0 {
            bail!("generation.timeout_secs must be > 0");
        }

        Ok(())
    }
}

/// Parse and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
///
/// The boolean is `false` when the defaults were used.
pub fn load_config_or_default(path: &Path) -> Result<(Config, bool)> {
    if !path.exists() {
        return Ok((Config::default(), false));
    }
    Ok((load_config(path)?, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.catalog.path, PathBuf::from("courses.jsonl"));
        assert_eq!(config.strategy_kind().unwrap(), StrategyKind::TopN);
        assert_eq!(config.backend_kind().unwrap(), BackendKind::Ollama);
        assert_eq!(config.retrieval.top_n, 3);
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.generation.ollama.model, "phi3");
        assert_eq!(config.generation.gemini.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
[catalog]
path = "data/courses.jsonl"

[retrieval]
strategy = "window"
top_n = 4
window_size = 2

[embedding]
provider = "disabled"

[generation]
backend = "gemini"
timeout_secs = 10

[generation.gemini]
url = "http://localhost:9999"
model = "gemini-test"
api_key_env = "TEST_GEMINI_KEY"
"#,
        )
        .unwrap();
        assert_eq!(config.strategy_kind().unwrap(), StrategyKind::Window);
        assert_eq!(config.retrieval.params().window_size, 2);
        assert!(!config.embedding.is_enabled());
        assert_eq!(config.backend_kind().unwrap(), BackendKind::Gemini);
        assert_eq!(config.generation.gemini.model, "gemini-test");
        assert_eq!(config.generation.openai.model, "gpt-4o-mini");
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let err = parse("[retrieval]\nstrategy = \"Window\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("unknown strategy: Window"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = parse("[generation]\nbackend = \"foo\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("unknown backend: foo"));
    }

    #[test]
    fn test_zero_top_n_rejected() {
        assert!(parse("[retrieval]\ntop_n = 0\n").is_err());
    }

    #[test]
    fn test_unknown_embedding_provider_rejected() {
        let err = parse("[embedding]\nprovider = \"cohere\"\n").unwrap_err();
        assert!(err.to_string().contains("cohere"));
    }

    #[test]
    fn test_disabled_embedding_skips_model_check() {
        assert!(parse("[embedding]\nprovider = \"disabled\"\nmodel = \"\"\n").is_ok());
        assert!(parse("[embedding]\nprovider = \"ollama\"\nmodel = \"\"\n").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (config, found) = load_config_or_default(&tmp.path().join("nope.toml")).unwrap();
        assert!(!found);
        assert_eq!(config.generation.backend, "ollama");
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[retrieval\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
