//! Settings loaded from `reportlens.toml` with environment overrides.
//!
//! Resolution order, later wins:
//! 1. Built-in defaults
//! 2. The TOML file: `--config <path>`, else `./reportlens.toml`, else
//!    `<user config dir>/reportlens/reportlens.toml`, whichever exists first
//! 3. `.env` and process environment variables

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "reportlens.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub models: ModelConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub pipeline: PipelineConfig,
    pub paths: PathsConfig,
    pub documents: DocumentsConfig,
    /// Never read from the TOML file; only `OPENAI_API_KEY` sets it.
    #[serde(skip)]
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Ollama,
}

impl std::str::FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: Provider,
    pub llm_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    /// Base URL override; defaults to the provider's public endpoint
    pub endpoint: Option<String>,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            llm_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            endpoint: None,
            temperature: 0.0,
            request_timeout_secs: 120,
            max_retries: 3,
        }
    }
}

impl ModelConfig {
    pub fn base_url(&self) -> String {
        match (&self.endpoint, self.provider) {
            (Some(endpoint), _) => endpoint.trim_end_matches('/').to_string(),
            (None, Provider::OpenAi) => "https://api.openai.com/v1".to_string(),
            (None, Provider::Ollama) => "http://localhost:11434".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters for the fallback splitter
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Try embedding-based sentence grouping before the window splitter
    pub semantic: bool,
    pub breakpoint_percentile: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            semantic: true,
            breakpoint_percentile: 85.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub stage_timeout_secs: Option<u64>,
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: None,
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub index_path: PathBuf,
    pub outputs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data").join("documents"),
            index_path: PathBuf::from("index").join("chunks.json"),
            outputs_dir: PathBuf::from("outputs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    pub forecast_doc_name: String,
    pub midyear_doc_name: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            forecast_doc_name: "outlook-2025".to_string(),
            midyear_doc_name: "mid-year-outlook-2025".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (or the default file if it exists), then apply
    /// `.env` and environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(found) => Self::from_file(&found)?,
                None => Self::default(),
            },
        };

        settings.apply_env(|key| env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply overrides from a variable lookup. Taking a closure keeps tests off
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.openai_api_key = Some(value);
        }
        if let Some(value) = lookup("REPORTLENS_PROVIDER") {
            self.models.provider = value.parse()?;
        }
        if let Some(value) = lookup("REPORTLENS_LLM_MODEL") {
            self.models.llm_model = value;
        }
        if let Some(value) = lookup("REPORTLENS_EMBEDDING_MODEL") {
            self.models.embedding_model = value;
        }
        if let Some(value) = lookup("REPORTLENS_ENDPOINT") {
            self.models.endpoint = Some(value);
        }
        if let Some(value) = lookup("REPORTLENS_TOP_K") {
            self.retrieval.top_k = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|k| *k > 0)
                .ok_or(ConfigError::InvalidEnv {
                    key: "REPORTLENS_TOP_K",
                    value,
                })?;
        }
        if let Some(value) = lookup("REPORTLENS_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("REPORTLENS_INDEX_PATH") {
            self.paths.index_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("REPORTLENS_OUTPUTS_DIR") {
            self.paths.outputs_dir = PathBuf::from(value);
        }
        Ok(())
    }

    /// API key for the configured provider. Ollama needs none.
    pub fn api_key(&self) -> Result<Option<&str>, ConfigError> {
        match self.models.provider {
            Provider::OpenAi => self
                .openai_api_key
                .as_deref()
                .map(Some)
                .ok_or(ConfigError::MissingApiKey),
            Provider::Ollama => Ok(None),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    user_config_path().filter(|path| path.exists())
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reportlens").join(DEFAULT_CONFIG_FILE))
}
