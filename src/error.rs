use std::path::PathBuf;
use thiserror::Error;

use crate::rag::Stage;

/// Fatal failure of a single pipeline run.
///
/// Each variant names the stage it came from so batch drivers can report
/// which part of the run broke.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("chunk store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("routing failed: {cause:#}")]
    RoutingFailure { cause: anyhow::Error },

    #[error("retrieval failed: {cause:#}")]
    RetrievalFailure { cause: anyhow::Error },

    #[error("synthesis failed: {cause:#}")]
    SynthesisFailure { cause: anyhow::Error },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::StoreUnavailable { .. } | PipelineError::RetrievalFailure { .. } => {
                Stage::Retrieving
            }
            PipelineError::RoutingFailure { .. } => Stage::Routing,
            PipelineError::SynthesisFailure { .. } => Stage::Synthesizing,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::StoreUnavailable { .. } => "store_unavailable",
            PipelineError::RoutingFailure { .. } => "routing_failure",
            PipelineError::RetrievalFailure { .. } => "retrieval_failure",
            PipelineError::SynthesisFailure { .. } => "synthesis_failure",
        }
    }
}

/// Errors raised by a [`crate::search::VectorStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no index at {}; run `reportlens ingest` first", path.display())]
    Unavailable { path: PathBuf },

    #[error("index lock poisoned")]
    Poisoned,

    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { .. } => PipelineError::StoreUnavailable {
                reason: err.to_string(),
            },
            other => PipelineError::RetrievalFailure {
                cause: anyhow::Error::new(other),
            },
        }
    }
}

/// Conditions that stop ingestion before any index is written
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("data directory not found: {}; place the extracted report text files there", path.display())]
    MissingDataDir { path: PathBuf },

    #[error(
        "expected at least 2 documents in {}, found {found}; both the forecast and the mid-year report are required",
        path.display()
    )]
    InsufficientDocuments { path: PathBuf, found: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("unsupported model provider '{0}'; use openai or ollama")]
    UnknownProvider(String),

    #[error("OPENAI_API_KEY must be set for the OpenAI provider")]
    MissingApiKey,
}
