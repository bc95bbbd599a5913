mod ollama;
mod openai;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::config::{ModelConfig, Provider};

/// Text to vector. The same embedder must be used for ingestion and queries.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn dimensions(&self) -> usize;
    async fn health_check(&self) -> Result<()>;
}

pub fn create_embedder(config: &ModelConfig, api_key: Option<&str>) -> Result<Box<dyn Embedder>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    match config.provider {
        Provider::Ollama => Ok(Box::new(OllamaEmbedder::new(
            &config.base_url(),
            &config.embedding_model,
            config.embedding_dimensions,
            timeout,
        )?)),
        Provider::OpenAi => {
            let key = api_key
                .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY must be set for the OpenAI provider"))?;
            Ok(Box::new(OpenAiEmbedder::new(
                key,
                &config.base_url(),
                &config.embedding_model,
                config.embedding_dimensions,
                timeout,
                config.max_retries,
            )?))
        }
    }
}
