use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::llm::{create_language_model, LanguageModel};
use crate::rag::Pipeline;
use crate::search::{create_embedder, ChunkStore, Embedder, JsonStore, VectorStore};

pub fn build_store(settings: &Settings) -> Arc<JsonStore> {
    Arc::new(JsonStore::new(settings.paths.index_path.clone()))
}

pub fn build_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let embedder = create_embedder(&settings.models, settings.api_key()?)?;
    Ok(Arc::from(embedder))
}

pub fn build_model(settings: &Settings) -> Result<Arc<dyn LanguageModel>> {
    let model = create_language_model(&settings.models, settings.api_key()?)?;
    Ok(Arc::from(model))
}

/// Loaded index paired with the query embedder.
pub async fn open_chunk_store(settings: &Settings) -> Result<ChunkStore> {
    let embedder = build_embedder(settings)?;
    let store = build_store(settings);
    store.load().await?;
    Ok(ChunkStore::new(store, embedder))
}

pub async fn build_pipeline(settings: &Settings, top_k: usize) -> Result<Pipeline> {
    anyhow::ensure!(top_k > 0, "top-k must be at least 1");
    let model = build_model(settings)?;
    let store = open_chunk_store(settings).await?;
    let stage_timeout = settings.pipeline.stage_timeout_secs.map(Duration::from_secs);
    Ok(Pipeline::from_parts(model, store, top_k).with_stage_timeout(stage_timeout))
}

pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
