use anyhow::{Context, Result};
use std::sync::Arc;

use super::embedder::Embedder;
use super::store::{SearchResult, VectorStore};
use crate::error::StoreError;
use crate::types::Partition;

/// Text-level view over a [`VectorStore`]: embeds queries with the same
/// embedder that built the index, then runs a partition-filtered search.
#[derive(Clone)]
pub struct ChunkStore {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl ChunkStore {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub async fn ensure_ready(&self) -> Result<(), StoreError> {
        self.store.ensure_ready().await
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(query)
            .await
            .context("failed to embed query")
    }

    /// Search with an already embedded query
    pub async fn search_vector(
        &self,
        query_vector: &[f32],
        partition: Option<Partition>,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        self.store.search(query_vector, partition, limit).await
    }

    /// Embed `query` and search. Store errors stay typed inside the returned
    /// `anyhow::Error` so callers can downcast to [`StoreError`].
    pub async fn search_text(
        &self,
        query: &str,
        partition: Option<Partition>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let query_vector = self.embed_query(query).await?;
        Ok(self.search_vector(&query_vector, partition, limit).await?)
    }
}
