use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::loader::LoadedDocument;

use super::chunker::{ChunkInfo, Chunker, ChunkingDegraded};
use super::embedder::Embedder;
use super::store::{StoredChunk, VectorStore};

const BATCH_SIZE: usize = 32;

pub struct Indexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
}

#[derive(Debug, Default)]
pub struct IndexReport {
    pub documents_processed: usize,
    pub pages_processed: usize,
    pub chunks_created: usize,
    /// Length of the stored vectors, 0 when nothing was embedded.
    pub dimensions: usize,
    pub degraded: Vec<ChunkingDegraded>,
}

impl Indexer {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, chunker: Chunker) -> Self {
        Self {
            store,
            embedder,
            chunker,
        }
    }

    /// Chunk, embed and persist every page of `documents`, replacing any
    /// existing index. The previous index is untouched if any document
    /// fails to embed.
    pub async fn index_all(&self, documents: &[LoadedDocument]) -> Result<IndexReport> {
        let mut report = IndexReport::default();
        let mut all_chunks = Vec::new();

        for document in documents {
            info!(
                document = %document.name,
                strategy = self.chunker.strategy_name(),
                "chunking document"
            );

            let mut infos = Vec::new();
            for page in &document.pages {
                let page_chunks = self.chunker.chunk_page(page).await;
                debug!(page = page.number, chunks = page_chunks.chunks.len(), "chunked page");
                infos.extend(page_chunks.chunks);
                report.degraded.extend(page_chunks.degraded);
            }

            let chunks = self
                .embed_chunks(infos)
                .await
                .with_context(|| format!("failed to embed chunks of {}", document.name))?;

            report.documents_processed += 1;
            report.pages_processed += document.pages.len();
            report.chunks_created += chunks.len();
            all_chunks.extend(chunks);
        }

        report.dimensions = all_chunks.first().map_or(0, |c| c.vector.len());
        if report.dimensions != 0 && report.dimensions != self.embedder.dimensions() {
            warn!(
                expected = self.embedder.dimensions(),
                actual = report.dimensions,
                "embedding size differs from configured dimensions"
            );
        }

        self.store.clear().await?;
        self.store.save_chunks(all_chunks).await?;
        self.store.persist().await?;

        info!(
            documents = report.documents_processed,
            chunks = report.chunks_created,
            dimensions = report.dimensions,
            degraded_pages = report.degraded.len(),
            "index built"
        );

        Ok(report)
    }

    /// Embed chunks and return full StoredChunk objects
    async fn embed_chunks(&self, chunk_infos: Vec<ChunkInfo>) -> Result<Vec<StoredChunk>> {
        let mut chunks = Vec::with_capacity(chunk_infos.len());

        for batch in chunk_infos.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            anyhow::ensure!(
                embeddings.len() == batch.len(),
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                batch.len()
            );

            for (info, vector) in batch.iter().zip(embeddings) {
                chunks.push(StoredChunk {
                    id: info.id.clone(),
                    document: info.document.clone(),
                    doc_type: info.doc_type,
                    page: info.page,
                    chunk_index: info.chunk_index,
                    total_chunks_in_page: info.total_chunks_in_page,
                    content: info.content.clone(),
                    vector,
                    hash: info.hash.clone(),
                    updated_at: Utc::now(),
                });
            }
        }

        Ok(chunks)
    }
}
