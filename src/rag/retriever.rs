use tracing::info;

use crate::error::PipelineError;
use crate::search::{ChunkStore, SearchResult};
use crate::types::{Chunk, Partition, PartitionSelection};

/// Partition-aware top-k retrieval over a [`ChunkStore`]
#[derive(Clone)]
pub struct Retriever {
    store: ChunkStore,
}

impl Retriever {
    pub fn new(store: ChunkStore) -> Self {
        Self { store }
    }

    /// Chunks for `question`, best match first.
    ///
    /// A single partition yields at most `k` chunks. `Both` searches each
    /// partition for `k`, concatenates forecast before midyear, re-ranks the
    /// union by distance (stable, so ties keep that order) and keeps up to
    /// `2k`. No selection searches the whole index for `k`.
    pub async fn retrieve(
        &self,
        question: &str,
        selection: Option<PartitionSelection>,
        k: usize,
    ) -> Result<Vec<Chunk>, PipelineError> {
        self.store.ensure_ready().await?;

        let query_vector = self
            .store
            .embed_query(question)
            .await
            .map_err(|cause| PipelineError::RetrievalFailure { cause })?;

        let results = match selection {
            Some(PartitionSelection::Both) => {
                let mut merged = self.search(&query_vector, Some(Partition::Forecast), k).await?;
                merged.extend(self.search(&query_vector, Some(Partition::Midyear), k).await?);
                merged.sort_by(|a, b| a.distance.total_cmp(&b.distance));
                merged.truncate(k * 2);
                merged
            }
            Some(PartitionSelection::Forecast) => {
                self.search(&query_vector, Some(Partition::Forecast), k).await?
            }
            Some(PartitionSelection::Midyear) => {
                self.search(&query_vector, Some(Partition::Midyear), k).await?
            }
            None => self.search(&query_vector, None, k).await?,
        };

        let chunks: Vec<Chunk> = results.into_iter().map(SearchResult::into_chunk).collect();

        info!(
            selection = selection.map_or("unfiltered", |s| s.as_str()),
            retrieved = chunks.len(),
            "retrieved chunks"
        );

        Ok(chunks)
    }

    async fn search(
        &self,
        query_vector: &[f32],
        partition: Option<Partition>,
        k: usize,
    ) -> Result<Vec<SearchResult>, PipelineError> {
        self.store
            .search_vector(query_vector, partition, k)
            .await
            .map_err(PipelineError::from)
    }
}
