mod json;
mod types;

pub use json::JsonStore;
pub use types::{IndexStats, SearchResult, StoredChunk};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::Partition;

/// Persisted nearest-neighbour index over [`StoredChunk`]s.
///
/// Building (`save_chunks`/`persist`/`clear`) and querying are separate phases;
/// a store that was neither built nor loaded refuses to search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn save_chunks(&self, chunks: Vec<StoredChunk>) -> Result<(), StoreError>;

    /// `Unavailable` unless the index has been built or loaded.
    async fn ensure_ready(&self) -> Result<(), StoreError>;

    /// Up to `limit` results in ascending distance order. `partition` restricts
    /// the candidate set before ranking.
    async fn search(
        &self,
        query_vector: &[f32],
        partition: Option<Partition>,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError>;

    async fn list_documents(&self) -> Result<Vec<String>, StoreError>;
    async fn persist(&self) -> Result<(), StoreError>;
    async fn load(&self) -> Result<(), StoreError>;
    async fn stats(&self) -> Result<IndexStats, StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// `1 - cosine_similarity`, in `[0, 2]`
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}
