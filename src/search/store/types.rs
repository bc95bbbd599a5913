use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Chunk, Partition};

/// A chunk as persisted in the index, vector included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub document: String,
    pub doc_type: Partition,
    pub page: usize,
    pub chunk_index: usize,
    pub total_chunks_in_page: usize,
    pub content: String,
    pub vector: Vec<f32>,
    pub hash: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: StoredChunk,
    /// Cosine distance; lower is closer
    pub distance: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub forecast_chunks: usize,
    pub midyear_chunks: usize,
    pub index_size_bytes: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl SearchResult {
    pub fn new(chunk: StoredChunk, distance: f32) -> Self {
        Self { chunk, distance }
    }

    pub fn into_chunk(self) -> Chunk {
        Chunk {
            content: self.chunk.content,
            document: self.chunk.document,
            page: self.chunk.page,
            partition: self.chunk.doc_type,
            score: self.distance,
        }
    }
}
