use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{cosine_distance, IndexStats, SearchResult, StoredChunk, VectorStore};
use crate::error::StoreError;
use crate::types::Partition;

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexData {
    chunks: BTreeMap<String, StoredChunk>,
}

#[derive(Debug, Default)]
struct State {
    data: IndexData,
    /// Set once the index has been loaded from disk or built in-process
    ready: bool,
}

/// Exact-scan vector store persisted as a single JSON file
pub struct JsonStore {
    path: PathBuf,
    state: RwLock<State>,
}

impl JsonStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(State::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }

    fn atomic_write(&self, data: &IndexData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        let json = serde_json::to_vec(data)?;
        fs::write(&temp_path, json)?;
        fs::rename(temp_path, &self.path)?;

        Ok(())
    }
}

#[async_trait]
impl VectorStore for JsonStore {
    async fn save_chunks(&self, chunks: Vec<StoredChunk>) -> Result<(), StoreError> {
        let mut state = self.write()?;
        for chunk in chunks {
            state.data.chunks.insert(chunk.id.clone(), chunk);
        }
        state.ready = true;
        Ok(())
    }

    async fn ensure_ready(&self) -> Result<(), StoreError> {
        if self.read()?.ready {
            Ok(())
        } else {
            Err(StoreError::Unavailable {
                path: self.path.clone(),
            })
        }
    }

    async fn search(
        &self,
        query_vector: &[f32],
        partition: Option<Partition>,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let state = self.read()?;
        if !state.ready {
            return Err(StoreError::Unavailable {
                path: self.path.clone(),
            });
        }

        let mut results: Vec<SearchResult> = state
            .data
            .chunks
            .values()
            .filter(|chunk| partition.map_or(true, |p| chunk.doc_type == p))
            .map(|chunk| {
                let distance = cosine_distance(query_vector, &chunk.vector);
                SearchResult::new(chunk.clone(), distance)
            })
            .collect();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(limit);

        Ok(results)
    }

    async fn list_documents(&self) -> Result<Vec<String>, StoreError> {
        let state = self.read()?;
        let documents: BTreeSet<&str> = state
            .data
            .chunks
            .values()
            .map(|c| c.document.as_str())
            .collect();
        Ok(documents.into_iter().map(str::to_string).collect())
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let state = self.read()?;
        self.atomic_write(&state.data)
    }

    async fn load(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Err(StoreError::Unavailable {
                path: self.path.clone(),
            });
        }

        let content = fs::read(&self.path)?;
        let loaded: IndexData = serde_json::from_slice(&content)?;

        let mut state = self.write()?;
        state.data = loaded;
        state.ready = true;

        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, StoreError> {
        let state = self.read()?;
        let chunks = &state.data.chunks;

        let index_size_bytes = if self.path.exists() {
            fs::metadata(&self.path)?.len()
        } else {
            0
        };

        let total_documents = chunks
            .values()
            .map(|c| c.document.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let forecast_chunks = chunks
            .values()
            .filter(|c| c.doc_type == Partition::Forecast)
            .count();

        Ok(IndexStats {
            total_documents,
            total_chunks: chunks.len(),
            forecast_chunks,
            midyear_chunks: chunks.len() - forecast_chunks,
            index_size_bytes,
            last_updated: chunks.values().map(|c| c.updated_at).max(),
        })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.data.chunks.clear();
        state.ready = false;

        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }

        Ok(())
    }
}
