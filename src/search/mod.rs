pub mod chunker;
pub mod embedder;
pub mod indexer;
pub mod searcher;
pub mod store;

pub use chunker::{ChunkInfo, ChunkStrategy, Chunker, ChunkingDegraded, SemanticChunker, WindowChunker};
pub use embedder::{create_embedder, Embedder};
pub use indexer::{IndexReport, Indexer};
pub use searcher::ChunkStore;
pub use store::{IndexStats, JsonStore, SearchResult, StoredChunk, VectorStore};
