//! reportlens: question answering over a year-ahead forecast report and its
//! mid-year review.
//!
//! A question is routed to the forecast, the mid-year review or both, the
//! matching chunks are retrieved from a partitioned vector index, and a
//! language model writes an answer citing document and page for every chunk
//! it was shown.

pub mod cli;
pub mod config;
pub mod emit;
pub mod error;
pub mod llm;
pub mod loader;
pub mod questions;
pub mod rag;
pub mod search;
pub mod types;

pub use error::{ConfigError, IngestError, PipelineError, StoreError};
pub use rag::{Pipeline, PipelineState, RunResult, Stage};
pub use types::{Answer, Chunk, Citation, Partition, PartitionSelection};
