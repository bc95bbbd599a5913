//! Question answering over the indexed reports: route, retrieve, synthesize.

mod pipeline;
pub mod prompts;
mod retriever;
mod router;
mod state;
mod synthesizer;

pub use pipeline::{Pipeline, Stage};
pub use retriever::Retriever;
pub use router::{Router, RouterDecision};
pub use state::{PipelineState, RunResult, StateUpdate};
pub use synthesizer::{citations_for, render_context, Synthesizer};
