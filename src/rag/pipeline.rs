use anyhow::anyhow;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, Instrument};

use super::retriever::Retriever;
use super::router::Router;
use super::state::{PipelineState, StateUpdate};
use super::synthesizer::Synthesizer;
use crate::error::PipelineError;
use crate::llm::LanguageModel;
use crate::search::ChunkStore;

/// Position of a run in the fixed route → retrieve → synthesize sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Routing,
    Retrieving,
    Synthesizing,
    Done,
}

impl Stage {
    pub fn next(self) -> Self {
        match self {
            Stage::Routing => Stage::Retrieving,
            Stage::Retrieving => Stage::Synthesizing,
            Stage::Synthesizing | Stage::Done => Stage::Done,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Routing => "routing",
            Stage::Retrieving => "retrieving",
            Stage::Synthesizing => "synthesizing",
            Stage::Done => "done",
        }
    }

    fn timed_out(self, limit: Duration) -> PipelineError {
        let cause = anyhow!("{} stage timed out after {:?}", self.as_str(), limit);
        match self {
            Stage::Routing => PipelineError::RoutingFailure { cause },
            Stage::Retrieving => PipelineError::RetrievalFailure { cause },
            Stage::Synthesizing | Stage::Done => PipelineError::SynthesisFailure { cause },
        }
    }
}

/// Answers one question at a time. Runs share nothing but the components,
/// so a single `Pipeline` can serve concurrent runs.
#[derive(Clone)]
pub struct Pipeline {
    router: Router,
    retriever: Retriever,
    synthesizer: Synthesizer,
    top_k: usize,
    stage_timeout: Option<Duration>,
}

impl Pipeline {
    pub fn new(router: Router, retriever: Retriever, synthesizer: Synthesizer, top_k: usize) -> Self {
        Self {
            router,
            retriever,
            synthesizer,
            top_k,
            stage_timeout: None,
        }
    }

    /// Router and synthesizer share one model.
    pub fn from_parts(model: Arc<dyn LanguageModel>, store: ChunkStore, top_k: usize) -> Self {
        Self::new(
            Router::new(model.clone()),
            Retriever::new(store),
            Synthesizer::new(model),
            top_k,
        )
    }

    pub fn with_stage_timeout(mut self, limit: Option<Duration>) -> Self {
        self.stage_timeout = limit;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Model that writes the answers
    pub fn model_name(&self) -> &str {
        self.synthesizer.model_name()
    }

    /// Route, retrieve and synthesize, in that order. The first failing
    /// stage ends the run; nothing partial is returned.
    pub async fn run(&self, question: &str) -> Result<PipelineState, PipelineError> {
        let mut state = PipelineState::new(question);
        let mut stage = Stage::Routing;
        info!(run_id = %state.run_id, question, "run started");

        loop {
            let span = info_span!("stage", run_id = %state.run_id, stage = stage.as_str());
            let update = match stage {
                Stage::Routing => self.bounded(stage, self.route(&state)).instrument(span).await?,
                Stage::Retrieving => {
                    self.bounded(stage, self.retrieve(&state)).instrument(span).await?
                }
                Stage::Synthesizing => {
                    self.bounded(stage, self.synthesize(&state)).instrument(span).await?
                }
                Stage::Done => {
                    info!(
                        run_id = %state.run_id,
                        chunks = state.retrieved_chunks.len(),
                        "run finished"
                    );
                    return Ok(state);
                }
            };
            state = state.apply(update);
            stage = stage.next();
        }
    }

    async fn route(&self, state: &PipelineState) -> Result<StateUpdate, PipelineError> {
        let decision = self.router.route(&state.question).await?;
        Ok(StateUpdate::Routed {
            selection: decision.document_type,
            reasoning: decision.reasoning,
        })
    }

    async fn retrieve(&self, state: &PipelineState) -> Result<StateUpdate, PipelineError> {
        let chunks = self
            .retriever
            .retrieve(&state.question, state.partition_selection, self.top_k)
            .await?;
        Ok(StateUpdate::Retrieved(chunks))
    }

    async fn synthesize(&self, state: &PipelineState) -> Result<StateUpdate, PipelineError> {
        let answer = self
            .synthesizer
            .synthesize(&state.question, &state.retrieved_chunks)
            .await?;
        Ok(StateUpdate::Synthesized(answer))
    }

    async fn bounded<F>(&self, stage: Stage, work: F) -> Result<StateUpdate, PipelineError>
    where
        F: Future<Output = Result<StateUpdate, PipelineError>>,
    {
        match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| stage.timed_out(limit))?,
            None => work.await,
        }
    }
}
