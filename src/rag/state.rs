use serde::Serialize;
use uuid::Uuid;

use crate::types::{Answer, Chunk, Citation, PartitionSelection};

/// Everything one question run has accumulated so far.
///
/// Owned by a single run. Stages never mutate it in place: each returns a
/// [`StateUpdate`] and the pipeline folds it in with [`PipelineState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    pub run_id: Uuid,
    pub question: String,
    pub partition_selection: Option<PartitionSelection>,
    pub routing_reasoning: String,
    pub retrieved_chunks: Vec<Chunk>,
    pub answer: Option<Answer>,
}

/// Fields produced by one stage
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Routed {
        selection: PartitionSelection,
        reasoning: String,
    },
    Retrieved(Vec<Chunk>),
    Synthesized(Answer),
}

impl PipelineState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            question: question.into(),
            partition_selection: None,
            routing_reasoning: String::new(),
            retrieved_chunks: Vec::new(),
            answer: None,
        }
    }

    /// Merge a stage's output; untouched fields carry over.
    pub fn apply(self, update: StateUpdate) -> Self {
        match update {
            StateUpdate::Routed {
                selection,
                reasoning,
            } => Self {
                partition_selection: Some(selection),
                routing_reasoning: reasoning,
                ..self
            },
            StateUpdate::Retrieved(chunks) => Self {
                retrieved_chunks: chunks,
                ..self
            },
            StateUpdate::Synthesized(answer) => Self {
                answer: Some(answer),
                ..self
            },
        }
    }

    /// Caller-facing view of a finished run.
    pub fn into_result(self) -> RunResult {
        let retrieved_chunk_count = self.retrieved_chunks.len();
        let (answer_text, citations) = match self.answer {
            Some(answer) => (answer.answer_text, answer.citations),
            None => (String::new(), Vec::new()),
        };
        RunResult {
            run_id: self.run_id,
            question: self.question,
            partition_selection: self.partition_selection,
            routing_reasoning: self.routing_reasoning,
            answer_text,
            citations,
            retrieved_chunk_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub question: String,
    pub partition_selection: Option<PartitionSelection>,
    pub routing_reasoning: String,
    pub answer_text: String,
    pub citations: Vec<Citation>,
    pub retrieved_chunk_count: usize,
}
