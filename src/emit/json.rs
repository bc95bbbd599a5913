use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::PipelineError;
use crate::questions::Question;
use crate::rag::RunResult;
use crate::types::{Citation, PartitionSelection};

#[derive(Serialize)]
pub struct AnalysisOutput {
    pub metadata: Metadata,
    /// Keyed by question id
    pub results: BTreeMap<String, QuestionResult>,
}

#[derive(Serialize)]
pub struct Metadata {
    pub generated_at: DateTime<Local>,
    pub model: String,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub top_k: usize,
}

impl Metadata {
    /// `model` and `top_k` are what the runs actually used.
    pub fn new(
        settings: &Settings,
        model: &str,
        top_k: usize,
        generated_at: DateTime<Local>,
    ) -> Self {
        Self {
            generated_at,
            model: model.to_string(),
            embedding_model: settings.models.embedding_model.clone(),
            chunk_size: settings.chunking.chunk_size,
            top_k,
        }
    }
}

#[derive(Serialize)]
pub struct Routing {
    pub document_type: Option<PartitionSelection>,
    pub reasoning: String,
}

#[derive(Serialize)]
pub struct QuestionResult {
    pub id: String,
    pub title: String,
    pub question: String,
    pub routing: Routing,
    pub answer: Option<String>,
    pub citations: Vec<Citation>,
    pub retrieved_chunks_count: usize,
    /// Set when the run failed; the other fields are then empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

#[derive(Serialize)]
pub struct RunError {
    pub kind: &'static str,
    pub stage: &'static str,
    pub message: String,
}

impl QuestionResult {
    pub fn from_run(question: &Question, outcome: Result<RunResult, PipelineError>) -> Self {
        match outcome {
            Ok(run) => Self {
                id: question.id.to_string(),
                title: question.title.to_string(),
                question: question.question.to_string(),
                routing: Routing {
                    document_type: run.partition_selection,
                    reasoning: run.routing_reasoning,
                },
                answer: Some(run.answer_text),
                citations: run.citations,
                retrieved_chunks_count: run.retrieved_chunk_count,
                error: None,
            },
            Err(err) => Self {
                id: question.id.to_string(),
                title: question.title.to_string(),
                question: question.question.to_string(),
                routing: Routing {
                    document_type: None,
                    reasoning: String::new(),
                },
                answer: None,
                citations: Vec::new(),
                retrieved_chunks_count: 0,
                error: Some(RunError {
                    kind: err.kind(),
                    stage: err.stage().as_str(),
                    message: err.to_string(),
                }),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl AnalysisOutput {
    pub fn new(metadata: Metadata, results: Vec<QuestionResult>) -> Self {
        Self {
            metadata,
            results: results.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Write to `outputs_dir/analysis_results_<YYYYmmdd_HHMMSS>.json`, creating
    /// the directory if needed.
    pub fn save(&self, outputs_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(outputs_dir)
            .with_context(|| format!("failed to create {}", outputs_dir.display()))?;

        let path = outputs_dir.join(output_file_name(&self.metadata.generated_at));
        fs::write(&path, self.to_json())
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(path)
    }
}

pub fn output_file_name(generated_at: &DateTime<Local>) -> String {
    format!("analysis_results_{}.json", generated_at.format("%Y%m%d_%H%M%S"))
}
