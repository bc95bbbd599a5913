use anyhow::{anyhow, Result};
use chrono::Local;
use console::{style, Emoji};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::context::build_pipeline;
use crate::config::Settings;
use crate::emit::{AnalysisOutput, Metadata, QuestionResult};
use crate::questions;
use crate::rag::PipelineState;

static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "");
static ERROR: Emoji<'_, '_> = Emoji("❌ ", "");
static SAVED: Emoji<'_, '_> = Emoji("💾 ", "");

/// Run the predefined questions. A failed question is recorded in the output
/// file and does not stop the others.
pub async fn run_analyze(
    settings: &Settings,
    only: &[String],
    concurrency: Option<usize>,
) -> Result<()> {
    let selected = questions::select(only)
        .map_err(|unknown| anyhow!("unknown question id(s): {}", unknown.join(", ")))?;
    let concurrency = concurrency.unwrap_or(settings.pipeline.concurrency).max(1);
    let pipeline = build_pipeline(settings, settings.retrieval.top_k).await?;

    info!(questions = selected.len(), concurrency, "starting analysis");

    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let pipeline = &pipeline;
    let progress = &pb;
    let results: Vec<QuestionResult> = stream::iter(selected)
        .map(|question| async move {
            info!(id = question.id, title = question.title, "processing question");
            let outcome = pipeline
                .run(question.question)
                .await
                .map(PipelineState::into_result);
            match &outcome {
                Ok(run) => info!(id = question.id, chunks = run.retrieved_chunk_count, "completed question"),
                Err(err) => warn!(id = question.id, kind = err.kind(), error = %err, "question failed"),
            }
            progress.inc(1);
            progress.set_message(question.id);
            QuestionResult::from_run(question, outcome)
        })
        .buffered(concurrency)
        .collect()
        .await;
    pb.finish_and_clear();

    println!();
    for result in &results {
        match &result.error {
            None => println!(
                "{}{} {} {}",
                SUCCESS,
                style(&result.id).bold(),
                result.title,
                style(format!("({} chunks)", result.retrieved_chunks_count)).dim()
            ),
            Some(err) => println!(
                "{}{} {} {}",
                ERROR,
                style(&result.id).bold(),
                result.title,
                style(&err.message).red()
            ),
        }
    }

    let failed = results.iter().filter(|r| r.is_error()).count();
    let metadata = Metadata::new(settings, pipeline.model_name(), pipeline.top_k(), Local::now());
    let output = AnalysisOutput::new(metadata, results);
    let path = output.save(&settings.paths.outputs_dir)?;

    println!("\n{}Results saved to {}", SAVED, style(path.display()).green());
    if failed > 0 {
        println!("   {} question(s) failed; see the error entries", style(failed).red());
    }

    Ok(())
}
