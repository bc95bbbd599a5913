use anyhow::Result;
use console::{style, Emoji};

use super::context::{build_pipeline, spinner};
use crate::config::Settings;
use crate::rag::RunResult;

static THINKING: Emoji<'_, '_> = Emoji("🤔 ", "");
static ROUTE: Emoji<'_, '_> = Emoji("🧭 ", "");
static FILE: Emoji<'_, '_> = Emoji("📄 ", "");

pub async fn run_ask(
    settings: &Settings,
    question: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let pipeline = build_pipeline(settings, top_k.unwrap_or(settings.retrieval.top_k)).await?;

    let pb = spinner(format!("{}Answering...", THINKING));
    let outcome = pipeline.run(question).await;
    pb.finish_and_clear();
    let result = outcome?.into_result();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(())
}

fn print_result(result: &RunResult) {
    let selection = result
        .partition_selection
        .map_or("unrouted", |s| s.as_str());
    println!(
        "\n{}Routed to {}: {}",
        ROUTE,
        style(selection).cyan().bold(),
        style(&result.routing_reasoning).dim()
    );
    println!(
        "   {} chunks retrieved\n",
        style(result.retrieved_chunk_count).cyan()
    );

    println!("{}\n", result.answer_text);

    if result.citations.is_empty() {
        return;
    }

    println!("{}", style("Sources").bold());
    for (i, citation) in result.citations.iter().enumerate() {
        println!(
            "{} {}. {} {}",
            FILE,
            style(i + 1).dim(),
            style(&citation.document).green(),
            style(format!("(page {})", citation.page)).dim()
        );
        let preview = citation
            .text_excerpt
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        println!("   {}", style(preview).dim());
    }
}
