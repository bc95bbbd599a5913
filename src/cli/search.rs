use anyhow::Result;
use console::{style, Emoji};

use super::context::open_chunk_store;
use crate::config::Settings;
use crate::search::SearchResult;
use crate::types::{excerpt, Chunk, Partition};

static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "");
static FILE: Emoji<'_, '_> = Emoji("📄 ", "");

pub async fn run_search(
    settings: &Settings,
    query: &str,
    partition: Option<Partition>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let store = open_chunk_store(settings).await?;
    let chunks: Vec<Chunk> = store
        .search_text(query, partition, limit)
        .await?
        .into_iter()
        .map(SearchResult::into_chunk)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    if chunks.is_empty() {
        println!("No results found for: {}", style(query).italic());
        return Ok(());
    }

    println!(
        "\n{}Found {} results for: {}\n",
        SEARCH,
        style(chunks.len()).cyan(),
        style(query).yellow().bold()
    );

    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "{} {}. {} {}",
            FILE,
            style(i + 1).dim(),
            style(&chunk.document).green(),
            style(format!("(page {})", chunk.page)).dim()
        );
        println!(
            "   Distance: {} | Partition: {}",
            style(format!("{:.3}", chunk.score)).cyan(),
            chunk.partition
        );
        let preview = chunk.content.split_whitespace().collect::<Vec<_>>().join(" ");
        println!("   {}", style(excerpt(&preview)).dim());
        println!();
    }

    Ok(())
}
