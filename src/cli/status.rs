use anyhow::Result;
use console::{style, Emoji};

use super::context::build_store;
use crate::config::Settings;
use crate::search::VectorStore;

static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");

pub async fn run_status(settings: &Settings) -> Result<()> {
    let store = build_store(settings);

    if !store.exists() {
        println!("{}No index found at {}", INFO, store.path().display());
        println!("Run `reportlens ingest` to build it.");
        return Ok(());
    }

    store.load().await?;
    let stats = store.stats().await?;
    let documents = store.list_documents().await?;

    println!("\n{}Index Status: {}\n", INFO, store.path().display());
    println!("  Documents:       {}", style(stats.total_documents).green());
    for document in &documents {
        println!("    - {}", style(document).dim());
    }
    println!("  Total chunks:    {}", style(stats.total_chunks).cyan());
    println!("  Forecast chunks: {}", stats.forecast_chunks);
    println!("  Midyear chunks:  {}", stats.midyear_chunks);
    println!(
        "  Index size:      {} KB",
        style(stats.index_size_bytes / 1024).yellow()
    );
    if let Some(updated) = stats.last_updated {
        println!(
            "  Last updated:    {}",
            style(updated.format("%Y-%m-%d %H:%M:%S")).dim()
        );
    }

    Ok(())
}
