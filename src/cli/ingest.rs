use anyhow::Result;
use console::{style, Emoji};
use tracing::info;

use super::context::{build_embedder, build_store, spinner};
use crate::config::Settings;
use crate::loader::load_documents;
use crate::search::{Chunker, Indexer, VectorStore};

static INDEXING: Emoji<'_, '_> = Emoji("📊 ", "");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "");
static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");

pub async fn run_ingest(settings: &Settings, force: bool) -> Result<()> {
    let store = build_store(settings);

    if store.exists() && !force {
        println!("{}Index already exists at {}", INFO, store.path().display());
        println!("Run `reportlens ingest --force` to rebuild it.");
        return Ok(());
    }

    let documents = load_documents(&settings.paths.data_dir, &settings.documents)?;
    for document in &documents {
        println!(
            "{}{} ({}): {} pages, {}",
            INFO,
            style(&document.name).bold(),
            document.partition,
            document.total_pages,
            style(document.path.display()).dim()
        );
    }

    let embedder = build_embedder(settings)?;
    embedder.health_check().await?;

    let chunker = Chunker::from_config(&settings.chunking, embedder.clone());
    info!(strategy = chunker.strategy_name(), "chunker ready");
    let indexer = Indexer::new(store.clone(), embedder, chunker);

    let pb = spinner(format!(
        "{}Indexing {} documents from {}...",
        INDEXING,
        documents.len(),
        settings.paths.data_dir.display()
    ));
    let report = indexer.index_all(&documents).await;
    pb.finish_and_clear();
    let report = report?;

    println!("\n{}Ingestion complete!\n", SUCCESS);
    println!(
        "  Documents:       {}",
        style(report.documents_processed).green()
    );
    println!("  Pages:           {}", report.pages_processed);
    println!("  Chunks created:  {}", style(report.chunks_created).cyan());
    println!("  Vector size:     {}", report.dimensions);

    if !report.degraded.is_empty() {
        println!(
            "\n{}Pages chunked with the window fallback ({}):",
            WARN,
            report.degraded.len()
        );
        for degraded in report.degraded.iter().take(10) {
            println!(
                "  - {} page {}: {}",
                degraded.document,
                degraded.page,
                style(&degraded.reason).yellow()
            );
        }
        if report.degraded.len() > 10 {
            println!("  ... and {} more", report.degraded.len() - 10);
        }
    }

    let stats = store.stats().await?;
    println!("\n{}Index Statistics:", INFO);
    println!("  Forecast chunks: {}", stats.forecast_chunks);
    println!("  Midyear chunks:  {}", stats.midyear_chunks);
    println!("  Index size:      {} KB", stats.index_size_bytes / 1024);

    Ok(())
}
