use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use reportlens::config::{ChunkingConfig, DocumentsConfig};
use reportlens::llm::{CompletionRequest, LanguageModel, OutputSchema};
use reportlens::loader::load_documents;
use reportlens::rag::prompts::NOT_MENTIONED_ANSWER;
use reportlens::search::{ChunkStore, Chunker, Embedder, Indexer, JsonStore, VectorStore};
use reportlens::{Partition, PartitionSelection, Pipeline, PipelineError};

/// Embeds text as keyword counts over a tiny fixed vocabulary.
struct KeywordEmbedder;

const VOCABULARY: &[&str] = &["technology", "bond", "inflation", "europe"];

fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut vector: Vec<f32> = VOCABULARY
        .iter()
        .map(|word| lower.matches(word).count() as f32)
        .collect();
    vector.push(0.1);
    vector
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len() + 1
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Routes on wording in the question and answers with a fixed sentence.
#[derive(Default)]
struct KeywordModel {
    completions: AtomicUsize,
}

fn question_of(user_prompt: &str) -> &str {
    user_prompt
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("Question: "))
        .unwrap_or(user_prompt)
}

#[async_trait]
impl LanguageModel for KeywordModel {
    fn model_name(&self) -> &str {
        "keyword"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        self.completions.fetch_add(1, Ordering::SeqCst);
        assert!(request.user.contains("Context from retrieved documents"));
        Ok("Technology leadership was expected [outlook-2025, Page 1].".to_string())
    }

    async fn complete_structured(
        &self,
        request: &CompletionRequest<'_>,
        schema: &OutputSchema,
    ) -> Result<Value> {
        if schema.name != "router_decision" {
            return Err(anyhow!("unexpected schema {}", schema.name));
        }
        let question = question_of(request.user).to_lowercase();
        let document_type = if question.contains("compare") || question.contains(" vs ") {
            "both"
        } else if question.contains("actually") || question.contains("happened") {
            "midyear"
        } else if question.contains("predict") || question.contains("expected") {
            "forecast"
        } else {
            "both"
        };
        Ok(json!({ "document_type": document_type, "reasoning": format!("keyword match: {}", document_type) }))
    }
}

struct Fixture {
    _dir: TempDir,
    store: Arc<JsonStore>,
}

fn write_reports(dir: &TempDir) -> std::path::PathBuf {
    let data = dir.path().join("documents");
    fs::create_dir_all(&data).unwrap();
    fs::write(
        data.join("outlook-2025.txt"),
        "Technology stocks are expected to lead in 2025 as AI spending grows.\u{c}\
         Bond yields should stay elevated while inflation cools.\u{c}\
         Europe may surprise to the upside.",
    )
    .unwrap();
    fs::write(
        data.join("mid-year-outlook-2025.txt"),
        "Technology stocks lagged in the first half as valuations compressed.\u{c}\
         Inflation proved sticky and bond markets sold off.\u{c}\
         Europe outperformed technology benchmarks.",
    )
    .unwrap();
    data
}

async fn indexed_fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let data = write_reports(&dir);
    let documents = load_documents(&data, &DocumentsConfig::default()).unwrap();

    let store = Arc::new(JsonStore::new(dir.path().join("index").join("chunks.json")));
    let chunker = Chunker::window(&ChunkingConfig::default());
    let indexer = Indexer::new(store.clone(), Arc::new(KeywordEmbedder), chunker);
    let report = indexer.index_all(&documents).await.unwrap();
    assert_eq!(report.documents_processed, 2);
    assert_eq!(report.chunks_created, 6);

    Fixture { _dir: dir, store }
}

/// Pipeline over a fresh store instance that loads the persisted index.
async fn pipeline(fixture: &Fixture, model: Arc<KeywordModel>, top_k: usize) -> Pipeline {
    let reopened = Arc::new(JsonStore::new(fixture.store.path().to_path_buf()));
    reopened.load().await.unwrap();
    Pipeline::from_parts(model, ChunkStore::new(reopened, Arc::new(KeywordEmbedder)), top_k)
}

#[tokio::test]
async fn test_forecast_question_reads_forecast_only() {
    let fixture = indexed_fixture().await;
    let pipeline = pipeline(&fixture, Arc::new(KeywordModel::default()), 2).await;

    let state = pipeline
        .run("What did the outlook predict for technology stocks?")
        .await
        .unwrap();

    assert_eq!(state.partition_selection, Some(PartitionSelection::Forecast));
    assert!(!state.retrieved_chunks.is_empty());
    assert!(state.retrieved_chunks.len() <= 2);
    assert!(state
        .retrieved_chunks
        .iter()
        .all(|c| c.partition == Partition::Forecast));
    assert_eq!(state.retrieved_chunks[0].page, 1);
}

#[tokio::test]
async fn test_midyear_question_reads_midyear_only() {
    let fixture = indexed_fixture().await;
    let pipeline = pipeline(&fixture, Arc::new(KeywordModel::default()), 3).await;

    let state = pipeline
        .run("What actually happened to bond markets?")
        .await
        .unwrap();

    assert_eq!(state.partition_selection, Some(PartitionSelection::Midyear));
    assert_eq!(state.retrieved_chunks.len(), 3);
    assert!(state
        .retrieved_chunks
        .iter()
        .all(|c| c.document == "mid-year-outlook-2025"));
}

#[tokio::test]
async fn test_comparison_question_reads_both_ranked() {
    let fixture = indexed_fixture().await;
    let pipeline = pipeline(&fixture, Arc::new(KeywordModel::default()), 2).await;

    let state = pipeline
        .run("Compare the technology forecast vs reality")
        .await
        .unwrap();

    assert_eq!(state.partition_selection, Some(PartitionSelection::Both));
    let chunks = &state.retrieved_chunks;
    assert!(chunks.len() <= 4);
    assert!(chunks.iter().any(|c| c.partition == Partition::Forecast));
    assert!(chunks.iter().any(|c| c.partition == Partition::Midyear));
    assert!(chunks.windows(2).all(|w| w[0].score <= w[1].score));
}

#[tokio::test]
async fn test_citations_match_retrieved_chunks() {
    let fixture = indexed_fixture().await;
    let model = Arc::new(KeywordModel::default());
    let pipeline = pipeline(&fixture, model.clone(), 2).await;

    let state = pipeline
        .run("Compare inflation forecast vs reality")
        .await
        .unwrap();
    let chunks = state.retrieved_chunks.clone();
    let result = state.into_result();

    assert_eq!(result.citations.len(), result.retrieved_chunk_count);
    for (citation, chunk) in result.citations.iter().zip(&chunks) {
        assert_eq!((&citation.document, citation.page), (&chunk.document, chunk.page));
    }
    assert!(result.citations.iter().all(|c| c.page >= 1));
    assert!(result
        .citations
        .iter()
        .all(|c| c.text_excerpt.chars().count() <= 203));
    assert_eq!(model.completions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_routing_is_repeatable() {
    let fixture = indexed_fixture().await;
    let pipeline = pipeline(&fixture, Arc::new(KeywordModel::default()), 2).await;

    let question = "What was expected for Europe?";
    let first = pipeline.run(question).await.unwrap();
    let second = pipeline.run(question).await.unwrap();
    assert_eq!(first.partition_selection, second.partition_selection);
    assert_eq!(first.retrieved_chunks, second.retrieved_chunks);
}

#[tokio::test]
async fn test_missing_index_is_store_unavailable() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::new(dir.path().join("never-built.json")));
    assert!(store.load().await.is_err());

    let model = Arc::new(KeywordModel::default());
    let pipeline = Pipeline::from_parts(
        model.clone(),
        ChunkStore::new(store, Arc::new(KeywordEmbedder)),
        5,
    );

    let err = pipeline.run("What happened?").await.unwrap_err();
    assert!(matches!(err, PipelineError::StoreUnavailable { .. }));
    assert_eq!(model.completions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_partition_answers_not_mentioned() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::new(dir.path().join("chunks.json")));
    // Only a forecast document is indexed.
    let documents = {
        let data = write_reports(&dir);
        fs::remove_file(data.join("mid-year-outlook-2025.txt")).unwrap();
        fs::write(data.join("outlook-2025-appendix.txt"), "Technology appendix.").unwrap();
        load_documents(&data, &DocumentsConfig::default()).unwrap()
    };
    let indexer = Indexer::new(
        store.clone(),
        Arc::new(KeywordEmbedder),
        Chunker::window(&ChunkingConfig::default()),
    );
    indexer.index_all(&documents).await.unwrap();

    let model = Arc::new(KeywordModel::default());
    let pipeline = Pipeline::from_parts(
        model.clone(),
        ChunkStore::new(store, Arc::new(KeywordEmbedder)),
        3,
    );
    let state = pipeline
        .run("What actually happened to technology?")
        .await
        .unwrap();

    assert_eq!(state.partition_selection, Some(PartitionSelection::Midyear));
    assert!(state.retrieved_chunks.is_empty());
    let answer = state.answer.unwrap();
    assert_eq!(answer.answer_text, NOT_MENTIONED_ANSWER);
    assert!(answer.citations.is_empty());
    assert_eq!(model.completions.load(Ordering::SeqCst), 0);
}
