//! Page-level text chunking.
//!
//! Two strategies share the [`ChunkStrategy`] interface: [`SemanticChunker`]
//! groups sentences by embedding similarity, [`WindowChunker`] is a recursive
//! character splitter with overlap. [`Chunker`] tries the configured primary
//! strategy per page and falls back to the window splitter for that page alone
//! when the primary one fails.

use anyhow::{ensure, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

use super::embedder::Embedder;
use super::store::cosine_distance;
use crate::config::ChunkingConfig;
use crate::loader::Page;
use crate::types::Partition;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.?!]\s+").expect("sentence boundary regex is valid"));

const WINDOW_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Raw chunk info before embedding
#[derive(Debug, Clone)]
pub struct ChunkInfo {
    pub id: String,
    pub document: String,
    pub doc_type: Partition,
    pub page: usize,
    pub chunk_index: usize,
    pub total_chunks_in_page: usize,
    pub content: String,
    pub hash: String,
}

/// Recorded when a page had to be split by the fallback strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkingDegraded {
    pub document: String,
    pub page: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct PageChunks {
    pub chunks: Vec<ChunkInfo>,
    pub degraded: Option<ChunkingDegraded>,
}

#[async_trait]
pub trait ChunkStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn split(&self, text: &str) -> Result<Vec<String>>;
}

pub struct Chunker {
    primary: Option<Box<dyn ChunkStrategy>>,
    fallback: WindowChunker,
}

impl Chunker {
    /// Window splitting only
    pub fn window(config: &ChunkingConfig) -> Self {
        Self {
            primary: None,
            fallback: WindowChunker::new(config.chunk_size, config.chunk_overlap),
        }
    }

    pub fn with_primary(config: &ChunkingConfig, primary: Box<dyn ChunkStrategy>) -> Self {
        Self {
            primary: Some(primary),
            fallback: WindowChunker::new(config.chunk_size, config.chunk_overlap),
        }
    }

    pub fn from_config(config: &ChunkingConfig, embedder: Arc<dyn Embedder>) -> Self {
        if config.semantic {
            Self::with_primary(
                config,
                Box::new(SemanticChunker::new(embedder, config.breakpoint_percentile)),
            )
        } else {
            Self::window(config)
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map_or(self.fallback.name(), |p| p.name())
    }

    pub async fn chunk_page(&self, page: &Page) -> PageChunks {
        let mut degraded = None;

        let pieces = match &self.primary {
            Some(primary) => match primary.split(&page.text).await {
                Ok(pieces) => pieces,
                Err(e) => {
                    warn!(
                        document = %page.document,
                        page = page.number,
                        error = %e,
                        "{} chunking failed, falling back to window splitting",
                        primary.name()
                    );
                    degraded = Some(ChunkingDegraded {
                        document: page.document.clone(),
                        page: page.number,
                        reason: format!("{:#}", e),
                    });
                    self.fallback.split_text(&page.text)
                }
            },
            None => self.fallback.split_text(&page.text),
        };

        PageChunks {
            chunks: to_chunk_infos(page, pieces),
            degraded,
        }
    }
}

fn to_chunk_infos(page: &Page, pieces: Vec<String>) -> Vec<ChunkInfo> {
    let pieces: Vec<String> = pieces
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let total = pieces.len();

    pieces
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| ChunkInfo {
            id: format!("{}:{}:{}", page.document, page.number, chunk_index),
            document: page.document.clone(),
            doc_type: page.partition,
            page: page.number,
            chunk_index,
            total_chunks_in_page: total,
            hash: hash_content(&content),
            content,
        })
        .collect()
}

/// Recursive character splitter: splits on the coarsest separator present,
/// recurses into pieces that are still too long, then merges neighbours back
/// up to `chunk_size` characters with `chunk_overlap` characters carried over.
pub struct WindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for WindowChunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl WindowChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, WINDOW_SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split_inclusive(separator)
                .filter(|s| !s.is_empty())
                .collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for split in splits {
            if char_len(split) <= self.chunk_size {
                pending.push(split);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }
            if remaining.is_empty() {
                chunks.push(split.to_string());
            } else {
                chunks.extend(self.split_recursive(split, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    fn merge(&self, splits: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            let len = char_len(split);
            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, &window);
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
            window.push_back(split);
            total += len;
        }

        push_trimmed(&mut chunks, &window);
        chunks
    }
}

#[async_trait]
impl ChunkStrategy for WindowChunker {
    fn name(&self) -> &'static str {
        "window"
    }

    async fn split(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.split_text(text))
    }
}

fn push_trimmed(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Groups consecutive sentences, breaking where the embedding distance between
/// neighbouring sentence windows is above the given percentile.
pub struct SemanticChunker {
    embedder: Arc<dyn Embedder>,
    breakpoint_percentile: f32,
    buffer_size: usize,
}

impl SemanticChunker {
    pub fn new(embedder: Arc<dyn Embedder>, breakpoint_percentile: f32) -> Self {
        Self {
            embedder,
            breakpoint_percentile: breakpoint_percentile.clamp(0.0, 100.0),
            buffer_size: 1,
        }
    }
}

#[async_trait]
impl ChunkStrategy for SemanticChunker {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn split(&self, text: &str) -> Result<Vec<String>> {
        let sentences = split_sentences(text);
        if sentences.len() <= 1 {
            return Ok(sentences.into_iter().map(str::to_string).collect());
        }

        // Each sentence is embedded together with its neighbours to smooth
        // out very short sentences.
        let windows: Vec<String> = (0..sentences.len())
            .map(|i| {
                let start = i.saturating_sub(self.buffer_size);
                let end = (i + self.buffer_size + 1).min(sentences.len());
                sentences[start..end].join(" ")
            })
            .collect();

        let vectors = self.embedder.embed_batch(&windows).await?;
        ensure!(
            vectors.len() == sentences.len(),
            "embedder returned {} vectors for {} sentences",
            vectors.len(),
            sentences.len()
        );

        let distances: Vec<f32> = vectors
            .windows(2)
            .map(|pair| cosine_distance(&pair[0], &pair[1]))
            .collect();
        let threshold = percentile(&distances, self.breakpoint_percentile);

        let mut groups = Vec::new();
        let mut start = 0;
        for (i, distance) in distances.iter().enumerate() {
            if *distance > threshold {
                groups.push(sentences[start..=i].join(" "));
                start = i + 1;
            }
        }
        groups.push(sentences[start..].join(" "));

        Ok(groups)
    }
}

pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        let end = m.start() + 1;
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Linear-interpolated percentile, `p` in `[0, 100]`
fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);

    let rank = p / 100.0 * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f32)
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn page(text: &str) -> Page {
        Page {
            document: "outlook-2025".to_string(),
            partition: Partition::Forecast,
            number: 3,
            text: text.to_string(),
        }
    }

    /// Maps sentences about equities and about bonds to orthogonal vectors.
    struct TopicEmbedder;

    #[async_trait]
    impl Embedder for TopicEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            let equity = lower.matches("equit").count() as f32;
            let bond = lower.matches("bond").count() as f32;
            Ok(vec![equity, bond])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    struct FailingStrategy;

    #[async_trait]
    impl ChunkStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn split(&self, _text: &str) -> Result<Vec<String>> {
            Err(anyhow!("embedding backend unavailable"))
        }
    }

    #[test]
    fn test_window_short_text_is_single_chunk() {
        let chunker = WindowChunker::new(100, 20);
        let chunks = chunker.split_text("A short paragraph.");
        assert_eq!(chunks, vec!["A short paragraph.".to_string()]);
    }

    #[test]
    fn test_window_respects_size_and_overlaps() {
        let chunker = WindowChunker::new(40, 15);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi omicron pi";
        let chunks = chunker.split_text(text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        // Consecutive chunks share at least one word.
        for pair in chunks.windows(2) {
            let last_word = pair[0].split_whitespace().last().unwrap();
            assert!(pair[1].contains(last_word));
        }
    }

    #[test]
    fn test_window_prefers_paragraph_boundaries() {
        let chunker = WindowChunker::new(30, 0);
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = chunker.split_text(text);
        assert_eq!(
            chunks,
            vec![
                "First paragraph here.".to_string(),
                "Second paragraph here.".to_string()
            ]
        );
    }

    #[test]
    fn test_window_splits_unbroken_text_by_characters() {
        let chunker = WindowChunker::new(10, 0);
        let chunks = chunker.split_text(&"x".repeat(25));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("Rates fell. Stocks rose!  Why? Nobody knows");
        assert_eq!(sentences, vec!["Rates fell.", "Stocks rose!", "Why?", "Nobody knows"]);
    }

    #[test]
    fn test_percentile_interpolates() {
        assert_eq!(percentile(&[], 85.0), 0.0);
        assert_eq!(percentile(&[0.4], 85.0), 0.4);
        assert!((percentile(&[0.0, 1.0], 50.0) - 0.5).abs() < 1e-6);
        assert_eq!(percentile(&[3.0, 1.0, 2.0], 100.0), 3.0);
    }

    #[tokio::test]
    async fn test_semantic_breaks_on_topic_shift() {
        let chunker = SemanticChunker::new(Arc::new(TopicEmbedder), 90.0);
        let text = "Equities should lead. Large caps favour equities. \
                    Bond yields stay high. Bond supply grows.";
        let groups = chunker.split(text).await.unwrap();

        assert_eq!(
            groups,
            vec![
                "Equities should lead. Large caps favour equities.".to_string(),
                "Bond yields stay high. Bond supply grows.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_chunker_falls_back_per_page() {
        let config = ChunkingConfig {
            chunk_size: 50,
            chunk_overlap: 10,
            ..ChunkingConfig::default()
        };
        let chunker = Chunker::with_primary(&config, Box::new(FailingStrategy));
        let result = chunker
            .chunk_page(&page("Growth should broaden beyond the largest technology names in 2025."))
            .await;

        let degraded = result.degraded.expect("fallback recorded");
        assert_eq!(degraded.document, "outlook-2025");
        assert_eq!(degraded.page, 3);
        assert!(degraded.reason.contains("embedding backend unavailable"));
        assert!(!result.chunks.is_empty());
    }

    #[tokio::test]
    async fn test_chunk_infos_carry_page_metadata() {
        let chunker = Chunker::window(&ChunkingConfig {
            chunk_size: 30,
            chunk_overlap: 0,
            ..ChunkingConfig::default()
        });
        let result = chunker
            .chunk_page(&page("First paragraph here.\n\nSecond paragraph here."))
            .await;

        assert!(result.degraded.is_none());
        assert_eq!(result.chunks.len(), 2);
        let second = &result.chunks[1];
        assert_eq!(second.id, "outlook-2025:3:1");
        assert_eq!(second.chunk_index, 1);
        assert_eq!(second.total_chunks_in_page, 2);
        assert_eq!(second.doc_type, Partition::Forecast);
        assert_eq!(second.hash.len(), 16);
    }
}
