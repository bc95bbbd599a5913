use std::sync::Arc;
use tracing::info;

use super::prompts::{synthesis_user_prompt, NOT_MENTIONED_ANSWER, SYNTHESIS_SYSTEM_PROMPT};
use crate::error::PipelineError;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::types::{Answer, Chunk, Citation};

const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Turns retrieved chunks into a cited answer
#[derive(Clone)]
pub struct Synthesizer {
    model: Arc<dyn LanguageModel>,
}

impl Synthesizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn synthesize(&self, question: &str, chunks: &[Chunk]) -> Result<Answer, PipelineError> {
        if chunks.is_empty() {
            info!("no chunks retrieved, answering without the model");
            return Ok(Answer {
                answer_text: NOT_MENTIONED_ANSWER.to_string(),
                citations: Vec::new(),
            });
        }

        let context = render_context(chunks);
        let user = synthesis_user_prompt(&context, question);
        let request = CompletionRequest {
            system: SYNTHESIS_SYSTEM_PROMPT,
            user: &user,
        };

        let answer_text = self
            .model
            .complete(&request)
            .await
            .map_err(|cause| PipelineError::SynthesisFailure { cause })?;

        info!(citations = chunks.len(), "answer synthesized");

        Ok(Answer {
            answer_text,
            citations: citations_for(chunks),
        })
    }
}

/// Every chunk tagged with its `[document, Page n]` source, in retrieval order.
pub fn render_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("[{}, Page {}]\n{}\n", chunk.document, chunk.page, chunk.content))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// One citation per chunk shown to the model, whether or not the answer
/// refers to it.
pub fn citations_for(chunks: &[Chunk]) -> Vec<Citation> {
    chunks.iter().map(Citation::from_chunk).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OutputSchema;
    use crate::types::Partition;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingModel {
        calls: AtomicUsize,
        last_user: Mutex<String>,
        fail: bool,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_user.lock().unwrap() = request.user.to_string();
            if self.fail {
                return Err(anyhow!("request timed out"));
            }
            Ok("Equities were expected to lead [outlook-2025, Page 2].".to_string())
        }

        async fn complete_structured(
            &self,
            _request: &CompletionRequest<'_>,
            _schema: &OutputSchema,
        ) -> Result<Value> {
            Err(anyhow!("structured output not expected"))
        }
    }

    fn chunk(document: &str, page: usize, content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            document: document.to_string(),
            page,
            partition: Partition::classify(document),
            score: 0.2,
        }
    }

    #[test]
    fn test_render_context_tags_and_separates() {
        let context = render_context(&[
            chunk("outlook-2025", 2, "Equities lead."),
            chunk("mid-year-outlook-2025", 7, "Equities lagged."),
        ]);
        assert_eq!(
            context,
            "[outlook-2025, Page 2]\nEquities lead.\n\n---\n[mid-year-outlook-2025, Page 7]\nEquities lagged.\n"
        );
    }

    #[tokio::test]
    async fn test_citations_mirror_every_chunk() {
        let model = Arc::new(RecordingModel::default());
        let synthesizer = Synthesizer::new(model.clone());
        let long = "x".repeat(250);
        let chunks = vec![
            chunk("outlook-2025", 2, "Equities lead."),
            chunk("mid-year-outlook-2025", 7, &long),
            chunk("outlook-2025", 9, "Never mentioned in the answer."),
        ];

        let answer = synthesizer.synthesize("What was expected?", &chunks).await.unwrap();

        assert_eq!(answer.citations.len(), chunks.len());
        for (citation, chunk) in answer.citations.iter().zip(&chunks) {
            assert_eq!(citation.document, chunk.document);
            assert_eq!(citation.page, chunk.page);
        }
        assert_eq!(answer.citations[1].text_excerpt, format!("{}...", "x".repeat(200)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        let user = model.last_user.lock().unwrap();
        assert!(user.contains("[outlook-2025, Page 9]"));
        assert!(user.contains("Question: What was expected?"));
    }

    #[tokio::test]
    async fn test_empty_context_states_absence_without_model() {
        let model = Arc::new(RecordingModel::default());
        let synthesizer = Synthesizer::new(model.clone());

        let answer = synthesizer.synthesize("What happened?", &[]).await.unwrap();
        assert_eq!(answer.answer_text, NOT_MENTIONED_ANSWER);
        assert!(answer.citations.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_synthesis_failure() {
        let synthesizer = Synthesizer::new(Arc::new(RecordingModel {
            fail: true,
            ..RecordingModel::default()
        }));
        let err = synthesizer
            .synthesize("q", &[chunk("outlook-2025", 1, "text")])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SynthesisFailure { .. }));
    }
}
