use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_json_content, CompletionRequest, LanguageModel, OutputSchema};

/// Chat against a local Ollama server; structured output uses its `format` field
pub struct OllamaChat {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OllamaChat {
    pub fn new(endpoint: &str, model: &str, temperature: f32, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Ollama HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    async fn chat(&self, request: &CompletionRequest<'_>, format: Option<&Value>) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.user,
                },
            ],
            stream: false,
            format,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        let resp = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    anyhow!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.endpoint
                    )
                } else {
                    anyhow!("Ollama request failed: {}", e)
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Ollama error ({}): {}", status, text);
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .context("failed to parse Ollama chat response")?;
        Ok(parsed.message.content)
    }
}

#[async_trait]
impl LanguageModel for OllamaChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        self.chat(request, None).await
    }

    async fn complete_structured(
        &self,
        request: &CompletionRequest<'_>,
        schema: &OutputSchema,
    ) -> Result<Value> {
        let content = self.chat(request, Some(&schema.schema)).await?;
        parse_json_content(&content)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Value>,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}
