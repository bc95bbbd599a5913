//! Language-model backends.
//!
//! The pipeline only sees [`LanguageModel`]: free-text completion for the
//! synthesizer and schema-constrained completion for the router.

mod ollama;
mod openai;

pub use ollama::OllamaChat;
pub use openai::OpenAiChat;

use anyhow::{Context, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::{ModelConfig, Provider};

/// System and user instructions for one model call
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
}

/// JSON schema the model output must conform to
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

impl OutputSchema {
    /// Self-contained schema for `T`: `$defs` references are inlined, since
    /// strict structured output rejects a `$ref` with sibling keywords.
    pub fn of<T: JsonSchema>(name: &'static str) -> Self {
        let mut schema = schemars::schema_for!(T).to_value();
        let mut defs = Map::new();
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
            if let Some(Value::Object(found)) = obj.remove("$defs") {
                defs = found;
            }
        }
        inline_refs(&mut schema, &defs);
        Self { name, schema }
    }
}

fn inline_refs(value: &mut Value, defs: &Map<String, Value>) {
    match value {
        Value::Object(obj) => {
            let target = obj
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/$defs/"))
                .and_then(|name| defs.get(name))
                .cloned();
            if let Some(Value::Object(def)) = target {
                obj.remove("$ref");
                for (key, entry) in def {
                    obj.entry(key).or_insert(entry);
                }
            }
            for entry in obj.values_mut() {
                inline_refs(entry, defs);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, defs);
            }
        }
        _ => {}
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;

    async fn complete_structured(
        &self,
        request: &CompletionRequest<'_>,
        schema: &OutputSchema,
    ) -> Result<Value>;
}

/// Schema-constrained call decoded into `T`. Output that does not deserialize
/// is an error, never a default.
pub async fn complete_as<T>(
    model: &dyn LanguageModel,
    request: &CompletionRequest<'_>,
    name: &'static str,
) -> Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = OutputSchema::of::<T>(name);
    let value = model.complete_structured(request, &schema).await?;
    serde_json::from_value(value.clone())
        .with_context(|| format!("model output does not match the {} schema: {}", name, value))
}

pub fn create_language_model(
    config: &ModelConfig,
    api_key: Option<&str>,
) -> Result<Box<dyn LanguageModel>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    match config.provider {
        Provider::OpenAi => {
            let key = api_key
                .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY must be set for the OpenAI provider"))?;
            Ok(Box::new(OpenAiChat::new(
                key,
                &config.base_url(),
                &config.llm_model,
                config.temperature,
                timeout,
            )?))
        }
        Provider::Ollama => Ok(Box::new(OllamaChat::new(
            &config.base_url(),
            &config.llm_model,
            config.temperature,
            timeout,
        )?)),
    }
}

/// Parse structured output that arrived as message text.
fn parse_json_content(content: &str) -> Result<Value> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim()).context("model returned invalid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PartitionSelection;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct Decision {
        document_type: PartitionSelection,
        reasoning: String,
    }

    struct Canned(Value);

    #[async_trait]
    impl LanguageModel for Canned {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String> {
            Ok(self.0.to_string())
        }

        async fn complete_structured(
            &self,
            _request: &CompletionRequest<'_>,
            _schema: &OutputSchema,
        ) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    const REQUEST: CompletionRequest<'static> = CompletionRequest {
        system: "system",
        user: "user",
    };

    #[test]
    fn test_schema_lists_fields_and_enum_values() {
        let schema = OutputSchema::of::<Decision>("decision");
        let text = schema.schema.to_string();
        assert!(schema.schema.get("$schema").is_none());
        assert!(text.contains("document_type"));
        assert!(text.contains("reasoning"));
        assert!(text.contains("\"midyear\""));
        assert!(text.contains("\"both\""));
    }

    /// Paths of objects holding a `$ref`.
    fn refs(value: &Value, path: &str, found: &mut Vec<String>) {
        match value {
            Value::Object(obj) => {
                if obj.contains_key("$ref") {
                    found.push(path.to_string());
                }
                for (key, entry) in obj {
                    refs(entry, &format!("{}/{}", path, key), found);
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    refs(item, &format!("{}/{}", path, i), found);
                }
            }
            _ => {}
        }
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Described {
        /// Which document(s) to query
        document_type: PartitionSelection,
        /// Fallback choice
        fallback: Option<PartitionSelection>,
    }

    #[test]
    fn test_schema_inlines_referenced_definitions() {
        let schema = OutputSchema::of::<Described>("described").schema;
        let mut found = Vec::new();
        refs(&schema, "", &mut found);
        assert!(found.is_empty(), "unresolved $ref at {:?}", found);
        assert!(schema.get("$defs").is_none());

        let field = &schema["properties"]["document_type"];
        assert_eq!(field["description"], "Which document(s) to query");
        assert_eq!(field["enum"], serde_json::json!(["forecast", "midyear", "both"]));
    }

    #[tokio::test]
    async fn test_complete_as_decodes_conforming_output() {
        let model = Canned(serde_json::json!({
            "document_type": "forecast",
            "reasoning": "asks what was expected"
        }));
        let decision: Decision = complete_as(&model, &REQUEST, "decision").await.unwrap();
        assert_eq!(decision.document_type, PartitionSelection::Forecast);
    }

    #[tokio::test]
    async fn test_complete_as_rejects_unknown_enum_value() {
        let model = Canned(serde_json::json!({
            "document_type": "neither",
            "reasoning": "?"
        }));
        let err = complete_as::<Decision>(&model, &REQUEST, "decision")
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("decision schema"));
    }

    #[test]
    fn test_parse_json_content_strips_fences() {
        let value = parse_json_content("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value["a"], 1);
        assert!(parse_json_content("not json").is_err());
    }
}
