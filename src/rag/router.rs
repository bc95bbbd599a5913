use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::prompts::{router_user_prompt, ROUTER_SYSTEM_PROMPT};
use crate::error::PipelineError;
use crate::llm::{complete_as, CompletionRequest, LanguageModel};
use crate::types::PartitionSelection;

/// Structured output of the routing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RouterDecision {
    /// Which document(s) to query: forecast, midyear, or both
    pub document_type: PartitionSelection,
    /// Brief explanation of the routing decision
    pub reasoning: String,
}

/// Picks the partition(s) a question is answered from
#[derive(Clone)]
pub struct Router {
    model: Arc<dyn LanguageModel>,
}

impl Router {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn route(&self, question: &str) -> Result<RouterDecision, PipelineError> {
        let user = router_user_prompt(question);
        let request = CompletionRequest {
            system: ROUTER_SYSTEM_PROMPT,
            user: &user,
        };

        let decision: RouterDecision =
            complete_as(self.model.as_ref(), &request, "router_decision")
                .await
                .map_err(|cause| PipelineError::RoutingFailure { cause })?;

        info!(
            document_type = %decision.document_type,
            reasoning = %decision.reasoning,
            "router decision"
        );

        Ok(decision)
    }
}
