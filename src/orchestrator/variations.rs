//! Design variation generation: one prompt fanned out to several models.

use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::{FallbackOrchestrator, OrchestratorError};
use crate::budget::UsageRecord;
use crate::llm::{CompletionRequest, ModelRoute};

/// Default fan-out set, one model per vendor.
pub const DEFAULT_VARIATION_MODELS: [&str; 3] = [
    "anthropic/claude-3.5-haiku",
    "openai/gpt-4o-mini",
    "gemini-2.5-flash",
];

/// Result of one variation branch. Failed branches carry `error` instead of content.
#[derive(Debug, Clone, Serialize)]
pub struct VariationOutcome {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VariationOutcome {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl FallbackOrchestrator {
    /// [`generate_variations`](Self::generate_variations) over
    /// [`DEFAULT_VARIATION_MODELS`].
    pub async fn generate_default_variations(
        &self,
        task_name: &str,
        system_prompt: &str,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<VariationOutcome>, OrchestratorError> {
        let models: Vec<String> = DEFAULT_VARIATION_MODELS
            .iter()
            .map(|m| m.to_string())
            .collect();
        self.generate_variations(task_name, system_prompt, user_text, &models, cancel)
            .await
    }

    /// Run the task's prompt against every model concurrently.
    ///
    /// Each branch makes a single call with no fallback. Branch failures are
    /// reported in the outcome list; only an unknown task fails the whole call.
    /// Outcomes keep the order of `models`.
    pub async fn generate_variations(
        &self,
        task_name: &str,
        system_prompt: &str,
        user_text: &str,
        models: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<VariationOutcome>, OrchestratorError> {
        let task = self
            .tasks
            .get(task_name)
            .ok_or_else(|| OrchestratorError::Configuration(task_name.to_string()))?;

        let request = CompletionRequest::new(system_prompt, user_text, task.options());
        let routes: Vec<ModelRoute> = models.iter().cloned().map(ModelRoute::resolve).collect();

        let branches = routes.iter().map(|model| {
            let request = &request;
            async move { (model, self.provider.complete(model, request, cancel).await) }
        });

        let outcomes: Vec<VariationOutcome> = join_all(branches)
            .await
            .into_iter()
            .map(|(model, result)| match result {
                Ok(completion) => VariationOutcome {
                    model: model.id.clone(),
                    usage: Some(UsageRecord::new(
                        task_name,
                        &model.id,
                        completion.usage,
                        &self.pricing,
                        false,
                    )),
                    content: Some(completion.content),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Variation on {} failed: {}", model, e);
                    VariationOutcome {
                        model: model.id.clone(),
                        content: None,
                        usage: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.is_error()).count();
        tracing::info!(
            "Generated {} design variations for {} ({} failed)",
            outcomes.len() - failed,
            task_name,
            failed
        );

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FallbackPolicy;
    use crate::llm::{ProviderError, TokenUsage};
    use crate::orchestrator::tests::{pricing, tasks, ScriptedProvider};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_partial_success_keeps_other_branches() {
        let provider = Arc::new(
            ScriptedProvider::default()
                .ok("anthropic/claude-sonnet-4", "variation A", TokenUsage::new(100, 900))
                .fail("openai/gpt-4o", ProviderError::http(500, "Internal error"))
                .ok("gemini-2.5-flash", "variation C", TokenUsage::new(100, 700)),
        );
        let orchestrator =
            FallbackOrchestrator::new(provider.clone(), tasks(), pricing(), FallbackPolicy::default());

        let models = vec![
            "anthropic/claude-sonnet-4".to_string(),
            "openai/gpt-4o".to_string(),
            "gemini-2.5-flash".to_string(),
        ];
        let outcomes = orchestrator
            .generate_variations("prd-generation", "sys", "tokens", &models, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].content.as_deref(), Some("variation A"));
        assert!(outcomes[0].usage.as_ref().unwrap().priced);
        assert!(outcomes[1].is_error());
        assert_eq!(outcomes[1].error.as_deref(), Some("Internal error"));
        assert!(outcomes[1].content.is_none());
        assert_eq!(outcomes[2].content.as_deref(), Some("variation C"));

        // One call per model, no fallback substitution.
        let mut calls = provider.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec!["anthropic/claude-sonnet-4", "gemini-2.5-flash", "openai/gpt-4o"]
        );
    }

    #[tokio::test]
    async fn test_default_set_fans_out_to_three_models() {
        let provider = Arc::new(
            ScriptedProvider::default()
                .ok("anthropic/claude-3.5-haiku", "A", TokenUsage::new(1, 1))
                .ok("openai/gpt-4o-mini", "B", TokenUsage::new(1, 1))
                .ok("gemini-2.5-flash", "C", TokenUsage::new(1, 1)),
        );
        let orchestrator =
            FallbackOrchestrator::new(provider.clone(), tasks(), pricing(), FallbackPolicy::default());

        let outcomes = orchestrator
            .generate_default_variations("prd-generation", "sys", "user", &CancellationToken::new())
            .await
            .unwrap();

        let contents: Vec<&str> = outcomes.iter().filter_map(|o| o.content.as_deref()).collect();
        assert_eq!(contents, vec!["A", "B", "C"]);
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_task_rejected() {
        let provider = Arc::new(ScriptedProvider::default());
        let orchestrator =
            FallbackOrchestrator::new(provider, tasks(), pricing(), FallbackPolicy::default());
        let result = orchestrator
            .generate_variations("nope", "s", "u", &["a/b".to_string()], &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(OrchestratorError::Configuration(_))));
    }
}
