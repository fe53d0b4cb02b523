//! Fallback orchestrator: runs a named task on its primary model and
//! substitutes the fallback model once if the primary fails.
//!
//! ```text
//!   execute(task) ──► TaskRegistry ──► primary ──ok──► UsageRecord
//!                                        │
//!                                       err
//!                                        ▼
//!                                     fallback ──ok──► UsageRecord
//!                                        │
//!                                       err
//!                                        ▼
//!                              CompositeFallback error
//! ```

mod variations;

pub use variations::{VariationOutcome, DEFAULT_VARIATION_MODELS};

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::budget::{format_cost, PricingTable, TaskRegistry, UsageRecord};
use crate::config::{FallbackPolicy, OrchestratorConfig};
use crate::llm::{
    ChatOptions, Completion, CompletionProvider, CompletionRequest, ModelRoute, ProviderError,
    ProviderRouter,
};

/// Caller-visible failures of a task execution.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Unknown task: {0}")]
    Configuration(String),

    #[error(
        "Task {task} failed on both models: {primary_model} ({primary_error}); \
         fallback {fallback_model} ({fallback_error})"
    )]
    CompositeFallback {
        task: String,
        primary_model: String,
        primary_error: ProviderError,
        fallback_model: String,
        fallback_error: ProviderError,
    },

    #[error("Task {0} was cancelled")]
    Cancelled(String),
}

/// Per-call adjustments to a task's configured model and budget.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Replaces the primary model; the task's fallback still applies
    pub model: Option<String>,
    pub max_tokens: Option<u64>,
    pub temperature: Option<f64>,
}

/// Generated content plus the usage attributed to the model that answered.
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub content: String,
    pub usage: UsageRecord,
}

pub struct FallbackOrchestrator {
    provider: Arc<dyn CompletionProvider>,
    tasks: TaskRegistry,
    pricing: PricingTable,
    policy: FallbackPolicy,
}

impl FallbackOrchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        tasks: TaskRegistry,
        pricing: PricingTable,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            provider,
            tasks,
            pricing,
            policy,
        }
    }

    /// Build with a [`ProviderRouter`] using the configured credentials and timeout.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let router = ProviderRouter::new(&config.providers, config.fallback.timeout);
        Self::new(
            Arc::new(router),
            config.tasks.clone(),
            config.pricing.clone(),
            config.fallback,
        )
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub async fn execute(
        &self,
        task_name: &str,
        system_prompt: &str,
        user_text: &str,
        overrides: Option<Overrides>,
    ) -> Result<TaskOutput, OrchestratorError> {
        self.execute_with_cancel(
            task_name,
            system_prompt,
            user_text,
            overrides,
            &CancellationToken::new(),
        )
        .await
    }

    /// Run a task, aborting without fallback if `cancel` fires.
    pub async fn execute_with_cancel(
        &self,
        task_name: &str,
        system_prompt: &str,
        user_text: &str,
        overrides: Option<Overrides>,
        cancel: &CancellationToken,
    ) -> Result<TaskOutput, OrchestratorError> {
        let task = self
            .tasks
            .get(task_name)
            .ok_or_else(|| OrchestratorError::Configuration(task_name.to_string()))?;

        let overrides = overrides.unwrap_or_default();
        let primary = overrides
            .model
            .map(ModelRoute::resolve)
            .unwrap_or_else(|| task.primary.clone());
        let options = ChatOptions {
            max_tokens: overrides.max_tokens.unwrap_or(task.max_tokens),
            temperature: overrides.temperature.unwrap_or(task.temperature),
        };
        let request = CompletionRequest::new(system_prompt, user_text, options);

        let primary_error = match self.call_model(task_name, &primary, &request, cancel).await {
            Ok(completion) => return Ok(self.finish(task_name, &primary, completion, false)),
            Err(e) if e.is_cancelled() => {
                return Err(OrchestratorError::Cancelled(task_name.to_string()))
            }
            Err(e) => e,
        };

        let fallback = &task.fallback;
        if fallback.id == primary.id {
            // Never call a model that just failed a second time as "fallback".
            return Err(OrchestratorError::CompositeFallback {
                task: task_name.to_string(),
                primary_model: primary.id.clone(),
                primary_error,
                fallback_model: fallback.id.clone(),
                fallback_error: ProviderError::not_attempted(
                    "fallback model is the model that already failed",
                ),
            });
        }

        tracing::warn!(
            "Primary model {} failed for task {} ({}): {}; falling back to {}",
            primary,
            task_name,
            primary_error.kind,
            primary_error,
            fallback
        );

        match self.call_model(task_name, fallback, &request, cancel).await {
            Ok(completion) => Ok(self.finish(task_name, fallback, completion, true)),
            Err(e) if e.is_cancelled() => Err(OrchestratorError::Cancelled(task_name.to_string())),
            Err(fallback_error) => {
                tracing::error!(
                    "Fallback model {} also failed for task {}: {}",
                    fallback,
                    task_name,
                    fallback_error
                );
                Err(OrchestratorError::CompositeFallback {
                    task: task_name.to_string(),
                    primary_model: primary.id.clone(),
                    primary_error,
                    fallback_model: fallback.id.clone(),
                    fallback_error,
                })
            }
        }
    }

    /// Call one model up to `attempts_per_model` times.
    async fn call_model(
        &self,
        task_name: &str,
        model: &ModelRoute,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, ProviderError> {
        let attempts = self.policy.attempts_per_model.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.provider.complete(model, request, cancel).await {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    if attempts > 1 {
                        tracing::warn!(
                            "Task {} attempt {}/{} on {} failed: {}",
                            task_name,
                            attempt,
                            attempts,
                            model,
                            e
                        );
                    }
                    last_error = Some(e);
                }
            }

            if attempt < attempts && !self.policy.retry_backoff.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ProviderError::cancelled()),
                    _ = tokio::time::sleep(self.policy.retry_backoff) => {}
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::not_attempted("no attempts were made")))
    }

    fn finish(
        &self,
        task_name: &str,
        model: &ModelRoute,
        completion: Completion,
        fallback_used: bool,
    ) -> TaskOutput {
        let usage = UsageRecord::new(
            task_name,
            &model.id,
            completion.usage,
            &self.pricing,
            fallback_used,
        );

        tracing::info!(
            task = task_name,
            model = %usage.model,
            fallback = fallback_used,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Task completed, cost {} (input {}, output {}){}",
            format_cost(usage.cost.total),
            format_cost(usage.cost.input),
            format_cost(usage.cost.output),
            if usage.priced { "" } else { " [unpriced]" }
        );

        TaskOutput {
            content: completion.content,
            usage,
        }
    }
}
