//! LLM provider layer.
//!
//! Two wire protocols are supported:
//! - an aggregator gateway (OpenRouter-style, `vendor/model` identifiers)
//! - a direct vendor API (Gemini-style, bare model identifiers)
//!
//! The protocol for a model is resolved once into a [`ProviderKind`] and
//! responses from both are normalized into a single [`Completion`] shape.

mod error;
mod gemini;
mod openrouter;
mod response;
mod router;

pub use error::{ProviderError, ProviderErrorKind};
pub use gemini::{GeminiClient, GEMINI_API_URL};
pub use openrouter::{OpenRouterClient, OPENROUTER_API_URL};
pub use response::{AggregatorResponse, DirectResponse, ProviderResponse};
pub use router::ProviderRouter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Which wire protocol serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Aggregator gateway, addressed as `vendor/model`
    Aggregator,
    /// Direct vendor endpoint, addressed by bare model name
    Direct,
}

impl ProviderKind {
    /// Namespaced identifiers go through the gateway.
    pub fn for_model(model_id: &str) -> Self {
        if model_id.contains('/') {
            ProviderKind::Aggregator
        } else {
            ProviderKind::Direct
        }
    }
}

/// A model identifier together with its resolved provider kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ModelRoute {
    pub id: String,
    pub kind: ProviderKind,
}

impl ModelRoute {
    pub fn resolve(id: impl Into<String>) -> Self {
        let id = id.into();
        let kind = ProviderKind::for_model(&id);
        Self { id, kind }
    }

    /// Anthropic models behind the gateway accept `cache_control` hints.
    pub fn supports_prompt_caching(&self) -> bool {
        self.kind == ProviderKind::Aggregator && self.id.starts_with("anthropic/")
    }
}

impl From<String> for ModelRoute {
    fn from(id: String) -> Self {
        Self::resolve(id)
    }
}

impl From<ModelRoute> for String {
    fn from(route: ModelRoute) -> Self {
        route.id
    }
}

impl std::fmt::Display for ModelRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Generation budget for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    /// Maximum output tokens to generate.
    pub max_tokens: u64,
    /// Sampling temperature (0 = deterministic).
    pub temperature: f64,
}

/// One single-turn generation request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_text: String,
    pub options: ChatOptions,
}

impl CompletionRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_text: impl Into<String>,
        options: ChatOptions,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_text: user_text.into(),
            options,
        }
    }
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Create a usage object ensuring `total_tokens` is consistent.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Normalized provider answer; nothing downstream knows which protocol produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}

/// Anything that can answer a completion request for a routed model.
///
/// Implementations must not retry internally; retry and fallback belong to
/// the orchestrator.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        model: &ModelRoute,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, ProviderError>;
}
