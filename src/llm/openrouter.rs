//! Aggregator gateway client (OpenRouter chat-completions protocol).

use reqwest::Client;
use serde::Serialize;

use super::response::{decode_body, AggregatorResponse};
use super::{CompletionRequest, ModelRoute, ProviderError, ProviderResponse, Role};

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

/// Environment variable holding the gateway API key.
pub(crate) const OPENROUTER_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// OpenRouter API client. Performs exactly one request per call.
pub struct OpenRouterClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(client: Client, api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_request(model: &ModelRoute, request: &CompletionRequest) -> OpenRouterRequest {
        let cache_control = model
            .supports_prompt_caching()
            .then_some(CacheControl { kind: "ephemeral" });

        OpenRouterRequest {
            model: model.id.clone(),
            messages: vec![
                GatewayMessage {
                    role: Role::System,
                    content: request.system_prompt.clone(),
                    cache_control,
                },
                GatewayMessage {
                    role: Role::User,
                    content: request.user_text.clone(),
                    cache_control,
                },
            ],
            max_tokens: request.options.max_tokens,
            temperature: request.options.temperature,
        }
    }

    /// Send a single chat completion request.
    pub async fn send(
        &self,
        model: &ModelRoute,
        request: &CompletionRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::missing_credentials(OPENROUTER_KEY_VAR))?;

        let body = Self::build_request(model, request);

        tracing::debug!(
            "Sending request to OpenRouter: model={}, cache_hints={}",
            model.id,
            body.messages[0].cache_control.is_some()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("HTTP-Referer", "https://github.com/plancraft")
            .header("X-Title", "plancraft")
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let parsed: AggregatorResponse = decode_body(response).await?;
        Ok(ProviderResponse::Aggregator(parsed))
    }
}

/// OpenRouter API request format.
#[derive(Debug, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<GatewayMessage>,
    max_tokens: u64,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct GatewayMessage {
    role: Role,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_control: Option<CacheControl>,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct CacheControl {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatOptions;
    use serde_json::json;

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            "You are a planner.",
            "List the features.",
            ChatOptions {
                max_tokens: 800,
                temperature: 0.4,
            },
        )
    }

    #[test]
    fn test_request_shape_with_cache_hints() {
        let model = ModelRoute::resolve("anthropic/claude-sonnet-4");
        let body = serde_json::to_value(OpenRouterClient::build_request(&model, &request())).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "anthropic/claude-sonnet-4",
                "messages": [
                    {"role": "system", "content": "You are a planner.", "cache_control": {"type": "ephemeral"}},
                    {"role": "user", "content": "List the features.", "cache_control": {"type": "ephemeral"}}
                ],
                "max_tokens": 800,
                "temperature": 0.4
            })
        );
    }

    #[test]
    fn test_no_cache_hints_outside_family() {
        let model = ModelRoute::resolve("openai/gpt-4o-mini");
        let body = serde_json::to_value(OpenRouterClient::build_request(&model, &request())).unwrap();
        assert!(body["messages"][0].get("cache_control").is_none());
        assert!(body["messages"][1].get("cache_control").is_none());
    }
}
