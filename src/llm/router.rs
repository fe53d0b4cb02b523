//! Provider router: dispatches a routed model to its wire protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::{
    Completion, CompletionProvider, CompletionRequest, GeminiClient, ModelRoute, OpenRouterClient,
    ProviderError, ProviderKind,
};
use crate::config::ProviderSettings;

/// Routes requests to the gateway or direct vendor client.
///
/// Every call is bounded by `timeout` and observes the caller's cancellation
/// token. There is no retry here.
pub struct ProviderRouter {
    openrouter: OpenRouterClient,
    gemini: GeminiClient,
    timeout: Duration,
}

impl ProviderRouter {
    pub fn new(settings: &ProviderSettings, timeout: Duration) -> Self {
        let client = Client::new();
        Self {
            openrouter: OpenRouterClient::new(
                client.clone(),
                settings.openrouter_api_key.clone(),
                settings.openrouter_base_url.clone(),
            ),
            gemini: GeminiClient::new(
                client,
                settings.gemini_api_key.clone(),
                settings.gemini_base_url.clone(),
            ),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform one call against the model's protocol and normalize the answer.
    pub async fn route(
        &self,
        model: &ModelRoute,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, ProviderError> {
        let call = async {
            let response = match model.kind {
                ProviderKind::Aggregator => self.openrouter.send(model, request).await?,
                ProviderKind::Direct => self.gemini.send(model, request).await?,
            };
            response.into_completion()
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::cancelled()),
            result = tokio::time::timeout(self.timeout, call) => match result {
                Ok(inner) => inner,
                Err(_) => Err(ProviderError::timeout(self.timeout)),
            },
        }
    }
}

#[async_trait]
impl CompletionProvider for ProviderRouter {
    async fn complete(
        &self,
        model: &ModelRoute,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, ProviderError> {
        self.route(model, request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatOptions, ProviderErrorKind, TokenUsage};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base: &str) -> ProviderSettings {
        ProviderSettings {
            openrouter_api_key: Some("or-key".to_string()),
            openrouter_base_url: format!("{}/api/v1", base),
            gemini_api_key: Some("gm-key".to_string()),
            gemini_base_url: format!("{}/v1beta", base),
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            "system",
            "user",
            ChatOptions {
                max_tokens: 256,
                temperature: 0.5,
            },
        )
    }

    #[tokio::test]
    async fn test_routes_namespaced_model_to_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer or-key"))
            .and(body_partial_json(json!({"model": "openai/gpt-4o-mini", "max_tokens": 256})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "gateway answer"}}],
                "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let router = ProviderRouter::new(&settings(&server.uri()), Duration::from_secs(5));
        let completion = router
            .route(
                &ModelRoute::resolve("openai/gpt-4o-mini"),
                &request(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(completion.content, "gateway answer");
        assert_eq!(completion.usage, TokenUsage::new(20, 5));
    }

    #[tokio::test]
    async fn test_routes_bare_model_to_direct_vendor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "gm-key"))
            .and(body_partial_json(json!({"generationConfig": {"maxOutputTokens": 256}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "direct answer"}]}}],
                "usageMetadata": {"promptTokenCount": 11, "candidatesTokenCount": 4, "totalTokenCount": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let router = ProviderRouter::new(&settings(&server.uri()), Duration::from_secs(5));
        let completion = router
            .route(
                &ModelRoute::resolve("gemini-2.5-flash"),
                &request(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(completion.content, "direct answer");
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_vendor_error_message_is_carried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(json!({"error": {"message": "Insufficient credits"}})),
            )
            .mount(&server)
            .await;

        let router = ProviderRouter::new(&settings(&server.uri()), Duration::from_secs(5));
        let err = router
            .route(
                &ModelRoute::resolve("anthropic/claude-sonnet-4"),
                &request(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::Http);
        assert_eq!(err.status, Some(402));
        assert_eq!(err.message, "Insufficient credits");
    }

    #[tokio::test]
    async fn test_error_body_with_success_status_keeps_vendor_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"message": "Provider returned error: context length exceeded"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"message": "Quota exhausted for project"}
            })))
            .mount(&server)
            .await;

        let router = ProviderRouter::new(&settings(&server.uri()), Duration::from_secs(5));
        let err = router
            .route(
                &ModelRoute::resolve("openai/gpt-4o"),
                &request(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
        assert_eq!(err.message, "Provider returned error: context length exceeded");

        let err = router
            .route(
                &ModelRoute::resolve("gemini-2.5-pro"),
                &request(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
        assert_eq!(err.message, "Quota exhausted for project");
    }

    #[tokio::test]
    async fn test_timeout_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let router = ProviderRouter::new(&settings(&server.uri()), Duration::from_millis(100));
        let err = router
            .route(
                &ModelRoute::resolve("openai/gpt-4o-mini"),
                &request(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let router = ProviderRouter::new(&settings("http://127.0.0.1:9"), Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = router
            .route(&ModelRoute::resolve("gemini-2.5-flash"), &request(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let mut settings = settings("http://127.0.0.1:9");
        settings.gemini_api_key = None;
        let router = ProviderRouter::new(&settings, Duration::from_secs(5));

        let err = router
            .route(
                &ModelRoute::resolve("gemini-2.5-pro"),
                &request(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MissingCredentials);
    }
}
