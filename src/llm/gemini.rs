//! Direct vendor client (Gemini `generateContent` protocol).

use reqwest::Client;
use serde::Serialize;

use super::response::{decode_body, DirectResponse};
use super::{CompletionRequest, ModelRoute, ProviderError, ProviderResponse};

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub(crate) const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

/// Gemini API client. Performs exactly one request per call.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_request(request: &CompletionRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: request.user_text.clone(),
                }],
            }],
            system_instruction: GeminiInstruction {
                parts: vec![GeminiPart {
                    text: request.system_prompt.clone(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: request.options.temperature,
                max_output_tokens: request.options.max_tokens,
            },
        }
    }

    fn endpoint(&self, model: &ModelRoute) -> String {
        // URL format: base_url/models/{model}:generateContent
        format!(
            "{}/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(&model.id)
        )
    }

    /// Send a single generateContent request.
    pub async fn send(
        &self,
        model: &ModelRoute,
        request: &CompletionRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::missing_credentials(GEMINI_KEY_VAR))?;

        tracing::debug!("Sending request to Gemini: model={}", model.id);

        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", api_key)])
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let parsed: DirectResponse = decode_body(response).await?;
        Ok(ProviderResponse::Direct(parsed))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    system_instruction: GeminiInstruction,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u64,
}
