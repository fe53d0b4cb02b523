//! Typed decoders for the two provider response shapes.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::vendor_message;
use super::{Completion, ProviderError, TokenUsage};

/// A decoded provider response, tagged by the protocol that produced it.
#[derive(Debug)]
pub enum ProviderResponse {
    Aggregator(AggregatorResponse),
    Direct(DirectResponse),
}

impl ProviderResponse {
    /// Normalize into the shared [`Completion`] shape.
    ///
    /// Missing text content is an error; a missing usage block counts as zero.
    pub fn into_completion(self) -> Result<Completion, ProviderError> {
        match self {
            ProviderResponse::Aggregator(resp) => {
                let choice = resp
                    .choices
                    .into_iter()
                    .next()
                    .ok_or_else(|| ProviderError::malformed("No choices in response"))?;
                let content = choice
                    .message
                    .content
                    .ok_or_else(|| ProviderError::malformed("No message content in response"))?;
                let usage = resp
                    .usage
                    .map(|u| TokenUsage {
                        prompt_tokens: u.prompt_tokens,
                        completion_tokens: u.completion_tokens,
                        total_tokens: u
                            .total_tokens
                            .unwrap_or(u.prompt_tokens.saturating_add(u.completion_tokens)),
                    })
                    .unwrap_or_default();
                Ok(Completion { content, usage })
            }
            ProviderResponse::Direct(resp) => {
                let candidate = resp
                    .candidates
                    .into_iter()
                    .next()
                    .ok_or_else(|| ProviderError::malformed("No candidates in response"))?;
                let texts: Vec<String> = candidate
                    .content
                    .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
                    .unwrap_or_default();
                if texts.is_empty() {
                    return Err(ProviderError::malformed("No text parts in candidate"));
                }
                let usage = resp
                    .usage_metadata
                    .map(|u| TokenUsage {
                        prompt_tokens: u.prompt_token_count,
                        completion_tokens: u.candidates_token_count,
                        total_tokens: u
                            .total_token_count
                            .unwrap_or(u.prompt_token_count.saturating_add(u.candidates_token_count)),
                    })
                    .unwrap_or_default();
                Ok(Completion {
                    content: texts.concat(),
                    usage,
                })
            }
        }
    }
}

/// Chat-completions response from the aggregator gateway.
#[derive(Debug, Deserialize)]
pub struct AggregatorResponse {
    #[serde(default)]
    choices: Vec<AggregatorChoice>,
    #[serde(default)]
    usage: Option<AggregatorUsage>,
}

#[derive(Debug, Deserialize)]
struct AggregatorChoice {
    message: AggregatorMessage,
}

#[derive(Debug, Deserialize)]
struct AggregatorMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggregatorUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: Option<u64>,
}

/// `generateContent` response from the direct vendor API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectResponse {
    #[serde(default)]
    candidates: Vec<DirectCandidate>,
    #[serde(default)]
    usage_metadata: Option<DirectUsage>,
}

#[derive(Debug, Deserialize)]
struct DirectCandidate {
    #[serde(default)]
    content: Option<DirectContent>,
}

#[derive(Debug, Deserialize)]
struct DirectContent {
    #[serde(default)]
    parts: Vec<DirectPart>,
}

#[derive(Debug, Deserialize)]
struct DirectPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: Option<u64>,
}

/// Check status and decode a JSON body, mapping every failure to [`ProviderError`].
pub(crate) async fn decode_body<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response.text().await.map_err(ProviderError::from_reqwest)?;

    if !status.is_success() {
        return Err(ProviderError::from_status(status, &body));
    }

    // Gateways sometimes report upstream failures inside a 200 body.
    if let Some(message) = vendor_message(&body) {
        return Err(ProviderError::malformed(message));
    }

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::malformed(format!("Failed to parse response: {}, body: {}", e, body))
    })
}
