//! Provider error type shared by both wire protocols.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Broad classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Non-success HTTP status from the vendor
    Http,
    /// Connection or transport failure before a status was received
    Network,
    /// The per-call timeout elapsed
    Timeout,
    /// The caller's cancellation token fired
    Cancelled,
    /// Response body was not the expected shape
    Malformed,
    /// No API key configured for the selected protocol
    MissingCredentials,
    /// The call was never made (e.g. fallback identical to the failed primary)
    NotAttempted,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Http => "http",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Malformed => "malformed",
            Self::MissingCredentials => "missing_credentials",
            Self::NotAttempted => "not_attempted",
        };
        write!(f, "{}", s)
    }
}

/// A single failed provider call.
///
/// `message` carries the vendor's own error text when one was reported.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Http,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ProviderErrorKind::Timeout,
            format!("Request timed out after {:?}", after),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(ProviderErrorKind::Cancelled, "Request cancelled")
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message)
    }

    pub fn missing_credentials(env_var: &str) -> Self {
        Self::new(
            ProviderErrorKind::MissingCredentials,
            format!("No API key configured ({} is not set)", env_var),
        )
    }

    pub fn not_attempted(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotAttempted, message)
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ProviderErrorKind::Cancelled
    }

    /// Build an error from a non-success response.
    ///
    /// Prefers `{"error": {"message": ...}}` from the body, then the canonical
    /// status reason, then the bare status code.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = vendor_message(body)
            .or_else(|| status.canonical_reason().map(|s| s.to_string()))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        Self::http(status.as_u16(), message)
    }

    /// Map a transport-level reqwest failure.
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::new(ProviderErrorKind::Timeout, format!("Request timeout: {}", error))
        } else if error.is_connect() {
            Self::network(format!("Connection failed: {}", error))
        } else {
            Self::network(format!("Request failed: {}", error))
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

pub(crate) fn vendor_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.trim().is_empty())
}
