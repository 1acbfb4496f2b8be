//! Groq chat-completions client.
//!
//! Groq exposes an OpenAI-compatible `/chat/completions` endpoint. Replies
//! are kept short for voice, so requests are capped at [`GROQ_MAX_TOKENS`]
//! and always use [`GROQ_CHAT_MODEL`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroize;

use super::base::{ChatCompletion, ChatMessage, ChatRequest, LlmError, LlmResult};

pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Model used for every Groq request.
pub const GROQ_CHAT_MODEL: &str = "llama-3.1-8b-instant";

/// Response length cap applied to Groq requests.
pub const GROQ_MAX_TOKENS: u32 = 200;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GroqErrorDetail {
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

pub struct GroqChatClient {
    api_key: Option<String>,
    api_url: String,
    http_client: Client,
}

impl GroqChatClient {
    /// Create a client for the public Groq endpoint.
    ///
    /// A missing key is accepted here and reported on the first request.
    pub fn new(api_key: Option<String>) -> LlmResult<Self> {
        Self::with_api_url(api_key, GROQ_CHAT_URL)
    }

    pub fn with_api_url(api_key: Option<String>, api_url: impl Into<String>) -> LlmResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                LlmError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            api_url: api_url.into(),
            http_client,
        })
    }

    fn classify_error(status: reqwest::StatusCode, body: &str, retry_after: Option<&str>) -> LlmError {
        let error_msg = match serde_json::from_str::<GroqErrorResponse>(body) {
            Ok(resp) => match resp.error.error_type {
                Some(kind) => format!("Groq API error: {} ({kind})", resp.error.message),
                None => format!("Groq API error: {}", resp.error.message),
            },
            Err(_) => format!("Groq API error ({status}): {body}"),
        };

        match status.as_u16() {
            400 | 404 => LlmError::ConfigurationError(error_msg),
            401 | 403 => LlmError::AuthenticationFailed(error_msg),
            429 => {
                let retry_info = retry_after
                    .map(|s| format!(" (retry after {s}s)"))
                    .unwrap_or_default();
                LlmError::RateLimitExceeded(format!("{error_msg}{retry_info}"))
            }
            500..=599 => LlmError::ProviderError(format!("Server error: {error_msg}")),
            _ => LlmError::ProviderError(error_msg),
        }
    }
}

impl std::fmt::Debug for GroqChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqChatClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Drop for GroqChatClient {
    fn drop(&mut self) {
        if let Some(ref mut key) = self.api_key {
            key.zeroize();
        }
    }
}

#[async_trait]
impl ChatCompletion for GroqChatClient {
    async fn complete(&self, request: ChatRequest) -> LlmResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            LlmError::AuthenticationFailed("GROQ_API_KEY is not configured".to_string())
        })?;

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
        };

        debug!(model = %request.model, max_tokens = ?request.max_tokens, "Sending Groq chat request");

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::NetworkError(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(
                status,
                &response_text,
                retry_after.as_deref(),
            ));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no choices".to_string()))?;

        choice.message.content.ok_or_else(|| {
            LlmError::InvalidResponse("First choice had no content".to_string())
        })
    }

    fn provider_name(&self) -> &'static str {
        "groq"
    }
}
