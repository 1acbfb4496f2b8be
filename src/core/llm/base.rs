use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Provider-neutral chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model identifier understood by the backend.
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Response length cap in tokens; `None` leaves the backend default.
    pub max_tokens: Option<u32>,
}

/// Errors raised by chat-completion backends.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// A hosted chat-completion backend.
///
/// Implementations are stateless per call: every request carries the full
/// message list and nothing is remembered between calls.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send the request and return the text of the first completion.
    async fn complete(&self, request: ChatRequest) -> LlmResult<String>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_serialization() {
        let json = serde_json::to_value(ChatMessage::system("be nice")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be nice");

        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::AuthenticationFailed("bad key".to_string());
        assert_eq!(err.to_string(), "Authentication failed: bad key");
    }
}
