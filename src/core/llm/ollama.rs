//! Ollama `/api/chat` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::base::{ChatCompletion, ChatMessage, ChatRequest, LlmError, LlmResult};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

/// Client for a self-hosted Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    http_client: Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> LlmResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                LlmError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatCompletion for OllamaClient {
    async fn complete(&self, request: ChatRequest) -> LlmResult<String> {
        let body = OllamaChatRequest {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            options: request
                .max_tokens
                .map(|num_predict| OllamaOptions { num_predict }),
        };

        let url = self.chat_url();
        debug!(url = %url, model = %request.model, "Sending Ollama chat request");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::NetworkError(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let error_msg = match serde_json::from_str::<OllamaErrorResponse>(&response_text) {
                Ok(err) => format!("Ollama error: {}", err.error),
                Err(_) => format!("Ollama error ({status}): {response_text}"),
            };
            return Err(match status.as_u16() {
                400 | 404 => LlmError::ConfigurationError(error_msg),
                429 => LlmError::RateLimitExceeded(error_msg),
                _ => LlmError::ProviderError(error_msg),
            });
        }

        let parsed: OllamaChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        Ok(parsed.message.content)
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(max_tokens: Option<u32>) -> ChatRequest {
        ChatRequest {
            model: "llama3.2".to_string(),
            messages: vec![ChatMessage::system("persona"), ChatMessage::user("hello")],
            max_tokens,
        }
    }

    #[tokio::test]
    async fn test_complete_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3.2",
                "stream": false,
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.2",
                "message": {"role": "assistant", "content": "Hi there!"},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(format!("{}/", server.uri())).unwrap();
        let reply = client.complete(request(None)).await.unwrap();
        assert_eq!(reply, "Hi there!");
    }

    #[tokio::test]
    async fn test_request_without_cap_has_no_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "ok"}
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        client.complete(request(None)).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(body.get("options").is_none());
    }

    #[tokio::test]
    async fn test_unknown_model_is_configuration_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "model \"nope\" not found, try pulling it first"
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        let err = client.complete(request(None)).await.unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(ref msg) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        let err = client.complete(request(Some(10))).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = OllamaClient::new("http://127.0.0.1:1").unwrap();
        let err = client.complete(request(None)).await.unwrap_err();
        assert!(matches!(err, LlmError::NetworkError(_)));
    }
}
