use std::sync::Arc;

use tracing::info;

use super::base::{ChatCompletion, ChatMessage, ChatRequest, LlmResult};
use super::groq::{GROQ_CHAT_MODEL, GROQ_MAX_TOKENS, GroqChatClient};
use super::ollama::OllamaClient;
use super::LlmBackend;
use crate::config::ServerConfig;

/// One client handle per backend, built once and shared.
#[derive(Clone)]
pub struct BackendClients {
    pub ollama: Arc<dyn ChatCompletion>,
    pub groq: Arc<dyn ChatCompletion>,
}

impl BackendClients {
    pub fn from_config(config: &ServerConfig) -> LlmResult<Self> {
        Ok(Self {
            ollama: Arc::new(OllamaClient::new(config.ollama_url.clone())?),
            groq: Arc::new(GroqChatClient::new(config.groq_api_key.clone())?),
        })
    }

    fn get(&self, backend: LlmBackend) -> &Arc<dyn ChatCompletion> {
        match backend {
            LlmBackend::Ollama => &self.ollama,
            LlmBackend::Groq => &self.groq,
        }
    }
}

/// Maps a caller utterance to a persona reply from the selected backend.
///
/// Each call is independent: the request is always the persona system
/// message followed by the utterance, with no conversation history.
#[derive(Clone)]
pub struct ResponseRouter {
    clients: BackendClients,
    persona: Arc<str>,
    ollama_model: String,
}

impl ResponseRouter {
    pub fn new(
        clients: BackendClients,
        persona: impl Into<Arc<str>>,
        ollama_model: impl Into<String>,
    ) -> Self {
        Self {
            clients,
            persona: persona.into(),
            ollama_model: ollama_model.into(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> LlmResult<Self> {
        Ok(Self::new(
            BackendClients::from_config(config)?,
            config.persona.render(),
            config.ollama_model_name.clone(),
        ))
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Build the request sent to `backend` for `utterance`.
    pub fn build_request(&self, utterance: &str, backend: LlmBackend) -> ChatRequest {
        let messages = vec![
            ChatMessage::system(&*self.persona),
            ChatMessage::user(utterance),
        ];

        match backend {
            LlmBackend::Ollama => ChatRequest {
                model: self.ollama_model.clone(),
                messages,
                max_tokens: None,
            },
            LlmBackend::Groq => ChatRequest {
                model: GROQ_CHAT_MODEL.to_string(),
                messages,
                max_tokens: Some(GROQ_MAX_TOKENS),
            },
        }
    }

    pub async fn get_response(&self, utterance: &str, backend: LlmBackend) -> LlmResult<String> {
        info!("User: {:?}", utterance);

        let request = self.build_request(utterance, backend);
        let reply = self.clients.get(backend).complete(request).await?;

        info!(backend = %backend, "Response: {}", reply);
        Ok(reply)
    }
}
