//! Chat-completion backends and the response router.
//!
//! Two hosted backends are supported:
//! - **Ollama**: self-hosted `/api/chat` endpoint, model chosen by configuration
//! - **Groq**: OpenAI-compatible chat completions with a fixed fast model
//!
//! The [`ResponseRouter`] pairs the persona prompt with a caller utterance and
//! dispatches it to the backend selected for the process.

pub mod base;
pub mod groq;
pub mod ollama;
pub mod persona;
pub mod router;

pub use base::{ChatCompletion, ChatMessage, ChatRequest, ChatRole, LlmError, LlmResult};
pub use groq::{GROQ_CHAT_MODEL, GROQ_CHAT_URL, GROQ_MAX_TOKENS, GroqChatClient};
pub use ollama::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, OllamaClient};
pub use persona::Persona;
pub use router::{BackendClients, ResponseRouter};

/// Supported chat-completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LlmBackend {
    /// Self-hosted Ollama server
    #[default]
    Ollama,
    /// Groq hosted inference
    Groq,
}

impl LlmBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmBackend::Ollama => "ollama",
            LlmBackend::Groq => "groq",
        }
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmBackend::Ollama),
            "groq" => Ok(LlmBackend::Groq),
            _ => Err(LlmError::ConfigurationError(format!(
                "Unsupported model backend: {s}. Supported backends: {}",
                get_supported_llm_backends().join(", ")
            ))),
        }
    }
}

/// Get the list of supported backend names
pub fn get_supported_llm_backends() -> Vec<&'static str> {
    vec!["ollama", "groq"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing_is_case_insensitive() {
        assert_eq!("ollama".parse::<LlmBackend>().unwrap(), LlmBackend::Ollama);
        assert_eq!("GROQ".parse::<LlmBackend>().unwrap(), LlmBackend::Groq);
        assert_eq!(" Groq ".parse::<LlmBackend>().unwrap(), LlmBackend::Groq);
    }

    #[test]
    fn test_unsupported_backend_is_rejected() {
        for value in ["openai", "", "llama3.2"] {
            let result = value.parse::<LlmBackend>();
            assert!(
                matches!(result, Err(LlmError::ConfigurationError(ref msg)) if msg.contains("ollama, groq")),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_backend_display_round_trips() {
        for name in get_supported_llm_backends() {
            let backend: LlmBackend = name.parse().unwrap();
            assert_eq!(backend.to_string(), name);
        }
        assert_eq!(LlmBackend::default(), LlmBackend::Ollama);
    }
}
