//! Speech-to-text providers.

pub mod base;
pub mod whisper;

use std::sync::Arc;

pub use base::{STTError, STTResult, SpeechToText};
pub use whisper::{WhisperConfig, WhisperSTT};

/// Supported STT providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SttProvider {
    /// Groq Whisper STT REST API
    #[default]
    Groq,
    /// OpenAI Whisper STT REST API
    OpenAI,
}

impl std::fmt::Display for SttProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SttProvider::Groq => write!(f, "groq"),
            SttProvider::OpenAI => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for SttProvider {
    type Err = STTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(SttProvider::Groq),
            "openai" => Ok(SttProvider::OpenAI),
            _ => Err(STTError::ConfigurationError(format!(
                "Unsupported STT provider: {s}. Supported providers: groq, openai"
            ))),
        }
    }
}

/// Create the configured speech-to-text provider.
pub fn create_stt_provider(config: WhisperConfig) -> STTResult<Arc<dyn SpeechToText>> {
    Ok(Arc::new(WhisperSTT::with_config(config)?))
}
