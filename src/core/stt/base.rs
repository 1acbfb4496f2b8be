use async_trait::async_trait;
use thiserror::Error;

use crate::core::audio::AudioSegment;

/// Errors raised by speech-to-text providers.
#[derive(Debug, Error)]
pub enum STTError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
}

pub type STTResult<T> = Result<T, STTError>;

/// Request/response transcription of one caller utterance.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe the segment. Returns the text as recognized, possibly empty.
    async fn transcribe(&self, segment: &AudioSegment) -> STTResult<String>;

    fn get_provider_info(&self) -> &'static str;
}
