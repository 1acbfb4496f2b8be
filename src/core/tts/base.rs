use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

/// Errors raised by text-to-speech providers.
#[derive(Debug, Error)]
pub enum TTSError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Invalid text: {0}")]
    InvalidText(String),
}

pub type TTSResult<T> = Result<T, TTSError>;

/// PCM16 little-endian chunks in the order the provider produced them.
pub type AudioChunkStream = Pin<Box<dyn Stream<Item = TTSResult<Bytes>> + Send>>;

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Start synthesizing `text`. Audio arrives through the returned stream.
    async fn synthesize(&self, text: &str) -> TTSResult<AudioChunkStream>;

    /// Sample rate of the PCM16 chunks produced by [`synthesize`](Self::synthesize).
    fn output_sample_rate(&self) -> u32;

    fn get_provider_info(&self) -> serde_json::Value;
}
