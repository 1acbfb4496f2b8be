use thiserror::Error;

use crate::config::ConfigError;
use crate::core::{LlmError, STTError, TTSError};

/// Startup failures while building the application state.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Chat backend setup failed: {0}")]
    Llm(#[from] LlmError),
    #[error("Speech-to-text setup failed: {0}")]
    Stt(#[from] STTError),
    #[error("Text-to-speech setup failed: {0}")]
    Tts(#[from] TTSError),
    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

pub type AppResult<T> = Result<T, AppError>;
