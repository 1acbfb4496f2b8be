//! Whisper-compatible speech-to-text over REST (Groq or OpenAI).

mod client;
mod config;
mod messages;

pub use client::WhisperSTT;
pub use config::{
    GROQ_DEFAULT_MODEL, GROQ_STT_URL, MAX_UPLOAD_BYTES, OPENAI_DEFAULT_MODEL, OPENAI_STT_URL,
    WhisperConfig,
};
pub use messages::{TranscriptionResponse, wav};
