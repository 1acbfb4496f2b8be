//! Text-to-speech providers.

pub mod base;
pub mod openai;

use std::sync::Arc;

pub use base::{AudioChunkStream, TTSError, TTSResult, TextToSpeech};
pub use openai::{OpenAITTS, OpenAITTSModel, OpenAIVoice};

/// Create the OpenAI speech synthesizer.
pub fn create_tts_provider(
    api_key: &str,
    model: &str,
    voice: &str,
) -> TTSResult<Arc<dyn TextToSpeech>> {
    Ok(Arc::new(OpenAITTS::new(api_key, model, voice)?))
}
