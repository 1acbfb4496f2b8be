//! OpenAI TTS provider module.
//!
//! Uses the Audio Speech API with `response_format = pcm`, which returns
//! 24kHz 16-bit mono little-endian audio streamed as it is generated.
//!
//! Models: `tts-1`, `tts-1-hd`, `gpt-4o-mini-tts`.
//! Voices: alloy, ash, ballad, coral, echo, fable, onyx, nova, sage, shimmer, verse.

mod config;
mod provider;

pub use config::{OPENAI_PCM_SAMPLE_RATE, OPENAI_TTS_URL, OpenAITTSModel, OpenAIVoice};
pub use provider::OpenAITTS;
