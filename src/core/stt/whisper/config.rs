//! Configuration for Whisper-compatible transcription endpoints.

use zeroize::Zeroize;

use super::super::SttProvider;

pub const GROQ_STT_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
pub const OPENAI_STT_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

pub const GROQ_DEFAULT_MODEL: &str = "whisper-large-v3-turbo";
pub const OPENAI_DEFAULT_MODEL: &str = "whisper-1";

/// Groq rejects uploads above 25MB; stay below it with room for the WAV header.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct WhisperConfig {
    pub provider: SttProvider,
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    /// ISO-639-1 language hint; empty lets the service detect it.
    pub language: String,
}

impl WhisperConfig {
    /// Defaults for `provider`, with the public endpoint and default model.
    pub fn for_provider(provider: SttProvider, api_key: impl Into<String>) -> Self {
        let (api_url, model) = match provider {
            SttProvider::Groq => (GROQ_STT_URL, GROQ_DEFAULT_MODEL),
            SttProvider::OpenAI => (OPENAI_STT_URL, OPENAI_DEFAULT_MODEL),
        };
        Self {
            provider,
            api_key: api_key.into(),
            api_url: api_url.to_string(),
            model: model.to_string(),
            language: "en".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err(format!("API key is required for {} speech-to-text", self.provider));
        }
        if self.model.is_empty() {
            return Err("Transcription model must not be empty".to_string());
        }
        Ok(())
    }
}

impl std::fmt::Debug for WhisperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("language", &self.language)
            .finish()
    }
}

impl Drop for WhisperConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}
