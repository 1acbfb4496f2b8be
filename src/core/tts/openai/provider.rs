use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use zeroize::Zeroize;

use super::config::{OPENAI_PCM_SAMPLE_RATE, OPENAI_TTS_URL, OpenAITTSModel, OpenAIVoice};
use crate::core::tts::base::{AudioChunkStream, TTSError, TTSResult, TextToSpeech};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// OpenAI text-to-speech over HTTP, streaming raw PCM as it is generated.
pub struct OpenAITTS {
    api_key: String,
    api_url: String,
    model: OpenAITTSModel,
    voice: OpenAIVoice,
    http_client: Client,
}

impl OpenAITTS {
    pub fn new(api_key: impl Into<String>, model: &str, voice: &str) -> TTSResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(TTSError::AuthenticationFailed(
                "OPENAI_API_KEY is required for text-to-speech".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| {
                TTSError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            api_key,
            api_url: OPENAI_TTS_URL.to_string(),
            model: model.parse()?,
            voice: voice.parse()?,
            http_client,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn model(&self) -> OpenAITTSModel {
        self.model
    }

    pub fn voice(&self) -> OpenAIVoice {
        self.voice
    }

    fn build_http_request(&self, text: &str) -> reqwest::RequestBuilder {
        let body = json!({
            "model": self.model.as_str(),
            "input": text,
            "voice": self.voice.as_str(),
            "response_format": "pcm",
        });

        self.http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
    }
}

impl Drop for OpenAITTS {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

#[async_trait]
impl TextToSpeech for OpenAITTS {
    async fn synthesize(&self, text: &str) -> TTSResult<AudioChunkStream> {
        if text.trim().is_empty() {
            return Ok(Box::pin(futures::stream::empty()));
        }

        debug!(model = %self.model, voice = %self.voice, chars = text.len(), "Requesting speech");

        let response = self
            .build_http_request(text)
            .send()
            .await
            .map_err(|e| TTSError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error_msg = format!("OpenAI TTS error ({status}): {body}");
            return Err(match status.as_u16() {
                400 => TTSError::InvalidText(error_msg),
                401 | 403 => TTSError::AuthenticationFailed(error_msg),
                _ => TTSError::ProviderError(error_msg),
            });
        }

        let chunks = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| TTSError::NetworkError(format!("Audio stream interrupted: {e}")))
        });
        Ok(Box::pin(chunks))
    }

    fn output_sample_rate(&self) -> u32 {
        OPENAI_PCM_SAMPLE_RATE
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "openai",
            "api_type": "HTTP REST",
            "response_format": "pcm",
            "sample_rate": OPENAI_PCM_SAMPLE_RATE,
            "model": self.model.as_str(),
            "voice": self.voice.as_str(),
            "endpoint": self.api_url,
        })
    }
}
