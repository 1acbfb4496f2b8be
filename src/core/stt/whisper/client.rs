//! Whisper transcription client.
//!
//! Groq and OpenAI expose the same `audio/transcriptions` REST contract:
//! a multipart upload with the audio file, the model name and optional
//! hints. Each caller utterance is sent as one WAV upload; there is no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use super::super::base::{STTError, STTResult, SpeechToText};
use super::config::{MAX_UPLOAD_BYTES, WhisperConfig};
use super::messages::{ApiErrorResponse, TranscriptionResponse, wav};
use crate::core::audio::AudioSegment;

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct WhisperSTT {
    config: WhisperConfig,
    http_client: Client,
}

impl WhisperSTT {
    pub fn with_config(config: WhisperConfig) -> STTResult<Self> {
        config.validate().map_err(STTError::ConfigurationError)?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| {
                STTError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn build_form(&self, wav_data: Vec<u8>) -> STTResult<Form> {
        let file_part = Part::bytes(wav_data)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| STTError::ConfigurationError(format!("Invalid MIME type: {e}")))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("response_format", "json");

        if !self.config.language.is_empty() {
            form = form.text("language", self.config.language.clone());
        }

        Ok(form)
    }

    fn classify_error(&self, status: reqwest::StatusCode, body: &str) -> STTError {
        let error_msg = match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(resp) => format!(
                "{} transcription error: {}",
                self.config.provider, resp.error.message
            ),
            Err(_) => format!(
                "{} transcription error ({status}): {body}",
                self.config.provider
            ),
        };

        match status.as_u16() {
            400 => STTError::ConfigurationError(error_msg),
            401 | 403 => STTError::AuthenticationFailed(error_msg),
            413 => STTError::AudioProcessingError(format!("File too large: {error_msg}")),
            429 => STTError::ProviderError(format!("Rate limit exceeded: {error_msg}")),
            500..=599 => STTError::ProviderError(format!("Server error: {error_msg}")),
            _ => STTError::ProviderError(error_msg),
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperSTT {
    async fn transcribe(&self, segment: &AudioSegment) -> STTResult<String> {
        if segment.is_empty() {
            debug!("No audio data to transcribe");
            return Ok(String::new());
        }

        let wav_data = wav::encode_wav(&segment.samples, segment.sample_rate)
            .map_err(|e| STTError::AudioProcessingError(format!("Failed to create WAV: {e}")))?;

        if wav_data.len() > MAX_UPLOAD_BYTES {
            return Err(STTError::AudioProcessingError(format!(
                "Audio ({} bytes) exceeds maximum upload size ({} bytes)",
                wav_data.len(),
                MAX_UPLOAD_BYTES
            )));
        }

        info!(
            "Sending {}ms of audio to {} Whisper API (model: {})",
            segment.duration_ms(),
            self.config.provider,
            self.config.model
        );

        let form = self.build_form(wav_data)?;
        let response = self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| STTError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| STTError::NetworkError(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(self.classify_error(status, &response_text));
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&response_text)
            .map_err(|e| STTError::ProviderError(format!("Failed to parse response: {e}")))?;

        if let Some(meta) = &parsed.x_groq {
            debug!("Groq request ID: {}", meta.id);
        }

        Ok(parsed.text.trim().to_string())
    }

    fn get_provider_info(&self) -> &'static str {
        match self.config.provider {
            super::super::SttProvider::Groq => "Groq Whisper",
            super::super::SttProvider::OpenAI => "OpenAI Whisper",
        }
    }
}
