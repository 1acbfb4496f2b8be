use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::core::stt::{WhisperConfig, create_stt_provider};
use crate::core::tts::create_tts_provider;
use crate::core::{PauseDetectorConfig, ResponseRouter, VoicePipeline};
use crate::errors::{AppError, AppResult};

/// Process-wide state shared by every request and call.
///
/// Built once at startup; read-only afterwards.
pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: VoicePipeline,
}

impl AppState {
    /// Build the backend clients and speech providers from configuration.
    pub async fn new(config: ServerConfig) -> AppResult<Arc<Self>> {
        let router = ResponseRouter::from_config(&config)?;

        let stt_key = config.stt_api_key().ok_or_else(|| {
            AppError::MissingCredential(format!(
                "an API key for the {} speech-to-text provider",
                config.stt_provider
            ))
        })?;
        let mut stt_config = WhisperConfig::for_provider(config.stt_provider, stt_key);
        if let Some(model) = &config.stt_model {
            stt_config.model = model.clone();
        }
        stt_config.language = config.stt_language.clone();
        let stt = create_stt_provider(stt_config)?;

        let openai_key = config.openai_api_key.as_deref().ok_or_else(|| {
            AppError::MissingCredential("OPENAI_API_KEY for text-to-speech".to_string())
        })?;
        let tts = create_tts_provider(openai_key, &config.tts_model, &config.tts_voice)?;

        info!(
            backend = %config.model_name,
            stt = stt.get_provider_info(),
            tts_voice = %config.tts_voice,
            "Voice pipeline ready"
        );

        let pipeline = VoicePipeline::new(stt, Arc::new(router), tts, config.model_name);
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Assemble state around an already-built pipeline.
    pub fn with_pipeline(config: ServerConfig, pipeline: VoicePipeline) -> Arc<Self> {
        Arc::new(Self { config, pipeline })
    }

    pub fn pause_detector_config(&self) -> PauseDetectorConfig {
        self.config.pause_detector_config()
    }
}
