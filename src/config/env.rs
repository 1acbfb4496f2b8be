use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ServerConfig, TlsConfig};
use crate::core::llm::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, LlmBackend, Persona};
use crate::core::stt::SttProvider;
use crate::core::turn::{DEFAULT_PAUSE_RMS_THRESHOLD, DEFAULT_PAUSE_SILENCE_MS};

pub(super) const DEFAULT_HOST: &str = "0.0.0.0";
pub(super) const DEFAULT_PORT: u16 = 8000;
pub(super) const DEFAULT_STT_LANGUAGE: &str = "en";
pub(super) const DEFAULT_TTS_MODEL: &str = "tts-1";
pub(super) const DEFAULT_TTS_VOICE: &str = "alloy";
pub(super) const DEFAULT_RATE_LIMIT_RPS: u32 = 60;
pub(super) const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

/// Read a variable, treating unset and blank the same.
fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_string(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env_string(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn tls_from_env() -> Result<Option<TlsConfig>, ConfigError> {
    match (env_string("TLS_CERT_PATH"), env_string("TLS_KEY_PATH")) {
        (Some(cert), Some(key)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        (None, None) => Ok(None),
        _ => Err(ConfigError::Invalid(
            "TLS requires both TLS_CERT_PATH and TLS_KEY_PATH".to_string(),
        )),
    }
}

pub(super) fn load_from_env() -> Result<ServerConfig, ConfigError> {
    Ok(ServerConfig {
        host: env_or("HOST", DEFAULT_HOST),
        port: env_parse("PORT", DEFAULT_PORT)?,
        public_host: env_string("PUBLIC_HOST"),
        tls: tls_from_env()?,

        model_name: env_parse("MODEL_NAME", LlmBackend::default())?,
        ollama_url: env_or("OLLAMA_URL", DEFAULT_OLLAMA_URL),
        ollama_model_name: env_or("OLLAMA_MODEL_NAME", DEFAULT_OLLAMA_MODEL),
        groq_api_key: env_string("GROQ_API_KEY"),

        stt_provider: env_parse("STT_PROVIDER", SttProvider::default())?,
        stt_model: env_string("STT_MODEL"),
        stt_language: env_or("STT_LANGUAGE", DEFAULT_STT_LANGUAGE),

        openai_api_key: env_string("OPENAI_API_KEY"),

        tts_model: env_or("TTS_MODEL", DEFAULT_TTS_MODEL),
        tts_voice: env_or("TTS_VOICE", DEFAULT_TTS_VOICE),

        pause_silence_ms: env_parse("PAUSE_SILENCE_MS", DEFAULT_PAUSE_SILENCE_MS)?,
        pause_rms_threshold: env_parse("PAUSE_RMS_THRESHOLD", DEFAULT_PAUSE_RMS_THRESHOLD)?,

        persona: Persona::default(),

        cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS"),
        rate_limit_requests_per_second: env_parse(
            "RATE_LIMIT_REQUESTS_PER_SECOND",
            DEFAULT_RATE_LIMIT_RPS,
        )?,
        rate_limit_burst_size: env_parse("RATE_LIMIT_BURST_SIZE", DEFAULT_RATE_LIMIT_BURST)?,
    })
}
