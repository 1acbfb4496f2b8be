//! Configuration module for the phone bridge
//!
//! Server configuration comes from `.env` files, environment variables and an
//! optional YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `env`: Environment variable loading
//! - `yaml`: YAML configuration file loading
//! - `merge`: Applying YAML overrides on top of the environment
//!
//! # Example
//! ```rust,no_run
//! use phonebridge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::core::llm::{LlmBackend, Persona};
use crate::core::stt::SttProvider;
use crate::core::tts::{OpenAITTSModel, OpenAIVoice};
use crate::core::turn::PauseDetectorConfig;

mod env;
mod merge;
mod yaml;

pub use yaml::YamlConfig;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    /// Host name Twilio should dial back for the media stream.
    /// `None` falls back to the `Host` header of the webhook request.
    pub public_host: Option<String>,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Chat-completion backend
    pub model_name: LlmBackend,
    pub ollama_url: String,
    pub ollama_model_name: String,
    pub groq_api_key: Option<String>,

    // Speech-to-text
    pub stt_provider: SttProvider,
    /// `None` uses the provider's default model.
    pub stt_model: Option<String>,
    pub stt_language: String,

    /// OpenAI API key for TTS and OpenAI Whisper
    pub openai_api_key: Option<String>,

    // Text-to-speech
    pub tts_model: String,
    pub tts_voice: String,

    // Pause detection
    pub pause_silence_ms: u32,
    pub pause_rms_threshold: f32,

    pub persona: Persona,

    // Security settings
    /// Comma-separated list of allowed origins, or "*" for any
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,
}

/// Implement Drop to zeroize all secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.groq_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, with defaults for anything unset.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, layered over the environment.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pause detector settings for 8 kHz telephony audio.
    pub fn pause_detector_config(&self) -> PauseDetectorConfig {
        PauseDetectorConfig {
            rms_threshold: self.pause_rms_threshold,
            silence_duration_ms: self.pause_silence_ms,
            ..Default::default()
        }
    }

    /// API key used by the configured speech-to-text provider.
    pub fn stt_api_key(&self) -> Option<&str> {
        match self.stt_provider {
            SttProvider::Groq => self.groq_api_key.as_deref(),
            SttProvider::OpenAI => self.openai_api_key.as_deref(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.pause_rms_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "PAUSE_RMS_THRESHOLD".to_string(),
                message: format!("must be between 0.0 and 1.0, got {}", self.pause_rms_threshold),
            });
        }
        if let Err(e) = self.tts_model.parse::<OpenAITTSModel>() {
            return Err(ConfigError::InvalidValue {
                key: "TTS_MODEL".to_string(),
                message: e.to_string(),
            });
        }
        if let Err(e) = self.tts_voice.parse::<OpenAIVoice>() {
            return Err(ConfigError::InvalidValue {
                key: "TTS_VOICE".to_string(),
                message: e.to_string(),
            });
        }
        if self.pause_silence_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PAUSE_SILENCE_MS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.rate_limit_requests_per_second == 0 || self.rate_limit_burst_size == 0 {
            return Err(ConfigError::Invalid(
                "Rate limit values must be greater than zero".to_string(),
            ));
        }
        if let Some(tls) = &self.tls {
            if tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "TLS requires both a certificate path and a key path".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::{env, fs};
    use tempfile::TempDir;

    const VARS: &[&str] = &[
        "HOST",
        "PORT",
        "PUBLIC_HOST",
        "TLS_CERT_PATH",
        "TLS_KEY_PATH",
        "MODEL_NAME",
        "OLLAMA_URL",
        "OLLAMA_MODEL_NAME",
        "GROQ_API_KEY",
        "STT_PROVIDER",
        "STT_MODEL",
        "STT_LANGUAGE",
        "OPENAI_API_KEY",
        "TTS_MODEL",
        "TTS_VOICE",
        "PAUSE_SILENCE_MS",
        "PAUSE_RMS_THRESHOLD",
        "CORS_ALLOWED_ORIGINS",
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        "RATE_LIMIT_BURST_SIZE",
    ];

    // Helper to clean up environment variables
    fn cleanup_env_vars() {
        for var in VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.address(), "0.0.0.0:8000");
        assert_eq!(config.model_name, LlmBackend::Ollama);
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.ollama_model_name, "llama3.2");
        assert_eq!(config.groq_api_key, None);
        assert_eq!(config.stt_provider, SttProvider::Groq);
        assert_eq!(config.stt_model, None);
        assert_eq!(config.stt_language, "en");
        assert_eq!(config.tts_model, "tts-1");
        assert_eq!(config.tts_voice, "alloy");
        assert_eq!(config.pause_silence_ms, 600);
        assert_eq!(config.pause_rms_threshold, 0.02);
        assert_eq!(config.rate_limit_requests_per_second, 60);
        assert_eq!(config.rate_limit_burst_size, 10);
        assert!(config.tls.is_none());
        assert_eq!(config.persona, Persona::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        cleanup_env_vars();
        unsafe {
            env::set_var("MODEL_NAME", "Groq");
            env::set_var("GROQ_API_KEY", "gsk_env");
            env::set_var("OLLAMA_URL", "http://ollama:11434");
            env::set_var("OLLAMA_MODEL_NAME", "mistral");
            env::set_var("PORT", "9000");
            env::set_var("PUBLIC_HOST", "abc.ngrok.app");
            env::set_var("STT_PROVIDER", "openai");
            env::set_var("PAUSE_SILENCE_MS", "800");
            env::set_var("TLS_CERT_PATH", "/certs/cert.pem");
            env::set_var("TLS_KEY_PATH", "/certs/key.pem");
        }

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.model_name, LlmBackend::Groq);
        assert_eq!(config.groq_api_key.as_deref(), Some("gsk_env"));
        assert_eq!(config.ollama_url, "http://ollama:11434");
        assert_eq!(config.ollama_model_name, "mistral");
        assert_eq!(config.port, 9000);
        assert_eq!(config.public_host.as_deref(), Some("abc.ngrok.app"));
        assert_eq!(config.stt_provider, SttProvider::OpenAI);
        assert_eq!(config.stt_api_key(), None);
        assert_eq!(config.pause_detector_config().silence_duration_ms, 800);
        assert_eq!(
            config.tls,
            Some(TlsConfig {
                cert_path: PathBuf::from("/certs/cert.pem"),
                key_path: PathBuf::from("/certs/key.pem"),
            })
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_model_name_is_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("MODEL_NAME", "openai");
        }

        let err = ServerConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MODEL_NAME"));
        assert!(err.to_string().contains("Supported backends: ollama, groq"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_unknown_tts_model_or_voice_is_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TTS_VOICE", "robot");
        }
        let err = ServerConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "TTS_VOICE"));

        unsafe {
            env::set_var("TTS_VOICE", "Nova");
            env::set_var("TTS_MODEL", "tts-2");
        }
        let err = ServerConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "TTS_MODEL"));

        unsafe {
            env::set_var("TTS_MODEL", "tts-1-hd");
        }
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.tts_voice, "Nova");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_are_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "eighty");
        }
        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("PORT"));

        cleanup_env_vars();
        unsafe {
            env::set_var("PAUSE_RMS_THRESHOLD", "1.5");
        }
        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("PAUSE_RMS_THRESHOLD"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_partial_tls_is_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TLS_CERT_PATH", "/certs/cert.pem");
        }

        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("TLS"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_empty_values_fall_back_to_defaults() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OLLAMA_URL", "");
            env::set_var("GROQ_API_KEY", "");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.groq_api_key, None);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_only() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080
  public_host: "calls.example.com"

llm:
  backend: groq
  ollama_model: "phi3"

providers:
  groq_api_key: "yaml-groq-key"
  openai_api_key: "yaml-openai-key"

tts:
  voice: "nova"

pause:
  silence_ms: 700
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.public_host.as_deref(), Some("calls.example.com"));
        assert_eq!(config.model_name, LlmBackend::Groq);
        assert_eq!(config.ollama_model_name, "phi3");
        assert_eq!(config.groq_api_key.as_deref(), Some("yaml-groq-key"));
        assert_eq!(config.openai_api_key.as_deref(), Some("yaml-openai-key"));
        assert_eq!(config.tts_voice, "nova");
        assert_eq!(config.tts_model, "tts-1");
        assert_eq!(config.pause_silence_ms, 700);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(
            &config_path,
            "server:\n  host: \"127.0.0.1\"\nllm:\n  backend: ollama\n",
        )
        .unwrap();

        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("PORT", "7000");
            env::set_var("MODEL_NAME", "groq");
        }

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.model_name, LlmBackend::Ollama);
        // ENV value
        assert_eq!(config.port, 7000);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_persona_override() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(
            &config_path,
            r#"
persona:
  assistant_name: "Max"
  hours: "9 AM to 5 PM on weekdays"
"#,
        )
        .unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.persona.assistant_name, "Max");
        assert_eq!(config.persona.hours, "9 AM to 5 PM on weekdays");
        assert_eq!(config.persona.business_name, "London Electronics");
        assert!(config.persona.render().starts_with("Your name is Max."));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_backend() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "llm:\n  backend: anthropic\n").unwrap();

        let err = ServerConfig::from_file(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "llm.backend"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ServerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_yaml() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: [content").unwrap();

        let result = ServerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }
}
