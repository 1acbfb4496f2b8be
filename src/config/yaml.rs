use serde::Deserialize;
use std::path::PathBuf;

use super::ConfigError;
use crate::core::llm::Persona;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Anything set here
/// overrides the environment.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8000
///   public_host: "abc123.ngrok.app"
///   tls:
///     cert_path: "/etc/certs/cert.pem"
///     key_path: "/etc/certs/key.pem"
///
/// llm:
///   backend: "groq"
///   ollama_url: "http://localhost:11434"
///   ollama_model: "llama3.2"
///
/// providers:
///   groq_api_key: "gsk_..."
///   openai_api_key: "sk-..."
///
/// stt:
///   provider: "groq"
///   model: "whisper-large-v3-turbo"
///   language: "en"
///
/// tts:
///   model: "tts-1"
///   voice: "alloy"
///
/// pause:
///   silence_ms: 600
///   rms_threshold: 0.02
///
/// persona:
///   assistant_name: "Lisa"
///   business_name: "London Electronics"
///
/// security:
///   cors_allowed_origins: "*"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub llm: Option<LlmYaml>,
    pub providers: Option<ProvidersYaml>,
    pub stt: Option<SttYaml>,
    pub tts: Option<TtsYaml>,
    pub pause: Option<PauseYaml>,
    pub persona: Option<Persona>,
    pub security: Option<SecurityYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub public_host: Option<String>,
    pub tls: Option<TlsYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmYaml {
    /// Backend selector, same values as `MODEL_NAME`
    pub backend: Option<String>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SttYaml {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsYaml {
    pub model: Option<String>,
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PauseYaml {
    pub silence_ms: Option<u32>,
    pub rms_threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config: YamlConfig = serde_yaml::from_str(&contents)?;

        Ok(config)
    }
}
