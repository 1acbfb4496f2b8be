use super::env::{load_from_env, parse_value};
use super::yaml::YamlConfig;
use super::{ConfigError, ServerConfig, TlsConfig};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Build the configuration from the environment, then apply YAML overrides.
pub(super) fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, ConfigError> {
    let mut config = load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = non_empty(server.host) {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(public_host) = non_empty(server.public_host) {
            config.public_host = Some(public_host);
        }
        if let Some(tls) = server.tls {
            match (tls.cert_path, tls.key_path) {
                (Some(cert_path), Some(key_path)) => {
                    config.tls = Some(TlsConfig {
                        cert_path,
                        key_path,
                    });
                }
                (None, None) => {}
                _ => {
                    return Err(ConfigError::Invalid(
                        "server.tls requires both cert_path and key_path".to_string(),
                    ));
                }
            }
        }
    }

    if let Some(llm) = yaml.llm {
        if let Some(backend) = non_empty(llm.backend) {
            config.model_name = parse_value("llm.backend", &backend)?;
        }
        if let Some(url) = non_empty(llm.ollama_url) {
            config.ollama_url = url;
        }
        if let Some(model) = non_empty(llm.ollama_model) {
            config.ollama_model_name = model;
        }
    }

    if let Some(providers) = yaml.providers {
        if let Some(key) = non_empty(providers.groq_api_key) {
            config.groq_api_key = Some(key);
        }
        if let Some(key) = non_empty(providers.openai_api_key) {
            config.openai_api_key = Some(key);
        }
    }

    if let Some(stt) = yaml.stt {
        if let Some(provider) = non_empty(stt.provider) {
            config.stt_provider = parse_value("stt.provider", &provider)?;
        }
        if let Some(model) = non_empty(stt.model) {
            config.stt_model = Some(model);
        }
        if let Some(language) = stt.language {
            config.stt_language = language;
        }
    }

    if let Some(tts) = yaml.tts {
        if let Some(model) = non_empty(tts.model) {
            config.tts_model = model;
        }
        if let Some(voice) = non_empty(tts.voice) {
            config.tts_voice = voice;
        }
    }

    if let Some(pause) = yaml.pause {
        if let Some(ms) = pause.silence_ms {
            config.pause_silence_ms = ms;
        }
        if let Some(threshold) = pause.rms_threshold {
            config.pause_rms_threshold = threshold;
        }
    }

    if let Some(persona) = yaml.persona {
        config.persona = persona;
    }

    if let Some(security) = yaml.security {
        if let Some(origins) = non_empty(security.cors_allowed_origins) {
            config.cors_allowed_origins = Some(origins);
        }
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
    }

    Ok(config)
}
