//! Shared fixtures for integration tests
//!
//! Fake providers stand in for Whisper, the chat backends and OpenAI speech
//! so the HTTP and WebSocket surfaces can be exercised without network access.

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use phonebridge::core::llm::LlmResult;
use phonebridge::{
    AppState, AudioChunkStream, AudioSegment, BackendClients, ChatCompletion, ChatRequest,
    LlmBackend, Persona, ResponseRouter, STTResult, ServerConfig, SpeechToText, SttProvider,
    TTSResult, TextToSpeech, VoicePipeline,
};

/// Find an available port for testing
pub fn find_available_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Config with dummy credentials and short pauses
pub fn create_test_config(port: u16) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        public_host: None,
        tls: None,
        model_name: LlmBackend::Ollama,
        ollama_url: "http://127.0.0.1:11434".to_string(),
        ollama_model_name: "llama3.2".to_string(),
        groq_api_key: Some("test-groq-key".to_string()),
        stt_provider: SttProvider::Groq,
        stt_model: None,
        stt_language: "en".to_string(),
        openai_api_key: Some("test-openai-key".to_string()),
        tts_model: "tts-1".to_string(),
        tts_voice: "alloy".to_string(),
        pause_silence_ms: 200,
        pause_rms_threshold: 0.02,
        persona: Persona::default(),
        cors_allowed_origins: None,
        rate_limit_requests_per_second: 100000,
        rate_limit_burst_size: 100000,
    }
}

/// Transcriber that always hears the same words
pub struct FakeTranscriber {
    text: String,
    pub calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SpeechToText for FakeTranscriber {
    async fn transcribe(&self, _segment: &AudioSegment) -> STTResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }

    fn get_provider_info(&self) -> &'static str {
        "fake-stt"
    }
}

/// Chat backend that always replies with the same text
pub struct CannedChat {
    reply: String,
    pub calls: AtomicUsize,
}

impl CannedChat {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ChatCompletion for CannedChat {
    async fn complete(&self, _request: ChatRequest) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn provider_name(&self) -> &'static str {
        "canned"
    }
}

/// Synthesizer producing loud 8 kHz PCM16 chunks, optionally paced
pub struct FakeSynth {
    chunks: usize,
    chunk_bytes: usize,
    delay: Duration,
}

impl FakeSynth {
    /// `chunks` chunks of one telephony frame each, all at once.
    pub fn instant(chunks: usize) -> Arc<Self> {
        Arc::new(Self {
            chunks,
            chunk_bytes: 320,
            delay: Duration::ZERO,
        })
    }

    /// Chunks released one per `delay`, long enough to interrupt.
    pub fn paced(chunks: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            chunks,
            chunk_bytes: 320,
            delay,
        })
    }
}

#[async_trait]
impl TextToSpeech for FakeSynth {
    async fn synthesize(&self, _text: &str) -> TTSResult<AudioChunkStream> {
        let chunks = self.chunks;
        let chunk_bytes = self.chunk_bytes;
        let delay = self.delay;

        Ok(Box::pin(async_stream::stream! {
            for _ in 0..chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let sample = 8000i16.to_le_bytes();
                let chunk: Vec<u8> = sample.iter().copied().cycle().take(chunk_bytes).collect();
                yield Ok(Bytes::from(chunk));
            }
        }))
    }

    fn output_sample_rate(&self) -> u32 {
        8000
    }

    fn get_provider_info(&self) -> serde_json::Value {
        serde_json::json!({ "provider": "fake-tts" })
    }
}

/// App state around fake providers
pub fn create_test_state(
    config: ServerConfig,
    stt: Arc<dyn SpeechToText>,
    chat: Arc<dyn ChatCompletion>,
    tts: Arc<dyn TextToSpeech>,
) -> Arc<AppState> {
    let clients = BackendClients {
        ollama: chat.clone(),
        groq: chat,
    };
    let router = ResponseRouter::new(clients, config.persona.render(), "llama3.2");
    let backend = config.model_name;
    let pipeline = VoicePipeline::new(stt, Arc::new(router), tts, backend);
    AppState::with_pipeline(config, pipeline)
}

/// App state whose every reply is `frames` frames of audio
pub fn create_default_state(port: u16, frames: usize) -> Arc<AppState> {
    create_test_state(
        create_test_config(port),
        FakeTranscriber::new("What time do you open?"),
        CannedChat::new("We open at 8 AM!"),
        FakeSynth::instant(frames),
    )
}
