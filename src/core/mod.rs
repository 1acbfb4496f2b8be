pub mod audio;
pub mod llm;
pub mod pipeline;
pub mod stt;
pub mod tts;
pub mod turn;

// Re-export commonly used types for convenience
pub use audio::{AudioSegment, TelephonyEncoder};
pub use llm::{
    BackendClients, ChatCompletion, ChatMessage, ChatRequest, ChatRole, LlmBackend, LlmError,
    LlmResult, Persona, ResponseRouter,
};
pub use pipeline::{PipelineError, ReplyStream, VoicePipeline};
pub use stt::{STTError, STTResult, SpeechToText, SttProvider, create_stt_provider};
pub use tts::{AudioChunkStream, TTSError, TTSResult, TextToSpeech, create_tts_provider};
pub use turn::{PauseDetector, PauseDetectorConfig, PauseEvent};
