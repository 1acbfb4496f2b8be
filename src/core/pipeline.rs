//! The reply-on-pause callback: transcribe, route, synthesize.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::debug;

use super::audio::AudioSegment;
use super::llm::{LlmBackend, LlmError, ResponseRouter};
use super::stt::{STTError, SpeechToText};
use super::tts::{AudioChunkStream, TTSError, TextToSpeech};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Transcription failed: {0}")]
    Transcription(#[from] STTError),
    #[error("Response generation failed: {0}")]
    Response(#[from] LlmError),
    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[from] TTSError),
}

/// Lazy stream of reply audio for one turn.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<Bytes, PipelineError>> + Send>>;

/// Turns one caller utterance into spoken reply audio.
///
/// Collaborators are injected once at startup and shared by every call.
#[derive(Clone)]
pub struct VoicePipeline {
    stt: Arc<dyn SpeechToText>,
    router: Arc<ResponseRouter>,
    tts: Arc<dyn TextToSpeech>,
    backend: LlmBackend,
}

impl VoicePipeline {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        router: Arc<ResponseRouter>,
        tts: Arc<dyn TextToSpeech>,
        backend: LlmBackend,
    ) -> Self {
        Self {
            stt,
            router,
            tts,
            backend,
        }
    }

    pub fn backend(&self) -> LlmBackend {
        self.backend
    }

    /// Sample rate of the PCM16 chunks yielded by [`respond`](Self::respond).
    pub fn output_sample_rate(&self) -> u32 {
        self.tts.output_sample_rate()
    }

    /// Produce the reply for `segment`.
    ///
    /// Nothing runs until the stream is polled. An empty transcript yields an
    /// empty stream; any failure is yielded once as the final item.
    pub fn respond(&self, segment: AudioSegment) -> ReplyStream {
        let pipeline = self.clone();

        Box::pin(stream! {
            match pipeline.start_reply(segment).await {
                Ok(Some(mut audio)) => {
                    while let Some(chunk) = audio.next().await {
                        let failed = chunk.is_err();
                        yield chunk.map_err(PipelineError::from);
                        if failed {
                            break;
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    yield Err(e);
                }
            }
        })
    }

    async fn start_reply(
        &self,
        segment: AudioSegment,
    ) -> Result<Option<AudioChunkStream>, PipelineError> {
        let transcript = self.stt.transcribe(&segment).await?;
        if transcript.trim().is_empty() {
            debug!(
                duration_ms = segment.duration_ms(),
                "Empty transcript, skipping reply"
            );
            return Ok(None);
        }

        let reply = self.router.get_response(&transcript, self.backend).await?;
        let audio = self.tts.synthesize(&reply).await?;
        Ok(Some(audio))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::llm::BackendClients;
    use crate::core::llm::router::tests::RecordingClient;
    use crate::core::stt::STTResult;
    use crate::core::tts::TTSResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    pub(crate) struct FixedTranscript {
        text: String,
        pub(crate) calls: AtomicUsize,
    }

    impl FixedTranscript {
        pub(crate) fn new(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SpeechToText for FixedTranscript {
        async fn transcribe(&self, _segment: &AudioSegment) -> STTResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }

        fn get_provider_info(&self) -> &'static str {
            "fixed"
        }
    }

    /// Speaks every reply as `chunks` chunks of `chunk_len` bytes of PCM.
    pub(crate) struct ToneSynth {
        chunks: usize,
        chunk_len: usize,
        pub(crate) spoken: Mutex<Vec<String>>,
    }

    impl ToneSynth {
        pub(crate) fn new(chunks: usize, chunk_len: usize) -> Arc<Self> {
            Arc::new(Self {
                chunks,
                chunk_len,
                spoken: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextToSpeech for ToneSynth {
        async fn synthesize(&self, text: &str) -> TTSResult<AudioChunkStream> {
            self.spoken.lock().await.push(text.to_string());
            let chunk = Bytes::from(vec![0x10; self.chunk_len]);
            let chunks: Vec<TTSResult<Bytes>> = (0..self.chunks).map(|_| Ok(chunk.clone())).collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }

        fn output_sample_rate(&self) -> u32 {
            24000
        }

        fn get_provider_info(&self) -> serde_json::Value {
            serde_json::json!({"provider": "tone"})
        }
    }

    fn pipeline(
        stt: Arc<FixedTranscript>,
        llm: Arc<RecordingClient>,
        tts: Arc<ToneSynth>,
    ) -> VoicePipeline {
        let router = ResponseRouter::new(
            BackendClients {
                ollama: llm.clone(),
                groq: llm,
            },
            "persona",
            "llama3.2",
        );
        VoicePipeline::new(stt, Arc::new(router), tts, LlmBackend::Ollama)
    }

    fn segment() -> AudioSegment {
        AudioSegment::new(vec![500; 1600], 8000)
    }

    #[tokio::test]
    async fn test_reply_audio_is_streamed() {
        let llm = RecordingClient::replying("We open at 8 AM!");
        let tts = ToneSynth::new(3, 960);
        let pipeline = pipeline(FixedTranscript::new("What time do you open?"), llm.clone(), tts.clone());

        let chunks: Vec<_> = pipeline.respond(segment()).collect().await;
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.as_ref().map(|b| b.len()).ok() == Some(960)));

        assert_eq!(tts.spoken.lock().await.as_slice(), ["We open at 8 AM!"]);
        let requests = llm.requests.lock().await;
        assert_eq!(requests[0].messages[1].content, "What time do you open?");
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let stt = FixedTranscript::new("hello");
        let pipeline = pipeline(stt.clone(), RecordingClient::replying("hi"), ToneSynth::new(1, 10));

        let stream = pipeline.respond(segment());
        assert_eq!(stt.calls.load(Ordering::SeqCst), 0);
        drop(stream);
        assert_eq!(stt.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_router() {
        let llm = RecordingClient::replying("unused");
        let tts = ToneSynth::new(1, 10);
        let pipeline = pipeline(FixedTranscript::new("  "), llm.clone(), tts.clone());

        let chunks: Vec<_> = pipeline.respond(segment()).collect().await;
        assert!(chunks.is_empty());
        assert!(llm.requests.lock().await.is_empty());
        assert!(tts.spoken.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_is_single_error_item() {
        let tts = ToneSynth::new(1, 10);
        let pipeline = pipeline(FixedTranscript::new("hello"), RecordingClient::failing(), tts.clone());

        let chunks: Vec<_> = pipeline.respond(segment()).collect().await;
        assert_eq!(chunks.len(), 1);
        assert!(matches!(chunks[0], Err(PipelineError::Response(_))));
        assert!(tts.spoken.lock().await.is_empty());
    }
}
