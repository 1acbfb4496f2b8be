//! Media stream WebSocket handler
//!
//! Twilio connects here once the call's TwiML reaches `<Connect><Stream>`.
//! Caller audio feeds a pause detector; each detected pause starts one reply
//! task that streams synthesized audio back as μ-law frames. Speech from the
//! caller while a reply is playing aborts it and clears Twilio's buffer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use base64::Engine;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use super::messages::{MediaStreamRoute, TwilioIncomingMessage, TwilioOutgoingMessage};
use crate::core::audio::{AudioSegment, TELEPHONY_SAMPLE_RATE, TelephonyEncoder, decode_mulaw};
use crate::core::{PauseDetector, PauseEvent, VoicePipeline};
use crate::state::AppState;

/// Channel buffer size for outbound frames
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Maximum WebSocket frame size (1 MB)
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// How long the writer gets to flush the close frame on teardown
const SENDER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Media stream WebSocket handler
///
/// Upgrades the HTTP connection to a WebSocket speaking the Twilio Media
/// Streams protocol.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Media stream connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_stream(socket, state))
}

async fn handle_media_stream(socket: WebSocket, app_state: Arc<AppState>) {
    info!("Media stream connection established");

    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<MediaStreamRoute>(CHANNEL_BUFFER_SIZE);

    // Single writer for the socket
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let result = match route {
                MediaStreamRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                MediaStreamRoute::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let mut call = CallSession::new(
        app_state.pipeline.clone(),
        PauseDetector::new(app_state.pause_detector_config()),
        message_tx.clone(),
    );

    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<TwilioIncomingMessage>(text.as_str()) {
                    Ok(message) => {
                        if !call.handle_message(message).await {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring unrecognized media stream frame: {}", e),
                }
            }
            Ok(Message::Close(_)) => {
                info!("Media stream closed by Twilio");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Media stream WebSocket error: {}", e);
                break;
            }
        }
    }

    call.finish();
    let _ = message_tx.send(MediaStreamRoute::Close).await;
    drop(message_tx);
    if tokio::time::timeout(SENDER_SHUTDOWN_TIMEOUT, sender_task)
        .await
        .is_err()
    {
        debug!("Media stream writer did not finish in time");
    }

    info!(stream_sid = ?call.stream_sid, turns = call.turns, "Media stream finished");
}

/// The latest reply: its task and the mark that closes its audio.
struct ActiveReply {
    task: JoinHandle<()>,
    mark: String,
    /// Set once the first frame has gone to Twilio.
    audio_sent: Arc<AtomicBool>,
}

impl ActiveReply {
    /// Generating, or audio queued at Twilio whose mark has not come back.
    fn is_playing(&self) -> bool {
        !self.task.is_finished() || self.audio_sent.load(Ordering::Acquire)
    }
}

/// Per-call state: the pause detector and the reply currently playing.
struct CallSession {
    pipeline: VoicePipeline,
    detector: PauseDetector,
    message_tx: mpsc::Sender<MediaStreamRoute>,
    stream_sid: Option<String>,
    reply: Option<ActiveReply>,
    turns: u64,
}

impl CallSession {
    fn new(
        pipeline: VoicePipeline,
        detector: PauseDetector,
        message_tx: mpsc::Sender<MediaStreamRoute>,
    ) -> Self {
        Self {
            pipeline,
            detector,
            message_tx,
            stream_sid: None,
            reply: None,
            turns: 0,
        }
    }

    /// Returns false once the stream has ended.
    async fn handle_message(&mut self, message: TwilioIncomingMessage) -> bool {
        match message {
            TwilioIncomingMessage::Connected { protocol, version } => {
                debug!(?protocol, ?version, "Media stream connected");
            }
            TwilioIncomingMessage::Start { stream_sid, start } => {
                info!(
                    stream_sid = %stream_sid,
                    call_sid = ?start.call_sid,
                    "Media stream started"
                );
                if let Some(format) = &start.media_format
                    && (format.encoding != "audio/x-mulaw"
                        || format.sample_rate != TELEPHONY_SAMPLE_RATE)
                {
                    warn!(
                        encoding = %format.encoding,
                        sample_rate = format.sample_rate,
                        "Unexpected media format"
                    );
                }
                self.stream_sid = Some(stream_sid);
            }
            TwilioIncomingMessage::Media { media, .. } => {
                if media.is_inbound() {
                    self.handle_audio(&media.payload).await;
                }
            }
            TwilioIncomingMessage::Mark { mark, .. } => {
                debug!(mark = %mark.name, "Playback reached mark");
                if self.reply.as_ref().is_some_and(|r| r.mark == mark.name) {
                    self.reply = None;
                }
            }
            TwilioIncomingMessage::Dtmf { dtmf, .. } => {
                info!(digit = %dtmf.digit, "DTMF received");
            }
            TwilioIncomingMessage::Stop { .. } => {
                info!(stream_sid = ?self.stream_sid, "Media stream stopped");
                return false;
            }
        }
        true
    }

    async fn handle_audio(&mut self, payload: &str) {
        let mulaw = match base64::engine::general_purpose::STANDARD.decode(payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Invalid base64 media payload: {}", e);
                return;
            }
        };

        match self.detector.push_frame(&decode_mulaw(&mulaw)) {
            Some(PauseEvent::SpeechStarted) => self.interrupt().await,
            Some(PauseEvent::Pause(segment)) => self.start_reply(segment),
            None => {}
        }
    }

    /// Barge-in: stop generating and drop audio Twilio has queued.
    async fn interrupt(&mut self) {
        let Some(reply) = self.reply.take() else {
            return;
        };
        if !reply.is_playing() {
            return;
        }

        reply.task.abort();
        if !reply.audio_sent.load(Ordering::Acquire) {
            debug!(mark = %reply.mark, "Caller spoke before reply audio, cancelled");
            return;
        }

        if let Some(stream_sid) = &self.stream_sid {
            info!(stream_sid = %stream_sid, "Caller interrupted reply");
            let _ = self
                .message_tx
                .send(MediaStreamRoute::Outgoing(TwilioOutgoingMessage::clear(
                    stream_sid,
                )))
                .await;
        }
    }

    fn start_reply(&mut self, segment: AudioSegment) {
        let Some(stream_sid) = self.stream_sid.clone() else {
            warn!("Pause detected before stream start, dropping segment");
            return;
        };

        if let Some(previous) = self.reply.take() {
            previous.task.abort();
        }

        self.turns += 1;
        let mark = format!("reply-{}", self.turns);
        debug!(
            stream_sid = %stream_sid,
            turn = self.turns,
            duration_ms = segment.duration_ms(),
            "Caller paused, generating reply"
        );

        let audio_sent = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(stream_reply(
            self.pipeline.clone(),
            segment,
            stream_sid,
            mark.clone(),
            audio_sent.clone(),
            self.message_tx.clone(),
        ));
        self.reply = Some(ActiveReply {
            task,
            mark,
            audio_sent,
        });
    }

    fn finish(&mut self) {
        if let Some(reply) = self.reply.take() {
            reply.task.abort();
        }
    }
}

/// Run one turn and forward its audio as 20 ms μ-law frames, ending with a mark.
async fn stream_reply(
    pipeline: VoicePipeline,
    segment: AudioSegment,
    stream_sid: String,
    mark: String,
    audio_sent: Arc<AtomicBool>,
    message_tx: mpsc::Sender<MediaStreamRoute>,
) {
    let mut encoder = TelephonyEncoder::new(pipeline.output_sample_rate());
    let mut reply = pipeline.respond(segment);
    let mut frames_sent = 0usize;

    while let Some(item) = reply.next().await {
        match item {
            Ok(chunk) => {
                for frame in encoder.push(&chunk) {
                    let message = TwilioOutgoingMessage::media(&stream_sid, &frame);
                    if message_tx
                        .send(MediaStreamRoute::Outgoing(message))
                        .await
                        .is_err()
                    {
                        return;
                    }
                    frames_sent += 1;
                    audio_sent.store(true, Ordering::Release);
                }
            }
            Err(e) => {
                error!(stream_sid = %stream_sid, "Reply failed: {}", e);
                break;
            }
        }
    }

    if let Some(frame) = encoder.finish() {
        let message = TwilioOutgoingMessage::media(&stream_sid, &frame);
        if message_tx
            .send(MediaStreamRoute::Outgoing(message))
            .await
            .is_err()
        {
            return;
        }
        frames_sent += 1;
        audio_sent.store(true, Ordering::Release);
    }

    if frames_sent > 0 {
        let _ = message_tx
            .send(MediaStreamRoute::Outgoing(TwilioOutgoingMessage::mark(
                &stream_sid,
                mark,
            )))
            .await;
    }

    debug!(stream_sid = %stream_sid, frames = frames_sent, "Reply streamed");
}
