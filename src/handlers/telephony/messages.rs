//! Twilio Media Streams message types
//!
//! Every frame on the media stream socket is a JSON text message tagged by
//! its `event` field. Audio travels as base64 8 kHz μ-law in both directions.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Messages sent by Twilio over the media stream socket
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TwilioIncomingMessage {
    /// First frame after the socket opens
    Connected {
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default)]
        version: Option<String>,
    },
    /// Stream metadata; carries the `streamSid` every outbound frame must echo
    Start {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        start: StreamStart,
    },
    /// A chunk of caller audio
    Media {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
        media: MediaPayload,
    },
    /// Playback reached a mark we sent earlier
    Mark {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
        mark: MarkPayload,
    },
    /// Caller pressed a key
    Dtmf {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
        dtmf: DtmfPayload,
    },
    /// The call or stream ended
    Stop {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamStart {
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
    #[serde(rename = "accountSid", default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub tracks: Vec<String>,
    #[serde(rename = "mediaFormat", default)]
    pub media_format: Option<MediaFormat>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaFormat {
    pub encoding: String,
    #[serde(rename = "sampleRate")]
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaPayload {
    #[serde(default)]
    pub track: Option<String>,
    /// Base64 μ-law audio
    pub payload: String,
}

impl MediaPayload {
    /// True for audio spoken by the caller (Twilio labels it `inbound`).
    pub fn is_inbound(&self) -> bool {
        self.track.as_deref().is_none_or(|t| t == "inbound")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkPayload {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DtmfPayload {
    pub digit: String,
}

/// Messages we send to Twilio
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TwilioOutgoingMessage {
    /// Audio to play to the caller
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutgoingMedia,
    },
    /// Ask Twilio to report when playback reaches this point
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkPayload,
    },
    /// Drop any audio Twilio has buffered but not yet played
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMedia {
    pub payload: String,
}

impl TwilioOutgoingMessage {
    pub fn media(stream_sid: &str, mulaw: &Bytes) -> Self {
        use base64::Engine;
        Self::Media {
            stream_sid: stream_sid.to_string(),
            media: OutgoingMedia {
                payload: base64::engine::general_purpose::STANDARD.encode(mulaw),
            },
        }
    }

    pub fn mark(stream_sid: &str, name: impl Into<String>) -> Self {
        Self::Mark {
            stream_sid: stream_sid.to_string(),
            mark: MarkPayload { name: name.into() },
        }
    }

    pub fn clear(stream_sid: &str) -> Self {
        Self::Clear {
            stream_sid: stream_sid.to_string(),
        }
    }
}

/// Routing for the socket's single writer task
#[derive(Debug)]
pub enum MediaStreamRoute {
    Outgoing(TwilioOutgoingMessage),
    Close,
}
