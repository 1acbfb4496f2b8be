//! Configuration types for OpenAI TTS API.
//!
//! - Model selection (tts-1, tts-1-hd, gpt-4o-mini-tts)
//! - Voice selection (11 available voices)

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::tts::base::TTSError;

/// OpenAI speech endpoint.
pub const OPENAI_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Raw PCM output is 24kHz 16-bit mono little-endian.
pub const OPENAI_PCM_SAMPLE_RATE: u32 = 24000;

// =============================================================================
// OpenAI TTS Models
// =============================================================================

/// Supported OpenAI TTS models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpenAITTSModel {
    /// Standard quality, lower latency
    #[default]
    #[serde(rename = "tts-1")]
    Tts1,
    #[serde(rename = "tts-1-hd")]
    Tts1Hd,
    #[serde(rename = "gpt-4o-mini-tts")]
    Gpt4oMiniTts,
}

impl OpenAITTSModel {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tts1 => "tts-1",
            Self::Tts1Hd => "tts-1-hd",
            Self::Gpt4oMiniTts => "gpt-4o-mini-tts",
        }
    }

}

impl FromStr for OpenAITTSModel {
    type Err = TTSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tts-1" | "tts1" => Ok(Self::Tts1),
            "tts-1-hd" | "tts1-hd" | "tts1hd" => Ok(Self::Tts1Hd),
            "gpt-4o-mini-tts" | "gpt4o-mini-tts" => Ok(Self::Gpt4oMiniTts),
            _ => Err(TTSError::ConfigurationError(format!(
                "Unsupported TTS model: {s}. Supported models: tts-1, tts-1-hd, gpt-4o-mini-tts"
            ))),
        }
    }
}

impl std::fmt::Display for OpenAITTSModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// OpenAI TTS Voices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAIVoice {
    #[default]
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Fable,
    Onyx,
    Nova,
    Sage,
    Shimmer,
    Verse,
}

impl OpenAIVoice {
    const ALL: [OpenAIVoice; 11] = [
        Self::Alloy,
        Self::Ash,
        Self::Ballad,
        Self::Coral,
        Self::Echo,
        Self::Fable,
        Self::Onyx,
        Self::Nova,
        Self::Sage,
        Self::Shimmer,
        Self::Verse,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

}

impl FromStr for OpenAIVoice {
    type Err = TTSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|voice| voice.as_str() == wanted)
            .ok_or_else(|| TTSError::ConfigurationError(format!("Unsupported TTS voice: {s}")))
    }
}

impl std::fmt::Display for OpenAIVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
