//! Wire types for Whisper transcription responses and the WAV upload.

use serde::{Deserialize, Serialize};

/// JSON transcription response (`response_format = json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,

    /// Groq-specific metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_groq: Option<GroqMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqMetadata {
    pub id: String,
}

/// Error envelope shared by Groq and OpenAI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,

    #[serde(rename = "type", default)]
    pub error_type: Option<String>,

    #[serde(default)]
    pub code: Option<String>,
}

pub mod wav {
    use std::io::Cursor;

    /// Encode mono PCM16 samples as a WAV file.
    pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for &sample in samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}
