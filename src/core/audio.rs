//! Audio helpers for telephony media.
//!
//! Twilio media streams carry 8 kHz mono G.711 μ-law, while the speech
//! providers work with 16-bit linear PCM. This module holds the conversions
//! between the two and the framing used on the outbound leg.

use bytes::Bytes;

/// Sample rate of Twilio media stream audio.
pub const TELEPHONY_SAMPLE_RATE: u32 = 8000;

/// One outbound media frame: 20 ms of 8 kHz μ-law.
pub const TELEPHONY_FRAME_BYTES: usize = 160;

/// Scale factor for converting PCM 16-bit samples to normalized float (-1.0 to 1.0).
const PCM_TO_FLOAT_SCALE: f32 = 1.0 / 32768.0;

const MULAW_BIAS: i32 = 0x84;
const MULAW_CLIP: i32 = 32635;

// =============================================================================
// Audio Segment
// =============================================================================

/// A buffered stretch of caller speech handed to speech-to-text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    /// Mono PCM16 samples.
    pub samples: Vec<i16>,
    /// Sample rate of `samples` in Hz.
    pub sample_rate: u32,
}

impl AudioSegment {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the segment in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }
}

// =============================================================================
// G.711 μ-law
// =============================================================================

/// Decode a single μ-law byte to a linear PCM16 sample.
#[inline]
pub fn mulaw_decode_sample(byte: u8) -> i16 {
    let u = !byte;
    let sign = u & 0x80;
    let exponent = (u >> 4) & 0x07;
    let mantissa = (u & 0x0F) as i32;

    let magnitude = (((mantissa << 3) + MULAW_BIAS) << exponent) - MULAW_BIAS;
    if sign != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

/// Encode a linear PCM16 sample as a μ-law byte.
#[inline]
pub fn mulaw_encode_sample(sample: i16) -> u8 {
    let mut magnitude = sample as i32;
    let sign = if magnitude < 0 {
        magnitude = -magnitude;
        0x80
    } else {
        0x00
    };

    magnitude = magnitude.min(MULAW_CLIP) + MULAW_BIAS;

    let mut exponent = 7;
    let mut mask = 0x4000;
    while exponent > 0 && (magnitude & mask) == 0 {
        exponent -= 1;
        mask >>= 1;
    }

    let mantissa = (magnitude >> (exponent + 3)) & 0x0F;
    !((sign | (exponent << 4) | mantissa) as u8)
}

/// Decode a μ-law payload into PCM16 samples.
pub fn decode_mulaw(data: &[u8]) -> Vec<i16> {
    data.iter().map(|&b| mulaw_decode_sample(b)).collect()
}

/// Encode PCM16 samples into a μ-law payload.
pub fn encode_mulaw(samples: &[i16]) -> Vec<u8> {
    samples.iter().map(|&s| mulaw_encode_sample(s)).collect()
}

// =============================================================================
// PCM helpers
// =============================================================================

/// Interpret little-endian bytes as PCM16 samples. A trailing odd byte is ignored.
pub fn pcm16_from_le_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Serialize PCM16 samples as little-endian bytes.
pub fn pcm16_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Calculate RMS (Root Mean Square) energy of PCM16 samples, normalized to 0.0..=1.0.
pub fn rms_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples
        .iter()
        .map(|&s| {
            let v = s as f32 * PCM_TO_FLOAT_SCALE;
            v * v
        })
        .sum();

    (sum_squares / samples.len() as f32).sqrt()
}

/// Resample PCM16 audio with linear interpolation.
pub fn resample_linear(input: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || input.is_empty() || from_rate == 0 || to_rate == 0 {
        return input.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let output_len = (input.len() as f64 * ratio).floor() as usize;
    let mut output = Vec::with_capacity(output_len);
    let last = input.len() - 1;

    for i in 0..output_len {
        let src_idx = i as f64 / ratio;
        let idx_floor = (src_idx.floor() as usize).min(last);
        let idx_ceil = (idx_floor + 1).min(last);
        let frac = src_idx - idx_floor as f64;

        let sample = input[idx_floor] as f64 * (1.0 - frac) + input[idx_ceil] as f64 * frac;
        output.push(sample.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16);
    }

    output
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

// =============================================================================
// Outbound encoder
// =============================================================================

/// Turns synthesized PCM16 chunks into 20 ms telephony frames.
///
/// Chunks from a streaming synthesizer arrive at arbitrary byte boundaries, so
/// the encoder carries a dangling byte, a partial resampling block and a
/// partial output frame between calls.
#[derive(Debug)]
pub struct TelephonyEncoder {
    source_rate: u32,
    /// Input samples per resampling block; blocks keep interpolation phase stable across chunks.
    block: usize,
    odd_byte: Option<u8>,
    pending_samples: Vec<i16>,
    pending_frame: Vec<u8>,
}

impl TelephonyEncoder {
    pub fn new(source_rate: u32) -> Self {
        let divisor = gcd(source_rate.max(1), TELEPHONY_SAMPLE_RATE);
        Self {
            source_rate,
            block: (source_rate.max(1) / divisor) as usize,
            odd_byte: None,
            pending_samples: Vec::new(),
            pending_frame: Vec::with_capacity(TELEPHONY_FRAME_BYTES),
        }
    }

    /// Feed a chunk of little-endian PCM16 and collect every completed frame.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        let mut bytes = Vec::with_capacity(chunk.len() + 1);
        if let Some(b) = self.odd_byte.take() {
            bytes.push(b);
        }
        bytes.extend_from_slice(chunk);
        if bytes.len() % 2 == 1 {
            self.odd_byte = bytes.pop();
        }

        self.pending_samples.extend(pcm16_from_le_bytes(&bytes));

        let usable = self.pending_samples.len() - self.pending_samples.len() % self.block;
        if usable == 0 {
            return Vec::new();
        }
        let ready: Vec<i16> = self.pending_samples.drain(..usable).collect();
        let resampled = resample_linear(&ready, self.source_rate, TELEPHONY_SAMPLE_RATE);

        self.frame(&encode_mulaw(&resampled))
    }

    /// Flush whatever is buffered, padding the last frame with μ-law silence.
    pub fn finish(&mut self) -> Option<Bytes> {
        let rest = std::mem::take(&mut self.pending_samples);
        if !rest.is_empty() {
            let resampled = resample_linear(&rest, self.source_rate, TELEPHONY_SAMPLE_RATE);
            self.pending_frame.extend(encode_mulaw(&resampled));
        }
        self.odd_byte = None;

        if self.pending_frame.is_empty() {
            return None;
        }

        let mut frame = std::mem::take(&mut self.pending_frame);
        frame.resize(TELEPHONY_FRAME_BYTES, mulaw_encode_sample(0));
        Some(Bytes::from(frame))
    }

    fn frame(&mut self, encoded: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        for &byte in encoded {
            self.pending_frame.push(byte);
            if self.pending_frame.len() == TELEPHONY_FRAME_BYTES {
                let frame = std::mem::replace(
                    &mut self.pending_frame,
                    Vec::with_capacity(TELEPHONY_FRAME_BYTES),
                );
                frames.push(Bytes::from(frame));
            }
        }
        frames
    }
}
