//! Energy-based pause detection for caller audio.
//!
//! The detector consumes fixed-size telephony frames and decides when the
//! caller has finished an utterance. Time is measured in samples rather than
//! wall-clock, so the same audio always produces the same segments.

use tracing::debug;

use super::audio::{AudioSegment, TELEPHONY_SAMPLE_RATE, rms_energy};

/// Default silence after speech that ends a turn.
pub const DEFAULT_PAUSE_SILENCE_MS: u32 = 600;

/// Default normalized RMS level above which a frame counts as speech.
pub const DEFAULT_PAUSE_RMS_THRESHOLD: f32 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct PauseDetectorConfig {
    pub sample_rate: u32,
    /// Normalized RMS (0.0..=1.0) at or above which a frame is speech.
    pub rms_threshold: f32,
    /// Trailing silence that closes a segment.
    pub silence_duration_ms: u32,
    /// Speech shorter than this is discarded as noise.
    pub min_speech_ms: u32,
    /// Audio kept from before speech onset.
    pub pre_roll_ms: u32,
    /// Hard cap on segment length. The segment is flushed when reached and
    /// speech that runs on past it is dropped until the caller pauses.
    pub max_segment_ms: u32,
}

impl Default for PauseDetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate: TELEPHONY_SAMPLE_RATE,
            rms_threshold: DEFAULT_PAUSE_RMS_THRESHOLD,
            silence_duration_ms: DEFAULT_PAUSE_SILENCE_MS,
            min_speech_ms: 200,
            pre_roll_ms: 200,
            max_segment_ms: 30_000,
        }
    }
}

impl PauseDetectorConfig {
    fn samples_for(&self, ms: u32) -> usize {
        (self.sample_rate as u64 * ms as u64 / 1000) as usize
    }
}

/// Outcome of feeding a frame to the detector.
#[derive(Debug, Clone, PartialEq)]
pub enum PauseEvent {
    /// Speech has lasted long enough to be taken as a real utterance.
    SpeechStarted,
    /// The caller paused; the buffered utterance is ready for transcription.
    Pause(AudioSegment),
}

#[derive(Debug)]
pub struct PauseDetector {
    config: PauseDetectorConfig,
    buffer: Vec<i16>,
    in_speech: bool,
    speech_announced: bool,
    speech_samples: usize,
    silence_samples: usize,
    /// Set after a forced flush; cleared by the next full pause.
    draining: bool,
}

impl PauseDetector {
    pub fn new(config: PauseDetectorConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            in_speech: false,
            speech_announced: false,
            speech_samples: 0,
            silence_samples: 0,
            draining: false,
        }
    }

    /// True while an utterance is being buffered.
    pub fn is_in_speech(&self) -> bool {
        self.in_speech
    }

    /// Feed one frame of PCM16 samples at the configured rate.
    pub fn push_frame(&mut self, samples: &[i16]) -> Option<PauseEvent> {
        if samples.is_empty() {
            return None;
        }

        let is_speech = rms_energy(samples) >= self.config.rms_threshold;

        if self.draining {
            self.drain(samples.len(), is_speech);
            return None;
        }

        if !self.in_speech {
            self.buffer.extend_from_slice(samples);
            if !is_speech {
                let pre_roll = self.config.samples_for(self.config.pre_roll_ms);
                if self.buffer.len() > pre_roll {
                    let excess = self.buffer.len() - pre_roll;
                    self.buffer.drain(..excess);
                }
                return None;
            }
            self.in_speech = true;
            self.speech_samples = samples.len();
            self.silence_samples = 0;
            return self.announce_if_confirmed();
        }

        self.buffer.extend_from_slice(samples);
        if is_speech {
            self.speech_samples += samples.len();
            self.silence_samples = 0;
        } else {
            self.silence_samples += samples.len();
        }

        if self.silence_samples >= self.config.samples_for(self.config.silence_duration_ms) {
            if self.speech_samples >= self.config.samples_for(self.config.min_speech_ms) {
                return Some(PauseEvent::Pause(self.take_segment()));
            }
            debug!(
                speech_ms = self.speech_samples * 1000 / self.config.sample_rate.max(1) as usize,
                "Discarding short noise burst"
            );
            self.reset();
            return None;
        }

        if self.buffer.len() >= self.config.samples_for(self.config.max_segment_ms) {
            debug!("Segment reached maximum length, flushing");
            let segment = self.take_segment();
            self.draining = is_speech;
            return Some(PauseEvent::Pause(segment));
        }

        if is_speech {
            return self.announce_if_confirmed();
        }
        None
    }

    /// Skip the tail of an over-long utterance until silence ends it.
    fn drain(&mut self, len: usize, is_speech: bool) {
        if is_speech {
            self.silence_samples = 0;
            return;
        }
        self.silence_samples += len;
        if self.silence_samples >= self.config.samples_for(self.config.silence_duration_ms) {
            debug!("Caller paused after a flushed segment");
            self.reset();
        }
    }

    /// Drop any buffered audio and return to idle.
    pub fn reset(&mut self) {
        self.draining = false;
        self.buffer.clear();
        self.in_speech = false;
        self.speech_announced = false;
        self.speech_samples = 0;
        self.silence_samples = 0;
    }

    fn announce_if_confirmed(&mut self) -> Option<PauseEvent> {
        if !self.speech_announced
            && self.speech_samples >= self.config.samples_for(self.config.min_speech_ms)
        {
            self.speech_announced = true;
            return Some(PauseEvent::SpeechStarted);
        }
        None
    }

    fn take_segment(&mut self) -> AudioSegment {
        let samples = std::mem::take(&mut self.buffer);
        self.reset();
        AudioSegment::new(samples, self.config.sample_rate)
    }
}
