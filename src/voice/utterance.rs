//! End-of-utterance detection
//!
//! Energy-based segmentation of the microphone stream: a question starts
//! when the signal rises above the speech threshold and ends after a pause.

use std::time::Duration;

use super::SAMPLE_RATE;

/// Minimum audio energy threshold to consider speech
pub const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to accept (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Default trailing pause that ends an utterance
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(800);

/// State of the utterance detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceState {
    /// Waiting for speech
    Idle,
    /// Speech detected, accumulating
    Speaking,
    /// Speech followed by a pause
    Complete,
}

/// Splits a sample stream into a single spoken utterance
pub struct UtteranceDetector {
    state: UtteranceState,
    buffer: Vec<f32>,
    speech_samples: usize,
    silence_counter: usize,
    pause_samples: usize,
}

impl UtteranceDetector {
    /// Create a detector with the default pause length
    #[must_use]
    pub fn new() -> Self {
        Self::with_pause(DEFAULT_PAUSE)
    }

    /// Create a detector that closes an utterance after `pause` of silence
    #[must_use]
    pub fn with_pause(pause: Duration) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let pause_samples = (pause.as_millis() as usize * SAMPLE_RATE as usize) / 1000;

        Self {
            state: UtteranceState::Idle,
            buffer: Vec::new(),
            speech_samples: 0,
            silence_counter: 0,
            pause_samples,
        }
    }

    /// Feed audio samples
    ///
    /// Returns true once the utterance is complete
    pub fn process(&mut self, samples: &[f32]) -> bool {
        if samples.is_empty() {
            return self.is_complete();
        }

        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            UtteranceState::Idle => {
                if is_speech {
                    self.state = UtteranceState::Speaking;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech_samples = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
            }
            UtteranceState::Speaking => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_samples += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter >= self.pause_samples {
                    if self.speech_samples >= MIN_SPEECH_SAMPLES {
                        self.state = UtteranceState::Complete;
                        tracing::debug!(samples = self.buffer.len(), "utterance complete");
                    } else {
                        // Too short to be a question, likely a click or cough
                        tracing::trace!(samples = self.speech_samples, "discarding short burst");
                        self.reset();
                    }
                }
            }
            UtteranceState::Complete => {}
        }

        self.is_complete()
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> UtteranceState {
        self.state
    }

    /// Whether an utterance has been closed by a pause
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == UtteranceState::Complete
    }

    /// Whether any speech has been heard yet
    #[must_use]
    pub fn has_speech(&self) -> bool {
        self.state != UtteranceState::Idle
    }

    /// Buffered samples of the current utterance
    #[must_use]
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Take the buffered utterance and reset
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let samples = std::mem::take(&mut self.buffer);
        self.reset();
        samples
    }

    /// Reset to idle
    pub fn reset(&mut self) {
        self.state = UtteranceState::Idle;
        self.buffer.clear();
        self.speech_samples = 0;
        self.silence_counter = 0;
    }
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}
