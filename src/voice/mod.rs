//! Voice processing module
//!
//! Microphone capture, utterance segmentation, STT, TTS and playback, plus
//! the adapters that plug them into the conversation loop.

mod capture;
mod convert;
mod playback;
mod stt;
mod tts;
mod utterance;

use std::time::Duration;

use async_trait::async_trait;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav, wait_for_utterance};
pub use convert::{StreamResampler, downmix, resample};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3};
pub use stt::{SpeechToText, SttProvider, WHISPER_STYLE_PROMPT, plain_transcript};
pub use tts::{GOOGLE_MAX_CHARS, TextToSpeech, TtsProvider, split_text};
pub use utterance::{
    DEFAULT_PAUSE, ENERGY_THRESHOLD, UtteranceDetector, UtteranceState, calculate_energy,
};

use crate::Result;
use crate::assistant::{Listener, Recognition, Speaker};

/// Listens on the default microphone and transcribes each utterance
pub struct MicListener {
    capture: AudioCapture,
    detector: UtteranceDetector,
    stt: SpeechToText,
    timeout: Duration,
}

impl MicListener {
    /// Create a listener on the default input device
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened
    pub fn new(stt: SpeechToText, pause: Duration, timeout: Duration) -> Result<Self> {
        Ok(Self {
            capture: AudioCapture::new()?,
            detector: UtteranceDetector::with_pause(pause),
            stt,
            timeout,
        })
    }
}

#[async_trait(?Send)]
impl Listener for MicListener {
    async fn listen(&mut self) -> Recognition {
        let samples = match self
            .capture
            .record_utterance(&mut self.detector, self.timeout)
            .await
        {
            Ok(Some(samples)) => samples,
            Ok(None) => return Recognition::Unintelligible,
            Err(e) => {
                tracing::error!(error = %e, "microphone capture failed");
                return Recognition::Unintelligible;
            }
        };

        println!("Recognizing...");
        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::error!(error = %e, "WAV encoding failed");
                return Recognition::Unintelligible;
            }
        };

        Recognition::from_result(self.stt.transcribe(&wav).await)
    }
}

/// Speaks through a TTS service and the default output device
pub struct AudioSpeaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl AudioSpeaker {
    /// Create a speaker on the default output device
    ///
    /// # Errors
    ///
    /// Returns error if the output device cannot be opened
    pub fn new(tts: TextToSpeech) -> Result<Self> {
        Ok(Self {
            tts,
            playback: AudioPlayback::new()?,
        })
    }
}

#[async_trait(?Send)]
impl Speaker for AudioSpeaker {
    async fn speak(&mut self, text: &str, lang: &str) -> Result<()> {
        tracing::debug!(text, lang, "speaking");
        let audio = self.tts.synthesize(text, lang).await?;
        self.playback.play_mp3(&audio).await
    }
}
