//! Audio capture from microphone

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use super::convert::{StreamResampler, downmix};
use super::utterance::UtteranceDetector;
use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// How often the listen loop drains the capture buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Captures audio from the default input device
///
/// Devices that cannot open a 16kHz mono stream are captured at their
/// default config; samples are down-mixed and resampled when taken.
pub struct AudioCapture {
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
    resampler: Option<StreamResampler>,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let preferred = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.sample_format() == cpal::SampleFormat::F32
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            });

        let config = match preferred {
            Some(c) => c.with_sample_rate(SampleRate(SAMPLE_RATE)).config(),
            None => {
                let fallback = device
                    .default_input_config()
                    .map_err(|e| Error::Audio(format!("no suitable audio config found: {e}")))?;
                tracing::debug!(
                    sample_rate = fallback.sample_rate().0,
                    channels = fallback.channels(),
                    "16kHz mono unavailable, capturing at device default"
                );
                fallback.config()
            }
        };

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "audio capture initialized"
        );

        let resampler = if config.sample_rate.0 == SAMPLE_RATE {
            None
        } else {
            Some(StreamResampler::new(config.sample_rate.0, SAMPLE_RATE)?)
        };

        Ok(Self {
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            resampler,
        })
    }

    /// Start capturing audio
    ///
    /// # Errors
    ///
    /// Returns error if capture fails
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    /// Take captured audio as 16kHz mono and clear the buffer
    ///
    /// Successive calls continue the same resampled stream; a trailing
    /// fraction of a resampler chunk is held back until the next call.
    ///
    /// # Errors
    ///
    /// Returns error if resampling fails
    pub fn take_buffer(&mut self) -> Result<Vec<f32>> {
        let raw = self
            .buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        let mono = downmix(&raw, usize::from(self.config.channels));
        match self.resampler.as_mut() {
            Some(resampler) => resampler.process(&mono),
            None => Ok(mono),
        }
    }

    /// Clear the audio buffer and any partially resampled input
    pub fn clear_buffer(&mut self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
        if let Some(resampler) = self.resampler.as_mut() {
            resampler.reset();
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    /// Capture one spoken utterance
    ///
    /// Returns `None` if nothing was said before `timeout`. Speech still in
    /// progress at the timeout is returned as is.
    ///
    /// # Errors
    ///
    /// Returns error if the device fails
    pub async fn record_utterance(
        &mut self,
        detector: &mut UtteranceDetector,
        timeout: Duration,
    ) -> Result<Option<Vec<f32>>> {
        self.clear_buffer();
        self.start()?;

        let outcome = wait_for_utterance(detector, timeout, || self.take_buffer()).await;

        self.stop();
        outcome
    }
}

/// Poll a sample source until the detector closes an utterance
///
/// `next_batch` is drained every 100ms. Returns `None` if nothing was said
/// before `timeout`; speech still in progress at the timeout is returned as
/// is.
///
/// # Errors
///
/// Returns the first error from `next_batch`
pub async fn wait_for_utterance<F>(
    detector: &mut UtteranceDetector,
    timeout: Duration,
    mut next_batch: F,
) -> Result<Option<Vec<f32>>>
where
    F: FnMut() -> Result<Vec<f32>>,
{
    detector.reset();
    let started = tokio::time::Instant::now();

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let samples = next_batch()?;
        if detector.process(&samples) {
            return Ok(Some(detector.take_utterance()));
        }

        if started.elapsed() >= timeout {
            tracing::debug!(heard_speech = detector.has_speech(), "listen timeout");
            return Ok(detector.has_speech().then(|| detector.take_utterance()));
        }
    }
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
