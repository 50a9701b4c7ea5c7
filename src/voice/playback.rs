//! Audio playback to speakers

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use super::convert::resample;
use crate::{Error, Result};

/// Preferred playback rate (matches common TTS output)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Plays audio to the default output device
pub struct AudioPlayback {
    config: StreamConfig,
}

impl AudioPlayback {
    /// Create a new audio playback instance
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supports = |channels: u16| -> Option<cpal::SupportedStreamConfigRange> {
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == channels
                    && c.sample_format() == cpal::SampleFormat::F32
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
        };

        // Mono first, then stereo, then whatever the device defaults to
        let config = match supports(1).or_else(|| supports(2)) {
            Some(range) => range
                .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
                .config(),
            None => device
                .default_output_config()
                .map_err(|e| Error::Audio(format!("no suitable output config found: {e}")))?
                .config(),
        };

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { config })
    }

    /// Output sample rate of the opened stream config
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Play mono samples recorded at `sample_rate`
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    pub async fn play(&self, samples: Vec<f32>, sample_rate: u32) -> Result<()> {
        let samples = resample(&samples, sample_rate, self.sample_rate())?;
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || play_blocking(&config, samples))
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }

    /// Play audio from MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    pub async fn play_mp3(&self, mp3_data: &[u8]) -> Result<()> {
        let (samples, sample_rate) = decode_mp3(mp3_data)?;
        self.play(samples, sample_rate).await
    }
}

/// Play samples on the default output device, blocking until done
fn play_blocking(config: &StreamConfig, samples: Vec<f32>) -> Result<()> {
    if samples.is_empty() {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device".to_string()))?;

    let channels = usize::from(config.channels);
    let sample_count = samples.len();
    let finished = Arc::new(AtomicBool::new(false));
    let finished_cb = Arc::clone(&finished);
    let mut position = 0usize;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = samples.get(position).copied().unwrap_or_else(|| {
                        finished_cb.store(true, Ordering::Release);
                        0.0
                    });
                    frame.fill(sample);
                    position = position.saturating_add(1).min(samples.len());
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let duration_ms = (sample_count as u64 * 1000) / u64::from(config.sample_rate.0);
    let start = Instant::now();
    let timeout = Duration::from_millis(duration_ms + 500);

    while !finished.load(Ordering::Acquire) {
        if start.elapsed() > timeout {
            tracing::warn!("playback did not signal completion, stopping");
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    // Let the device drain its last buffer
    std::thread::sleep(Duration::from_millis(100));

    drop(stream);
    tracing::debug!(samples = sample_count, "playback complete");

    Ok(())
}

/// Decode MP3 bytes to mono f32 samples and their sample rate
///
/// Concatenated MP3 segments (as returned by chunked TTS) decode as one
/// stream as long as they share a rate.
///
/// # Errors
///
/// Returns error if the data is not decodable MP3
pub fn decode_mp3(mp3_data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                #[allow(clippy::cast_sign_loss)]
                let rate = frame.sample_rate as u32;
                if *sample_rate.get_or_insert(rate) != rate {
                    tracing::warn!(rate, "skipping MP3 frame with mismatched sample rate");
                    continue;
                }

                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|pair| {
                        let left = f32::from(pair[0]) / 32768.0;
                        let right = f32::from(pair.get(1).copied().unwrap_or(pair[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => {}
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| Error::Audio("MP3 contained no audio frames".to_string()))?;

    Ok((samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_mp3(b"definitely not an mp3 stream").is_err());
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_mp3(&[]).is_err());
    }
}
