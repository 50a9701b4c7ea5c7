//! Sample format helpers shared by capture and playback

use rubato::{FftFixedIn, Resampler};

use crate::{Error, Result};

/// Input frames per resampler call
const RESAMPLER_CHUNK_SIZE: usize = 1024;

/// Average interleaved frames down to a single channel
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Resample mono audio between rates
///
/// The final partial chunk is zero-padded, then the output is trimmed to the
/// expected length so neither the resampler delay nor the padding is heard.
///
/// # Errors
///
/// Returns error if the resampler cannot be constructed or fails
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = fft_resampler(from_rate, to_rate)?;

    let chunk_size = resampler.input_frames_next();
    let expected = (samples.len() as f64 * f64::from(to_rate) / f64::from(from_rate)) as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(delay + expected + chunk_size);

    for chunk in samples.chunks(chunk_size) {
        let mut input = chunk.to_vec();
        input.resize(chunk_size, 0.0);

        let result = resampler
            .process(&[input], None)
            .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        output.extend_from_slice(&result[0]);
    }

    // FFT resampler output is delayed; flush it with silent chunks
    while output.len() < delay + expected {
        let flushed = resampler
            .process(&[vec![0.0; chunk_size]], None)
            .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        if flushed[0].is_empty() {
            break;
        }
        output.extend_from_slice(&flushed[0]);
    }

    let end = (delay + expected).min(output.len());
    Ok(output[delay.min(end)..end].to_vec())
}

#[allow(clippy::cast_possible_truncation)]
fn fft_resampler(from_rate: u32, to_rate: u32) -> Result<FftFixedIn<f32>> {
    FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        RESAMPLER_CHUNK_SIZE,
        2,
        1,
    )
    .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))
}

/// Resampler for audio that arrives in pieces
///
/// Filter state and unconsumed input carry over between calls, so a stream
/// fed in arbitrary slices comes out the same as one resampled in a single
/// pass. Input shorter than a resampler chunk waits for the next call.
pub struct StreamResampler {
    resampler: FftFixedIn<f32>,
    pending: Vec<f32>,
    delay_left: usize,
}

impl StreamResampler {
    /// Create a mono stream resampler
    ///
    /// # Errors
    ///
    /// Returns error if the resampler cannot be constructed
    pub fn new(from_rate: u32, to_rate: u32) -> Result<Self> {
        let resampler = fft_resampler(from_rate, to_rate)?;
        let delay_left = resampler.output_delay();
        Ok(Self {
            resampler,
            pending: Vec::new(),
            delay_left,
        })
    }

    /// Feed the next slice of the stream, returning whatever is ready
    ///
    /// # Errors
    ///
    /// Returns error if resampling fails
    pub fn process(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        self.pending.extend_from_slice(samples);

        let mut output = Vec::new();
        loop {
            let needed = self.resampler.input_frames_next();
            if self.pending.len() < needed {
                break;
            }

            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            let result = self
                .resampler
                .process(&[chunk], None)
                .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
            output.extend_from_slice(&result[0]);
        }

        let skip = self.delay_left.min(output.len());
        self.delay_left -= skip;
        output.drain(..skip);
        Ok(output)
    }

    /// Drop buffered input and filter state before a new stream
    pub fn reset(&mut self) {
        self.resampler.reset();
        self.pending.clear();
        self.delay_left = self.resampler.output_delay();
    }
}
