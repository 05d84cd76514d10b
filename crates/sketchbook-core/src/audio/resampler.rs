use crate::{CoreResult, SessionError};

use std::{borrow::Cow, panic::Location};

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

const CHUNK_FRAMES: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Mono sample rate converter used to match a take to the output device.
pub struct Resampler {
    inner: Fft<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl Resampler {
    /// Build a converter from `input_rate` to `output_rate`.
    ///
    /// # Errors
    ///
    /// `ResamplingError` if rubato rejects the rates.
    #[track_caller]
    #[instrument]
    pub fn new(input_rate: u32, output_rate: u32) -> CoreResult<Self> {
        let inner = Fft::<f32>::new(
            input_rate as usize,
            output_rate as usize,
            CHUNK_FRAMES,
            SUB_CHUNKS,
            1,
            FixedSync::Input,
        )
        .map_err(|e| SessionError::ResamplingError {
            reason: format!("Failed to create resampler: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self {
            inner,
            input_rate,
            output_rate,
        })
    }

    /// Convert a whole mono buffer. The final partial chunk is zero padded and
    /// the output trimmed to the expected length.
    ///
    /// # Errors
    ///
    /// `ResamplingError` if rubato fails on any chunk.
    #[track_caller]
    #[instrument(skip(self, samples))]
    pub fn resample(&mut self, samples: &[f32]) -> CoreResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let expected_len = (samples.len() as f64 * f64::from(self.output_rate)
            / f64::from(self.input_rate)) as usize;
        let mut output = Vec::with_capacity(expected_len + CHUNK_FRAMES);
        let mut padded = vec![0.0f32; CHUNK_FRAMES];
        let mut scratch = vec![0.0f32; self.inner.output_frames_max()];

        for chunk in samples.chunks(CHUNK_FRAMES) {
            padded[..chunk.len()].copy_from_slice(chunk);
            padded[chunk.len()..].fill(0.0);

            let input = InterleavedSlice::new(&padded, 1, CHUNK_FRAMES).map_err(|e| {
                SessionError::ResamplingError {
                    reason: format!("Failed to create input adapter: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

            let capacity = scratch.len();
            let mut out = InterleavedSlice::new_mut(&mut scratch, 1, capacity).map_err(|e| {
                SessionError::ResamplingError {
                    reason: format!("Failed to create output adapter: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

            let (_consumed, written) = self
                .inner
                .process_into_buffer(&input, &mut out, None)
                .map_err(|e| SessionError::ResamplingError {
                    reason: format!("Resampling failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            output.extend_from_slice(&scratch[..written]);
        }

        output.truncate(expected_len);

        debug!(
            input_len = samples.len(),
            output_len = output.len(),
            input_rate = self.input_rate,
            output_rate = self.output_rate,
            "Resampled take"
        );

        Ok(output)
    }
}

/// Convert `samples` only when the rates differ; borrows otherwise.
///
/// # Errors
///
/// `ResamplingError` if conversion fails.
#[track_caller]
pub fn match_rate(samples: &[f32], input_rate: u32, output_rate: u32) -> CoreResult<Cow<'_, [f32]>> {
    if input_rate == output_rate {
        return Ok(Cow::Borrowed(samples));
    }

    let mut resampler = Resampler::new(input_rate, output_rate)?;
    Ok(Cow::Owned(resampler.resample(samples)?))
}
