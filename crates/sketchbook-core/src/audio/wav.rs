use crate::{
    CoreResult, SessionError,
    device::{AudioChunk, Encoder, StreamFormat},
    take::EncodedAudio,
};

use std::{io::Cursor, panic::Location};

use error_location::ErrorLocation;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::{debug, instrument};

/// Mime tag of takes produced by [`WavEncoder`].
pub const WAV_MIME: &str = "audio/wav";

const WAV_BITS_PER_SAMPLE: u16 = 16;

/// Finalizes captured chunks into 16-bit PCM WAV.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder;

impl Encoder for WavEncoder {
    #[track_caller]
    #[instrument(skip(self, chunks))]
    fn finalize(&self, format: StreamFormat, chunks: Vec<AudioChunk>) -> CoreResult<EncodedAudio> {
        if format.channels == 0 || format.sample_rate == 0 {
            return Err(SessionError::EncodeError {
                reason: format!("Unsupported stream format: {:?}", format),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let channels = usize::from(format.channels);
        let total: usize = chunks.iter().map(AudioChunk::len).sum();
        // hound rejects a trailing partial frame
        let whole = total - total % channels;

        if whole == 0 {
            return Err(SessionError::EncodeError {
                reason: "No audio captured".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let spec = WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: WAV_BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + whole * 2));
        {
            let mut writer =
                WavWriter::new(&mut cursor, spec).map_err(|e| SessionError::EncodeError {
                    reason: format!("Failed to create WAV writer: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            for sample in chunks.iter().flat_map(|c| c.samples.iter()).take(whole) {
                writer
                    .write_sample(to_pcm16(*sample))
                    .map_err(|e| SessionError::EncodeError {
                        reason: format!("Failed to write sample: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
            }

            writer.finalize().map_err(|e| SessionError::EncodeError {
                reason: format!("Failed to finalize WAV: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        let bytes = cursor.into_inner();

        debug!(
            sample_count = whole,
            byte_len = bytes.len(),
            sample_rate = format.sample_rate,
            "Take encoded"
        );

        Ok(EncodedAudio::new(bytes, WAV_MIME))
    }
}

/// Duration of a WAV payload in seconds.
///
/// # Errors
///
/// `DecodeError` if the payload is not readable WAV.
#[track_caller]
pub fn probe_duration(audio: &EncodedAudio) -> CoreResult<f64> {
    let reader = open_reader(audio)?;
    let spec = reader.spec();

    if spec.sample_rate == 0 {
        return Err(SessionError::DecodeError {
            reason: "WAV header declares a zero sample rate".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

/// Decode a WAV payload to mono `f32` samples, returning them with the sample rate.
///
/// # Errors
///
/// `DecodeError` if the payload is not readable WAV.
#[track_caller]
pub fn decode_mono(audio: &EncodedAudio) -> CoreResult<(Vec<f32>, u32)> {
    let reader = open_reader(audio)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| SessionError::DecodeError {
                reason: format!("Failed to read samples: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| SessionError::DecodeError {
                    reason: format!("Failed to read samples: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?
        }
    };

    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}

#[track_caller]
fn open_reader(audio: &EncodedAudio) -> CoreResult<WavReader<Cursor<&[u8]>>> {
    WavReader::new(Cursor::new(audio.bytes())).map_err(|e| SessionError::DecodeError {
        reason: format!("Not a readable WAV payload ({}): {}", audio.mime(), e),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}
