use crate::{
    CoreResult, SessionError,
    audio::{capture::classify_backend_error, resampler::match_rate, wav},
    device::{EndedSignal, PlaybackEngine, Player},
    take::EncodedAudio,
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument};

/// Plays WAV takes through the default cpal output device.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalPlaybackEngine;

impl PlaybackEngine for CpalPlaybackEngine {
    type Player = CpalPlayer;

    #[track_caller]
    #[instrument(skip(self, audio, ended))]
    fn load(&self, audio: &EncodedAudio, ended: EndedSignal) -> CoreResult<CpalPlayer> {
        let (mono, take_rate) = wav::decode_mono(audio)?;

        let device = cpal::default_host()
            .default_output_device()
            .ok_or(SessionError::NoDevice {
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config: StreamConfig = device
            .default_output_config()
            .map_err(|e| classify_backend_error(format!("Failed to get output config: {}", e)))?
            .into();

        let samples: Arc<[f32]> = Arc::from(match_rate(&mono, take_rate, config.sample_rate)?);

        info!(
            take_rate = take_rate,
            device_rate = config.sample_rate,
            frames = samples.len(),
            "Take loaded for playback"
        );

        Ok(CpalPlayer {
            device,
            config,
            stream: None,
            shared: Arc::new(PlayerShared {
                samples,
                cursor: AtomicUsize::new(0),
                playing: AtomicBool::new(false),
                ended_fired: AtomicBool::new(false),
                ended,
            }),
        })
    }

    fn probe_duration(&self, audio: &EncodedAudio) -> CoreResult<f64> {
        wav::probe_duration(audio)
    }
}

struct PlayerShared {
    samples: Arc<[f32]>,
    cursor: AtomicUsize,
    playing: AtomicBool,
    ended_fired: AtomicBool,
    ended: EndedSignal,
}

/// One decoded take on the output device. The stream is built on first play.
pub struct CpalPlayer {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    shared: Arc<PlayerShared>,
}

impl CpalPlayer {
    fn build_stream(&self) -> CoreResult<Stream> {
        let shared = Arc::clone(&self.shared);
        let channels = usize::from(self.config.channels.max(1));

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !shared.playing.load(Ordering::Acquire) {
                        data.fill(0.0);
                        return;
                    }

                    let total = shared.samples.len();
                    let start = shared.cursor.load(Ordering::Acquire).min(total);
                    let frames = data.len() / channels;
                    let end = (start + frames).min(total);

                    for (i, frame) in data.chunks_mut(channels).enumerate() {
                        let sample = shared.samples.get(start + i).copied().unwrap_or(0.0);
                        frame.fill(if start + i < end { sample } else { 0.0 });
                    }

                    // A concurrent seek wins over this advance.
                    if shared
                        .cursor
                        .compare_exchange(start, end, Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                    {
                        return;
                    }

                    if end >= total {
                        shared.playing.store(false, Ordering::Release);
                        if !shared.ended_fired.swap(true, Ordering::AcqRel) {
                            shared.ended.notify();
                        }
                    }
                },
                |err| {
                    error!("Playback stream error: {}", err);
                },
                None,
            )
            .map_err(|e| classify_backend_error(format!("Failed to build output stream: {}", e)))
    }
}

impl Player for CpalPlayer {
    fn play(&mut self) {
        if self.stream.is_none() {
            match self.build_stream() {
                Ok(stream) => self.stream = Some(stream),
                Err(e) => {
                    error!(error = ?e, "Failed to open playback stream");
                    return;
                }
            }
        }

        self.shared.ended_fired.store(false, Ordering::Release);
        self.shared.playing.store(true, Ordering::Release);

        if let Some(stream) = self.stream.as_ref() {
            if let Err(e) = stream.play() {
                error!(error = %e, "Failed to start playback stream");
            }
        }
    }

    fn pause(&mut self) {
        self.shared.playing.store(false, Ordering::Release);

        if let Some(stream) = self.stream.as_ref() {
            if let Err(e) = stream.pause() {
                debug!(error = %e, "Playback stream could not be paused");
            }
        }
    }

    fn set_position(&mut self, seconds: f64) {
        let frame = (seconds.max(0.0) * f64::from(self.config.sample_rate)) as usize;
        self.shared
            .cursor
            .store(frame.min(self.shared.samples.len()), Ordering::Release);
    }

    fn position(&self) -> f64 {
        if self.config.sample_rate == 0 {
            return 0.0;
        }
        self.shared.cursor.load(Ordering::Acquire) as f64 / f64::from(self.config.sample_rate)
    }
}
