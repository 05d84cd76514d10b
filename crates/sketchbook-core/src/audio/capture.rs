use crate::{
    CoreResult, SessionError,
    device::{AnalysisTap, AudioChunk, InputStream, Microphone, StreamFormat},
};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use cpal::{
    BuildStreamError, DefaultStreamConfigError, Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Maximum samples to buffer (5 minutes at 48kHz mono).
/// Prevents unbounded memory growth during long recordings.
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 60 * 5;

/// Microphone backed by the default cpal host.
#[derive(Debug, Clone, Default)]
pub struct CpalMicrophone {
    device_name: Option<String>,
}

impl CpalMicrophone {
    /// Use the named input device, or the host default when `None`.
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    #[track_caller]
    fn select_device(&self) -> CoreResult<Device> {
        let host = cpal::default_host();

        let Some(wanted) = self.device_name.as_deref() else {
            return host.default_input_device().ok_or(SessionError::NoDevice {
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let mut devices = host.input_devices().map_err(|e| SessionError::DeviceError {
            reason: format!("Failed to enumerate input devices: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        #[allow(deprecated)]
        let found = devices.find(|d| d.name().map(|n| n == wanted).unwrap_or(false));

        match found {
            Some(device) => Ok(device),
            None => {
                warn!(device = wanted, "Configured input device not found, using default");
                host.default_input_device().ok_or(SessionError::NoDevice {
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    #[track_caller]
    fn input_config(device: &Device) -> CoreResult<StreamConfig> {
        let config = device.default_input_config().map_err(|e| match e {
            DefaultStreamConfigError::DeviceNotAvailable => SessionError::NoDevice {
                location: ErrorLocation::from(Location::caller()),
            },
            other => classify_backend_error(other.to_string()),
        })?;

        Ok(config.into())
    }
}

impl Microphone for CpalMicrophone {
    type Stream = CpalInputStream;
    type Tap = CpalAnalysisTap;

    #[track_caller]
    #[instrument(skip(self))]
    fn open(&self) -> CoreResult<CpalInputStream> {
        let device = self.select_device()?;
        let config = Self::input_config(&device)?;

        let samples: Arc<Mutex<VecDeque<f32>>> = Arc::new(Mutex::new(VecDeque::new()));
        let failure: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let shutdown = Arc::new(AtomicBool::new(false));

        let stream = {
            let samples = Arc::clone(&samples);
            let failure = Arc::clone(&failure);
            let shutdown = Arc::clone(&shutdown);

            device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        // Once close() sets this flag no more samples are written,
                        // even if the backend fires one more callback.
                        if shutdown.load(Ordering::Acquire) {
                            return;
                        }
                        let mut buf = samples.lock().unwrap_or_else(|e| {
                            error!("Capture buffer lock poisoned, recovering: {}", e);
                            e.into_inner()
                        });
                        buf.extend(data.iter().copied());
                        while buf.len() > MAX_BUFFER_SAMPLES {
                            buf.pop_front();
                        }
                    },
                    move |err| {
                        error!("Capture stream error: {}", err);
                        let mut slot = failure.lock().unwrap_or_else(|e| e.into_inner());
                        slot.get_or_insert_with(|| err.to_string());
                    },
                    None,
                )
                .map_err(map_build_error)?
        };

        stream.play().map_err(|e| SessionError::DeviceError {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let format = StreamFormat {
            sample_rate: config.sample_rate,
            channels: config.channels,
        };

        info!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Capture stream opened"
        );

        Ok(CpalInputStream {
            stream: Some(stream),
            format,
            samples,
            failure,
            shutdown,
        })
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn open_analysis(&self, window: usize) -> CoreResult<CpalAnalysisTap> {
        let device = self.select_device()?;
        let config = Self::input_config(&device)?;
        let channels = usize::from(config.channels.max(1));
        let window = window.max(1);

        let recent: Arc<Mutex<VecDeque<f32>>> =
            Arc::new(Mutex::new(VecDeque::with_capacity(window)));
        let connected = Arc::new(AtomicBool::new(true));

        let stream = {
            let recent = Arc::clone(&recent);
            let connected = Arc::clone(&connected);

            device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if !connected.load(Ordering::Acquire) {
                            return;
                        }
                        let mut buf = recent.lock().unwrap_or_else(|e| e.into_inner());
                        // Channel 0 only; the envelope does not need a true downmix.
                        buf.extend(data.iter().step_by(channels).copied());
                        while buf.len() > window {
                            buf.pop_front();
                        }
                    },
                    |err| {
                        warn!("Analysis stream error: {}", err);
                    },
                    None,
                )
                .map_err(map_build_error)?
        };

        stream.play().map_err(|e| SessionError::DeviceError {
            reason: format!("Failed to start analysis stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(window = window, "Analysis tap opened");

        Ok(CpalAnalysisTap {
            stream: Some(stream),
            recent,
            connected,
            stopped: false,
        })
    }
}

/// Encoder-path capture stream.
pub struct CpalInputStream {
    stream: Option<Stream>,
    format: StreamFormat,
    samples: Arc<Mutex<VecDeque<f32>>>,
    failure: Arc<Mutex<Option<String>>>,
    shutdown: Arc<AtomicBool>,
}

impl InputStream for CpalInputStream {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn drain_chunks(&mut self) -> Vec<AudioChunk> {
        let mut buf = self.samples.lock().unwrap_or_else(|e| {
            error!("Capture buffer lock poisoned, recovering: {}", e);
            e.into_inner()
        });

        if buf.is_empty() {
            return Vec::new();
        }

        vec![AudioChunk::new(buf.drain(..).collect())]
    }

    fn take_error(&mut self) -> Option<String> {
        self.failure.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    fn close(&mut self) {
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Capture stream closed");
        }
    }
}

impl Drop for CpalInputStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Analysis tap over an independent input stream.
pub struct CpalAnalysisTap {
    stream: Option<Stream>,
    recent: Arc<Mutex<VecDeque<f32>>>,
    connected: Arc<AtomicBool>,
    stopped: bool,
}

impl AnalysisTap for CpalAnalysisTap {
    fn read_time_domain(&mut self, out: &mut [f32]) {
        let buf = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        let available = buf.len().min(out.len());
        let pad = out.len() - available;

        out[..pad].fill(0.0);
        for (slot, sample) in out[pad..].iter_mut().zip(buf.iter().skip(buf.len() - available)) {
            *slot = *sample;
        }
    }

    fn disconnect(&mut self) {
        self.connected.store(false, Ordering::Release);
    }

    fn stop_tracks(&mut self) {
        if self.stopped {
            return;
        }
        if let Some(stream) = self.stream.as_ref() {
            if let Err(e) = stream.pause() {
                debug!(error = %e, "Analysis stream could not be paused");
            }
        }
        self.stopped = true;
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!("Analysis tap closed");
        }
    }
}

impl Drop for CpalAnalysisTap {
    fn drop(&mut self) {
        self.disconnect();
        self.stop_tracks();
        self.close();
    }
}

#[track_caller]
fn map_build_error(e: BuildStreamError) -> SessionError {
    match e {
        BuildStreamError::DeviceNotAvailable => SessionError::NoDevice {
            location: ErrorLocation::from(Location::caller()),
        },
        other => classify_backend_error(other.to_string()),
    }
}

/// Backends report permission refusals as free-form text.
#[track_caller]
pub(crate) fn classify_backend_error(reason: String) -> SessionError {
    let lowered = reason.to_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") {
        SessionError::PermissionDenied {
            reason,
            location: ErrorLocation::from(Location::caller()),
        }
    } else {
        SessionError::DeviceError {
            reason,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
