use crate::device::{AudioChunk, InputStream, StreamFormat};

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// No capture in progress.
    Idle,
    /// Waiting for the microphone grant.
    RequestingDevice,
    /// Microphone held, not yet buffering.
    Armed,
    /// Buffering audio.
    Recording,
    /// Buffered audio handed to the encoder.
    Finalizing,
    /// The last capture failed.
    Error,
}

/// What the finalize completion does with the encoded take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeIntent {
    /// Append as a normal take.
    Keep,
    /// Append as a false start, then start a new capture.
    KeepAsFalseStart,
    /// Append as a false start whose restart was superseded by a new recording.
    FalseStartOnly,
    /// Drop the take once finalized.
    Discard,
}

/// How to end a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Encode the buffered audio and let the intent decide its fate.
    Finalize(FinalizeIntent),
    /// Drop buffered audio without encoding.
    DropBuffered,
}

/// Buffered audio awaiting the encoder.
#[derive(Debug)]
pub struct PendingFinalize {
    /// Capture generation the audio belongs to.
    pub generation: u64,
    /// Layout of `chunks`.
    pub format: StreamFormat,
    /// Everything buffered since recording began.
    pub chunks: Vec<AudioChunk>,
    /// Intent at the time of the stop.
    pub intent: FinalizeIntent,
}

/// Result of [`CaptureSession::stop`].
#[derive(Debug)]
pub enum StopOutcome {
    /// Nothing was recording; any held device was released.
    Released,
    /// Recording stopped without any audio to keep.
    Empty,
    /// Recording stopped and audio awaits finalization.
    Finalize(PendingFinalize),
}

/// Owns the microphone stream and the recording-in-progress lifecycle.
///
/// At most one stream is held, and only while armed or recording.
pub struct CaptureSession<S: InputStream> {
    status: CaptureStatus,
    generation: u64,
    stream: Option<S>,
    format: Option<StreamFormat>,
    chunks: Vec<AudioChunk>,
    elapsed_seconds: u64,
    started_at: Option<Instant>,
    last_error: Option<String>,
}

impl<S: InputStream> Default for CaptureSession<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: InputStream> CaptureSession<S> {
    /// Idle session holding no device.
    pub fn new() -> Self {
        Self {
            status: CaptureStatus::Idle,
            generation: 0,
            stream: None,
            format: None,
            chunks: Vec::new(),
            elapsed_seconds: 0,
            started_at: None,
            last_error: None,
        }
    }

    /// Begin a device request. Returns the generation the grant must carry.
    pub fn request(&mut self) -> u64 {
        self.release();
        self.chunks.clear();
        self.generation += 1;
        self.status = CaptureStatus::RequestingDevice;
        self.elapsed_seconds = 0;
        self.started_at = None;
        self.last_error = None;
        self.generation
    }

    /// Accept a granted stream.
    ///
    /// A grant for a stale generation, or arriving after the request was
    /// abandoned, is handed back so the caller can release it at once.
    pub fn grant(&mut self, generation: u64, stream: S) -> Result<(), S> {
        if generation != self.generation || self.status != CaptureStatus::RequestingDevice {
            return Err(stream);
        }

        self.format = Some(stream.format());
        self.stream = Some(stream);
        self.status = CaptureStatus::Armed;
        debug!(generation = generation, "Microphone armed");
        Ok(())
    }

    /// Move from armed to recording. Returns false when not armed.
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.status != CaptureStatus::Armed {
            return false;
        }

        if let Some(stream) = self.stream.as_mut() {
            // Audio from the arm delay is not part of the take.
            let _ = stream.drain_chunks();
        }

        self.chunks.clear();
        self.elapsed_seconds = 0;
        self.started_at = Some(now);
        self.status = CaptureStatus::Recording;
        info!(generation = self.generation, "Recording started");
        true
    }

    /// One elapsed-time tick. Refreshes the whole-second counter, collects
    /// buffered audio and returns a stream failure if the backend reported one.
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        if self.status != CaptureStatus::Recording {
            return None;
        }

        self.elapsed_seconds = self.elapsed_precise(now).floor() as u64;
        self.collect();
        self.stream.as_mut().and_then(|s| s.take_error())
    }

    /// End the capture.
    pub fn stop(&mut self, mode: StopMode) -> StopOutcome {
        match self.status {
            CaptureStatus::RequestingDevice | CaptureStatus::Armed => {
                // A grant still in flight no longer matches and is released on arrival.
                self.release();
                self.status = CaptureStatus::Idle;
                debug!(generation = self.generation, "Capture abandoned before recording");
                StopOutcome::Released
            }
            CaptureStatus::Recording => {
                self.collect();
                self.release();
                self.elapsed_seconds = self.elapsed_precise(Instant::now()).floor() as u64;
                self.started_at = None;
                let chunks = std::mem::take(&mut self.chunks);

                let intent = match mode {
                    StopMode::DropBuffered => {
                        self.status = CaptureStatus::Idle;
                        info!(generation = self.generation, "Recording discarded");
                        return StopOutcome::Released;
                    }
                    StopMode::Finalize(intent) => intent,
                };

                let format = match self.format {
                    Some(format) if chunks.iter().any(|c| !c.is_empty()) => format,
                    _ => {
                        self.status = CaptureStatus::Idle;
                        warn!(generation = self.generation, "Recording stopped with no audio");
                        return StopOutcome::Empty;
                    }
                };

                self.status = CaptureStatus::Finalizing;
                info!(
                    generation = self.generation,
                    elapsed_seconds = self.elapsed_seconds,
                    intent = ?intent,
                    "Recording stopped, finalizing"
                );

                StopOutcome::Finalize(PendingFinalize {
                    generation: self.generation,
                    format,
                    chunks,
                    intent,
                })
            }
            CaptureStatus::Idle | CaptureStatus::Finalizing | CaptureStatus::Error => {
                StopOutcome::Released
            }
        }
    }

    /// Mark a finalize as complete.
    pub fn finish_finalize(&mut self, generation: u64) {
        if generation == self.generation && self.status == CaptureStatus::Finalizing {
            self.status = CaptureStatus::Idle;
        }
    }

    /// Enter the error state, releasing the device and buffered audio.
    pub fn fail(&mut self, reason: String) {
        self.release();
        self.chunks.clear();
        self.started_at = None;
        self.status = CaptureStatus::Error;
        self.last_error = Some(reason);
    }

    /// Return to idle from any state. In-flight grants become stale.
    pub fn reset(&mut self) {
        self.release();
        self.chunks.clear();
        self.started_at = None;
        self.generation += 1;
        self.status = CaptureStatus::Idle;
        self.last_error = None;
    }

    /// Seconds since recording began, with sub-second precision.
    pub fn elapsed_precise(&self, now: Instant) -> f64 {
        match (self.status, self.started_at) {
            (CaptureStatus::Recording, Some(started)) => {
                now.saturating_duration_since(started).as_secs_f64()
            }
            _ => self.elapsed_seconds as f64,
        }
    }

    /// Current status.
    pub fn status(&self) -> CaptureStatus {
        self.status
    }

    /// Generation of the most recent request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whole-second counter; frozen after stop.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Failure text of the last capture.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True while requesting, armed or recording.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            CaptureStatus::RequestingDevice | CaptureStatus::Armed | CaptureStatus::Recording
        )
    }

    /// True while a microphone stream is held.
    pub fn holds_device(&self) -> bool {
        self.stream.is_some()
    }

    fn collect(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            self.chunks
                .extend(stream.drain_chunks().into_iter().filter(|c| !c.is_empty()));
        }
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
            debug!(generation = self.generation, "Microphone released");
        }
    }
}
