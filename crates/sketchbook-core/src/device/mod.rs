//! Capability interfaces consumed from the host platform.
//!
//! The session controller never talks to an audio backend directly. It is
//! handed implementations of these traits (cpal/WAV in production, fakes in
//! tests). Device calls may block, so the controller runs them on the
//! blocking pool and reports their outcome back as events.

use crate::{CoreResult, take::EncodedAudio};

use tokio::sync::mpsc;

/// Sample layout of a capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

/// A block of interleaved samples produced by a capture stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioChunk {
    /// Interleaved `f32` samples in `[-1, 1]`.
    pub samples: Vec<f32>,
}

impl AudioChunk {
    /// Wrap a block of samples.
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    /// Number of samples in the block.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the block holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Microphone access.
pub trait Microphone: Send + Sync + 'static {
    /// Encoder-path stream.
    type Stream: InputStream;
    /// Analysis tap used by the live waveform.
    type Tap: AnalysisTap;

    /// Open an exclusive capture stream.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` or `NoDevice` when access is impossible.
    fn open(&self) -> CoreResult<Self::Stream>;

    /// Open an analysis tap keeping the most recent `window` mono samples.
    fn open_analysis(&self, window: usize) -> CoreResult<Self::Tap>;
}

/// A live capture stream buffering audio until drained.
pub trait InputStream: Send + 'static {
    /// Layout of the samples this stream produces.
    fn format(&self) -> StreamFormat;

    /// Take every chunk buffered since the previous call.
    fn drain_chunks(&mut self) -> Vec<AudioChunk>;

    /// Take a pending stream failure, if the backend reported one.
    fn take_error(&mut self) -> Option<String>;

    /// Stop capturing and release the device. Safe to call repeatedly.
    fn close(&mut self);
}

/// Read access to recent raw amplitude samples of a live stream.
///
/// Release happens in the order `disconnect`, `stop_tracks`, `close`; each
/// step must tolerate being called on an already released tap.
pub trait AnalysisTap: Send + 'static {
    /// Fill `out` with the most recent samples, oldest first, zero padded.
    fn read_time_domain(&mut self, out: &mut [f32]);

    /// Detach the analysis node from the stream.
    fn disconnect(&mut self);

    /// Stop the underlying stream tracks.
    fn stop_tracks(&mut self);

    /// Close the processing context.
    fn close(&mut self);
}

/// Turns captured chunks into a single encoded payload.
pub trait Encoder: Send + Sync + 'static {
    /// Finalize `chunks` into an encoded blob.
    ///
    /// # Errors
    ///
    /// `EncodeError` when encoding fails or there is nothing to encode.
    fn finalize(&self, format: StreamFormat, chunks: Vec<AudioChunk>) -> CoreResult<EncodedAudio>;
}

/// Decoder/player factory.
pub trait PlaybackEngine: Send + Sync + 'static {
    /// Player bound to one decoded take.
    type Player: Player;

    /// Decode `audio` into a player. `ended` must be notified on every
    /// natural completion.
    ///
    /// # Errors
    ///
    /// `DecodeError` for corrupt or unsupported payloads.
    fn load(&self, audio: &EncodedAudio, ended: EndedSignal) -> CoreResult<Self::Player>;

    /// Read the duration of `audio` in seconds.
    fn probe_duration(&self, audio: &EncodedAudio) -> CoreResult<f64>;
}

/// Transport of one loaded take.
pub trait Player: Send + 'static {
    /// Start or resume from the current cursor.
    fn play(&mut self);

    /// Halt output, keeping the cursor.
    fn pause(&mut self);

    /// Move the decode cursor.
    fn set_position(&mut self, seconds: f64);

    /// Current decode cursor in seconds.
    fn position(&self) -> f64;
}

/// End-of-clip notifier handed to a player at load time.
///
/// Tagged with the binding generation so completions of a replaced player
/// are ignored.
#[derive(Debug, Clone)]
pub struct EndedSignal {
    tx: mpsc::UnboundedSender<u64>,
    generation: u64,
}

impl EndedSignal {
    pub(crate) fn new(tx: mpsc::UnboundedSender<u64>, generation: u64) -> Self {
        Self { tx, generation }
    }

    /// Report natural completion. Never blocks; safe from audio callbacks.
    pub fn notify(&self) {
        let _ = self.tx.send(self.generation);
    }

    /// Binding generation this signal belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
