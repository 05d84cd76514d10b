//! Sketchbook Core Library
//!
//! Recording session core for a voice-memo recorder: capture, a bounded take
//! history, playback, a live scrolling waveform and the controller tying them
//! together. Devices are injected through the traits in [`device`]; cpal and
//! WAV implementations are provided.
//!
//! # Example
//!
//! ```no_run
//! use sketchbook_core::{
//!     CoreResult, CpalMicrophone, CpalPlaybackEngine, SessionConfig, SessionController,
//!     SessionState, SharedCanvas, WavEncoder,
//! };
//!
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let config = SessionConfig::default();
//!     let canvas = SharedCanvas::new(360.0, 120.0, 2.0);
//!     let (session, _task) = SessionController::spawn(
//!         config,
//!         CpalMicrophone::new(None),
//!         WavEncoder,
//!         CpalPlaybackEngine,
//!         canvas.clone(),
//!     );
//!
//!     session.start_recording().await?;
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     session.stop_recording().await?;
//!
//!     let snapshot = session.wait_for(|s| s.state == SessionState::Stopped).await?;
//!     println!("Recorded {} take(s)", snapshot.takes.len());
//!
//!     session.play().await?;
//!     Ok(())
//! }
//! ```

mod audio;
mod capture;
mod clock;
pub mod device;
mod error;
mod marker;
mod playback;
mod session;
mod take;
pub mod waveform;

pub use {
    audio::{
        CpalAnalysisTap, CpalInputStream, CpalMicrophone, CpalPlaybackEngine, CpalPlayer,
        Resampler, WAV_MIME, WavEncoder, decode_mono, match_rate, probe_duration,
    },
    capture::{
        CaptureSession, CaptureStatus, FinalizeIntent, PendingFinalize, StopMode, StopOutcome,
    },
    clock::{format_clock, progress_percent},
    error::{FaultKind, Result as CoreResult, SessionError},
    marker::{MARKER_REWIND_GRACE_SECONDS, Marker, MarkerTrack},
    playback::{EndedOutcome, PlaybackSession, PlaybackStatus, SeekOutcome},
    session::{
        RetryAction, SessionCommand, SessionConfig, SessionController, SessionFault,
        SessionHandle, SessionSnapshot, SessionState, TakeSummary,
    },
    take::{EncodedAudio, FALSE_START_LABEL, MAX_TAKES, Take, TakeKind, TakeStore},
    waveform::{
        LiveWaveformRenderer, MarkerPlacement, PixelCanvas, RendererStatus, Rgba, SharedCanvas,
        Surface, TraceStyle, WaveformConfig,
    },
};

#[cfg(test)]
mod tests;
