use crate::{
    SessionError,
    capture::CaptureStatus,
    error::FaultKind,
    marker::Marker,
    playback::PlaybackStatus,
    take::Take,
    waveform::{MarkerPlacement, RendererStatus},
};

use serde::Serialize;
use uuid::Uuid;

/// Top-level state shown to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No take, nothing running.
    #[default]
    Idle,
    /// Waiting for the microphone or the arm delay.
    Armed,
    /// Capturing audio, including the gap of a restart.
    Recording,
    /// Idle with a current take.
    Stopped,
    /// Playing the current take.
    Playing,
    /// A fault awaits dismissal or retry.
    Error,
}

/// What the retry action of a fault does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryAction {
    /// Re-run recording setup.
    Rearm,
    /// Only clear the banner.
    Dismiss,
}

/// A surfaced failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionFault {
    /// Category.
    pub kind: FaultKind,
    /// Banner text.
    pub message: String,
    /// Full error text for logs.
    pub detail: String,
    /// Effect of retrying.
    pub retry: RetryAction,
}

impl SessionFault {
    /// Build the fault surfaced for `error`.
    pub fn from_error(error: &SessionError) -> Self {
        let retry = match error.kind() {
            FaultKind::Decode | FaultKind::Resampling | FaultKind::Channel => RetryAction::Dismiss,
            _ => RetryAction::Rearm,
        };

        Self {
            kind: error.kind(),
            message: error.user_message().to_string(),
            detail: error.to_string(),
            retry,
        }
    }
}

/// Summary of a take in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TakeSummary {
    /// Take id.
    pub id: Uuid,
    /// True for a restarted attempt.
    pub false_start: bool,
    /// Label of a false start.
    pub label: Option<String>,
    /// Encoded size.
    pub bytes: usize,
    /// Codec tag.
    pub mime: String,
}

impl From<&Take> for TakeSummary {
    fn from(take: &Take) -> Self {
        Self {
            id: take.id(),
            false_start: take.is_false_start(),
            label: take.label().map(str::to_string),
            bytes: take.audio().len(),
            mime: take.audio().mime().to_string(),
        }
    }
}

/// Everything observable about a session at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Top-level state.
    pub state: SessionState,
    /// Capture lifecycle.
    pub capture: CaptureStatus,
    /// Whole seconds recorded; frozen after stop.
    pub elapsed_seconds: u64,
    /// Transport status.
    pub playback: PlaybackStatus,
    /// Playback position in seconds.
    pub position_seconds: f64,
    /// Duration of the current take; 0 until probed.
    pub duration_seconds: f64,
    /// Repeat-one flag.
    pub repeat_one: bool,
    /// History, oldest first.
    pub takes: Vec<TakeSummary>,
    /// Take bound to playback.
    pub bound_take: Option<Uuid>,
    /// Markers of the latest recording.
    pub markers: Vec<Marker>,
    /// On-screen marker positions of the last frame.
    pub marker_placements: Vec<MarkerPlacement>,
    /// Live waveform status.
    pub renderer: RendererStatus,
    /// Finalizes still running.
    pub pending_finalizes: usize,
    /// Current fault.
    pub fault: Option<SessionFault>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            capture: CaptureStatus::Idle,
            elapsed_seconds: 0,
            playback: PlaybackStatus::Idle,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            repeat_one: false,
            takes: Vec::new(),
            bound_take: None,
            markers: Vec::new(),
            marker_placements: Vec::new(),
            renderer: RendererStatus::Inactive,
            pending_finalizes: 0,
            fault: None,
        }
    }
}

impl SessionSnapshot {
    /// The most recent take.
    pub fn current_take(&self) -> Option<&TakeSummary> {
        self.takes.last()
    }
}
