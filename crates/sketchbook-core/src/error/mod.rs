use error_location::ErrorLocation;
use serde::Serialize;
use thiserror::Error;

/// Session errors with source location tracking.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The platform refused microphone access.
    #[error("Microphone permission denied: {reason} {location}")]
    PermissionDenied {
        /// Description reported by the audio backend.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio input device found.
    #[error("No microphone found {location}")]
    NoDevice {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device operation failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Captured audio could not be finalized into a take.
    #[error("Encoding failed: {reason} {location}")]
    EncodeError {
        /// Description of the encoder failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A take could not be decoded for playback or probing.
    #[error("Decoding failed: {reason} {location}")]
    DecodeError {
        /// Description of the decoder failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Re-acquiring the microphone after a restart failed.
    #[error("Restart failed: {source} {location}")]
    RestartFailed {
        /// The failure that prevented the new capture.
        #[source]
        source: Box<SessionError>,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio resampling failed.
    #[error("Resampling error: {reason} {location}")]
    ResamplingError {
        /// Description of the resampling error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The session controller is no longer running.
    #[error("Session channel closed: {reason} {location}")]
    ChannelClosed {
        /// Which exchange with the controller failed.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Failure category carried by session snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Microphone access refused.
    PermissionDenied,
    /// No input device present.
    NoDevice,
    /// Device failure, including mid-recording stream errors.
    Device,
    /// Finalizing a take failed.
    Encode,
    /// Loading or probing a take failed.
    Decode,
    /// A restart could not start the new capture.
    Restart,
    /// Sample rate conversion failed.
    Resampling,
    /// The controller went away.
    Channel,
}

impl SessionError {
    /// Category of this error.
    pub fn kind(&self) -> FaultKind {
        match self {
            SessionError::PermissionDenied { .. } => FaultKind::PermissionDenied,
            SessionError::NoDevice { .. } => FaultKind::NoDevice,
            SessionError::DeviceError { .. } => FaultKind::Device,
            SessionError::EncodeError { .. } => FaultKind::Encode,
            SessionError::DecodeError { .. } => FaultKind::Decode,
            SessionError::RestartFailed { .. } => FaultKind::Restart,
            SessionError::ResamplingError { .. } => FaultKind::Resampling,
            SessionError::ChannelClosed { .. } => FaultKind::Channel,
        }
    }

    /// Message suitable for the persistent error banner.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            FaultKind::PermissionDenied | FaultKind::NoDevice => {
                "Could not access microphone. Please check permissions."
            }
            FaultKind::Device => "Recording failed. Please try again.",
            FaultKind::Encode => "Failed to save recording. Please try again.",
            FaultKind::Decode => "Failed to load recording.",
            FaultKind::Restart => "Failed to restart recording. Please try again.",
            FaultKind::Resampling => "Failed to prepare recording for playback.",
            FaultKind::Channel => "Audio session stopped unexpectedly.",
        }
    }
}

/// Result type alias using [`SessionError`].
pub type Result<T> = std::result::Result<T, SessionError>;
