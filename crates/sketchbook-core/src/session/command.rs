use crate::marker::Marker;

use tokio::sync::oneshot;

/// Operations accepted by the session controller.
#[derive(Debug)]
pub enum SessionCommand {
    /// Stop any playback and arm the microphone.
    StartRecording,
    /// Stop and keep the take.
    StopRecording,
    /// Stop and drop the buffered audio.
    Discard,
    /// Drop the current take, or the one being recorded.
    Delete,
    /// Keep the current capture as a false start and record again.
    Restart,
    /// Start or resume playback of the current take.
    Play,
    /// Pause playback.
    Pause,
    /// Play when halted, pause when playing.
    TogglePlayback,
    /// Halt playback and rewind.
    StopPlayback,
    /// Move the playback position.
    Seek {
        /// Target in seconds; clamped to the take.
        seconds: f64,
    },
    /// Drop a marker at the current recording time.
    SetMarker {
        /// Receives the marker, or `None` when not recording.
        reply: oneshot::Sender<Option<Marker>>,
    },
    /// Seek to the next marker.
    NextMarker,
    /// Seek to the previous marker.
    PreviousMarker,
    /// Loop the current take on natural end.
    SetRepeatOne(bool),
    /// Clear the fault.
    DismissError,
    /// Clear the fault and re-run recording setup when applicable.
    Retry,
    /// Release everything and stop the controller.
    Shutdown,
}
