use super::{SessionCommand, SessionSnapshot};
use crate::{CoreResult, SessionError, marker::Marker};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::{mpsc, oneshot, watch};

/// Cloneable front end of a running session controller.
///
/// Commands are queued in order; their effects become visible through the
/// snapshot channel once the controller has processed them.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<SessionCommand>,
        snapshot: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self { commands, snapshot }
    }

    /// Stop any playback and start a new recording.
    pub async fn start_recording(&self) -> CoreResult<()> {
        self.send(SessionCommand::StartRecording).await
    }

    /// Stop recording and keep the take.
    pub async fn stop_recording(&self) -> CoreResult<()> {
        self.send(SessionCommand::StopRecording).await
    }

    /// Stop recording without creating a take.
    pub async fn discard(&self) -> CoreResult<()> {
        self.send(SessionCommand::Discard).await
    }

    /// Drop the current take, or the one being recorded once it finalizes.
    pub async fn delete(&self) -> CoreResult<()> {
        self.send(SessionCommand::Delete).await
    }

    /// Keep the running capture as a false start and record again.
    pub async fn restart(&self) -> CoreResult<()> {
        self.send(SessionCommand::Restart).await
    }

    /// Play the current take. No effect without one.
    pub async fn play(&self) -> CoreResult<()> {
        self.send(SessionCommand::Play).await
    }

    /// Pause playback.
    pub async fn pause(&self) -> CoreResult<()> {
        self.send(SessionCommand::Pause).await
    }

    /// Play when halted, pause when playing.
    pub async fn toggle_playback(&self) -> CoreResult<()> {
        self.send(SessionCommand::TogglePlayback).await
    }

    /// Halt playback and rewind to zero.
    pub async fn stop_playback(&self) -> CoreResult<()> {
        self.send(SessionCommand::StopPlayback).await
    }

    /// Move the playback position.
    pub async fn seek(&self, seconds: f64) -> CoreResult<()> {
        self.send(SessionCommand::Seek { seconds }).await
    }

    /// Mark the current recording time. `None` when not recording.
    pub async fn set_marker(&self) -> CoreResult<Option<Marker>> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::SetMarker { reply }).await?;

        rx.await.map_err(|e| SessionError::ChannelClosed {
            reason: format!("marker reply dropped: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Seek to the next marker.
    pub async fn next_marker(&self) -> CoreResult<()> {
        self.send(SessionCommand::NextMarker).await
    }

    /// Seek to the previous marker.
    pub async fn previous_marker(&self) -> CoreResult<()> {
        self.send(SessionCommand::PreviousMarker).await
    }

    /// Loop the current take on natural end.
    pub async fn set_repeat_one(&self, enabled: bool) -> CoreResult<()> {
        self.send(SessionCommand::SetRepeatOne(enabled)).await
    }

    /// Clear the fault.
    pub async fn dismiss_error(&self) -> CoreResult<()> {
        self.send(SessionCommand::DismissError).await
    }

    /// Clear the fault and retry the failed setup.
    pub async fn retry(&self) -> CoreResult<()> {
        self.send(SessionCommand::Retry).await
    }

    /// Release every device and stop the controller.
    pub async fn shutdown(&self) -> CoreResult<()> {
        self.send(SessionCommand::Shutdown).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Independent receiver of snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Wait until a snapshot satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// `ChannelClosed` if the controller stops first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> CoreResult<SessionSnapshot> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|e| SessionError::ChannelClosed {
                reason: format!("snapshot channel closed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
        Ok(snapshot.clone())
    }

    #[track_caller]
    fn send(&self, command: SessionCommand) -> impl Future<Output = CoreResult<()>> + '_ {
        let location = ErrorLocation::from(Location::caller());

        async move {
            self.commands
                .send(command)
                .await
                .map_err(|e| SessionError::ChannelClosed {
                    reason: format!("controller stopped: {e}"),
                    location,
                })
        }
    }
}
