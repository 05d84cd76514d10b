use crate::device::Player;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

/// Transport status of the bound take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// No take bound.
    Idle,
    /// Bound, not started or stopped.
    Loaded,
    /// Output running.
    Playing,
    /// Output halted mid-clip.
    Paused,
}

/// Effect of a seek.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekOutcome {
    /// No take bound; nothing changed.
    NoTake,
    /// Displayed position updated without starting playback.
    Previewed(f64),
    /// Decode cursor moved while playing; the sampling tick must restart.
    Relocated(f64),
}

/// Effect of an end-of-clip notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndedOutcome {
    /// Stale or unexpected notification.
    Ignored,
    /// Repeat-one restarted the clip from zero.
    Looped,
    /// Playback finished and returned to zero.
    Finished,
}

/// Transport for the current take.
///
/// Bound to at most one player at a time. Every rebind resets position,
/// duration and playing state, so nothing stale survives a take change.
pub struct PlaybackSession<P: Player> {
    status: PlaybackStatus,
    player: Option<P>,
    take_id: Option<Uuid>,
    generation: u64,
    position: f64,
    duration: f64,
    repeat_one: bool,
}

impl<P: Player> Default for PlaybackSession<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Player> PlaybackSession<P> {
    /// Unbound session.
    pub fn new() -> Self {
        Self {
            status: PlaybackStatus::Idle,
            player: None,
            take_id: None,
            generation: 0,
            position: 0.0,
            duration: 0.0,
            repeat_one: false,
        }
    }

    /// Release the current binding and reserve the generation of the next one.
    pub fn prepare_rebind(&mut self) -> u64 {
        self.unbind();
        self.generation
    }

    /// Bind a freshly loaded player. Ignored if `generation` is stale.
    pub fn bind(&mut self, generation: u64, take_id: Uuid, player: P) -> bool {
        if generation != self.generation {
            return false;
        }

        self.player = Some(player);
        self.take_id = Some(take_id);
        self.status = PlaybackStatus::Loaded;
        self.position = 0.0;
        self.duration = 0.0;
        info!(take_id = %take_id, generation = generation, "Playback bound to take");
        true
    }

    /// Drop the player and reset to zero.
    pub fn unbind(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.pause();
        }

        self.generation += 1;
        self.take_id = None;
        self.status = PlaybackStatus::Idle;
        self.position = 0.0;
        self.duration = 0.0;
    }

    /// Record a probed duration. Ignored if `generation` is stale.
    pub fn set_duration(&mut self, generation: u64, seconds: f64) -> bool {
        if generation != self.generation || self.player.is_none() {
            return false;
        }

        self.duration = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.position = self.position.min(self.duration);
        debug!(duration = self.duration, "Duration probed");
        true
    }

    /// Start or resume. Returns false when no take is bound.
    pub fn play(&mut self) -> bool {
        let Some(player) = self.player.as_mut() else {
            return false;
        };

        if self.status != PlaybackStatus::Playing {
            player.set_position(self.position);
            player.play();
            self.status = PlaybackStatus::Playing;
        }
        true
    }

    /// Freeze position, keeping the player bound.
    pub fn pause(&mut self) -> bool {
        if self.status != PlaybackStatus::Playing {
            return false;
        }

        if let Some(player) = self.player.as_mut() {
            let at = player.position();
            player.pause();
            self.position = self.clamp(at);
        }
        self.status = PlaybackStatus::Paused;
        true
    }

    /// Clamp to `[0, duration]` and move there.
    ///
    /// While not playing this only updates the displayed position.
    pub fn seek(&mut self, seconds: f64) -> SeekOutcome {
        let target = self.clamp(seconds);
        let playing = self.status == PlaybackStatus::Playing;

        let Some(player) = self.player.as_mut() else {
            return SeekOutcome::NoTake;
        };

        self.position = target;
        if playing {
            player.set_position(target);
            SeekOutcome::Relocated(target)
        } else {
            SeekOutcome::Previewed(target)
        }
    }

    /// Halt and rewind to zero, keeping the binding.
    pub fn stop(&mut self) -> bool {
        let Some(player) = self.player.as_mut() else {
            return false;
        };

        player.pause();
        player.set_position(0.0);
        self.position = 0.0;
        self.status = PlaybackStatus::Loaded;
        true
    }

    /// Handle natural completion reported by the player.
    pub fn on_ended(&mut self, generation: u64) -> EndedOutcome {
        if generation != self.generation || self.status != PlaybackStatus::Playing {
            return EndedOutcome::Ignored;
        }

        let Some(player) = self.player.as_mut() else {
            return EndedOutcome::Ignored;
        };

        self.position = 0.0;
        player.set_position(0.0);

        if self.repeat_one {
            player.play();
            EndedOutcome::Looped
        } else {
            player.pause();
            self.status = PlaybackStatus::Loaded;
            EndedOutcome::Finished
        }
    }

    /// Refresh the visible position from the player.
    pub fn sample(&mut self) {
        if self.status != PlaybackStatus::Playing {
            return;
        }
        if let Some(position) = self.player.as_ref().map(|p| p.position()) {
            self.position = self.clamp(position);
        }
    }

    /// Enable or disable looping of the bound take.
    pub fn set_repeat_one(&mut self, enabled: bool) {
        self.repeat_one = enabled;
    }

    /// Repeat-one flag.
    pub fn repeat_one(&self) -> bool {
        self.repeat_one
    }

    /// Current status.
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// True while output runs.
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// True when a take is bound.
    pub fn is_bound(&self) -> bool {
        self.player.is_some()
    }

    /// Visible position in seconds.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Probed duration in seconds; 0 until probing completes.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Take currently bound.
    pub fn take_id(&self) -> Option<Uuid> {
        self.take_id
    }

    /// Generation of the current binding.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn clamp(&self, seconds: f64) -> f64 {
        if !seconds.is_finite() {
            return 0.0;
        }
        seconds.clamp(0.0, self.duration.max(0.0))
    }
}
