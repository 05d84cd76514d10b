use sketchbook_core::SessionConfig;

use serde::{Deserialize, Serialize};

/// `[session]` section: history size and controller timings.
///
/// Durations are stored as whole milliseconds so the file stays readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Capacity of the take history.
    pub max_takes: usize,
    /// Pause between the microphone grant and the start of buffering.
    pub arm_delay_ms: u64,
    /// Pause between a false start and the next capture.
    pub restart_settle_ms: u64,
    /// Resolution of the elapsed-time counter.
    pub record_tick_ms: u64,
    /// Cadence of playback position sampling.
    pub playback_tick_ms: u64,
    /// Cadence of waveform frames.
    pub frame_interval_ms: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        let defaults = SessionConfig::default();

        Self {
            max_takes: defaults.max_takes,
            arm_delay_ms: millis(defaults.arm_delay),
            restart_settle_ms: millis(defaults.restart_settle),
            record_tick_ms: millis(defaults.record_tick),
            playback_tick_ms: millis(defaults.playback_tick),
            frame_interval_ms: millis(defaults.frame_interval),
        }
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
