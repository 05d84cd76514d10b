use crate::{take::MAX_TAKES, waveform::WaveformConfig};

use std::time::Duration;

/// Timings and limits of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Capacity of the take history.
    pub max_takes: usize,
    /// Pause between the microphone grant and the start of buffering.
    pub arm_delay: Duration,
    /// Pause between a false-start finalize and the new capture.
    pub restart_settle: Duration,
    /// Resolution of the elapsed-time counter.
    pub record_tick: Duration,
    /// Cadence of playback position sampling.
    pub playback_tick: Duration,
    /// Cadence of waveform frames.
    pub frame_interval: Duration,
    /// Live waveform settings.
    pub waveform: WaveformConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_takes: MAX_TAKES,
            arm_delay: Duration::from_millis(300),
            restart_settle: Duration::from_millis(100),
            record_tick: Duration::from_secs(1),
            playback_tick: Duration::from_millis(100),
            frame_interval: Duration::from_millis(16),
            waveform: WaveformConfig::default(),
        }
    }
}
