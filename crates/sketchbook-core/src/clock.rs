//! Transport bar time helpers.

/// Format seconds as `MM:SS`. Negative and non-finite input reads `00:00`.
pub fn format_clock(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Playback progress in percent, `0` when the duration is unknown.
pub fn progress_percent(position: f64, duration: f64) -> f64 {
    if duration.is_nan() || duration <= 0.0 || !position.is_finite() {
        return 0.0;
    }
    (position / duration * 100.0).clamp(0.0, 100.0)
}
