use super::{Rgba, TraceStyle};

use std::time::Duration;

/// Geometry, thresholds and colours of the live waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformConfig {
    /// Drawable width in CSS pixels.
    pub width: f32,
    /// Drawable height in CSS pixels, marker strip included.
    pub height: f32,
    /// Device pixels per CSS pixel.
    pub device_pixel_ratio: f32,
    /// Width of one bar.
    pub bar_width: f32,
    /// Gap between bars.
    pub bar_gap: f32,
    /// Time span represented by the full width.
    pub scroll_window: Duration,
    /// Readings at or below this are silent.
    pub dead_db: f32,
    /// Readings at or below this fade from the previous bar.
    pub floor_db: f32,
    /// Per-bar decay inside the fade zone.
    pub fade_factor: f32,
    /// Faded values below this snap to zero.
    pub fade_snap: f32,
    /// Samples read from the analysis tap per bar.
    pub analysis_window: usize,
    /// Height of the strip holding marker glyphs.
    pub marker_strip_height: f32,
    /// Trace strategy.
    pub style: TraceStyle,
    /// Trace colour.
    pub wave_color: Rgba,
    /// Marker glyph colour.
    pub marker_color: Rgba,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 120.0,
            device_pixel_ratio: 1.0,
            bar_width: 2.0,
            bar_gap: 1.0,
            scroll_window: Duration::from_secs(10),
            dead_db: -80.0,
            floor_db: -70.0,
            fade_factor: 0.6,
            fade_snap: 0.02,
            analysis_window: 256,
            marker_strip_height: 10.0,
            style: TraceStyle::Bars,
            wave_color: Rgba([0xe8, 0x4a, 0x3c, 0xff]),
            marker_color: Rgba([0xff, 0xff, 0xff, 0xff]),
        }
    }
}
