use crate::{AppError, AppResult};

use sketchbook_core::{Rgba, TraceStyle, WaveformConfig};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// `[waveform]` section: live trace geometry, thresholds and colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformSection {
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
    /// Time span of the full width, in milliseconds.
    pub scroll_window_ms: u64,
    /// Silence threshold in dBFS.
    pub dead_db: f32,
    /// Fade threshold in dBFS.
    pub floor_db: f32,
    /// Per-bar decay in the fade zone.
    pub fade_factor: f32,
    /// Faded bars below this snap to zero.
    pub fade_snap: f32,
    /// Samples read per bar.
    pub analysis_window: usize,
    /// Height of the marker strip.
    pub marker_strip_height: f32,
    /// `bars` or `line`.
    pub style: TraceStyle,
    /// Trace colour as `#rrggbb` or `#rrggbbaa`.
    pub wave_color: String,
    /// Marker colour as `#rrggbb` or `#rrggbbaa`.
    pub marker_color: String,
}

impl Default for WaveformSection {
    fn default() -> Self {
        let defaults = WaveformConfig::default();

        Self {
            width: defaults.width,
            height: defaults.height,
            device_pixel_ratio: defaults.device_pixel_ratio,
            bar_width: defaults.bar_width,
            bar_gap: defaults.bar_gap,
            scroll_window_ms: u64::try_from(defaults.scroll_window.as_millis())
                .unwrap_or(u64::MAX),
            dead_db: defaults.dead_db,
            floor_db: defaults.floor_db,
            fade_factor: defaults.fade_factor,
            fade_snap: defaults.fade_snap,
            analysis_window: defaults.analysis_window,
            marker_strip_height: defaults.marker_strip_height,
            style: defaults.style,
            wave_color: defaults.wave_color.to_hex(),
            marker_color: defaults.marker_color.to_hex(),
        }
    }
}

impl WaveformSection {
    /// Convert into the renderer's configuration.
    ///
    /// # Errors
    ///
    /// `ConfigError` when a colour is not valid hex.
    #[track_caller]
    pub fn to_waveform_config(&self) -> AppResult<WaveformConfig> {
        Ok(WaveformConfig {
            width: self.width,
            height: self.height,
            device_pixel_ratio: self.device_pixel_ratio,
            bar_width: self.bar_width,
            bar_gap: self.bar_gap,
            scroll_window: Duration::from_millis(self.scroll_window_ms),
            dead_db: self.dead_db,
            floor_db: self.floor_db,
            fade_factor: self.fade_factor,
            fade_snap: self.fade_snap,
            analysis_window: self.analysis_window,
            marker_strip_height: self.marker_strip_height,
            style: self.style,
            wave_color: parse_color("wave_color", &self.wave_color)?,
            marker_color: parse_color("marker_color", &self.marker_color)?,
        })
    }
}

#[track_caller]
fn parse_color(field: &str, text: &str) -> AppResult<Rgba> {
    Rgba::from_hex(text).ok_or_else(|| AppError::ConfigError {
        reason: format!("waveform.{} is not a hex colour: {:?}", field, text),
        location: ErrorLocation::from(Location::caller()),
    })
}
