use super::{
    Surface, WaveformConfig,
    strategy::{TraceArea, TraceStrategy, build_strategy},
};
use crate::{device::AnalysisTap, marker::Marker};

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Width of a marker glyph in CSS pixels.
pub const MARKER_GLYPH_WIDTH: f32 = 2.0;

/// Lifecycle of the live waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererStatus {
    /// Nothing held, no frames wanted.
    Inactive,
    /// Waiting for the analysis tap.
    Initializing,
    /// Painting every frame.
    Streaming,
}

/// On-screen position of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerPlacement {
    /// Marker the placement belongs to.
    pub id: u32,
    /// Horizontal position in CSS pixels; `None` once older than the window.
    pub x: Option<f32>,
}

/// Paints a scrolling amplitude trace of the live microphone.
///
/// Owns its own analysis tap, opened independently of the encoder stream,
/// and releases it on every exit through [`teardown`](Self::teardown).
pub struct LiveWaveformRenderer<S: Surface, T: AnalysisTap> {
    config: WaveformConfig,
    surface: S,
    strategy: Box<dyn TraceStrategy>,
    tap: Option<T>,
    status: RendererStatus,
    generation: u64,
    frame_pending: bool,
    last_frame: Option<Instant>,
    placements: Vec<MarkerPlacement>,
}

impl<S: Surface, T: AnalysisTap> LiveWaveformRenderer<S, T> {
    /// Size `surface` for the configured geometry and pick the trace strategy.
    pub fn new(config: WaveformConfig, mut surface: S) -> Self {
        surface.resize(config.width, config.height, config.device_pixel_ratio);
        let strategy = build_strategy(&config);

        Self {
            config,
            surface,
            strategy,
            tap: None,
            status: RendererStatus::Inactive,
            generation: 0,
            frame_pending: false,
            last_frame: None,
            placements: Vec::new(),
        }
    }

    /// Enter `Initializing`. Returns the generation the tap must carry.
    #[instrument(skip(self))]
    pub fn begin(&mut self) -> u64 {
        if self.status != RendererStatus::Inactive {
            self.teardown();
        }

        self.generation += 1;
        self.status = RendererStatus::Initializing;
        self.strategy.reset();
        self.surface.clear();
        self.placements.clear();
        debug!(generation = self.generation, "Waveform initializing");
        self.generation
    }

    /// Accept an opened tap. Hands it back when stale so the caller can release it.
    pub fn attach(&mut self, generation: u64, tap: T) -> Result<(), T> {
        if generation != self.generation || self.status != RendererStatus::Initializing {
            return Err(tap);
        }

        self.tap = Some(tap);
        self.status = RendererStatus::Streaming;
        self.frame_pending = true;
        self.last_frame = None;
        info!(generation = generation, "Waveform streaming");
        Ok(())
    }

    /// The tap could not be opened. Recording continues without a trace.
    pub fn fail(&mut self, generation: u64, reason: &str) {
        if generation == self.generation && self.status == RendererStatus::Initializing {
            warn!(generation = generation, reason = %reason, "Waveform tap unavailable");
            self.status = RendererStatus::Inactive;
        }
    }

    /// Paint one frame.
    ///
    /// `elapsed_now` is the recording clock in seconds; markers are placed by
    /// their age against the scroll window. Returns false when not streaming.
    pub fn render_frame(&mut self, now: Instant, markers: &[Marker], elapsed_now: f64) -> bool {
        if self.status != RendererStatus::Streaming || !self.frame_pending {
            return false;
        }
        let Some(tap) = self.tap.as_mut() else {
            return false;
        };

        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);

        self.strategy.update(delta, tap);

        let (width, height) = self.surface.css_size();
        let strip = self.config.marker_strip_height.clamp(0.0, height);
        let area = TraceArea {
            top: strip,
            width,
            height: height - strip,
        };

        self.surface.clear();
        self.strategy.paint(&mut self.surface, area);

        self.place_markers(markers, elapsed_now, width);
        for x in self.placements.iter().filter_map(|p| p.x) {
            self.surface.fill_rect(
                x - MARKER_GLYPH_WIDTH / 2.0,
                0.0,
                MARKER_GLYPH_WIDTH,
                strip,
                self.config.marker_color,
            );
        }
        true
    }

    /// Release everything: cancel frames, disconnect the analysis node, stop
    /// the tracks and close the context. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub fn teardown(&mut self) {
        self.frame_pending = false;
        self.last_frame = None;

        if let Some(mut tap) = self.tap.take() {
            tap.disconnect();
            tap.stop_tracks();
            tap.close();
            debug!(generation = self.generation, "Waveform tap released");
        }

        if self.status == RendererStatus::Initializing {
            // An open still in flight must come back stale.
            self.generation += 1;
        }
        self.status = RendererStatus::Inactive;
    }

    /// True while a frame callback should be scheduled.
    pub fn wants_frames(&self) -> bool {
        self.status == RendererStatus::Streaming && self.frame_pending
    }

    /// Current status.
    pub fn status(&self) -> RendererStatus {
        self.status
    }

    /// Generation of the latest `begin`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while an analysis tap is held.
    pub fn holds_tap(&self) -> bool {
        self.tap.is_some()
    }

    /// Marker placements of the last frame.
    pub fn placements(&self) -> &[MarkerPlacement] {
        &self.placements
    }

    /// The drawing surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn place_markers(&mut self, markers: &[Marker], elapsed_now: f64, width: f32) {
        let window = self.config.scroll_window.as_secs_f64();

        self.placements = markers
            .iter()
            .map(|marker| MarkerPlacement {
                id: marker.id,
                x: marker_x(elapsed_now - marker.time_seconds, window, width),
            })
            .collect();
    }
}

impl<S: Surface, T: AnalysisTap> Drop for LiveWaveformRenderer<S, T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Screen x of a marker `age` seconds old, or `None` outside the window.
pub fn marker_x(age: f64, window: f64, width: f32) -> Option<f32> {
    if !age.is_finite() || window <= 0.0 || age < 0.0 || age > window {
        return None;
    }
    Some((f64::from(width) - age / window * f64::from(width)).round() as f32)
}
