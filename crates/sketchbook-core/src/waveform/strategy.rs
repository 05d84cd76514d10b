use super::{
    BarRing, LevelNormalizer, Rgba, ScrollClock, Surface, WaveformConfig, bars::total_bars,
};
use crate::device::AnalysisTap;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Selects the trace strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStyle {
    /// Scrolling mirrored bars.
    #[default]
    Bars,
    /// Oscilloscope line of the latest window.
    Line,
}

/// Region of the surface the trace may paint into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceArea {
    /// Top edge in CSS pixels.
    pub top: f32,
    /// Width in CSS pixels.
    pub width: f32,
    /// Height in CSS pixels.
    pub height: f32,
}

impl TraceArea {
    fn center(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

/// A way of turning analysis samples into pixels.
pub trait TraceStrategy: Send {
    /// Advance by `delta`, sampling `tap` as needed.
    fn update(&mut self, delta: Duration, tap: &mut dyn AnalysisTap);

    /// Paint the current state. The surface has already been cleared.
    fn paint(&self, surface: &mut dyn Surface, area: TraceArea);

    /// Forget all history.
    fn reset(&mut self);
}

/// Build the strategy named by `config.style`.
pub fn build_strategy(config: &WaveformConfig) -> Box<dyn TraceStrategy> {
    match config.style {
        TraceStyle::Bars => Box::new(BarTrace::new(config)),
        TraceStyle::Line => Box::new(LineTrace::new(config)),
    }
}

/// Scrolling bar chart mirrored around the centre line.
pub struct BarTrace {
    ring: BarRing,
    scroll: ScrollClock,
    normalizer: LevelNormalizer,
    window: Vec<f32>,
    bar_width: f32,
    bar_gap: f32,
    color: Rgba,
}

impl BarTrace {
    /// Sized from the configured geometry.
    pub fn new(config: &WaveformConfig) -> Self {
        let bars = total_bars(config.width, config.bar_width, config.bar_gap);

        Self {
            ring: BarRing::new(bars),
            scroll: ScrollClock::new(
                config.scroll_window,
                bars,
                config.bar_width + config.bar_gap,
            ),
            normalizer: LevelNormalizer::new(
                config.dead_db,
                config.floor_db,
                config.fade_factor,
                config.fade_snap,
            ),
            window: vec![0.0; config.analysis_window.max(1)],
            bar_width: config.bar_width.max(1.0),
            bar_gap: config.bar_gap.max(0.0),
            color: config.wave_color,
        }
    }

    /// Bar heights, oldest first.
    pub fn bars(&self) -> &BarRing {
        &self.ring
    }

    /// Sub-cell scroll offset in pixels.
    pub fn scroll_offset(&self) -> f32 {
        self.scroll.offset()
    }
}

impl TraceStrategy for BarTrace {
    fn update(&mut self, delta: Duration, tap: &mut dyn AnalysisTap) {
        // More cells than the ring holds would only overwrite themselves.
        let cells = self.scroll.advance(delta).min(self.ring.len());

        for _ in 0..cells {
            tap.read_time_domain(&mut self.window);
            let value = self.normalizer.normalize_window(&self.window);
            self.ring.push(value);
        }
    }

    fn paint(&self, surface: &mut dyn Surface, area: TraceArea) {
        let cell = self.bar_width + self.bar_gap;
        let count = self.ring.len();
        let offset = self.scroll.offset();
        let center = area.center();

        for (i, value) in self.ring.iter().enumerate() {
            let x = area.width - (count - i) as f32 * cell - offset;
            if x + self.bar_width <= 0.0 || x >= area.width {
                continue;
            }

            let half = value * area.height / 2.0;
            if half <= 0.0 {
                continue;
            }
            surface.fill_rect(x, center - half, self.bar_width, half * 2.0, self.color);
        }
    }

    fn reset(&mut self) {
        self.ring.clear();
        self.scroll.reset();
        self.normalizer.reset();
    }
}

/// Oscilloscope trace of the most recent analysis window.
pub struct LineTrace {
    window: Vec<f32>,
    color: Rgba,
}

/// Stroke width of the line trace.
pub const LINE_WIDTH: f32 = 2.0;

impl LineTrace {
    /// Sized from the configured analysis window.
    pub fn new(config: &WaveformConfig) -> Self {
        Self {
            window: vec![0.0; config.analysis_window.max(2)],
            color: config.wave_color,
        }
    }

    /// Samples shown by the last paint.
    pub fn samples(&self) -> &[f32] {
        &self.window
    }
}

impl TraceStrategy for LineTrace {
    fn update(&mut self, _delta: Duration, tap: &mut dyn AnalysisTap) {
        tap.read_time_domain(&mut self.window);
    }

    fn paint(&self, surface: &mut dyn Surface, area: TraceArea) {
        let last = (self.window.len() - 1).max(1) as f32;
        let points: Vec<(f32, f32)> = self
            .window
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let v = if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
                (
                    i as f32 / last * area.width,
                    area.center() + v * 0.5 * area.height,
                )
            })
            .collect();

        surface.stroke_line(&points, LINE_WIDTH, self.color);
    }

    fn reset(&mut self) {
        self.window.fill(0.0);
    }
}
