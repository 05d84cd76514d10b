//! Live waveform rendering.

mod bars;
mod config;
mod level;
mod renderer;
mod scroll;
mod strategy;
mod surface;

pub use {
    bars::{BarRing, FALLBACK_BAR_COUNT, total_bars},
    config::WaveformConfig,
    level::{DB_EPSILON, LevelNormalizer, amplitude_to_db, peak_amplitude},
    renderer::{LiveWaveformRenderer, MARKER_GLYPH_WIDTH, MarkerPlacement, RendererStatus, marker_x},
    scroll::ScrollClock,
    strategy::{BarTrace, LINE_WIDTH, LineTrace, TraceArea, TraceStrategy, TraceStyle, build_strategy},
    surface::{PixelCanvas, Rgba, SharedCanvas, Surface},
};
