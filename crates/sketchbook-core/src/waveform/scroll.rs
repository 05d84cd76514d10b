use std::time::Duration;

/// Converts wall-clock deltas into a sub-cell scroll offset.
///
/// The rate is fixed by the scroll window and the drawable width, so the
/// trace scrolls at the same speed whatever the frame rate.
#[derive(Debug, Clone)]
pub struct ScrollClock {
    ms_per_pixel: f64,
    cell_width: f64,
    offset: f64,
}

impl ScrollClock {
    /// `window` spans `total_bars` cells of `cell_width` pixels.
    pub fn new(window: Duration, total_bars: usize, cell_width: f32) -> Self {
        let cell_width = f64::from(cell_width.max(1.0));
        let pixels = (total_bars.max(1) as f64) * cell_width;
        let ms = (window.as_secs_f64() * 1000.0).max(1.0);

        Self {
            ms_per_pixel: ms / pixels,
            cell_width,
            offset: 0.0,
        }
    }

    /// Advance by `delta`. Returns how many whole cells were crossed; the
    /// remainder stays in [`offset`](Self::offset).
    pub fn advance(&mut self, delta: Duration) -> usize {
        self.offset += (delta.as_secs_f64() * 1000.0) / self.ms_per_pixel;

        // Absorb float error so an exact multiple of the cell counts as crossed.
        let cells = (self.offset / self.cell_width + 1e-9).floor();
        self.offset = (self.offset - cells * self.cell_width).max(0.0);
        cells as usize
    }

    /// Pixels scrolled into the current cell.
    pub fn offset(&self) -> f32 {
        self.offset as f32
    }

    /// Milliseconds represented by one pixel.
    pub fn ms_per_pixel(&self) -> f64 {
        self.ms_per_pixel
    }

    /// Restart at zero offset.
    pub fn reset(&mut self) {
        self.offset = 0.0;
    }
}
