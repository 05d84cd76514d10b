use std::collections::VecDeque;

/// Bar count used when the geometry cannot produce one.
pub const FALLBACK_BAR_COUNT: usize = 100;

/// Number of bar cells fitting `width` pixels.
pub fn total_bars(width: f32, bar_width: f32, bar_gap: f32) -> usize {
    let cell = bar_width + bar_gap;
    if !width.is_finite() || !cell.is_finite() || width <= 0.0 || cell <= 0.0 {
        return FALLBACK_BAR_COUNT;
    }

    match (width / cell).ceil() as usize {
        0 => FALLBACK_BAR_COUNT,
        n => n,
    }
}

/// Fixed-length history of bar heights, oldest first.
#[derive(Debug, Clone)]
pub struct BarRing {
    values: VecDeque<f32>,
    len: usize,
}

impl BarRing {
    /// Ring of `len` zero bars.
    pub fn new(len: usize) -> Self {
        let len = len.max(1);
        Self {
            values: std::iter::repeat_n(0.0, len).collect(),
            len,
        }
    }

    /// Push a new bar, evicting the oldest.
    pub fn push(&mut self, value: f32) {
        if self.values.len() == self.len {
            self.values.pop_front();
        }
        self.values.push_back(value.clamp(0.0, 1.0));
    }

    /// Bars oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    /// Most recent bar.
    pub fn newest(&self) -> f32 {
        self.values.back().copied().unwrap_or(0.0)
    }

    /// Fixed length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Never true; the ring always holds `len` bars.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Zero every bar.
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }
}
