use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().strip_prefix('#').unwrap_or(text.trim());
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Some(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
    }

    /// Format as `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// A 2D drawing surface addressed in CSS pixels.
///
/// Implementations map CSS pixels to device pixels using the ratio given
/// to [`resize`](Surface::resize).
pub trait Surface: Send + 'static {
    /// Set the logical size and device-pixel ratio.
    fn resize(&mut self, css_width: f32, css_height: f32, device_pixel_ratio: f32);

    /// Logical `(width, height)`.
    fn css_size(&self) -> (f32, f32);

    /// Clear every pixel.
    fn clear(&mut self);

    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba);

    /// Stroke a polyline.
    fn stroke_line(&mut self, points: &[(f32, f32)], width: f32, color: Rgba);
}

/// In-memory RGBA pixel grid.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    css_width: f32,
    css_height: f32,
    ratio: f32,
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl PixelCanvas {
    /// Canvas of the given logical size.
    pub fn new(css_width: f32, css_height: f32, device_pixel_ratio: f32) -> Self {
        let mut canvas = Self {
            css_width: 0.0,
            css_height: 0.0,
            ratio: 1.0,
            width: 0,
            height: 0,
            pixels: Vec::new(),
        };
        canvas.resize(css_width, css_height, device_pixel_ratio);
        canvas
    }

    /// Backing width in device pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Backing height in device pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Device-pixel ratio in effect.
    pub fn device_pixel_ratio(&self) -> f32 {
        self.ratio
    }

    /// Colour of a device pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Number of pixels that are not transparent.
    pub fn painted_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p.0[3] != 0).count()
    }

    /// Row-major RGBA bytes.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.0).collect()
    }

    fn put(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn fill_device(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba) {
        let left = x0.floor().max(0.0) as i64;
        let top = y0.floor().max(0.0) as i64;
        let right = x1.ceil().min(self.width as f32) as i64;
        let bottom = y1.ceil().min(self.height as f32) as i64;

        for y in top..bottom {
            for x in left..right {
                self.put(x, y, color);
            }
        }
    }
}

impl Surface for PixelCanvas {
    fn resize(&mut self, css_width: f32, css_height: f32, device_pixel_ratio: f32) {
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let css_width = if css_width.is_finite() { css_width.max(1.0) } else { 1.0 };
        let css_height = if css_height.is_finite() { css_height.max(1.0) } else { 1.0 };

        self.css_width = css_width;
        self.css_height = css_height;
        self.ratio = ratio;
        self.width = (css_width * ratio).round().max(1.0) as u32;
        self.height = (css_height * ratio).round().max(1.0) as u32;
        self.pixels = vec![Rgba::TRANSPARENT; (self.width as usize) * (self.height as usize)];
    }

    fn css_size(&self) -> (f32, f32) {
        (self.css_width, self.css_height)
    }

    fn clear(&mut self) {
        self.pixels.fill(Rgba::TRANSPARENT);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let r = self.ratio;
        self.fill_device(x * r, y * r, (x + width) * r, (y + height) * r, color);
    }

    fn stroke_line(&mut self, points: &[(f32, f32)], width: f32, color: Rgba) {
        let r = self.ratio;
        let half = (width * r / 2.0).max(0.5);

        for pair in points.windows(2) {
            let (ax, ay) = (pair[0].0 * r, pair[0].1 * r);
            let (bx, by) = (pair[1].0 * r, pair[1].1 * r);
            let steps = (bx - ax).abs().max((by - ay).abs()).ceil().max(1.0) as usize;

            for step in 0..=steps {
                let t = step as f32 / steps as f32;
                let (x, y) = (ax + (bx - ax) * t, ay + (by - ay) * t);
                self.fill_device(x - half, y - half, x + half, y + half, color);
            }
        }
    }
}

/// A canvas shared between the renderer and whoever reads it back.
#[derive(Debug, Clone)]
pub struct SharedCanvas {
    inner: Arc<Mutex<PixelCanvas>>,
}

impl SharedCanvas {
    /// Wrap a fresh canvas.
    pub fn new(css_width: f32, css_height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PixelCanvas::new(
                css_width,
                css_height,
                device_pixel_ratio,
            ))),
        }
    }

    /// Copy of the current pixels.
    pub fn snapshot(&self) -> PixelCanvas {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, PixelCanvas> {
        self.inner.lock().unwrap_or_else(|e| {
            warn!("Canvas mutex was poisoned, recovering");
            e.into_inner()
        })
    }
}

impl Surface for SharedCanvas {
    fn resize(&mut self, css_width: f32, css_height: f32, device_pixel_ratio: f32) {
        self.lock().resize(css_width, css_height, device_pixel_ratio);
    }

    fn css_size(&self) -> (f32, f32) {
        self.lock().css_size()
    }

    fn clear(&mut self) {
        self.lock().clear();
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        self.lock().fill_rect(x, y, width, height, color);
    }

    fn stroke_line(&mut self, points: &[(f32, f32)], width: f32, color: Rgba) {
        self.lock().stroke_line(points, width, color);
    }
}
