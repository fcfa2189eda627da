//! Core geometry and buffer types for page rendering

use serde::{Deserialize, Serialize};

/// Inward nudge applied before rounding a transformed page rectangle to
/// pixels, so float noise on an edge never grows the pixmap by one pixel.
const ROUNDING_EPSILON: f32 = 0.001;

/// Page rectangle in page-space units (1/72 inch for PDF, pixels for images)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageBounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageBounds {
    #[must_use]
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Bounds anchored at the origin
    #[must_use]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// True when the rectangle has no area (also true for NaN edges)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.x1 > self.x0 && self.y1 > self.y0)
    }

    /// Apply a scale transform, keeping the rectangle normalized
    #[must_use]
    pub fn transform(&self, t: ScaleTransform) -> Self {
        let (ax, bx) = (self.x0 * t.sx, self.x1 * t.sx);
        let (ay, by) = (self.y0 * t.sy, self.y1 * t.sy);
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    /// Round outwards to whole pixels, ignoring sub-epsilon overhang
    #[must_use]
    pub fn round_out(&self) -> PixelRect {
        // float -> int `as` casts saturate, which is the clamping we want
        let x0 = (self.x0 + ROUNDING_EPSILON).floor() as i32;
        let y0 = (self.y0 + ROUNDING_EPSILON).floor() as i32;
        let x1 = (self.x1 - ROUNDING_EPSILON).ceil() as i32;
        let y1 = (self.y1 - ROUNDING_EPSILON).ceil() as i32;
        PixelRect {
            x0,
            y0,
            x1: x1.max(x0),
            y1: y1.max(y0),
        }
    }
}

/// Integer pixel rectangle, as produced by rounding transformed page bounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0).max(0) as u32
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0).max(0) as u32
    }

    #[must_use]
    pub fn size(&self) -> PageSize {
        PageSize::new(self.width(), self.height())
    }
}

/// Scale factors applied to page-space coordinates before rasterization
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleTransform {
    pub sx: f32,
    pub sy: f32,
}

impl ScaleTransform {
    /// Native size: one page unit per pixel
    pub const IDENTITY: Self = Self { sx: 1.0, sy: 1.0 };

    #[must_use]
    pub const fn new(sx: f32, sy: f32) -> Self {
        Self { sx, sy }
    }

    #[must_use]
    pub const fn uniform(zoom: f32) -> Self {
        Self { sx: zoom, sy: zoom }
    }

    #[must_use]
    pub fn is_uniform(&self) -> bool {
        (self.sx - self.sy).abs() <= f32::EPSILON
    }
}

impl Default for ScaleTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Caller-supplied upper bounds for one rendering region, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Pixel dimensions of a page render
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl PageSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes needed for a tightly packed buffer in the given format
    #[must_use]
    pub fn byte_len(&self, format: PixelFormat) -> usize {
        self.width as usize * self.height as usize * format.bytes_per_pixel()
    }
}

/// Sub-rectangle of the destination buffer (anchored at 0,0) that a
/// layout actually wrote
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutResult {
    pub width: u32,
    pub height: u32,
}

impl LayoutResult {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn fits(&self, viewport: Viewport) -> bool {
        self.width <= viewport.width && self.height <= viewport.height
    }
}

/// Byte layout of a destination buffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Three bytes per pixel: R, G, B
    Rgb,
    /// Four bytes per pixel: B, G, R, A (alpha always 255)
    #[default]
    Bgra,
}

impl PixelFormat {
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Bgra => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::Bgra => "bgra",
        }
    }
}

/// Colorspace requested from the rasterizer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Colorspace {
    DeviceGray,
    #[default]
    DeviceRgb,
}

impl Colorspace {
    /// Color channels, not counting alpha
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::DeviceGray => 1,
            Self::DeviceRgb => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_out_ignores_float_noise() {
        // 612 * (800 / 612) lands a hair above 800 in f32
        let zoom = 800.0_f32 / 612.0;
        let rect = PageBounds::from_size(612.0, 792.0)
            .transform(ScaleTransform::uniform(zoom))
            .round_out();
        assert_eq!(rect.width(), 800);
        assert_eq!(rect.height(), 1036);
    }

    #[test]
    fn round_out_grows_partial_pixels() {
        let rect = PageBounds::new(0.4, 0.0, 10.2, 5.5).round_out();
        assert_eq!(rect, PixelRect { x0: 0, y0: 0, x1: 11, y1: 6 });
    }

    #[test]
    fn transform_normalizes_negative_scale() {
        let b = PageBounds::from_size(10.0, 20.0).transform(ScaleTransform::new(-1.0, 2.0));
        assert_eq!(b, PageBounds::new(-10.0, 0.0, 0.0, 40.0));
        assert!(!ScaleTransform::new(-1.0, 2.0).is_uniform());
    }

    #[test]
    fn empty_bounds_detected() {
        assert!(PageBounds::from_size(0.0, 10.0).is_empty());
        assert!(PageBounds::new(0.0, 0.0, f32::NAN, 1.0).is_empty());
        assert!(!PageBounds::from_size(1.0, 1.0).is_empty());
    }

    #[test]
    fn buffer_sizes_follow_format() {
        let size = PageSize::new(10, 4);
        assert_eq!(size.byte_len(PixelFormat::Rgb), 120);
        assert_eq!(size.byte_len(PixelFormat::Bgra), 160);
    }
}
