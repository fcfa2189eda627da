//! Owned raster produced for a single page render

use super::error::{RenderFault, Result};
use super::types::{Colorspace, PixelRect};

/// Rasterized page samples plus their layout.
///
/// Rows are `stride` bytes apart; only the first `width * n` bytes of each
/// row are pixel data, the rest is alignment padding.
pub struct Pixmap {
    rect: PixelRect,
    colorspace: Colorspace,
    alpha: bool,
    n: usize,
    stride: usize,
    samples: Vec<u8>,
}

impl Pixmap {
    /// Allocate a zeroed pixmap covering `rect`.
    ///
    /// `row_alignment` rounds the stride up to a multiple of that many bytes.
    pub fn new(
        colorspace: Colorspace,
        rect: PixelRect,
        alpha: bool,
        row_alignment: usize,
    ) -> Result<Self> {
        let n = colorspace.channels() + usize::from(alpha);
        let row_bytes = (rect.width() as usize)
            .checked_mul(n)
            .ok_or_else(|| RenderFault::raster("pixmap row size overflow"))?;
        let stride = row_bytes
            .checked_next_multiple_of(row_alignment.max(1))
            .ok_or_else(|| RenderFault::raster("pixmap stride overflow"))?;
        let len = stride
            .checked_mul(rect.height() as usize)
            .ok_or_else(|| RenderFault::raster("pixmap size overflow"))?;

        let mut samples = Vec::new();
        samples.try_reserve_exact(len).map_err(|e| {
            RenderFault::raster(format!(
                "cannot allocate {}x{} pixmap: {e}",
                rect.width(),
                rect.height()
            ))
        })?;
        samples.resize(len, 0);

        Ok(Self {
            rect,
            colorspace,
            alpha,
            n,
            stride,
            samples,
        })
    }

    /// Clear every sample to zero (transparent black when alpha is present)
    pub fn clear(&mut self) {
        self.samples.fill(0);
    }

    /// Set every color sample to `value` and alpha to opaque
    pub fn clear_with(&mut self, value: u8) {
        if !self.alpha {
            self.samples.fill(value);
            return;
        }
        let n = self.n;
        for y in 0..self.height() as usize {
            for px in self.row_mut(y).chunks_exact_mut(n) {
                let (color, alpha) = px.split_at_mut(n - 1);
                color.fill(value);
                alpha[0] = u8::MAX;
            }
        }
    }

    #[must_use]
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.rect.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.rect.height()
    }

    /// Bytes between the starts of consecutive rows
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Channels per pixel, including alpha
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    #[must_use]
    pub fn alpha(&self) -> bool {
        self.alpha
    }

    #[must_use]
    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    /// Pixel bytes of row `y`, without padding
    #[must_use]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.samples[start..start + self.row_bytes()]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.stride;
        let len = self.row_bytes();
        &mut self.samples[start..start + len]
    }

    fn row_bytes(&self) -> usize {
        self.width() as usize * self.n
    }
}

impl std::fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pixmap")
            .field("rect", &self.rect)
            .field("colorspace", &self.colorspace)
            .field("alpha", &self.alpha)
            .field("n", &self.n)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}
