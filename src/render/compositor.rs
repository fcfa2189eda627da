//! Copy pixmap samples into caller-owned RGB or BGRA buffers

use super::error::{RenderFault, Result};
use super::pixmap::Pixmap;
use super::types::{LayoutResult, PixelFormat, Viewport};

/// A caller-owned destination buffer with a fixed row pitch of
/// `width * bytes_per_pixel`.
pub struct Surface<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl<'a> Surface<'a> {
    /// Wrap `data`, which must hold at least `width * height` pixels
    pub fn new(data: &'a mut [u8], width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let required = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(format.bytes_per_pixel()))
            .ok_or_else(|| RenderFault::invalid("destination size overflow"))?;
        if data.len() < required {
            return Err(RenderFault::invalid(format!(
                "destination holds {} bytes, {width}x{height} {} needs {required}",
                data.len(),
                format.as_str()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per destination row
    #[must_use]
    pub fn pitch(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Zero the whole buffer
    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

/// Where a pixmap lands in the destination and how much of it may be written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub column: u32,
    pub row: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Placement {
    /// Top-left placement clipped to `viewport`
    #[must_use]
    pub const fn origin(viewport: Viewport) -> Self {
        Self {
            column: 0,
            row: 0,
            max_width: viewport.width,
            max_height: viewport.height,
        }
    }

    #[must_use]
    pub const fn at(column: u32, row: u32, max_width: u32, max_height: u32) -> Self {
        Self {
            column,
            row,
            max_width,
            max_height,
        }
    }
}

/// Copy `pixmap` into `surface`, converting to the surface format.
///
/// Source rows are stepped by the pixmap stride. Pixels outside the written
/// region are left untouched. Returns the extent actually written, which is
/// the pixmap size clipped by the placement limits and the surface edges.
/// An extent with no pixels is reported as 0x0.
pub fn composite(
    pixmap: &Pixmap,
    surface: &mut Surface<'_>,
    placement: Placement,
) -> Result<LayoutResult> {
    let n = pixmap.n();
    if pixmap.colorspace().channels() < 3 {
        return Err(RenderFault::raster(format!(
            "cannot composite a {n}-channel pixmap, RGB required"
        )));
    }

    let cols = placement
        .max_width
        .min(pixmap.width())
        .min(surface.width.saturating_sub(placement.column));
    let rows = placement
        .max_height
        .min(pixmap.height())
        .min(surface.height.saturating_sub(placement.row));
    if cols == 0 || rows == 0 {
        return Ok(LayoutResult::new(0, 0));
    }

    let bpp = surface.format.bytes_per_pixel();
    let pitch = surface.pitch();
    let src_len = cols as usize * n;
    let dst_len = cols as usize * bpp;

    for y in 0..rows as usize {
        let src = &pixmap.row(y)[..src_len];
        let start = (placement.row as usize + y) * pitch + placement.column as usize * bpp;
        let dst = &mut surface.data[start..start + dst_len];
        match surface.format {
            PixelFormat::Rgb => copy_rgb_row(src, dst, n),
            PixelFormat::Bgra => copy_bgra_row(src, dst, n),
        }
    }

    Ok(LayoutResult::new(cols, rows))
}

fn copy_rgb_row(src: &[u8], dst: &mut [u8], n: usize) {
    if n == 3 {
        dst.copy_from_slice(src);
        return;
    }
    for (d, s) in dst.chunks_exact_mut(3).zip(src.chunks_exact(n)) {
        d.copy_from_slice(&s[..3]);
    }
}

fn copy_bgra_row(src: &[u8], dst: &mut [u8], n: usize) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(n)) {
        d[0] = s[2];
        d[1] = s[1];
        d[2] = s[0];
        d[3] = u8::MAX;
    }
}
