//! Single-page and two-page layouts into caller-owned buffers
//!
//! Every call is self-contained: the page handle and the transient pixmap
//! live only for the duration of the call and are dropped on every exit
//! path. The destination buffer is owned by the caller and only the
//! occupied region is written.

use log::{debug, trace, warn};

use super::compositor::{Placement, Surface, composite};
use super::engine::{DocumentEngine, EnginePage};
use super::error::{RenderFault, Result};
use super::fit::fit_page;
use super::pixmap::Pixmap;
use super::raster::rasterize_page;
use super::session::DocumentSession;
use super::types::{
    Colorspace, LayoutResult, PageBounds, PageSize, PixelFormat, ScaleTransform, Viewport,
};

fn drawable_bounds(index: usize, bounds: PageBounds) -> Result<PageBounds> {
    if bounds.is_empty() {
        return Err(RenderFault::raster(format!(
            "page {index} has empty bounds {bounds:?}"
        )));
    }
    Ok(bounds)
}

fn ensure_viewport(viewport: Viewport) -> Result<()> {
    if viewport.is_empty() {
        return Err(RenderFault::invalid(format!(
            "viewport {}x{} has no area",
            viewport.width, viewport.height
        )));
    }
    Ok(())
}

/// Pixel size of a page rendered at scale 1.0.
///
/// This is the first phase of a native render: size a buffer of
/// `width * height * 3` bytes, then call [`page_native_rgb`].
pub fn page_native_size<E: DocumentEngine>(
    session: &DocumentSession<E>,
    index: usize,
) -> Result<PageSize> {
    let bounds = drawable_bounds(index, session.page_bounds(index)?)?;
    Ok(bounds.round_out().size())
}

/// Render a page at scale 1.0 as tightly packed RGB.
///
/// `out` must hold at least `width * height * 3` bytes for the size
/// [`page_native_size`] reports. Returns that size.
pub fn page_native_rgb<E: DocumentEngine>(
    session: &DocumentSession<E>,
    index: usize,
    out: &mut [u8],
) -> Result<PageSize> {
    let page = session.load_page(index)?;
    let bounds = drawable_bounds(index, page.bounds()?)?;
    let size = bounds.round_out().size();

    let mut surface = Surface::new(out, size.width, size.height, PixelFormat::Rgb)?;
    let pixmap = rasterize_page(
        &page,
        &bounds,
        ScaleTransform::IDENTITY,
        Colorspace::DeviceRgb,
        false,
        session.row_alignment(),
    )?;
    drop(page);

    let placement = Placement::origin(surface.viewport());
    composite(&pixmap, &mut surface, placement)?;
    debug!("Native render of page {index}: {}x{}", size.width, size.height);
    Ok(size)
}

/// Fit one page to the whole surface and composite it at the top-left
pub fn page_fitted<E: DocumentEngine>(
    session: &DocumentSession<E>,
    index: usize,
    surface: &mut Surface<'_>,
) -> Result<LayoutResult> {
    let viewport = surface.viewport();
    ensure_viewport(viewport)?;

    let pixmap = fitted_pixmap(session, index, viewport)?;
    let result = composite(&pixmap, surface, Placement::origin(viewport))?;

    debug!(
        "Fitted page {index} into {}x{} {}: {}x{}",
        viewport.width,
        viewport.height,
        surface.format().as_str(),
        result.width,
        result.height
    );
    Ok(result)
}

/// [`page_fitted`] into an RGB buffer of `viewport.width * viewport.height * 3` bytes
pub fn page_fitted_rgb<E: DocumentEngine>(
    session: &DocumentSession<E>,
    index: usize,
    viewport: Viewport,
    out: &mut [u8],
) -> Result<LayoutResult> {
    let mut surface = Surface::new(out, viewport.width, viewport.height, PixelFormat::Rgb)?;
    page_fitted(session, index, &mut surface)
}

/// [`page_fitted`] into a BGRA buffer of `viewport.width * viewport.height * 4` bytes
pub fn page_fitted_bgra<E: DocumentEngine>(
    session: &DocumentSession<E>,
    index: usize,
    viewport: Viewport,
    out: &mut [u8],
) -> Result<LayoutResult> {
    let mut surface = Surface::new(out, viewport.width, viewport.height, PixelFormat::Bgra)?;
    page_fitted(session, index, &mut surface)
}

/// Lay pages `start` and `start + 1` side by side.
///
/// The first page is fitted into half the surface width. The second page
/// gets whatever the first one left, so a narrow first page leaves its
/// unused half to the second rather than centering either. The result is
/// the sum of the written widths and the taller of the two heights.
///
/// A failure on either page aborts the call; pixels already written by the
/// first page stay in the buffer.
pub fn two_pages_fitted<E: DocumentEngine>(
    session: &DocumentSession<E>,
    start: usize,
    surface: &mut Surface<'_>,
) -> Result<LayoutResult> {
    let viewport = surface.viewport();
    ensure_viewport(viewport)?;

    let second = start
        .checked_add(1)
        .ok_or_else(|| RenderFault::PageIndexInvalid {
            index: start,
            count: session.page_count(),
        })?;

    let mut budget = viewport.width / 2;
    let mut left_offset = 0u32;
    let mut bottom_offset = 0u32;

    for index in [start, second] {
        let pixmap = fitted_pixmap(session, index, Viewport::new(budget, viewport.height))
            .inspect_err(|e| warn!("Two-page layout aborted at page {index}: {e}"))?;
        let written = composite(
            &pixmap,
            surface,
            Placement::at(left_offset, 0, budget, viewport.height),
        )?;
        trace!(
            "Page {index} placed at column {left_offset}: {}x{}",
            written.width, written.height
        );

        left_offset += written.width;
        bottom_offset = bottom_offset.max(written.height);
        budget = viewport.width.saturating_sub(left_offset);
    }

    debug!(
        "Fitted pages {start}-{second} into {}x{}: {left_offset}x{bottom_offset}",
        viewport.width, viewport.height
    );
    Ok(LayoutResult::new(left_offset, bottom_offset))
}

/// [`two_pages_fitted`] into a BGRA buffer of `viewport.width * viewport.height * 4` bytes
pub fn two_pages_fitted_bgra<E: DocumentEngine>(
    session: &DocumentSession<E>,
    start: usize,
    viewport: Viewport,
    out: &mut [u8],
) -> Result<LayoutResult> {
    let mut surface = Surface::new(out, viewport.width, viewport.height, PixelFormat::Bgra)?;
    two_pages_fitted(session, start, &mut surface)
}

fn fitted_pixmap<E: DocumentEngine>(
    session: &DocumentSession<E>,
    index: usize,
    viewport: Viewport,
) -> Result<Pixmap> {
    let page = session.load_page(index)?;
    let bounds = drawable_bounds(index, page.bounds()?)?;
    let fit = fit_page(&bounds, viewport);
    trace!("Page {index} fit: zoom {:.4} bound by {:?}", fit.zoom, fit.axis);

    rasterize_page(
        &page,
        &bounds,
        fit.transform(),
        Colorspace::DeviceRgb,
        false,
        session.row_alignment(),
    )
}
