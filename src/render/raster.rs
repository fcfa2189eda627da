//! Page rasterization into transient pixmaps

use log::trace;

use super::engine::{DocumentEngine, EnginePage};
use super::error::Result;
use super::pixmap::Pixmap;
use super::session::DocumentSession;
use super::types::{Colorspace, PageBounds, ScaleTransform};

/// Load a page and rasterize it under `transform`.
///
/// The page handle is released before this returns, on success and failure.
pub fn rasterize<E: DocumentEngine>(
    session: &DocumentSession<E>,
    index: usize,
    transform: ScaleTransform,
    colorspace: Colorspace,
    alpha: bool,
) -> Result<Pixmap> {
    let page = session.load_page(index)?;
    let bounds = page.bounds()?;
    rasterize_page(
        &page,
        &bounds,
        transform,
        colorspace,
        alpha,
        session.row_alignment(),
    )
}

/// Rasterize an already-loaded page whose bounds the caller has queried.
///
/// The pixmap covers the transformed bounds rounded out to whole pixels and
/// starts cleared: transparent with alpha, opaque white without. If drawing
/// fails the pixmap is dropped and the error returned.
pub fn rasterize_page<P: EnginePage>(
    page: &P,
    bounds: &PageBounds,
    transform: ScaleTransform,
    colorspace: Colorspace,
    alpha: bool,
    row_alignment: usize,
) -> Result<Pixmap> {
    let rect = bounds.transform(transform).round_out();
    let mut pixmap = Pixmap::new(colorspace, rect, alpha, row_alignment)?;

    if alpha {
        pixmap.clear();
    } else {
        pixmap.clear_with(0xFF);
    }

    page.draw(transform, &mut pixmap)?;

    trace!(
        "Rasterized {}x{} (stride {}) at {transform:?}",
        pixmap.width(),
        pixmap.height(),
        pixmap.stride()
    );
    Ok(pixmap)
}
