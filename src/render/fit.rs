//! Fit-to-viewport scaling
//!
//! Pages are fitted by width first; when the resulting height would overflow
//! the viewport, height becomes the binding constraint. The spare space
//! therefore lands either to the right or below the page, never both.

use super::types::{PageBounds, ScaleTransform, Viewport};

/// Which viewport dimension limited the zoom
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitAxis {
    Width,
    Height,
}

/// Uniform zoom chosen for a page, and the axis that bound it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fit {
    pub zoom: f32,
    pub axis: FitAxis,
}

impl Fit {
    #[must_use]
    pub fn transform(&self) -> ScaleTransform {
        ScaleTransform::uniform(self.zoom)
    }
}

/// Compute the uniform zoom that fits `bounds` inside `viewport`.
///
/// Callers reject empty bounds first; a zero-width viewport yields a zero
/// zoom.
#[must_use]
pub fn fit_page(bounds: &PageBounds, viewport: Viewport) -> Fit {
    let page_width = bounds.width();
    let page_height = bounds.height();
    let avail_width = viewport.width as f32;
    let avail_height = viewport.height as f32;

    let zoom = avail_width / page_width;
    if page_height * zoom > avail_height {
        Fit {
            zoom: avail_height / page_height,
            axis: FitAxis::Height,
        }
    } else {
        Fit {
            zoom,
            axis: FitAxis::Width,
        }
    }
}

/// Shorthand for [`fit_page`] when only the transform is needed
#[must_use]
pub fn fit_transform(bounds: &PageBounds, viewport: Viewport) -> ScaleTransform {
    fit_page(bounds, viewport).transform()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: PageBounds = PageBounds::from_size(612.0, 792.0);

    fn fitted_size(bounds: &PageBounds, viewport: Viewport) -> (u32, u32) {
        let rect = bounds.transform(fit_transform(bounds, viewport)).round_out();
        (rect.width(), rect.height())
    }

    #[test]
    fn letter_page_in_landscape_viewport_binds_on_height() {
        let fit = fit_page(&LETTER, Viewport::new(800, 600));
        assert_eq!(fit.axis, FitAxis::Height);
        assert!((fit.zoom - 600.0 / 792.0).abs() < 1e-6);
        assert_eq!(fitted_size(&LETTER, Viewport::new(800, 600)), (464, 600));
    }

    #[test]
    fn letter_page_in_half_budget_binds_on_width() {
        let fit = fit_page(&LETTER, Viewport::new(400, 600));
        assert_eq!(fit.axis, FitAxis::Width);
        assert!((fit.zoom - 400.0 / 612.0).abs() < 1e-6);
        let (w, h) = fitted_size(&LETTER, Viewport::new(400, 600));
        assert_eq!(w, 400);
        assert!((518..=519).contains(&h), "height {h}");
    }

    #[test]
    fn fitted_size_never_exceeds_viewport_and_touches_one_edge() {
        let pages = [
            PageBounds::from_size(612.0, 792.0),
            PageBounds::from_size(1224.0, 792.0),
            PageBounds::from_size(100.0, 1000.0),
            PageBounds::from_size(300.0, 200.0),
        ];
        let viewports = [
            Viewport::new(1024, 1024),
            Viewport::new(800, 600),
            Viewport::new(333, 1000),
            Viewport::new(1920, 200),
        ];

        for page in &pages {
            for &viewport in &viewports {
                let (w, h) = fitted_size(page, viewport);
                assert!(w <= viewport.width && h <= viewport.height, "{page:?} {viewport:?}");
                assert!(
                    w == viewport.width || h == viewport.height,
                    "{page:?} in {viewport:?} gave {w}x{h}"
                );

                let page_ratio = page.width() / page.height();
                let out_ratio = w as f32 / h as f32;
                assert!(
                    (out_ratio / page_ratio - 1.0).abs() < 0.01,
                    "aspect drift for {page:?} in {viewport:?}"
                );
            }
        }
    }

    #[test]
    fn exact_fit_keeps_native_size() {
        let fit = fit_page(&LETTER, Viewport::new(612, 792));
        assert_eq!(fit.zoom, 1.0);
        assert_eq!(fitted_size(&LETTER, Viewport::new(612, 792)), (612, 792));
    }

    #[test]
    fn zero_width_viewport_collapses() {
        assert_eq!(fit_page(&LETTER, Viewport::new(0, 600)).zoom, 0.0);
    }
}
