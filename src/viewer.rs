//! Texture-backed book view for hosts that draw pages on a quad
//!
//! The view owns a fixed-size BGRA texture. Each render writes the occupied
//! region at the top-left and reports the UV scale the host applies so only
//! that region is sampled.

use std::path::Path;

use log::{debug, info};

use crate::backend::{Backend, StoreLimit};
use crate::render::{
    DocumentEngine, DocumentSession, LayoutResult, PixelFormat, RenderFault, Result, Surface,
    page_fitted, two_pages_fitted,
};
use crate::settings::{self, PageLayout};

/// Fraction of the texture covered by the last render
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvScale {
    pub u: f32,
    pub v: f32,
}

impl UvScale {
    pub const FULL: Self = Self { u: 1.0, v: 1.0 };

    #[must_use]
    pub fn of(layout: LayoutResult, width: u32, height: u32) -> Self {
        let ratio = |part: u32, whole: u32| {
            if whole == 0 {
                0.0
            } else {
                part as f32 / whole as f32
            }
        };
        Self {
            u: ratio(layout.width, width),
            v: ratio(layout.height, height),
        }
    }
}

impl Default for UvScale {
    fn default() -> Self {
        Self::FULL
    }
}

pub struct BookView<E: DocumentEngine = Backend> {
    session: Option<DocumentSession<E>>,
    texture: Vec<u8>,
    width: u32,
    height: u32,
    clear_backdrop: bool,
    store_limit: StoreLimit,
    last_layout: Option<LayoutResult>,
    uv_scale: UvScale,
}

impl<E: DocumentEngine> BookView<E> {
    /// A view with a zeroed `width` x `height` BGRA texture and no document
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * PixelFormat::Bgra.bytes_per_pixel();
        Self {
            session: None,
            texture: vec![0; len],
            width,
            height,
            clear_backdrop: false,
            store_limit: StoreLimit::Unlimited,
            last_layout: None,
            uv_scale: UvScale::FULL,
        }
    }

    /// Texture size, backdrop and page store taken from the global settings
    pub fn from_settings() -> Self {
        let (width, height) = settings::get_texture_size();
        Self::new(width, height)
            .with_clear_backdrop(settings::is_clear_backdrop())
            .with_store_limit(settings::get_store_limit())
    }

    pub fn with_clear_backdrop(mut self, clear: bool) -> Self {
        self.clear_backdrop = clear;
        self
    }

    pub fn with_store_limit(mut self, limit: StoreLimit) -> Self {
        self.store_limit = limit;
        self
    }

    /// Replace the current document with an already-open session
    pub fn attach(&mut self, session: DocumentSession<E>) -> usize {
        self.close();
        let pages = session.page_count();
        self.session = Some(session);
        pages
    }

    /// Close the current document, if any
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Closing book view document");
            session.close();
        }
        self.last_layout = None;
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Pages in the open document, 0 when nothing is open
    pub fn page_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.page_count())
    }

    /// Fit `page` to the texture
    pub fn show_page(&mut self, page: usize) -> Result<UvScale> {
        self.render(|session, surface| page_fitted(session, page, surface))
    }

    /// Lay out `start` and `start + 1` side by side in the texture
    pub fn show_two_pages(&mut self, start: usize) -> Result<UvScale> {
        self.render(|session, surface| two_pages_fitted(session, start, surface))
    }

    /// Render `page` in the given layout
    pub fn show(&mut self, page: usize, layout: PageLayout) -> Result<UvScale> {
        match layout {
            PageLayout::Single => self.show_page(page),
            PageLayout::Spread => self.show_two_pages(page),
        }
    }

    fn render<F>(&mut self, draw: F) -> Result<UvScale>
    where
        F: FnOnce(&DocumentSession<E>, &mut Surface<'_>) -> Result<LayoutResult>,
    {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| RenderFault::invalid("no document open"))?;

        if self.clear_backdrop {
            self.texture.fill(0);
        }
        let mut surface =
            Surface::new(&mut self.texture, self.width, self.height, PixelFormat::Bgra)?;
        let layout = draw(session, &mut surface)?;

        self.last_layout = Some(layout);
        self.uv_scale = UvScale::of(layout, self.width, self.height);
        debug!(
            "Texture {}x{} updated: {}x{} (uv {:.3}, {:.3})",
            self.width, self.height, layout.width, layout.height, self.uv_scale.u, self.uv_scale.v
        );
        Ok(self.uv_scale)
    }

    /// BGRA texture bytes, `pitch()` bytes per row
    pub fn texture(&self) -> &[u8] {
        &self.texture
    }

    pub fn texture_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pitch(&self) -> usize {
        self.width as usize * PixelFormat::Bgra.bytes_per_pixel()
    }

    pub fn uv_scale(&self) -> UvScale {
        self.uv_scale
    }

    pub fn last_layout(&self) -> Option<LayoutResult> {
        self.last_layout
    }
}

impl BookView<Backend> {
    /// Close any open document, then open `path`
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        self.close();
        let session = DocumentSession::open_with(path, self.store_limit)?;
        info!("Book view opened {} ({} pages)", path.display(), session.page_count());
        Ok(self.attach(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FaultKind;
    use crate::test_utils::{PageSpec, SyntheticDocument};

    fn letter_view(clear_backdrop: bool) -> BookView<SyntheticDocument> {
        let doc = SyntheticDocument::new(vec![
            PageSpec::new(612.0, 792.0),
            PageSpec::new(612.0, 792.0),
            PageSpec::new(792.0, 612.0),
        ]);
        let mut view = BookView::new(800, 600).with_clear_backdrop(clear_backdrop);
        view.attach(DocumentSession::from_engine(doc).unwrap());
        view
    }

    #[test]
    fn rendering_without_document_is_invalid() {
        let mut view: BookView<SyntheticDocument> = BookView::new(16, 16);
        let err = view.show_page(0).unwrap_err();
        assert_eq!(err.kind(), FaultKind::InvalidArgument);
        assert_eq!(view.page_count(), 0);
        assert!(view.texture().iter().all(|&b| b == 0));
    }

    #[test]
    fn uv_scale_tracks_occupied_region() {
        let mut view = letter_view(false);
        assert_eq!(view.page_count(), 3);

        let uv = view.show_page(0).unwrap();
        assert_eq!(view.last_layout(), Some(LayoutResult::new(464, 600)));
        assert!((uv.u - 464.0 / 800.0).abs() < 1e-6);
        assert_eq!(uv.v, 1.0);
        assert_eq!(view.uv_scale(), uv);

        let uv = view.show(0, PageLayout::Spread).unwrap();
        assert_eq!(uv.u, 1.0);
        assert!(uv.v < 1.0);
    }

    #[test]
    fn stale_pixels_remain_without_clear_backdrop() {
        let mut view = letter_view(false);
        view.show_two_pages(0).unwrap();
        view.show_page(0).unwrap();
        // column 700 was written by the spread and not by the single page
        assert_eq!(view.texture()[700 * 4 + 3], 255);

        let mut view = letter_view(true);
        view.show_two_pages(0).unwrap();
        view.show_page(0).unwrap();
        assert_eq!(view.texture()[700 * 4 + 3], 0);
    }

    #[test]
    fn failed_render_keeps_previous_scale() {
        let mut view = letter_view(false);
        // landscape page binds on height at 777x600
        let uv = view.show_page(2).unwrap();
        assert_eq!(uv.v, 1.0);
        assert!((uv.u - 777.0 / 800.0).abs() < 1e-6);
        assert!(view.show_page(9).is_err());
        assert_eq!(view.uv_scale(), uv);
    }

    #[test]
    fn close_forgets_document() {
        let mut view = letter_view(false);
        view.close();
        assert!(!view.is_open());
        assert_eq!(view.last_layout(), None);
        assert!(view.show_page(0).is_err());
    }
}
