//! Open document sessions

use std::path::Path;

use log::{debug, info, warn};

use crate::backend::{Backend, RenderContext, StoreLimit};

use super::engine::{DocumentEngine, EnginePage};
use super::error::{FaultKind, RenderFault, Result};
use super::types::PageBounds;

/// An open document plus the context it was opened with.
///
/// The session is the handle threaded through every render call. It is not
/// `Sync`: callers serialize access to one session.
pub struct DocumentSession<E: DocumentEngine = Backend> {
    // Field order is drop order: the document goes before its context.
    document: E,
    context: RenderContext,
    page_count: usize,
}

impl DocumentSession<Backend> {
    /// Open a document with an unbounded decode store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, StoreLimit::Unlimited)
    }

    /// Open a document, choosing the backend from the registered handlers
    pub fn open_with(path: impl AsRef<Path>, store_limit: StoreLimit) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening document: {}", path.display());

        let mut context = RenderContext::new(store_limit);
        context.register_document_handlers();

        let document = context.open_document(path).inspect_err(|e| {
            warn!("Failed to open {}: {e}", path.display());
        })?;

        Self::assemble(document, context).map_err(|e| match e.kind() {
            FaultKind::SessionOpenFailed => e,
            _ => RenderFault::open_failed(path, e.to_string()),
        })
    }
}

impl<E: DocumentEngine> DocumentSession<E> {
    /// Wrap an already-open engine document
    pub fn from_engine(document: E) -> Result<Self> {
        Self::assemble(document, RenderContext::new(StoreLimit::Unlimited))
    }

    fn assemble(document: E, context: RenderContext) -> Result<Self> {
        let page_count = document.page_count()?;
        info!("Document session ready: {page_count} pages");
        Ok(Self {
            document,
            context,
            page_count,
        })
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Bounds of a page, queried fresh from the engine
    pub fn page_bounds(&self, index: usize) -> Result<PageBounds> {
        let page = self.document.load_page(index)?;
        page.bounds()
    }

    /// Load a page handle; it is released when dropped
    pub fn load_page(&self, index: usize) -> Result<E::Page> {
        self.document.load_page(index)
    }

    #[must_use]
    pub fn row_alignment(&self) -> usize {
        self.document.row_alignment()
    }

    #[must_use]
    pub fn document(&self) -> &E {
        &self.document
    }

    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Release the document, then its context
    pub fn close(self) {
        drop(self);
    }
}

impl<E: DocumentEngine> Drop for DocumentSession<E> {
    fn drop(&mut self) {
        debug!("Closing document session ({} pages)", self.page_count);
    }
}
