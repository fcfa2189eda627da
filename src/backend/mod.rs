//! Document backends and the handler registry that picks between them

pub mod archive;
#[cfg(feature = "pdf")]
pub mod pdf;

use std::num::NonZeroUsize;
use std::path::Path;

use log::debug;

use crate::render::{
    DocumentEngine, EnginePage, PageBounds, Pixmap, RenderFault, Result, ScaleTransform,
};

use archive::{ArchiveDocument, ArchivePage};

/// Upper bound on decoded pages kept by a session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreLimit {
    #[default]
    Unlimited,
    Pages(NonZeroUsize),
}

impl StoreLimit {
    /// `0` means unlimited
    #[must_use]
    pub fn from_pages(pages: usize) -> Self {
        NonZeroUsize::new(pages).map_or(Self::Unlimited, Self::Pages)
    }
}

/// Document families a session can open
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Zip archive of page images (`.cbz`)
    ComicArchive,
    /// Directory of page images
    ImageDirectory,
    /// Anything MuPDF understands
    #[cfg(feature = "pdf")]
    Fitz,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComicArchive => "comic archive",
            Self::ImageDirectory => "image directory",
            #[cfg(feature = "pdf")]
            Self::Fitz => "fitz document",
        }
    }
}

#[derive(Clone, Debug)]
struct Handler {
    format: DocumentFormat,
    extensions: &'static [&'static str],
}

/// Per-session rendering context: registered document handlers and the
/// decode store limit handed to opened documents.
#[derive(Clone, Debug)]
pub struct RenderContext {
    handlers: Vec<Handler>,
    store_limit: StoreLimit,
}

impl RenderContext {
    /// A context with no handlers registered yet
    #[must_use]
    pub fn new(store_limit: StoreLimit) -> Self {
        Self {
            handlers: Vec::new(),
            store_limit,
        }
    }

    /// Register every document type this build supports.
    ///
    /// Earlier registrations win when extensions overlap.
    pub fn register_document_handlers(&mut self) {
        self.register(DocumentFormat::ComicArchive, &["cbz", "zip"]);
        self.register(DocumentFormat::ImageDirectory, &[]);
        #[cfg(feature = "pdf")]
        self.register(
            DocumentFormat::Fitz,
            &["pdf", "xps", "oxps", "epub", "fb2", "mobi", "svg"],
        );
    }

    pub fn register(&mut self, format: DocumentFormat, extensions: &'static [&'static str]) {
        debug!("Registering {} handler for {extensions:?}", format.as_str());
        self.handlers.push(Handler { format, extensions });
    }

    pub fn formats(&self) -> impl Iterator<Item = DocumentFormat> + '_ {
        self.handlers.iter().map(|h| h.format)
    }

    #[must_use]
    pub fn store_limit(&self) -> StoreLimit {
        self.store_limit
    }

    /// Pick the handler for `path`: directories go to the image-directory
    /// handler, files are matched on their lowercased extension.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> Option<DocumentFormat> {
        if path.is_dir() {
            return self
                .formats()
                .find(|&f| f == DocumentFormat::ImageDirectory);
        }

        let extension = path.extension()?.to_str()?.to_lowercase();
        self.handlers
            .iter()
            .find(|h| h.extensions.contains(&extension.as_str()))
            .map(|h| h.format)
    }

    /// Open `path` with the first matching handler
    pub fn open_document(&self, path: &Path) -> Result<Backend> {
        let format = self
            .resolve(path)
            .ok_or_else(|| RenderFault::open_failed(path, "unsupported document format"))?;
        debug!("Opening {} as {}", path.display(), format.as_str());

        match format {
            DocumentFormat::ComicArchive => {
                ArchiveDocument::open_archive(path, self.store_limit).map(Backend::Archive)
            }
            DocumentFormat::ImageDirectory => {
                ArchiveDocument::open_directory(path, self.store_limit).map(Backend::Archive)
            }
            #[cfg(feature = "pdf")]
            DocumentFormat::Fitz => pdf::PdfDocument::open(path).map(Backend::Pdf),
        }
    }
}

/// Any document a [`RenderContext`] can open
pub enum Backend {
    Archive(ArchiveDocument),
    #[cfg(feature = "pdf")]
    Pdf(pdf::PdfDocument),
}

/// Page handle of a [`Backend`] document
pub enum BackendPage {
    Archive(ArchivePage),
    #[cfg(feature = "pdf")]
    Pdf(pdf::PdfPage),
}

impl Backend {
    /// The archive document, when this is one
    #[must_use]
    pub fn as_archive(&self) -> Option<&ArchiveDocument> {
        match self {
            Self::Archive(doc) => Some(doc),
            #[cfg(feature = "pdf")]
            Self::Pdf(_) => None,
        }
    }
}

impl DocumentEngine for Backend {
    type Page = BackendPage;

    fn page_count(&self) -> Result<usize> {
        match self {
            Self::Archive(doc) => doc.page_count(),
            #[cfg(feature = "pdf")]
            Self::Pdf(doc) => doc.page_count(),
        }
    }

    fn load_page(&self, index: usize) -> Result<BackendPage> {
        match self {
            Self::Archive(doc) => doc.load_page(index).map(BackendPage::Archive),
            #[cfg(feature = "pdf")]
            Self::Pdf(doc) => doc.load_page(index).map(BackendPage::Pdf),
        }
    }

    fn row_alignment(&self) -> usize {
        match self {
            Self::Archive(doc) => doc.row_alignment(),
            #[cfg(feature = "pdf")]
            Self::Pdf(doc) => doc.row_alignment(),
        }
    }
}

impl EnginePage for BackendPage {
    fn bounds(&self) -> Result<PageBounds> {
        match self {
            Self::Archive(page) => page.bounds(),
            #[cfg(feature = "pdf")]
            Self::Pdf(page) => page.bounds(),
        }
    }

    fn draw(&self, transform: ScaleTransform, target: &mut Pixmap) -> Result<()> {
        match self {
            Self::Archive(page) => page.draw(transform, target),
            #[cfg(feature = "pdf")]
            Self::Pdf(page) => page.draw(transform, target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RenderContext {
        let mut ctx = RenderContext::new(StoreLimit::default());
        ctx.register_document_handlers();
        ctx
    }

    #[test]
    fn resolve_by_extension_is_case_insensitive() {
        let ctx = context();
        assert_eq!(
            ctx.resolve(Path::new("Volume 01.CBZ")),
            Some(DocumentFormat::ComicArchive)
        );
        assert_eq!(ctx.resolve(Path::new("notes.txt")), None);
        assert_eq!(ctx.resolve(Path::new("no_extension")), None);
    }

    #[test]
    fn directories_resolve_to_image_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            context().resolve(dir.path()),
            Some(DocumentFormat::ImageDirectory)
        );
    }

    #[test]
    fn empty_context_opens_nothing() {
        let ctx = RenderContext::new(StoreLimit::Unlimited);
        assert_eq!(ctx.resolve(Path::new("book.cbz")), None);
        let err = ctx.open_document(Path::new("book.cbz")).err().unwrap();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn store_limit_zero_is_unlimited() {
        assert_eq!(StoreLimit::from_pages(0), StoreLimit::Unlimited);
        assert_eq!(
            StoreLimit::from_pages(4),
            StoreLimit::Pages(NonZeroUsize::new(4).unwrap())
        );
    }
}
