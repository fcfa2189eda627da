//! Seam between the layout pipeline and a document engine

use super::error::Result;
use super::pixmap::Pixmap;
use super::types::{PageBounds, ScaleTransform};

/// An open document that can hand out pages.
pub trait DocumentEngine {
    /// Loaded page handle; the page is released when the value drops
    type Page: EnginePage;

    fn page_count(&self) -> Result<usize>;

    /// Load the 0-indexed page, reporting `PageIndexInvalid` when out of range
    fn load_page(&self, index: usize) -> Result<Self::Page>;

    /// Byte multiple that pixmap rows are padded to for this engine
    fn row_alignment(&self) -> usize {
        1
    }
}

/// A single loaded page.
pub trait EnginePage {
    /// Natural page rectangle in page units
    fn bounds(&self) -> Result<PageBounds>;

    /// Draw the page into `target`, which is already sized to the
    /// transformed bounds and cleared
    fn draw(&self, transform: ScaleTransform, target: &mut Pixmap) -> Result<()>;
}
