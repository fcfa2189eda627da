//! MuPDF-backed documents (PDF, XPS, EPUB, FB2, MOBI, SVG)

use std::path::Path;

use log::debug;
use mupdf::{Colorspace as FzColorspace, Document, Matrix, Page};

use crate::render::{
    Colorspace, DocumentEngine, EnginePage, PageBounds, Pixmap, RenderFault, Result,
    ScaleTransform,
};

/// A document opened through MuPDF
pub struct PdfDocument {
    doc: Document,
    page_count: usize,
}

/// A loaded MuPDF page; dropping it releases the page
pub struct PdfPage {
    page: Page,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let doc = Document::open(path.to_string_lossy().as_ref())
            .map_err(|e| RenderFault::open_failed(path, e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| RenderFault::open_failed(path, e.to_string()))?;
        debug!("MuPDF opened {} ({page_count} pages)", path.display());

        Ok(Self {
            doc,
            page_count: page_count.max(0) as usize,
        })
    }
}

impl DocumentEngine for PdfDocument {
    type Page = PdfPage;

    fn page_count(&self) -> Result<usize> {
        Ok(self.page_count)
    }

    fn load_page(&self, index: usize) -> Result<PdfPage> {
        if index >= self.page_count {
            return Err(RenderFault::PageIndexInvalid {
                index,
                count: self.page_count,
            });
        }
        let page = self.doc.load_page(index as i32)?;
        Ok(PdfPage { page })
    }
}

impl EnginePage for PdfPage {
    fn bounds(&self) -> Result<PageBounds> {
        let r = self.page.bounds()?;
        Ok(PageBounds::new(r.x0, r.y0, r.x1, r.y1))
    }

    fn draw(&self, transform: ScaleTransform, target: &mut Pixmap) -> Result<()> {
        let cs = match target.colorspace() {
            Colorspace::DeviceRgb => FzColorspace::device_rgb(),
            Colorspace::DeviceGray => FzColorspace::device_gray(),
        };
        let matrix = Matrix::new_scale(transform.sx, transform.sy);
        let pixmap = self
            .page
            .to_pixmap(&matrix, &cs, target.alpha(), false)
            .map_err(|e| RenderFault::raster(e.to_string()))?;

        let n = pixmap.n() as usize;
        if n != target.n() {
            return Err(RenderFault::raster(format!(
                "engine produced {n} channels, expected {}",
                target.n()
            )));
        }

        // MuPDF rows may be padded past width * n
        let stride = pixmap.stride() as usize;
        let row_bytes = pixmap.width().min(target.width()) as usize * n;
        let rows = pixmap.height().min(target.height()) as usize;
        let samples = pixmap.samples();
        if row_bytes > stride || samples.len() < stride.saturating_mul(rows) {
            return Err(RenderFault::raster("pixmap buffer size mismatch"));
        }

        for y in 0..rows {
            let start = y * stride;
            target.row_mut(y)[..row_bytes].copy_from_slice(&samples[start..start + row_bytes]);
        }
        Ok(())
    }
}
