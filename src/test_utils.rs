//! Test fixtures: an in-memory document engine and on-disk comic archives

use std::cell::Cell;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::Path;
use std::rc::Rc;

use image::{ImageFormat, Rgb, RgbImage};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::render::{
    Colorspace, DocumentEngine, EnginePage, PageBounds, Pixmap, RenderFault, Result,
    ScaleTransform,
};

/// Shape and behavior of one synthetic page
#[derive(Clone, Copy, Debug)]
pub struct PageSpec {
    bounds: PageBounds,
    blank: bool,
    failing: bool,
}

impl PageSpec {
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_bounds(PageBounds::from_size(width, height))
    }

    pub fn with_bounds(bounds: PageBounds) -> Self {
        Self {
            bounds,
            blank: false,
            failing: false,
        }
    }

    /// Draw nothing, leaving the cleared background
    pub fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Fail every draw with `RasterizationFailed`
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

/// Shared counters for page handles handed out by a [`SyntheticDocument`]
#[derive(Clone, Debug, Default)]
pub struct Tracker {
    live: Rc<Cell<usize>>,
    loads: Rc<Cell<usize>>,
}

impl Tracker {
    /// Page handles loaded and not yet dropped
    pub fn live_pages(&self) -> usize {
        self.live.get()
    }

    /// Total successful page loads
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

/// In-memory [`DocumentEngine`].
///
/// Pages paint a pattern that identifies every pixel: R is the device x
/// coordinate, G the device y coordinate (both mod 256) and B is
/// `page index * 40`.
pub struct SyntheticDocument {
    pages: Vec<PageSpec>,
    row_alignment: usize,
    tracker: Tracker,
}

impl SyntheticDocument {
    pub fn new(pages: Vec<PageSpec>) -> Self {
        Self {
            pages,
            row_alignment: 1,
            tracker: Tracker::default(),
        }
    }

    /// Pad pixmap rows to a multiple of `bytes`
    pub fn with_row_alignment(mut self, bytes: usize) -> Self {
        self.row_alignment = bytes;
        self
    }

    pub fn tracker(&self) -> Tracker {
        self.tracker.clone()
    }
}

/// Page handle of a [`SyntheticDocument`]
pub struct SyntheticPage {
    index: usize,
    spec: PageSpec,
    tracker: Tracker,
}

impl Drop for SyntheticPage {
    fn drop(&mut self) {
        self.tracker.live.set(self.tracker.live.get() - 1);
    }
}

impl DocumentEngine for SyntheticDocument {
    type Page = SyntheticPage;

    fn page_count(&self) -> Result<usize> {
        Ok(self.pages.len())
    }

    fn load_page(&self, index: usize) -> Result<SyntheticPage> {
        let spec = *self.pages.get(index).ok_or(RenderFault::PageIndexInvalid {
            index,
            count: self.pages.len(),
        })?;
        self.tracker.live.set(self.tracker.live.get() + 1);
        self.tracker.loads.set(self.tracker.loads.get() + 1);
        Ok(SyntheticPage {
            index,
            spec,
            tracker: self.tracker.clone(),
        })
    }

    fn row_alignment(&self) -> usize {
        self.row_alignment
    }
}

impl EnginePage for SyntheticPage {
    fn bounds(&self) -> Result<PageBounds> {
        Ok(self.spec.bounds)
    }

    fn draw(&self, _transform: ScaleTransform, target: &mut Pixmap) -> Result<()> {
        if self.spec.failing {
            return Err(RenderFault::raster(format!(
                "synthetic draw failure on page {}",
                self.index
            )));
        }
        if self.spec.blank {
            return Ok(());
        }

        let n = target.n();
        let alpha = target.alpha();
        let colorspace = target.colorspace();
        let blue = (self.index as u8).wrapping_mul(40);
        for y in 0..target.height() as usize {
            for (x, px) in target.row_mut(y).chunks_exact_mut(n).enumerate() {
                match colorspace {
                    Colorspace::DeviceRgb => {
                        px[0] = x as u8;
                        px[1] = y as u8;
                        px[2] = blue;
                    }
                    Colorspace::DeviceGray => px[0] = x as u8,
                }
                if alpha {
                    px[n - 1] = u8::MAX;
                }
            }
        }
        Ok(())
    }
}

/// Solid-color page image
pub fn solid_page(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

fn encode_png(image: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Write a comic archive with one PNG entry per `(name, image)` pair
pub fn write_comic_archive(path: &Path, pages: &[(&str, RgbImage)]) -> anyhow::Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, image) in pages {
        zip.start_file(*name, options)?;
        zip.write_all(&encode_png(image)?)?;
    }
    zip.finish()?;
    Ok(())
}

/// Write each `(relative path, image)` pair as a PNG under `dir`
pub fn write_image_directory(dir: &Path, pages: &[(&str, RgbImage)]) -> anyhow::Result<()> {
    for (name, image) in pages {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, encode_png(image)?)?;
    }
    Ok(())
}
