//! Image-per-page documents: comic archives (`.cbz`) and image directories
//!
//! Every decodable image entry is one page, ordered by name
//! (case-insensitive). Page units are source pixels, so the native render of
//! a page is the image at its original size.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage};
use log::{debug, trace, warn};
use lru::LruCache;
use walkdir::WalkDir;
use zip::ZipArchive;

use super::StoreLimit;
use crate::render::{
    Colorspace, DocumentEngine, EnginePage, PageBounds, Pixmap, RenderFault, Result,
    ScaleTransform,
};

// ITU-R BT.601 luma weights scaled to 256
const LUMA_R: u16 = 54;
const LUMA_G: u16 = 183;
const LUMA_B: u16 = 19;

/// Upper bound on the buffer reserved up front for an archive entry; the
/// declared size comes from the zip header and is not trusted beyond this
const MAX_ENTRY_RESERVE: u64 = 32 * 1024 * 1024;

enum PageSource {
    Zip {
        archive: RefCell<ZipArchive<BufReader<File>>>,
        entries: Vec<String>,
    },
    Directory {
        files: Vec<PathBuf>,
    },
}

/// Comic archive or image directory opened as a paged document
pub struct ArchiveDocument {
    source: PageSource,
    store: RefCell<LruCache<usize, Rc<RgbImage>>>,
}

/// A decoded page image
pub struct ArchivePage {
    index: usize,
    image: Rc<RgbImage>,
}

impl ArchiveDocument {
    /// Open a zip archive of page images
    pub fn open_archive(path: &Path, store_limit: StoreLimit) -> Result<Self> {
        let file = File::open(path).map_err(|e| RenderFault::open_failed(path, e.to_string()))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| RenderFault::open_failed(path, e.to_string()))?;

        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| RenderFault::open_failed(path, e.to_string()))?;
            if entry.is_file() && is_page_image(entry.name()) {
                entries.push(entry.name().to_string());
            }
        }
        entries.sort_by_key(|name| name.to_lowercase());

        if entries.is_empty() {
            return Err(RenderFault::open_failed(path, "archive contains no page images"));
        }
        debug!("Archive {} has {} pages", path.display(), entries.len());

        Ok(Self::with_source(
            PageSource::Zip {
                archive: RefCell::new(archive),
                entries,
            },
            store_limit,
        ))
    }

    /// Open a directory (recursively) of page images
    pub fn open_directory(path: &Path, store_limit: StoreLimit) -> Result<Self> {
        let mut files = Vec::new();
        for entry in WalkDir::new(path).min_depth(1).follow_links(true) {
            let entry = entry.map_err(|e| RenderFault::open_failed(path, e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(path) else {
                continue;
            };
            if rel.to_str().is_some_and(is_page_image) {
                files.push(entry.into_path());
            }
        }
        files.sort_by_key(|p| p.to_string_lossy().to_lowercase());

        if files.is_empty() {
            return Err(RenderFault::open_failed(
                path,
                "directory contains no page images",
            ));
        }
        debug!("Directory {} has {} pages", path.display(), files.len());

        Ok(Self::with_source(PageSource::Directory { files }, store_limit))
    }

    fn with_source(source: PageSource, store_limit: StoreLimit) -> Self {
        let store = match store_limit {
            StoreLimit::Unlimited => LruCache::unbounded(),
            StoreLimit::Pages(n) => LruCache::new(n),
        };
        Self {
            source,
            store: RefCell::new(store),
        }
    }

    fn len(&self) -> usize {
        match &self.source {
            PageSource::Zip { entries, .. } => entries.len(),
            PageSource::Directory { files } => files.len(),
        }
    }

    /// Names of the page entries, in page order
    #[must_use]
    pub fn page_names(&self) -> Vec<String> {
        match &self.source {
            PageSource::Zip { entries, .. } => entries.clone(),
            PageSource::Directory { files } => files
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }

    /// Decoded pages currently held in the store
    #[must_use]
    pub fn stored_pages(&self) -> usize {
        self.store.borrow().len()
    }

    fn decode(&self, index: usize) -> Result<RgbImage> {
        let decoded = match &self.source {
            PageSource::Zip { archive, entries } => {
                let name = &entries[index];
                let mut archive = archive.borrow_mut();
                let mut entry = archive
                    .by_name(name)
                    .map_err(|e| RenderFault::raster(format!("cannot read {name}: {e}")))?;
                let mut bytes = Vec::with_capacity(read_capacity(entry.size()));
                entry
                    .read_to_end(&mut bytes)
                    .map_err(|e| RenderFault::raster(format!("cannot read {name}: {e}")))?;
                let format = ImageFormat::from_path(name)
                    .map_err(|e| RenderFault::raster(format!("{name}: {e}")))?;
                image::load_from_memory_with_format(&bytes, format)
                    .map_err(|e| RenderFault::raster(format!("cannot decode {name}: {e}")))?
            }
            PageSource::Directory { files } => {
                let path = &files[index];
                image::open(path).map_err(|e| {
                    RenderFault::raster(format!("cannot decode {}: {e}", path.display()))
                })?
            }
        };
        Ok(decoded.to_rgb8())
    }
}

impl DocumentEngine for ArchiveDocument {
    type Page = ArchivePage;

    fn page_count(&self) -> Result<usize> {
        Ok(self.len())
    }

    fn load_page(&self, index: usize) -> Result<ArchivePage> {
        let count = self.len();
        if index >= count {
            return Err(RenderFault::PageIndexInvalid { index, count });
        }

        let stored = self.store.borrow_mut().get(&index).cloned();
        let image = match stored {
            Some(image) => image,
            None => {
                trace!("Decoding page {index}");
                let image = Rc::new(self.decode(index)?);
                self.store.borrow_mut().put(index, Rc::clone(&image));
                image
            }
        };

        Ok(ArchivePage { index, image })
    }
}

impl EnginePage for ArchivePage {
    fn bounds(&self) -> Result<PageBounds> {
        Ok(PageBounds::from_size(
            self.image.width() as f32,
            self.image.height() as f32,
        ))
    }

    fn draw(&self, transform: ScaleTransform, target: &mut Pixmap) -> Result<()> {
        let width = target.width();
        let height = target.height();
        if width == 0 || height == 0 {
            return Ok(());
        }
        if !transform.is_uniform() {
            warn!("Page {} drawn with non-uniform scale {transform:?}", self.index);
        }

        let resized;
        let source: &RgbImage = if (width, height) == self.image.dimensions() {
            &self.image
        } else {
            resized = imageops::resize(&*self.image, width, height, FilterType::Triangle);
            &resized
        };

        let colorspace = target.colorspace();
        let alpha = target.alpha();
        let n = target.n();
        let src_row_bytes = width as usize * 3;
        let raw = source.as_raw();

        for y in 0..height as usize {
            let src = &raw[y * src_row_bytes..(y + 1) * src_row_bytes];
            let dst = target.row_mut(y);
            for (d, s) in dst.chunks_exact_mut(n).zip(src.chunks_exact(3)) {
                match colorspace {
                    Colorspace::DeviceRgb => d[..3].copy_from_slice(s),
                    Colorspace::DeviceGray => {
                        let luma = (u16::from(s[0]) * LUMA_R
                            + u16::from(s[1]) * LUMA_G
                            + u16::from(s[2]) * LUMA_B)
                            >> 8;
                        d[0] = luma as u8;
                    }
                }
                if alpha {
                    d[n - 1] = u8::MAX;
                }
            }
        }
        Ok(())
    }
}

/// Image entries that this build can decode; hidden files and resource
/// forks are skipped
fn is_page_image(name: &str) -> bool {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    if file_name.starts_with('.') || name.starts_with("__MACOSX") {
        return false;
    }
    ImageFormat::from_path(name).is_ok_and(|f| f.reading_enabled())
}

fn read_capacity(declared: u64) -> usize {
    declared.min(MAX_ENTRY_RESERVE) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_image_filter() {
        assert!(is_page_image("001.png"));
        assert!(is_page_image("chapter1/Page 02.JPG"));
        assert!(!is_page_image("ComicInfo.xml"));
        assert!(!is_page_image("chapter1/.thumb.png"));
        assert!(!is_page_image("__MACOSX/chapter1/001.png"));
        assert!(!is_page_image("chapter1/"));
    }

    #[test]
    fn declared_entry_size_is_capped() {
        assert_eq!(read_capacity(4096), 4096);
        assert_eq!(read_capacity(u64::MAX), MAX_ENTRY_RESERVE as usize);
    }
}
