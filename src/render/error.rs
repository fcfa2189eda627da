//! Render faults

use std::path::{Path, PathBuf};

/// Result alias used across the rendering pipeline
pub type Result<T> = std::result::Result<T, RenderFault>;

/// Coarse category of a [`RenderFault`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    SessionOpenFailed,
    PageIndexInvalid,
    RasterizationFailed,
    InvalidArgument,
}

/// Errors raised while opening documents or rendering pages
#[derive(Debug, thiserror::Error)]
pub enum RenderFault {
    #[error("cannot open {}: {detail}", path.display())]
    SessionOpenFailed { path: PathBuf, detail: String },

    #[error("page {index} out of range (document has {count} pages)")]
    PageIndexInvalid { index: usize, count: usize },

    #[error("rasterization failed: {detail}")]
    RasterizationFailed { detail: String },

    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },

    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),
}

impl RenderFault {
    pub fn open_failed(path: &Path, detail: impl Into<String>) -> Self {
        Self::SessionOpenFailed {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }

    pub fn raster(detail: impl Into<String>) -> Self {
        Self::RasterizationFailed {
            detail: detail.into(),
        }
    }

    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidArgument {
            detail: detail.into(),
        }
    }

    /// Collapse the fault into its taxonomy bucket.
    ///
    /// Engine errors that were not classified at the call site count as
    /// rasterization failures.
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::SessionOpenFailed { .. } => FaultKind::SessionOpenFailed,
            Self::PageIndexInvalid { .. } => FaultKind::PageIndexInvalid,
            Self::RasterizationFailed { .. } => FaultKind::RasterizationFailed,
            Self::InvalidArgument { .. } => FaultKind::InvalidArgument,
            #[cfg(feature = "pdf")]
            Self::Pdf(_) => FaultKind::RasterizationFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_detail() {
        let err = RenderFault::open_failed(Path::new("/tmp/missing.cbz"), "no such file");
        assert_eq!(err.kind(), FaultKind::SessionOpenFailed);
        assert!(err.to_string().contains("/tmp/missing.cbz"));
        assert!(err.to_string().contains("no such file"));

        let err = RenderFault::PageIndexInvalid { index: 7, count: 3 };
        assert_eq!(err.to_string(), "page 7 out of range (document has 3 pages)");
    }

    #[test]
    fn constructors_map_to_kinds() {
        assert_eq!(
            RenderFault::raster("device lost").kind(),
            FaultKind::RasterizationFailed
        );
        assert_eq!(
            RenderFault::invalid("null buffer").kind(),
            FaultKind::InvalidArgument
        );
    }
}
