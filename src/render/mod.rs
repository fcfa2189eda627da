//! Page rendering: sessions, fit scaling, rasterization and compositing

mod compositor;
mod engine;
mod error;
mod fit;
pub mod layout;
mod pixmap;
mod raster;
mod session;
mod types;

pub use compositor::{Placement, Surface, composite};
pub use engine::{DocumentEngine, EnginePage};
pub use error::{FaultKind, RenderFault, Result};
pub use fit::{Fit, FitAxis, fit_page, fit_transform};
pub use layout::{
    page_fitted, page_fitted_bgra, page_fitted_rgb, page_native_rgb, page_native_size,
    two_pages_fitted, two_pages_fitted_bgra,
};
pub use pixmap::Pixmap;
pub use raster::{rasterize, rasterize_page};
pub use session::DocumentSession;
pub use types::*;
