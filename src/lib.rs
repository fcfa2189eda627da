//! Render document pages into fitted RGB or BGRA buffers for live display

pub mod backend;
pub mod ffi;
pub mod panic_handler;
pub mod render;
pub mod settings;
pub mod viewer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use render::{DocumentSession, FaultKind, LayoutResult, RenderFault, Viewport};
pub use viewer::{BookView, UvScale};
