//! C ABI over [`DocumentSession`] and the layout functions.
//!
//! Every function returns `1` on success and `0` on failure, and writes its
//! out-parameters only on success. Faults are logged before being reduced to
//! `0`; panics are caught here and never unwind into the caller.
//!
//! # Safety
//!
//! Pointers must be null or valid for the access described on each
//! function. Calls against one session must not overlap.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use log::{error, warn};

use crate::panic_handler::panic_message;
use crate::render::{
    DocumentSession, LayoutResult, PixelFormat, RenderFault, Result, Viewport, page_fitted_bgra,
    page_fitted_rgb, page_native_rgb, page_native_size, two_pages_fitted_bgra,
};
use crate::settings;

/// Opaque session handle handed to C callers
pub struct PagefitSession {
    session: DocumentSession,
}

fn guarded(op: &str, f: impl FnOnce() -> Result<()>) -> c_int {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => 1,
        Ok(Err(e)) => {
            warn!("{op} failed: {e}");
            0
        }
        Err(payload) => {
            error!("{op} panicked: {}", panic_message(&*payload));
            0
        }
    }
}

/// # Safety
/// `session` must be null or a live handle from [`pagefit_create`].
unsafe fn session_ref<'a>(session: *const PagefitSession) -> Result<&'a DocumentSession> {
    // SAFETY: caller guarantees the pointer is null or live
    unsafe { session.as_ref() }
        .map(|s| &s.session)
        .ok_or_else(|| RenderFault::invalid("null session"))
}

fn to_index(page: c_int) -> Result<usize> {
    usize::try_from(page).map_err(|_| RenderFault::invalid(format!("negative page index {page}")))
}

fn to_viewport(width: c_int, height: c_int) -> Result<Viewport> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok(Viewport::new(w, h)),
        _ => Err(RenderFault::invalid(format!(
            "negative viewport {width}x{height}"
        ))),
    }
}

fn to_c_int(value: u32) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| RenderFault::invalid(format!("{value} exceeds c_int")))
}

/// # Safety
/// `out` must be null or valid for writes of `viewport.width *
/// viewport.height * format.bytes_per_pixel()` bytes.
unsafe fn destination<'a>(
    out: *mut u8,
    viewport: Viewport,
    format: PixelFormat,
) -> Result<&'a mut [u8]> {
    if out.is_null() {
        return Err(RenderFault::invalid("null destination buffer"));
    }
    let len = (viewport.width as usize)
        .checked_mul(viewport.height as usize)
        .and_then(|px| px.checked_mul(format.bytes_per_pixel()))
        .ok_or_else(|| RenderFault::invalid("destination size overflow"))?;
    // SAFETY: caller guarantees `out` covers `len` writable bytes
    Ok(unsafe { std::slice::from_raw_parts_mut(out, len) })
}

/// # Safety
/// `out_width` and `out_height` must be valid for writes.
unsafe fn write_size(
    width: u32,
    height: u32,
    out_width: *mut c_int,
    out_height: *mut c_int,
) -> Result<()> {
    let (w, h) = (to_c_int(width)?, to_c_int(height)?);
    // SAFETY: checked non-null by the callers, validity is the caller's contract
    unsafe {
        *out_width = w;
        *out_height = h;
    }
    Ok(())
}

fn require_out<T>(ptr: *mut T, name: &str) -> Result<()> {
    if ptr.is_null() {
        return Err(RenderFault::invalid(format!("null {name}")));
    }
    Ok(())
}

/// Open the document at `path` (UTF-8, NUL-terminated).
///
/// On success `*out_session` receives a handle to release with
/// [`pagefit_destroy`]. The decode store limit comes from the settings.
///
/// # Safety
/// `out_session` must be valid for writes; `path` must be null or a valid C
/// string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pagefit_create(
    out_session: *mut *mut PagefitSession,
    path: *const c_char,
) -> c_int {
    guarded("pagefit_create", || {
        require_out(out_session, "session out-parameter")?;
        if path.is_null() {
            return Err(RenderFault::invalid("null path"));
        }
        // SAFETY: caller guarantees a NUL-terminated string
        let path = unsafe { CStr::from_ptr(path) }
            .to_str()
            .map_err(|e| RenderFault::invalid(format!("path is not UTF-8: {e}")))?;

        let session = DocumentSession::open_with(Path::new(path), settings::get_store_limit())?;
        let handle = Box::into_raw(Box::new(PagefitSession { session }));
        // SAFETY: checked non-null above
        unsafe { *out_session = handle };
        Ok(())
    })
}

/// Release a session. Null is ignored.
///
/// # Safety
/// `session` must be null or a handle from [`pagefit_create`] that has not
/// been destroyed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pagefit_destroy(session: *mut PagefitSession) {
    if session.is_null() {
        return;
    }
    guarded("pagefit_destroy", || {
        // SAFETY: the handle came from Box::into_raw in pagefit_create
        drop(unsafe { Box::from_raw(session) });
        Ok(())
    });
}

/// # Safety
/// `session` must be null or live; `out_count` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pagefit_page_count(
    session: *const PagefitSession,
    out_count: *mut c_int,
) -> c_int {
    guarded("pagefit_page_count", || {
        // SAFETY: forwarded caller contract
        let session = unsafe { session_ref(session) }?;
        require_out(out_count, "count out-parameter")?;
        let count = c_int::try_from(session.page_count())
            .map_err(|_| RenderFault::invalid("page count exceeds c_int"))?;
        // SAFETY: checked non-null above
        unsafe { *out_count = count };
        Ok(())
    })
}

/// Native-scale page render, in two phases.
///
/// With a null `out_buffer` only the size is written. Otherwise
/// `out_buffer` must hold `width * height * 3` bytes for that size and
/// receives tightly packed RGB.
///
/// # Safety
/// `session` must be null or live; `out_width`/`out_height` valid for
/// writes; `out_buffer` null or valid for the byte count above.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pagefit_get_page_rgb(
    session: *const PagefitSession,
    page: c_int,
    out_width: *mut c_int,
    out_height: *mut c_int,
    out_buffer: *mut u8,
) -> c_int {
    guarded("pagefit_get_page_rgb", || {
        // SAFETY: forwarded caller contract
        let session = unsafe { session_ref(session) }?;
        require_out(out_width, "width out-parameter")?;
        require_out(out_height, "height out-parameter")?;
        let index = to_index(page)?;

        let size = page_native_size(session, index)?;
        if !out_buffer.is_null() {
            let viewport = Viewport::new(size.width, size.height);
            // SAFETY: caller sized the buffer from the first phase
            let out = unsafe { destination(out_buffer, viewport, PixelFormat::Rgb) }?;
            page_native_rgb(session, index, out)?;
        }
        // SAFETY: checked non-null above
        unsafe { write_size(size.width, size.height, out_width, out_height) }
    })
}

/// # Safety
/// Shared contract of the fitted entry points.
#[allow(clippy::too_many_arguments)]
unsafe fn fitted(
    session: *const PagefitSession,
    page: c_int,
    available_width: c_int,
    available_height: c_int,
    out_width: *mut c_int,
    out_height: *mut c_int,
    out_buffer: *mut u8,
    format: PixelFormat,
    render: fn(&DocumentSession, usize, Viewport, &mut [u8]) -> Result<LayoutResult>,
) -> Result<()> {
    // SAFETY: forwarded caller contract
    let session = unsafe { session_ref(session) }?;
    require_out(out_width, "width out-parameter")?;
    require_out(out_height, "height out-parameter")?;
    let index = to_index(page)?;
    let viewport = to_viewport(available_width, available_height)?;

    // SAFETY: caller guarantees width * height * bpp bytes
    let out = unsafe { destination(out_buffer, viewport, format) }?;
    let result = render(session, index, viewport, out)?;
    // SAFETY: checked non-null above
    unsafe { write_size(result.width, result.height, out_width, out_height) }
}

/// Fit a page into `available_width` x `available_height` as RGB.
///
/// `out_buffer` holds `available_width * available_height * 3` bytes; only
/// the occupied region at its top-left is written.
///
/// # Safety
/// See [`pagefit_get_page_rgb`]. The width/height out-pointers must not
/// alias each other or the buffer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pagefit_get_page_fitted_rgb(
    session: *const PagefitSession,
    page: c_int,
    available_width: c_int,
    available_height: c_int,
    out_width: *mut c_int,
    out_height: *mut c_int,
    out_buffer: *mut u8,
) -> c_int {
    guarded("pagefit_get_page_fitted_rgb", || unsafe {
        fitted(
            session,
            page,
            available_width,
            available_height,
            out_width,
            out_height,
            out_buffer,
            PixelFormat::Rgb,
            page_fitted_rgb,
        )
    })
}

/// As [`pagefit_get_page_fitted_rgb`] into a 4-byte BGRA buffer, alpha 255
///
/// # Safety
/// See [`pagefit_get_page_fitted_rgb`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pagefit_get_page_fitted_bgra(
    session: *const PagefitSession,
    page: c_int,
    available_width: c_int,
    available_height: c_int,
    out_width: *mut c_int,
    out_height: *mut c_int,
    out_buffer: *mut u8,
) -> c_int {
    guarded("pagefit_get_page_fitted_bgra", || unsafe {
        fitted(
            session,
            page,
            available_width,
            available_height,
            out_width,
            out_height,
            out_buffer,
            PixelFormat::Bgra,
            page_fitted_bgra,
        )
    })
}

/// Pages `start_page` and `start_page + 1` side by side, BGRA
///
/// # Safety
/// See [`pagefit_get_page_fitted_rgb`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pagefit_get_two_pages_fitted_bgra(
    session: *const PagefitSession,
    start_page: c_int,
    available_width: c_int,
    available_height: c_int,
    out_width: *mut c_int,
    out_height: *mut c_int,
    out_buffer: *mut u8,
) -> c_int {
    guarded("pagefit_get_two_pages_fitted_bgra", || unsafe {
        fitted(
            session,
            start_page,
            available_width,
            available_height,
            out_width,
            out_height,
            out_buffer,
            PixelFormat::Bgra,
            two_pages_fitted_bgra,
        )
    })
}
