use std::ffi::CString;
use std::os::raw::c_int;
use std::ptr;

use pagefit::ffi::{
    PagefitSession, pagefit_create, pagefit_destroy, pagefit_get_page_fitted_bgra,
    pagefit_get_page_fitted_rgb, pagefit_get_page_rgb, pagefit_get_two_pages_fitted_bgra,
    pagefit_page_count,
};
use pagefit::test_utils::{solid_page, write_comic_archive};

const RED: [u8; 3] = [200, 10, 30];
const GREEN: [u8; 3] = [20, 180, 40];

struct Fixture {
    _dir: tempfile::TempDir,
    session: *mut PagefitSession,
}

impl Fixture {
    fn open() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.cbz");
        write_comic_archive(
            &path,
            &[
                ("01.png", solid_page(40, 30, RED)),
                ("02.png", solid_page(30, 40, GREEN)),
            ],
        )
        .unwrap();

        let c_path = CString::new(path.to_str().unwrap()).unwrap();
        let mut session: *mut PagefitSession = ptr::null_mut();
        let ok = unsafe { pagefit_create(&mut session, c_path.as_ptr()) };
        assert_eq!(ok, 1);
        assert!(!session.is_null());
        Self { _dir: dir, session }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        unsafe { pagefit_destroy(self.session) };
    }
}

#[test]
fn destroy_null_is_a_no_op() {
    unsafe { pagefit_destroy(ptr::null_mut()) };
}

#[test]
fn create_failure_leaves_out_param_untouched() {
    let path = CString::new("/no/such/dir/book.cbz").unwrap();
    let mut session: *mut PagefitSession = ptr::null_mut();
    assert_eq!(unsafe { pagefit_create(&mut session, path.as_ptr()) }, 0);
    assert!(session.is_null());

    assert_eq!(unsafe { pagefit_create(&mut session, ptr::null()) }, 0);
    assert_eq!(
        unsafe { pagefit_create(ptr::null_mut(), path.as_ptr()) },
        0
    );
}

#[test]
fn null_session_fails_every_call() {
    let mut count: c_int = -7;
    let (mut w, mut h): (c_int, c_int) = (-1, -1);
    let mut buf = vec![0u8; 16];
    unsafe {
        assert_eq!(pagefit_page_count(ptr::null(), &mut count), 0);
        assert_eq!(
            pagefit_get_page_rgb(ptr::null(), 0, &mut w, &mut h, ptr::null_mut()),
            0
        );
        assert_eq!(
            pagefit_get_page_fitted_bgra(ptr::null(), 0, 2, 2, &mut w, &mut h, buf.as_mut_ptr()),
            0
        );
    }
    assert_eq!(count, -7);
    assert_eq!((w, h), (-1, -1));
}

#[test]
fn two_phase_native_render() {
    let fixture = Fixture::open();
    let mut count: c_int = 0;
    assert_eq!(unsafe { pagefit_page_count(fixture.session, &mut count) }, 1);
    assert_eq!(count, 2);

    let (mut w, mut h): (c_int, c_int) = (0, 0);
    let ok = unsafe { pagefit_get_page_rgb(fixture.session, 0, &mut w, &mut h, ptr::null_mut()) };
    assert_eq!(ok, 1);
    assert_eq!((w, h), (40, 30));

    let mut buf = vec![0u8; (w * h * 3) as usize];
    let ok =
        unsafe { pagefit_get_page_rgb(fixture.session, 0, &mut w, &mut h, buf.as_mut_ptr()) };
    assert_eq!(ok, 1);
    assert!(buf.chunks_exact(3).all(|px| px == RED));
}

#[test]
fn fitted_calls_report_occupied_size() {
    let fixture = Fixture::open();
    let (mut w, mut h): (c_int, c_int) = (0, 0);

    let mut rgb = vec![0u8; 80 * 80 * 3];
    let ok = unsafe {
        pagefit_get_page_fitted_rgb(fixture.session, 0, 80, 80, &mut w, &mut h, rgb.as_mut_ptr())
    };
    assert_eq!(ok, 1);
    assert_eq!((w, h), (80, 60));

    let mut bgra = vec![0u8; 80 * 80 * 4];
    let ok = unsafe {
        pagefit_get_page_fitted_bgra(fixture.session, 1, 80, 80, &mut w, &mut h, bgra.as_mut_ptr())
    };
    assert_eq!(ok, 1);
    assert_eq!((w, h), (60, 80));
    assert_eq!(bgra[3], 255);
    assert_eq!(bgra[60 * 4 + 3], 0);

    let ok = unsafe {
        pagefit_get_two_pages_fitted_bgra(
            fixture.session,
            0,
            80,
            80,
            &mut w,
            &mut h,
            bgra.as_mut_ptr(),
        )
    };
    assert_eq!(ok, 1);
    // 40x30 fills its 40 column half at zoom 1; 30x40 widens to 40x54
    assert_eq!((w, h), (80, 54));
}

#[test]
fn invalid_arguments_fail_without_writing() {
    let fixture = Fixture::open();
    let (mut w, mut h): (c_int, c_int) = (-1, -1);
    let mut buf = vec![0u8; 10 * 10 * 4];
    unsafe {
        assert_eq!(
            pagefit_get_page_fitted_bgra(fixture.session, -1, 10, 10, &mut w, &mut h, buf.as_mut_ptr()),
            0
        );
        assert_eq!(
            pagefit_get_page_fitted_bgra(fixture.session, 5, 10, 10, &mut w, &mut h, buf.as_mut_ptr()),
            0
        );
        assert_eq!(
            pagefit_get_page_fitted_bgra(fixture.session, 0, -10, 10, &mut w, &mut h, buf.as_mut_ptr()),
            0
        );
        assert_eq!(
            pagefit_get_page_fitted_rgb(fixture.session, 0, 10, 10, &mut w, &mut h, ptr::null_mut()),
            0
        );
        assert_eq!(
            pagefit_get_two_pages_fitted_bgra(fixture.session, 1, 10, 10, &mut w, &mut h, buf.as_mut_ptr()),
            0
        );
    }
    assert_eq!((w, h), (-1, -1));
}
