use pagefit::render::{
    DocumentSession, PageBounds, Viewport, fit_transform, page_fitted_bgra, page_fitted_rgb,
    page_native_size, two_pages_fitted_bgra,
};
use pagefit::test_utils::{PageSpec, SyntheticDocument};

const PAGES: [(f32, f32); 5] = [
    (612.0, 792.0),
    (792.0, 612.0),
    (1224.0, 792.0),
    (100.0, 1000.0),
    (595.0, 842.0),
];

const VIEWPORTS: [(u32, u32); 5] = [(800, 600), (600, 800), (1024, 1024), (300, 900), (1920, 400)];

fn session() -> DocumentSession<SyntheticDocument> {
    let pages = PAGES.iter().map(|&(w, h)| PageSpec::new(w, h)).collect();
    DocumentSession::from_engine(SyntheticDocument::new(pages).with_row_alignment(16)).unwrap()
}

fn fitted_extent(bounds: PageBounds, viewport: Viewport) -> (u32, u32) {
    let rect = bounds.transform(fit_transform(&bounds, viewport)).round_out();
    (
        rect.width().min(viewport.width),
        rect.height().min(viewport.height),
    )
}

#[test]
fn native_size_matches_bounds() {
    let session = session();
    for (index, &(w, h)) in PAGES.iter().enumerate() {
        let size = page_native_size(&session, index).unwrap();
        assert_eq!(size.width, w.ceil() as u32, "page {index}");
        assert_eq!(size.height, h.ceil() as u32, "page {index}");
    }
}

#[test]
fn fitted_pages_stay_inside_and_keep_aspect() {
    let session = session();
    for (index, &(pw, ph)) in PAGES.iter().enumerate() {
        for &(vw, vh) in &VIEWPORTS {
            let viewport = Viewport::new(vw, vh);
            let mut buf = vec![0u8; vw as usize * vh as usize * 4];
            let result = page_fitted_bgra(&session, index, viewport, &mut buf).unwrap();

            assert!(result.fits(viewport), "page {index} in {vw}x{vh}: {result:?}");
            assert!(
                result.width == vw || result.height == vh,
                "page {index} in {vw}x{vh}: no binding edge in {result:?}"
            );

            let aspect = result.width as f32 / result.height as f32;
            let expected = pw / ph;
            assert!(
                ((aspect - expected) / expected).abs() < 0.01,
                "page {index} in {vw}x{vh}: aspect {aspect} vs {expected}"
            );
        }
    }
}

#[test]
fn bgra_and_rgb_carry_the_same_colors() {
    let session = session();
    let viewport = Viewport::new(320, 240);
    let mut rgb = vec![0u8; 320 * 240 * 3];
    let mut bgra = vec![0u8; 320 * 240 * 4];

    let a = page_fitted_rgb(&session, 4, viewport, &mut rgb).unwrap();
    let b = page_fitted_bgra(&session, 4, viewport, &mut bgra).unwrap();
    assert_eq!(a, b);

    for y in 0..a.height as usize {
        for x in 0..a.width as usize {
            let s = &rgb[(y * 320 + x) * 3..][..3];
            let d = &bgra[(y * 320 + x) * 4..][..4];
            assert_eq!([d[2], d[1], d[0]], [s[0], s[1], s[2]], "pixel ({x}, {y})");
            assert_eq!(d[3], 255);
        }
    }
}

#[test]
fn spread_is_sum_of_widths_and_max_of_heights() {
    let session = session();
    for start in 0..PAGES.len() - 1 {
        for &(vw, vh) in &VIEWPORTS {
            let viewport = Viewport::new(vw, vh);
            let mut buf = vec![0u8; vw as usize * vh as usize * 4];
            let result = two_pages_fitted_bgra(&session, start, viewport, &mut buf).unwrap();

            let first = PageBounds::from_size(PAGES[start].0, PAGES[start].1);
            let second = PageBounds::from_size(PAGES[start + 1].0, PAGES[start + 1].1);
            let (w0, h0) = fitted_extent(first, Viewport::new(vw / 2, vh));
            let (w1, h1) = fitted_extent(second, Viewport::new(vw - w0, vh));

            assert_eq!(result.width, w0 + w1, "pages {start}+ in {vw}x{vh}");
            assert_eq!(result.height, h0.max(h1), "pages {start}+ in {vw}x{vh}");
            assert!(result.fits(viewport));
        }
    }
}

#[test]
fn mixed_orientation_spread_takes_the_taller_page() {
    let doc = SyntheticDocument::new(vec![
        PageSpec::new(612.0, 792.0),
        PageSpec::new(792.0, 612.0),
    ]);
    let session = DocumentSession::from_engine(doc).unwrap();
    let mut buf = vec![0u8; 800 * 600 * 4];
    let result = two_pages_fitted_bgra(&session, 0, Viewport::new(800, 600), &mut buf).unwrap();

    // portrait fits 400 wide at ~518 tall, landscape 400 wide at ~310
    assert_eq!(result.width, 800);
    assert!((518..=519).contains(&result.height), "{result:?}");

    // below the landscape page the right half stays untouched
    let row = 400 * 3200;
    assert!(buf[row + 400 * 4..row + 3200].iter().all(|&b| b == 0));
    assert!(buf[row..row + 400 * 4].chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn letter_spread_scenario() {
    let mut buf = vec![0u8; 800 * 600 * 4];
    let doc = SyntheticDocument::new(vec![PageSpec::new(612.0, 792.0); 2]);
    let letters = DocumentSession::from_engine(doc).unwrap();
    let result = two_pages_fitted_bgra(&letters, 0, Viewport::new(800, 600), &mut buf).unwrap();
    assert_eq!(result.width, 800);
    assert!((518..=519).contains(&result.height));

    // every written pixel is opaque, rows below the spread are not touched
    for y in 0..result.height as usize {
        assert!(buf[y * 3200..(y + 1) * 3200].chunks_exact(4).all(|px| px[3] == 255));
    }
    assert!(buf[result.height as usize * 3200..].iter().all(|&b| b == 0));
}
