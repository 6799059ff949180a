//! Tile compositor integration tests
//!
//! Tiles carry a row-coded pattern: each device-pixel row's red channel
//! encodes the page row it was captured from (mod 251). After compositing,
//! canvas row `y` must hold value `y % 251` everywhere - any duplicated
//! band, gap, or misplacement shows up as a mismatched row.

use image::{ImageFormat, Rgba, RgbaImage};
use scrollshot::capture::{CaptureSession, PageGeometry, Tile};
use scrollshot::stitch::TileCompositor;
use std::io::Cursor;

fn row_coded_tile(width: u32, height: u32, page_offset_css: f64, dpr: f64) -> Vec<u8> {
    let base = (page_offset_css * dpr).round() as u32;
    let mut img = RgbaImage::new(width, height);
    for y in 0..height {
        let value = ((base + y) % 251) as u8;
        for x in 0..width {
            img.put_pixel(x, y, Rgba([value, 0, 0, 255]));
        }
    }
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn geometry(total_height: f64, viewport_height: f64, dpr: f64) -> PageGeometry {
    PageGeometry {
        total_width: 40.0,
        total_height,
        viewport_width: 40.0,
        viewport_height,
        device_pixel_ratio: dpr,
    }
}

fn tile(index: usize, offset: f64, viewport_height: f64, dpr: f64) -> Tile {
    let width = (40.0 * dpr).round() as u32;
    let height = (viewport_height * dpr).round() as u32;
    Tile {
        image: row_coded_tile(width, height, offset, dpr),
        requested_offset: offset,
        actual_offset: offset,
        viewport_height,
        sequence_index: index,
    }
}

fn assert_rows_continuous(canvas: &RgbaImage) {
    for y in 0..canvas.height() {
        assert_eq!(
            canvas.get_pixel(0, y).0[0],
            (y % 251) as u8,
            "canvas row {y} holds the wrong page band"
        );
    }
}

#[test]
fn nominal_overlap_produces_continuous_page() {
    // 2500px page in three tiles at 0/900/1800: each pair shares a 100px
    // band that must be drawn exactly once, and the last tile overshoots
    // the canvas and must be clipped.
    let session = CaptureSession {
        geometry: geometry(2500.0, 1000.0, 1.0),
        tiles: vec![
            tile(0, 0.0, 1000.0, 1.0),
            tile(1, 900.0, 1000.0, 1.0),
            tile(2, 1800.0, 1000.0, 1.0),
        ],
    };
    let canvas = TileCompositor::compose(&session).unwrap();

    assert_eq!(canvas.dimensions(), (40, 2500));
    assert_rows_continuous(&canvas);
}

#[test]
fn clamped_scroll_recomputes_overlap_from_recorded_offsets() {
    // Requested 1800 but the browser clamped to 1500: the true overlap
    // against the previous tile is 400px, not the nominal 100. Trusting
    // the nominal value would duplicate a 300px band.
    let session = CaptureSession {
        geometry: geometry(2500.0, 1000.0, 1.0),
        tiles: vec![
            tile(0, 0.0, 1000.0, 1.0),
            tile(1, 900.0, 1000.0, 1.0),
            tile(2, 1500.0, 1000.0, 1.0),
        ],
    };
    let canvas = TileCompositor::compose(&session).unwrap();

    assert_eq!(canvas.dimensions(), (40, 2500));
    assert_rows_continuous(&canvas);
}

#[test]
fn no_overlap_draws_full_tile_with_zero_cropped_rows() {
    // Consecutive offsets exactly one viewport apart: the overlap
    // correction must be a no-op, with the second tile's first row landing
    // exactly at page row 1000.
    let session = CaptureSession {
        geometry: geometry(2000.0, 1000.0, 1.0),
        tiles: vec![tile(0, 0.0, 1000.0, 1.0), tile(1, 1000.0, 1000.0, 1.0)],
    };
    let canvas = TileCompositor::compose(&session).unwrap();

    assert_eq!(canvas.dimensions(), (40, 2000));
    assert_rows_continuous(&canvas);
}

#[test]
fn fully_redundant_tile_is_skipped() {
    // A corrective capture that clamped to the same offset as its
    // predecessor adds no new rows and must not disturb the canvas.
    let session = CaptureSession {
        geometry: geometry(2000.0, 1000.0, 1.0),
        tiles: vec![
            tile(0, 0.0, 1000.0, 1.0),
            tile(1, 1000.0, 1000.0, 1.0),
            tile(2, 1000.0, 1000.0, 1.0),
        ],
    };
    let canvas = TileCompositor::compose(&session).unwrap();

    assert_rows_continuous(&canvas);
}

#[test]
fn device_pixel_ratio_scales_placement() {
    // dpr 2: tiles are 2000 device rows for a 1000 css viewport, and all
    // placement arithmetic runs in device space.
    let session = CaptureSession {
        geometry: geometry(1500.0, 1000.0, 2.0),
        tiles: vec![tile(0, 0.0, 1000.0, 2.0), tile(1, 500.0, 1000.0, 2.0)],
    };
    let canvas = TileCompositor::compose(&session).unwrap();

    assert_eq!(canvas.dimensions(), (80, 3000));
    assert_rows_continuous(&canvas);
}

#[test]
fn output_height_matches_device_rounding() {
    let session = CaptureSession {
        geometry: geometry(1000.0, 1000.0, 1.5),
        tiles: vec![tile(0, 0.0, 1000.0, 1.5)],
    };
    let canvas = TileCompositor::compose(&session).unwrap();

    assert_eq!(canvas.height(), 1500);
    assert_eq!(canvas.width(), 60);
}

#[test]
fn rejects_session_failing_schema_validation() {
    // Indices out of order must be caught at the component boundary.
    let mut bad = tile(0, 900.0, 1000.0, 1.0);
    bad.sequence_index = 5;
    let session = CaptureSession {
        geometry: geometry(2500.0, 1000.0, 1.0),
        tiles: vec![tile(0, 0.0, 1000.0, 1.0), bad, tile(2, 1500.0, 1000.0, 1.0)],
    };
    assert!(TileCompositor::compose(&session).is_err());
}
