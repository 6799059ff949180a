//! Tile compositing
//!
//! Flattens an ordered tile sequence into one bitmap at device-pixel
//! resolution. The seam correction recomputes the true overlap of each
//! consecutive tile pair from their recorded offsets instead of trusting
//! the nominal scroll step - that is what prevents both gaps and duplicated
//! bands when the browser did not scroll by exactly the requested amount.

use crate::capture::session::{CaptureSession, Tile};
use crate::error::{Result, StitchError};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::{debug, instrument, trace};

/// Flattens captured tiles into a single page bitmap.
pub struct TileCompositor;

impl TileCompositor {
    /// Compose the session's tiles into one image of
    /// `round(total_width * dpr) x round(total_height * dpr)` pixels.
    ///
    /// Pure function of its input: the page is not touched, and tiles are
    /// processed strictly in sequence order because each placement depends
    /// on the previous tile's recorded offset.
    #[instrument(skip(session), fields(tiles = session.tiles.len()))]
    pub fn compose(session: &CaptureSession) -> Result<RgbaImage> {
        session.validate()?;

        let geometry = &session.geometry;
        let dpr = geometry.device_pixel_ratio;
        let canvas_width = geometry.device_width();
        let canvas_height = geometry.device_height();
        if canvas_width == 0 || canvas_height == 0 {
            return Err(StitchError::InvalidCanvas(format!(
                "{canvas_width}x{canvas_height} device px"
            ))
            .into());
        }

        debug!("Compositing onto {canvas_width}x{canvas_height} canvas (dpr {dpr})");

        // Captured tiles are typically opaque, but any unpainted residual
        // band must not show through as transparent.
        let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([255, 255, 255, 255]));

        let mut previous: Option<&Tile> = None;
        for tile in &session.tiles {
            let decoded = image::load_from_memory(&tile.image)
                .map_err(|e| StitchError::DecodeFailed {
                    index: tile.sequence_index,
                    reason: e.to_string(),
                })?
                .to_rgba8();
            let (tile_width, tile_height) = decoded.dimensions();

            // Offsets are CSS px; tile bitmaps are device px.
            let target_y = (tile.actual_offset * dpr).round() as i64;

            let (source_y, dest_y) = match previous {
                None => (0u32, target_y),
                Some(prev) => {
                    // True shared band between this tile and the previous
                    // one, from recorded offsets. Crop it off the top so the
                    // already-drawn rows are not painted twice.
                    let overlap_css =
                        prev.actual_offset + prev.viewport_height - tile.actual_offset;
                    let overlap_device = (overlap_css.max(0.0) * dpr).round() as u32;
                    let source_y = overlap_device.min(tile_height);
                    (source_y, target_y + i64::from(overlap_device))
                }
            };

            let source_height = i64::from(tile_height - source_y);
            let remaining = i64::from(canvas_height) - dest_y;
            let draw_height = source_height.min(remaining);

            if draw_height > 0 {
                let draw_height = draw_height as u32;
                let band = imageops::crop_imm(&decoded, 0, source_y, tile_width, draw_height)
                    .to_image();
                // Pages wider than the viewport capture narrower tiles than
                // the canvas; stretch horizontally to the canvas width.
                let band = if tile_width != canvas_width {
                    imageops::resize(&band, canvas_width, draw_height, FilterType::Triangle)
                } else {
                    band
                };
                imageops::replace(&mut canvas, &band, 0, dest_y);
                trace!(
                    "Tile {}: cropped {source_y} rows, drew {draw_height} rows at y {dest_y}",
                    tile.sequence_index
                );
            } else {
                trace!("Tile {} fully redundant, skipped", tile.sequence_index);
            }

            previous = Some(tile);
        }

        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::session::{PageGeometry, Tile};

    fn png_tile(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn tile(index: usize, offset: f64, viewport_height: f64, image: Vec<u8>) -> Tile {
        Tile {
            image,
            requested_offset: offset,
            actual_offset: offset,
            viewport_height,
            sequence_index: index,
        }
    }

    fn geometry(total_height: f64, viewport_height: f64, dpr: f64) -> PageGeometry {
        PageGeometry {
            total_width: 100.0,
            total_height,
            viewport_width: 100.0,
            viewport_height,
            device_pixel_ratio: dpr,
        }
    }

    #[test]
    fn test_single_tile_page() {
        let session = CaptureSession {
            geometry: geometry(80.0, 100.0, 1.0),
            tiles: vec![tile(0, 0.0, 100.0, png_tile(100, 100, [10, 20, 30, 255]))],
        };
        let out = TileCompositor::compose(&session).unwrap();
        assert_eq!(out.dimensions(), (100, 80));
        assert_eq!(out.get_pixel(50, 40), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_output_matches_device_dimensions() {
        let session = CaptureSession {
            geometry: geometry(100.0, 100.0, 2.0),
            tiles: vec![tile(0, 0.0, 100.0, png_tile(200, 200, [1, 2, 3, 255]))],
        };
        let out = TileCompositor::compose(&session).unwrap();
        assert_eq!(out.dimensions(), (200, 200));
    }

    #[test]
    fn test_undecodable_tile_is_fatal() {
        let session = CaptureSession {
            geometry: geometry(80.0, 100.0, 1.0),
            tiles: vec![tile(0, 0.0, 100.0, vec![0xde, 0xad, 0xbe, 0xef])],
        };
        let err = TileCompositor::compose(&session).unwrap_err();
        assert!(err.to_string().contains("decode tile 0"));
    }

    #[test]
    fn test_white_background_where_nothing_painted() {
        // A 50px-tall tile on an 80px page leaves the bottom rows unpainted;
        // they must come out opaque white, not transparent.
        let session = CaptureSession {
            geometry: geometry(80.0, 100.0, 1.0),
            tiles: vec![tile(0, 0.0, 100.0, png_tile(100, 50, [0, 0, 0, 255]))],
        };
        let out = TileCompositor::compose(&session).unwrap();
        assert_eq!(out.get_pixel(10, 70), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_horizontal_stretch_to_canvas_width() {
        // Tile narrower than the canvas is stretched across the full width.
        let session = CaptureSession {
            geometry: geometry(60.0, 100.0, 1.0),
            tiles: vec![tile(0, 0.0, 100.0, png_tile(50, 60, [9, 9, 9, 255]))],
        };
        let out = TileCompositor::compose(&session).unwrap();
        assert_eq!(out.get_pixel(99, 30), &Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_rejects_zero_sized_canvas() {
        let mut g = geometry(80.0, 100.0, 1.0);
        g.total_width = 0.2;
        let session = CaptureSession {
            geometry: g,
            tiles: vec![tile(0, 0.0, 100.0, png_tile(100, 100, [0, 0, 0, 255]))],
        };
        assert!(TileCompositor::compose(&session).is_err());
    }
}
