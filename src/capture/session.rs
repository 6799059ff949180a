//! Capture session data model
//!
//! The record types produced by the sequencer and consumed by the
//! compositor. The boundary between the two components is loosely ordered
//! data, so `CaptureSession::validate` enforces a strict schema before any
//! compositing begins.

use crate::error::{CaptureError, Result, StitchError};
use serde::{Deserialize, Serialize};

/// Page and viewport dimensions measured at capture start, in CSS pixels.
///
/// Measured once per session and immutable afterwards. `total_width` and
/// `total_height` come from the maximum of several layout signals because
/// browsers disagree about which one reports the true document extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    /// Full document width (CSS px)
    pub total_width: f64,
    /// Full document height (CSS px)
    pub total_height: f64,
    /// Visible viewport width (CSS px)
    pub viewport_width: f64,
    /// Visible viewport height (CSS px)
    pub viewport_height: f64,
    /// Scale factor between CSS pixels and device pixels
    pub device_pixel_ratio: f64,
}

impl PageGeometry {
    /// Validate the measured geometry.
    ///
    /// A non-finite or non-positive `device_pixel_ratio` would silently
    /// corrupt every device-pixel computation downstream, so it is rejected
    /// here, before the page is mutated.
    pub fn validate(&self) -> Result<()> {
        if !self.device_pixel_ratio.is_finite() || self.device_pixel_ratio <= 0.0 {
            return Err(CaptureError::InvalidGeometry(format!(
                "devicePixelRatio must be a positive finite number, got {}",
                self.device_pixel_ratio
            ))
            .into());
        }

        for (name, value) in [
            ("totalWidth", self.total_width),
            ("totalHeight", self.total_height),
            ("viewportWidth", self.viewport_width),
            ("viewportHeight", self.viewport_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CaptureError::InvalidGeometry(format!(
                    "{name} must be a positive finite number, got {value}"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Destination bitmap width in device pixels.
    pub fn device_width(&self) -> u32 {
        (self.total_width * self.device_pixel_ratio).round() as u32
    }

    /// Destination bitmap height in device pixels.
    pub fn device_height(&self) -> u32 {
        (self.total_height * self.device_pixel_ratio).round() as u32
    }

    /// Maximum scroll offset the browser will settle at (CSS px).
    pub fn max_scroll_offset(&self) -> f64 {
        (self.total_height - self.viewport_height).max(0.0)
    }
}

/// One captured viewport image plus its true on-page position.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Encoded bitmap bytes (PNG) as returned by the capture primitive
    pub image: Vec<u8>,
    /// Scroll offset the sequencer asked for (CSS px)
    pub requested_offset: f64,
    /// Scroll offset the browser actually settled at (CSS px); authoritative
    pub actual_offset: f64,
    /// Viewport height at capture time (CSS px)
    pub viewport_height: f64,
    /// Position in the capture order, starting at 0
    pub sequence_index: usize,
}

impl Tile {
    /// Bottom edge of the page band this tile covers (CSS px).
    pub fn covered_bottom(&self) -> f64 {
        self.actual_offset + self.viewport_height
    }
}

/// The ordered tile sequence plus the geometry it was captured under.
///
/// Exists only for the lifetime of one capture operation.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    /// Geometry measured at capture start
    pub geometry: PageGeometry,
    /// Tiles in capture order
    pub tiles: Vec<Tile>,
}

impl CaptureSession {
    /// Validate the session schema at the sequencer/compositor boundary.
    ///
    /// Invariants checked:
    /// - at least one tile;
    /// - `sequence_index` values form a contiguous run from 0;
    /// - `actual_offset` is monotonically non-decreasing;
    /// - the last tile reaches the page bottom;
    /// - the geometry itself is valid.
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;

        if self.tiles.is_empty() {
            return Err(StitchError::InvalidSession("no tiles captured".to_string()).into());
        }

        let mut prev_offset = f64::NEG_INFINITY;
        for (i, tile) in self.tiles.iter().enumerate() {
            if tile.sequence_index != i {
                return Err(StitchError::InvalidSession(format!(
                    "tile at position {i} has sequence index {}",
                    tile.sequence_index
                ))
                .into());
            }
            if !tile.actual_offset.is_finite() || !tile.viewport_height.is_finite() {
                return Err(StitchError::InvalidSession(format!(
                    "tile {i} has non-finite offset or viewport height"
                ))
                .into());
            }
            if tile.actual_offset < prev_offset {
                return Err(StitchError::InvalidSession(format!(
                    "tile {i} offset {} precedes previous offset {prev_offset}",
                    tile.actual_offset
                ))
                .into());
            }
            prev_offset = tile.actual_offset;
        }

        if let Some(last) = self.tiles.last() {
            if last.covered_bottom() < self.geometry.total_height {
                return Err(StitchError::InvalidSession(format!(
                    "tiles end at {} but the page is {} tall",
                    last.covered_bottom(),
                    self.geometry.total_height
                ))
                .into());
            }
        }

        Ok(())
    }
}
