//! Scroll-and-capture sequencing
//!
//! Walks the page top to bottom in viewport-sized steps, capturing one tile
//! per stop. The loop trusts the read-back scroll offset rather than the
//! requested one (browsers clamp near the bottom), suppresses fixed/sticky
//! UI after the first tile so it is not duplicated into every subsequent
//! tile, and guarantees the page is visually restored on every exit path.

use crate::capture::page::CapturePage;
use crate::capture::session::{CaptureSession, PageGeometry, Tile};
use crate::error::{CaptureError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Tuning knobs for the capture sequencer.
///
/// The settle delays are fixed grace periods for layout, paint and
/// lazy-loaded content. They are configuration, not correctness properties;
/// a page that renders slower than the delay can still race the capture.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Nominal vertical band shared by consecutive scroll positions (CSS px).
    /// Absorbs sub-pixel rounding drift and small content shifts; the
    /// compositor recomputes the true overlap per tile pair regardless.
    pub overlap: f64,
    /// Pause after the initial scroll to the top, before the first tile.
    pub initial_settle: Duration,
    /// Pause after each subsequent scroll, before capturing.
    pub scroll_settle: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            overlap: 100.0,
            initial_settle: Duration::from_millis(800),
            scroll_settle: Duration::from_millis(600),
        }
    }
}

/// Drives one full scroll-and-capture pass over a page.
#[derive(Debug, Default)]
pub struct CaptureSequencer {
    config: SequencerConfig,
}

impl CaptureSequencer {
    /// Create a sequencer with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequencer with custom tuning.
    pub fn with_config(config: SequencerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Capture the full page as an ordered tile sequence.
    ///
    /// On success and on failure alike, the page's scroll position,
    /// scrollbar styling and fixed-element visibility are restored before
    /// this returns. A capture error takes precedence over a restoration
    /// error when both occur.
    #[instrument(skip(self, page))]
    pub async fn run(&self, page: &dyn CapturePage) -> Result<CaptureSession> {
        let original_offset = page.scroll_offset().await?;

        let geometry = page.measure_geometry().await?;
        geometry.validate()?;

        let fixed_count = page.collect_fixed_elements().await?;
        info!(
            "Starting capture: page {}x{} css px, viewport {}x{}, {} fixed/sticky elements",
            geometry.total_width,
            geometry.total_height,
            geometry.viewport_width,
            geometry.viewport_height,
            fixed_count
        );

        let outcome = self.capture_tiles(page, &geometry).await;
        let restoration = Self::restore_page(page, original_offset).await;

        let tiles = match outcome {
            Ok(tiles) => tiles,
            Err(err) => {
                if let Err(restore_err) = restoration {
                    warn!("Restoration after failed capture incomplete: {restore_err}");
                }
                return Err(err);
            }
        };
        restoration?;

        info!("Capture complete: {} tiles", tiles.len());
        let session = CaptureSession { geometry, tiles };
        session.validate()?;
        Ok(session)
    }

    /// The scroll loop proper. Page state mutations all happen in here; the
    /// caller owns restoration.
    async fn capture_tiles(
        &self,
        page: &dyn CapturePage,
        geometry: &PageGeometry,
    ) -> Result<Vec<Tile>> {
        page.scroll_to(0.0).await?;
        sleep(self.config.initial_settle).await;
        page.hide_scrollbar().await?;

        let step = self.scroll_step(geometry);
        let mut tiles: Vec<Tile> = Vec::new();
        let mut target = 0.0;

        while target < geometry.total_height {
            let tile = self.capture_one(page, geometry, target, tiles.len()).await?;
            tiles.push(tile);

            // The first tile keeps headers/footers in their natural place;
            // every later tile would duplicate them, so hide them now.
            if tiles.len() == 1 {
                page.hide_fixed_elements().await?;
            }

            target += step;
        }

        // Bottom-coverage check against recorded offsets: clamping may have
        // left the final band of the page uncaptured.
        if let Some(last) = tiles.last() {
            if last.covered_bottom() < geometry.total_height {
                debug!(
                    "Tiles end at {} of {}; capturing corrective bottom tile",
                    last.covered_bottom(),
                    geometry.total_height
                );
                let anchor = geometry.max_scroll_offset();
                let tile = self.capture_one(page, geometry, anchor, tiles.len()).await?;
                tiles.push(tile);
            }
        }

        Ok(tiles)
    }

    /// Scroll, settle, read back the real offset, capture.
    async fn capture_one(
        &self,
        page: &dyn CapturePage,
        geometry: &PageGeometry,
        target: f64,
        index: usize,
    ) -> Result<Tile> {
        page.scroll_to(target).await?;
        sleep(self.config.scroll_settle).await;

        // Authoritative position: the browser clamps requests past
        // totalHeight - viewportHeight.
        let actual = page.scroll_offset().await?;

        let image = page.capture_viewport().await.map_err(|e| {
            CaptureError::TileFailed {
                offset: target,
                reason: e.to_string(),
            }
        })?;

        debug!("Tile {index}: requested offset {target}, settled at {actual}");
        Ok(Tile {
            image,
            requested_offset: target,
            actual_offset: actual,
            viewport_height: geometry.viewport_height,
            sequence_index: index,
        })
    }

    /// Vertical advance between consecutive tiles. Must be strictly
    /// positive or the loop would never terminate.
    fn scroll_step(&self, geometry: &PageGeometry) -> f64 {
        let overlap = self.config.overlap;
        if overlap < 0.0 || overlap >= geometry.viewport_height {
            warn!(
                "Overlap {} unusable for viewport height {}; stepping by full viewport",
                overlap, geometry.viewport_height
            );
            return geometry.viewport_height;
        }
        geometry.viewport_height - overlap
    }

    /// Single restoration routine shared by the success and failure paths.
    /// Every step is attempted even when an earlier one fails.
    async fn restore_page(page: &dyn CapturePage, original_offset: f64) -> Result<()> {
        let fixed = page.restore_fixed_elements().await;
        let scrollbar = page.restore_scrollbar().await;
        let scroll = page.scroll_to(original_offset).await;

        fixed?;
        scrollbar?;
        scroll
    }
}
