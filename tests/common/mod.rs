#![allow(dead_code)] // each suite uses a different slice of the fake

//! Shared test double for the capture page capabilities.
//!
//! Simulates a scrollable page entirely in memory: scroll requests are
//! clamped like a real browser, fixed-element and scrollbar state is
//! tracked, and captures are answered by a pluggable painter so compositor
//! tests can get real PNG tiles while sequencer tests get cheap markers.

use async_trait::async_trait;
use scrollshot::capture::{CapturePage, PageGeometry};
use scrollshot::error::{Error, Result};
use std::sync::Mutex;

/// Paints the bytes returned for capture number `index` while the page sits
/// at `scroll`.
pub type TilePainter = Box<dyn Fn(usize, f64) -> Vec<u8> + Send + Sync>;

/// Observable page state mutated by the sequencer.
#[derive(Debug, Default)]
pub struct FakeState {
    pub scroll: f64,
    pub scroll_requests: Vec<f64>,
    pub captures: usize,
    pub fixed_recorded: bool,
    pub fixed_hidden: bool,
    /// Whether fixed elements were hidden at the moment of each capture.
    pub hidden_at_capture: Vec<bool>,
    pub fixed_restores: usize,
    pub scrollbar_hidden: bool,
    pub scrollbar_restores: usize,
}

pub struct FakePage {
    pub geometry: PageGeometry,
    pub state: Mutex<FakeState>,
    max_scroll: f64,
    /// Lazy-content simulation: after this many scroll requests the
    /// scrollable range grows to the second value.
    grow_after: Option<(usize, f64)>,
    fail_at_capture: Option<usize>,
    painter: TilePainter,
}

impl FakePage {
    pub fn new(geometry: PageGeometry) -> Self {
        let max_scroll = geometry.max_scroll_offset();
        Self {
            geometry,
            state: Mutex::new(FakeState::default()),
            max_scroll,
            grow_after: None,
            fail_at_capture: None,
            painter: Box::new(|index, _| vec![index as u8; 8]),
        }
    }

    /// Clamp scrolls below the geometry-derived maximum, as a browser whose
    /// real scroll range disagrees with the measured document height.
    pub fn clamped_at(mut self, max_scroll: f64) -> Self {
        self.max_scroll = max_scroll;
        self
    }

    /// Grow the scroll range to `new_max` once `requests` scrolls happened.
    pub fn growing(mut self, requests: usize, new_max: f64) -> Self {
        self.grow_after = Some((requests, new_max));
        self
    }

    /// Fail the Nth capture (0-based) with an error.
    pub fn failing_at(mut self, capture_index: usize) -> Self {
        self.fail_at_capture = Some(capture_index);
        self
    }

    pub fn painted_with(mut self, painter: TilePainter) -> Self {
        self.painter = painter;
        self
    }

    pub fn with_initial_scroll(self, offset: f64) -> Self {
        self.state.lock().unwrap().scroll = offset;
        self
    }
}

#[async_trait]
impl CapturePage for FakePage {
    async fn measure_geometry(&self) -> Result<PageGeometry> {
        Ok(self.geometry)
    }

    async fn scroll_offset(&self) -> Result<f64> {
        Ok(self.state.lock().unwrap().scroll)
    }

    async fn scroll_to(&self, y: f64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.scroll_requests.push(y);
        let mut max = self.max_scroll;
        if let Some((requests, new_max)) = self.grow_after {
            if state.scroll_requests.len() > requests {
                max = new_max;
            }
        }
        state.scroll = y.clamp(0.0, max);
        Ok(())
    }

    async fn collect_fixed_elements(&self) -> Result<usize> {
        self.state.lock().unwrap().fixed_recorded = true;
        Ok(3)
    }

    async fn hide_fixed_elements(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        assert!(state.fixed_recorded, "hide before collect");
        state.fixed_hidden = true;
        Ok(())
    }

    async fn restore_fixed_elements(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.fixed_hidden = false;
        state.fixed_restores += 1;
        Ok(())
    }

    async fn hide_scrollbar(&self) -> Result<()> {
        self.state.lock().unwrap().scrollbar_hidden = true;
        Ok(())
    }

    async fn restore_scrollbar(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.scrollbar_hidden = false;
        state.scrollbar_restores += 1;
        Ok(())
    }

    async fn capture_viewport(&self) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        if self.fail_at_capture == Some(state.captures) {
            return Err(Error::generic("forced capture failure"));
        }
        let fixed_hidden = state.fixed_hidden;
        state.hidden_at_capture.push(fixed_hidden);
        let bytes = (self.painter)(state.captures, state.scroll);
        state.captures += 1;
        Ok(bytes)
    }
}

/// Geometry helper shared by the suites.
pub fn geometry(total_height: f64, viewport_height: f64, dpr: f64) -> PageGeometry {
    PageGeometry {
        total_width: 100.0,
        total_height,
        viewport_width: 100.0,
        viewport_height,
        device_pixel_ratio: dpr,
    }
}
