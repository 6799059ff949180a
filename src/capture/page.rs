//! Host page capabilities consumed by the capture sequencer
//!
//! The sequencer never talks to CDP directly. Everything it needs from the
//! live page - layout measurement, scrolling, fixed-element suppression and
//! the viewport screenshot primitive - is expressed as the [`CapturePage`]
//! trait, so the whole scroll-and-capture flow can be driven against a mock
//! in tests.

use crate::browser::PageHandle;
use crate::capture::session::PageGeometry;
use crate::error::{CaptureError, Error, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use tracing::debug;

/// Capabilities the host environment provides to the capture sequencer.
///
/// The production implementation drives a CDP page; tests substitute a mock.
#[async_trait]
pub trait CapturePage: Send + Sync {
    /// Measure page and viewport dimensions (CSS px).
    async fn measure_geometry(&self) -> Result<PageGeometry>;

    /// Read the current vertical scroll offset (CSS px).
    async fn scroll_offset(&self) -> Result<f64>;

    /// Request a scroll to the given vertical offset. The browser may clamp;
    /// callers must read back [`CapturePage::scroll_offset`] for the truth.
    async fn scroll_to(&self, y: f64) -> Result<()>;

    /// Enumerate fixed/sticky positioned elements and record their original
    /// visibility, without hiding anything yet. Returns the record count.
    async fn collect_fixed_elements(&self) -> Result<usize>;

    /// Hide every element recorded by
    /// [`CapturePage::collect_fixed_elements`].
    async fn hide_fixed_elements(&self) -> Result<()>;

    /// Restore the recorded elements to their original visibility and drop
    /// the records.
    async fn restore_fixed_elements(&self) -> Result<()>;

    /// Visually suppress the scrollbar so it does not appear in tiles.
    async fn hide_scrollbar(&self) -> Result<()>;

    /// Undo [`CapturePage::hide_scrollbar`].
    async fn restore_scrollbar(&self) -> Result<()>;

    /// Rasterize the current viewport. Returns encoded PNG bytes.
    async fn capture_viewport(&self) -> Result<Vec<u8>>;
}

/// Measure the document extent as the maximum of several layout signals.
/// Some pages under-report through any single one of them.
const GEOMETRY_SCRIPT: &str = r#"
    JSON.stringify((() => {
        const body = document.body;
        const doc = document.documentElement;
        return {
            totalWidth: Math.max(
                body.scrollWidth, body.offsetWidth,
                doc.clientWidth, doc.scrollWidth, doc.offsetWidth
            ),
            totalHeight: Math.max(
                body.scrollHeight, body.offsetHeight,
                doc.clientHeight, doc.scrollHeight, doc.offsetHeight
            ),
            viewportWidth: window.innerWidth,
            viewportHeight: window.innerHeight,
            devicePixelRatio: window.devicePixelRatio || 1
        };
    })())
"#;

const COLLECT_FIXED_SCRIPT: &str = r#"
    (() => {
        const records = [];
        for (const el of document.querySelectorAll('*')) {
            const style = window.getComputedStyle(el);
            if (style.position === 'fixed' || style.position === 'sticky') {
                records.push({ el: el, visibility: el.style.visibility });
            }
        }
        window.__scrollshotFixed = records;
        return records.length;
    })()
"#;

const HIDE_FIXED_SCRIPT: &str = r#"
    (() => {
        const records = window.__scrollshotFixed || [];
        for (const record of records) {
            record.el.style.visibility = 'hidden';
        }
        return records.length;
    })()
"#;

const RESTORE_FIXED_SCRIPT: &str = r#"
    (() => {
        const records = window.__scrollshotFixed || [];
        for (const record of records) {
            record.el.style.visibility = record.visibility;
        }
        delete window.__scrollshotFixed;
        return records.length;
    })()
"#;

/// Scrollbars are hidden via scrollbar-width and a webkit pseudo-element
/// style. overflow:hidden is avoided because it breaks scrollTo() on some
/// pages.
const HIDE_SCROLLBAR_SCRIPT: &str = r#"
    (() => {
        document.documentElement.style.scrollbarWidth = 'none';
        const style = document.createElement('style');
        style.id = 'scrollshot-hide-scrollbar';
        style.textContent = '::-webkit-scrollbar { display: none !important; }';
        document.head.appendChild(style);
        return true;
    })()
"#;

const RESTORE_SCROLLBAR_SCRIPT: &str = r#"
    (() => {
        document.documentElement.style.scrollbarWidth = '';
        const style = document.getElementById('scrollshot-hide-scrollbar');
        if (style) {
            style.remove();
        }
        return true;
    })()
"#;

#[async_trait]
impl CapturePage for PageHandle {
    async fn measure_geometry(&self) -> Result<PageGeometry> {
        let json: String = self
            .inner()
            .evaluate(GEOMETRY_SCRIPT)
            .await
            .map_err(|e| CaptureError::ScriptFailed(e.to_string()))?
            .into_value()
            .map_err(|e| CaptureError::ScriptFailed(e.to_string()))?;

        let geometry: PageGeometry = serde_json::from_str(&json)?;
        debug!(
            "Measured geometry: {}x{} css px, viewport {}x{}, dpr {}",
            geometry.total_width,
            geometry.total_height,
            geometry.viewport_width,
            geometry.viewport_height,
            geometry.device_pixel_ratio
        );
        Ok(geometry)
    }

    async fn scroll_offset(&self) -> Result<f64> {
        self.inner()
            .evaluate("window.scrollY")
            .await
            .map_err(|e| CaptureError::ScrollFailed(e.to_string()))?
            .into_value()
            .map_err(|e| Error::from(CaptureError::ScrollFailed(e.to_string())))
    }

    async fn scroll_to(&self, y: f64) -> Result<()> {
        let script = format!("window.scrollTo({{ top: {y}, left: 0, behavior: 'instant' }})");
        self.inner()
            .evaluate(script.as_str())
            .await
            .map_err(|e| CaptureError::ScrollFailed(e.to_string()))?;
        Ok(())
    }

    async fn collect_fixed_elements(&self) -> Result<usize> {
        let count: usize = self
            .inner()
            .evaluate(COLLECT_FIXED_SCRIPT)
            .await
            .map_err(|e| CaptureError::ScriptFailed(e.to_string()))?
            .into_value()
            .map_err(|e| Error::from(CaptureError::ScriptFailed(e.to_string())))?;
        debug!("Recorded {count} fixed/sticky elements");
        Ok(count)
    }

    async fn hide_fixed_elements(&self) -> Result<()> {
        self.inner()
            .evaluate(HIDE_FIXED_SCRIPT)
            .await
            .map_err(|e| CaptureError::ScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn restore_fixed_elements(&self) -> Result<()> {
        self.inner()
            .evaluate(RESTORE_FIXED_SCRIPT)
            .await
            .map_err(|e| CaptureError::ScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn hide_scrollbar(&self) -> Result<()> {
        self.inner()
            .evaluate(HIDE_SCROLLBAR_SCRIPT)
            .await
            .map_err(|e| CaptureError::ScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn restore_scrollbar(&self) -> Result<()> {
        self.inner()
            .evaluate(RESTORE_SCROLLBAR_SCRIPT)
            .await
            .map_err(|e| CaptureError::ScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn capture_viewport(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .from_surface(true)
            .capture_beyond_viewport(false)
            .build();

        let data = self
            .inner()
            .screenshot(params)
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;

        debug!("Captured viewport tile: {} bytes", data.len());
        Ok(data)
    }
}
