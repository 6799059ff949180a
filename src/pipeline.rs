//! End-to-end capture pipeline
//!
//! One capture request runs capture -> stitch -> export in sequence, with
//! stage reporting for user-facing status and a lockout that rejects a
//! second request while one is in flight.

use crate::capture::{CapturePage, CaptureSequencer};
use crate::error::{CaptureError, Error, Result};
use crate::export::{PdfExporter, PngExporter, SaveSink};
use crate::stitch::TileCompositor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task;
use tracing::{info, instrument};

/// Output format for a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG at device-pixel dimensions
    #[default]
    Png,
    /// Single-page PDF with the bitmap scaled to a reference page width
    Pdf,
}

impl OutputFormat {
    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }
}

/// Pipeline phase, reported to the stage observer as it begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    /// Scroll-and-capture is running
    Capturing,
    /// Tiles are being composited
    Stitching,
    /// The output is being encoded and delivered
    PreparingDownload,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            CaptureStage::Capturing => "Capturing full page...",
            CaptureStage::Stitching => "Stitching screenshots together...",
            CaptureStage::PreparingDownload => "Preparing download...",
        };
        f.write_str(message)
    }
}

/// Callback receiving stage transitions.
pub type StageObserver = Arc<dyn Fn(CaptureStage) + Send + Sync>;

/// Orchestrates one capture request end to end.
pub struct ScreenshotPipeline {
    sequencer: CaptureSequencer,
    sink: Arc<dyn SaveSink>,
    observer: Option<StageObserver>,
    in_flight: AtomicBool,
}

impl ScreenshotPipeline {
    /// Create a pipeline from a sequencer and a delivery sink.
    pub fn new(sequencer: CaptureSequencer, sink: Arc<dyn SaveSink>) -> Self {
        Self {
            sequencer,
            sink,
            observer: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Attach a stage observer for user-facing status updates.
    pub fn with_observer(mut self, observer: StageObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Whether a capture session is currently running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run capture -> stitch -> export for one page and return the saved
    /// path. Fails fast with [`CaptureError::SessionInProgress`] if another
    /// request is already running; the lockout is released on every exit
    /// path.
    #[instrument(skip(self, page, title))]
    pub async fn capture(
        &self,
        page: &dyn CapturePage,
        title: &str,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        let _guard = self.acquire_trigger()?;

        self.notify(CaptureStage::Capturing);
        let session = self.sequencer.run(page).await?;

        self.notify(CaptureStage::Stitching);
        let bitmap = task::spawn_blocking(move || TileCompositor::compose(&session))
            .await
            .map_err(|e| Error::generic(format!("Stitch task failed: {e}")))??;

        self.notify(CaptureStage::PreparingDownload);
        let sink = Arc::clone(&self.sink);
        let title = title.to_string();
        let path = task::spawn_blocking(move || match format {
            OutputFormat::Png => PngExporter::export(&bitmap, &title, sink.as_ref()),
            OutputFormat::Pdf => PdfExporter::export(&bitmap, &title, sink.as_ref()),
        })
        .await
        .map_err(|e| Error::generic(format!("Export task failed: {e}")))??;

        info!("Capture session finished: {}", path.display());
        Ok(path)
    }

    fn notify(&self, stage: CaptureStage) {
        if let Some(observer) = &self.observer {
            observer(stage);
        }
    }

    fn acquire_trigger(&self) -> Result<TriggerGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CaptureError::SessionInProgress.into());
        }
        Ok(TriggerGuard {
            flag: &self.in_flight,
        })
    }
}

/// Releases the in-flight lockout when the request finishes, however it
/// finishes.
struct TriggerGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
