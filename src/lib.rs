//! Scrollshot - Full-Page Screenshots via Scroll-and-Stitch Capture
//!
//! This crate captures an entire scrollable web page as one seamless image
//! by walking the page in overlapping viewport-sized steps through a live
//! browser (CDP), then compositing the captured tiles into a single bitmap
//! exported as PNG or a single-page PDF.
//!
//! # Features
//!
//! - **Capture Sequencer**: scroll-driven tile capture that copes with
//!   browser scroll clamping, fixed/sticky UI and settling delays
//! - **Tile Compositor**: seam-corrected stitching from recorded offsets,
//!   device-pixel aware
//! - **Exporters**: lossless PNG or page-fitted PDF, named from the page
//!   title
//! - **Browser Control**: headless browser lifecycle and navigation via
//!   ChromiumOxide (CDP)
//!
//! # Architecture
//!
//! ```text
//! CLI ──▶ Pipeline ──▶ Capture Sequencer ──▶ CapturePage (CDP)
//!             │               │
//!             │               ▼
//!             │         CaptureSession (ordered tiles + geometry)
//!             │               │
//!             ▼               ▼
//!        Stage updates   Tile Compositor ──▶ PNG / PDF Exporter ──▶ SaveSink
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use scrollshot::browser::BrowserController;
//! use scrollshot::capture::CaptureSequencer;
//! use scrollshot::export::DirectorySink;
//! use scrollshot::pipeline::{OutputFormat, ScreenshotPipeline};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let browser = BrowserController::new().await?;
//!     let page = browser.navigate("https://example.com").await?;
//!
//!     let pipeline = ScreenshotPipeline::new(
//!         CaptureSequencer::new(),
//!         Arc::new(DirectorySink::new(".")),
//!     );
//!     let saved = pipeline.capture(&page, "example", OutputFormat::Png).await?;
//!
//!     println!("Saved: {}", saved.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod browser;
pub mod capture;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod stitch;

// Re-exports for convenience
pub use browser::BrowserController;
pub use capture::{CapturePage, CaptureSequencer, CaptureSession, PageGeometry, Tile};
pub use error::{Error, Result};
pub use pipeline::{CaptureStage, OutputFormat, ScreenshotPipeline};
pub use stitch::TileCompositor;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
