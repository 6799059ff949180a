//! Export adapters
//!
//! Consume the composited bitmap and deliver it as a PNG or a single-page
//! PDF, with filenames derived from the page title.

pub mod filename;
pub mod pdf;
pub mod png;
pub mod sink;

pub use filename::{sanitize_title, suggested_path, timestamp_slug};
pub use pdf::PdfExporter;
pub use png::PngExporter;
pub use sink::{DirectorySink, SaveSink};
