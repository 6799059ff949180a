//! PNG export
//!
//! Lossless serialization of the composited bitmap at its native
//! device-pixel dimensions.

use crate::error::{ExportError, Result};
use crate::export::filename;
use crate::export::sink::SaveSink;
use chrono::Utc;
use image::RgbaImage;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{info, instrument};

/// PNG export adapter.
pub struct PngExporter;

impl PngExporter {
    /// Encode `bitmap` as PNG and deliver it via `sink`, named after the
    /// page title.
    #[instrument(skip(bitmap, sink))]
    pub fn export(bitmap: &RgbaImage, title: &str, sink: &dyn SaveSink) -> Result<PathBuf> {
        info!(
            "Exporting {}x{} bitmap as PNG",
            bitmap.width(),
            bitmap.height()
        );
        let bytes = Self::encode(bitmap)?;
        let suggested = filename::suggested_path(title, Utc::now(), "png");
        sink.deliver(&bytes, &suggested, false)
    }

    /// Lossless PNG encoding.
    pub fn encode(bitmap: &RgbaImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        bitmap
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| ExportError::PngEncodeFailed(e.to_string()))?;
        Ok(bytes)
    }
}
