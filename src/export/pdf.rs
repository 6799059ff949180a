//! PDF export
//!
//! Wraps the composited bitmap in a single-page PDF sized to a fixed
//! reference width, preserving aspect ratio. The bitmap goes through a
//! JPEG re-encode first, which keeps huge pages from producing huge
//! documents.

use crate::error::{ExportError, Result};
use crate::export::filename;
use crate::export::sink::SaveSink;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use printpdf::{ColorBits, ColorSpace, ImageTransform, ImageXObject, Mm, PdfDocument, Pt, Px};
use std::io::{BufWriter, Cursor};
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Reference page width: A4 at 72 dpi, in points.
const PAGE_WIDTH_PT: f64 = 595.28;

/// Minimum page height: A4 at 72 dpi, in points.
const MIN_PAGE_HEIGHT_PT: f64 = 841.89;

/// Quality for the lossy re-encode of the bitmap.
const JPEG_QUALITY: u8 = 92;

/// PDF export adapter.
pub struct PdfExporter;

impl PdfExporter {
    /// Encode `bitmap` into a one-page PDF and deliver it via `sink`,
    /// named after the page title.
    #[instrument(skip(bitmap, sink))]
    pub fn export(bitmap: &RgbaImage, title: &str, sink: &dyn SaveSink) -> Result<PathBuf> {
        info!(
            "Exporting {}x{} bitmap as PDF",
            bitmap.width(),
            bitmap.height()
        );
        let bytes = Self::encode(bitmap)?;
        let suggested = filename::suggested_path(title, Utc::now(), "pdf");
        sink.deliver(&bytes, &suggested, false)
    }

    /// Build the PDF document bytes.
    pub fn encode(bitmap: &RgbaImage) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgba8(bitmap.clone()).to_rgb8();
        let (width, height) = rgb.dimensions();

        // Lossy step: the embedded pixels carry JPEG artifacts, not the
        // original lossless data.
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut Cursor::new(&mut jpeg), JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| ExportError::PdfEncodeFailed(format!("JPEG encode: {e}")))?;
        let embedded = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg)
            .map_err(|e| ExportError::PdfEncodeFailed(format!("JPEG decode: {e}")))?
            .to_rgb8();

        let (page_width, page_height, scale) = Self::page_layout(width, height);
        let scaled_height = f64::from(height) * scale;
        debug!(
            "PDF page {page_width:.2}x{page_height:.2}pt, image scale {scale:.4}"
        );

        let (doc, page_index, layer_index) = PdfDocument::new(
            crate::NAME,
            Mm::from(Pt(page_width)),
            Mm::from(Pt(page_height)),
            "Page image",
        );

        let xobject = ImageXObject {
            width: Px(width as usize),
            height: Px(height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: embedded.into_raw(),
            image_filter: None,
            clipping_bbox: None,
        };
        let pdf_image = printpdf::Image::from(xobject);

        // PDF origin is bottom-left; anchor the image at the top of the page.
        let layer = doc.get_page(page_index).get_layer(layer_index);
        pdf_image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm::from(Pt(0.0))),
                translate_y: Some(Mm::from(Pt(page_height - scaled_height))),
                scale_x: Some(scale),
                scale_y: Some(scale),
                // 1 px = 1 pt before scaling
                dpi: Some(72.0),
                ..Default::default()
            },
        );

        let mut bytes = Vec::new();
        doc.save(&mut BufWriter::new(&mut bytes))
            .map_err(|e| ExportError::PdfEncodeFailed(e.to_string()))?;
        Ok(bytes)
    }

    /// Page rectangle (points) and image scale factor for a bitmap of the
    /// given pixel dimensions.
    ///
    /// The image is scaled to the fixed reference width. Tall results get a
    /// portrait page stretched to the scaled image height; short, wide
    /// results get a landscape page at the reference dimensions.
    fn page_layout(width: u32, height: u32) -> (f64, f64, f64) {
        let scale = PAGE_WIDTH_PT / f64::from(width);
        let scaled_height = f64::from(height) * scale;
        let long_side = MIN_PAGE_HEIGHT_PT.max(scaled_height);

        if scaled_height > PAGE_WIDTH_PT {
            // portrait
            (PAGE_WIDTH_PT, long_side, scale)
        } else {
            // landscape
            (long_side, PAGE_WIDTH_PT, scale)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_page_layout_tall_image_is_portrait() {
        let (w, h, scale) = PdfExporter::page_layout(1000, 5000);
        assert_eq!(w, PAGE_WIDTH_PT);
        // scaled height: 5000 * 0.59528 = 2976.4 > 841.89
        assert!((h - 2976.4).abs() < 0.1);
        assert!((scale - 0.59528).abs() < 1e-6);
    }

    #[test]
    fn test_page_layout_tall_but_short_image_keeps_min_height() {
        // Scaled height above the page width but under A4 height.
        let (w, h, _) = PdfExporter::page_layout(1000, 1200);
        assert_eq!(w, PAGE_WIDTH_PT);
        assert_eq!(h, MIN_PAGE_HEIGHT_PT);
    }

    #[test]
    fn test_page_layout_wide_image_is_landscape() {
        // Scaled height: 400 * 0.59528 = 238.1 <= 595.28 -> landscape
        let (w, h, _) = PdfExporter::page_layout(1000, 400);
        assert_eq!(w, MIN_PAGE_HEIGHT_PT);
        assert_eq!(h, PAGE_WIDTH_PT);
    }

    #[test]
    fn test_encode_produces_pdf_header() {
        let bitmap = RgbaImage::from_pixel(20, 30, Rgba([120, 10, 200, 255]));
        let bytes = PdfExporter::encode(&bitmap).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_delivers_pdf_under_screenshots() {
        let dir = tempfile::tempdir().unwrap();
        let sink = crate::export::sink::DirectorySink::new(dir.path());
        let bitmap = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));

        let path = PdfExporter::export(&bitmap, "Doc: Review?", &sink).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("Doc_Review_"));
        assert!(name.ends_with(".pdf"));
    }
}
