//! PDF rendering helpers over pdfium.
//!
//! All rendering runs on blocking threads (pdfium wraps a C++ library with
//! thread-local state and must never run on async worker threads). Every
//! worker binds pdfium and reopens the document from the shared byte buffer
//! itself — pdfium document handles cannot cross task boundaries, so the
//! bytes travel instead.
//!
//! Region crops work in two steps: render the full page at the requested
//! scale once, then cut pixel windows out of it. The crop scale is derived
//! from the *actual* rendered width rather than the requested one, so
//! integer rounding in the renderer never drifts the geometry.

use crate::config::BoxRect;
use crate::error::ExtractError;
use image::DynamicImage;
use pdfium_render::prelude::*;

/// Render scale for local-OCR and photo region crops (400 DPI).
pub const OCR_RENDER_SCALE: f32 = 400.0 / 72.0;

/// Render scale for direct cloud region calls (300 DPI).
pub const REGION_RENDER_SCALE: f32 = 300.0 / 72.0;

/// Bind to a pdfium library: `PDFIUM_LIB_PATH` first, then the system
/// library, then the working directory.
pub fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    if let Ok(dir) = std::env::var("PDFIUM_LIB_PATH") {
        if !dir.is_empty() {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            {
                return Ok(Pdfium::new(bindings));
            }
        }
    }

    Pdfium::bind_to_system_library()
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&"./"))
        })
        .map(Pdfium::new)
        .map_err(|e| ExtractError::PdfiumBindingFailed(e.to_string()))
}

/// Open a document from in-memory bytes.
pub fn load_document<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
) -> Result<PdfDocument<'a>, ExtractError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ExtractError::CorruptPdf {
            detail: format!("{e:?}"),
        })
}

/// Rasterise a full page at `scale` pixels per point.
pub fn render_page(page: &PdfPage<'_>, scale: f32) -> Result<DynamicImage, ExtractError> {
    let width_px = (page.width().value * scale).round().max(1.0) as i32;
    let render_config = PdfRenderConfig::new().set_target_width(width_px);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ExtractError::Internal(format!("page render failed: {e:?}")))?;

    Ok(bitmap.as_image())
}

/// Cut a region (page points, top-left origin) out of a rendered page.
///
/// Returns `None` for degenerate or fully out-of-bounds regions — the
/// caller treats that exactly like an empty extraction.
pub fn crop_region(
    page_image: &DynamicImage,
    region: &BoxRect,
    page_width_points: f32,
) -> Option<DynamicImage> {
    if page_width_points <= 0.0 || region.width <= 0.0 || region.height <= 0.0 {
        return None;
    }

    let scale = page_image.width() as f32 / page_width_points;
    let x = (region.x * scale).max(0.0) as u32;
    let y = (region.y * scale).max(0.0) as u32;
    if x >= page_image.width() || y >= page_image.height() {
        return None;
    }

    let width = ((region.width * scale) as u32).min(page_image.width() - x);
    let height = ((region.height * scale) as u32).min(page_image.height() - y);
    if width == 0 || height == 0 {
        return None;
    }

    Some(page_image.crop_imm(x, y, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn page_image() -> DynamicImage {
        // 600×800 px render of a 300×400 pt page → scale 2.0.
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(600, 800, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn crop_maps_points_to_pixels() {
        let img = page_image();
        let region = BoxRect::new(10.0, 20.0, 100.0, 50.0);
        let crop = crop_region(&img, &region, 300.0).unwrap();
        assert_eq!(crop.width(), 200);
        assert_eq!(crop.height(), 100);
    }

    #[test]
    fn crop_clamps_to_page_bounds() {
        let img = page_image();
        let region = BoxRect::new(250.0, 350.0, 100.0, 100.0);
        let crop = crop_region(&img, &region, 300.0).unwrap();
        assert_eq!(crop.width(), 100);
        assert_eq!(crop.height(), 100);
    }

    #[test]
    fn degenerate_regions_yield_nothing() {
        let img = page_image();
        assert!(crop_region(&img, &BoxRect::new(0.0, 0.0, 0.0, 10.0), 300.0).is_none());
        assert!(crop_region(&img, &BoxRect::new(0.0, 0.0, 10.0, -5.0), 300.0).is_none());
        assert!(crop_region(&img, &BoxRect::new(400.0, 0.0, 10.0, 10.0), 300.0).is_none());
    }
}
