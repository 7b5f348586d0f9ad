//! Local-OCR preprocessing.
//!
//! Recognition quality on 400 DPI crops improves markedly with a standard
//! cleanup pass before the engine sees the pixels: grayscale, contrast
//! stretch, sharpening, then a small median filter to knock out scan noise
//! without blurring glyph edges.

use image::DynamicImage;
use imageproc::filter::median_filter;

/// Language hints passed to recognisers on these rolls.
pub const SCRIPT_HINTS: [&str; 2] = ["en", "hi"];

/// Prepare a region crop for text recognition.
pub fn preprocess_for_ocr(image: &DynamicImage) -> DynamicImage {
    let enhanced = image.grayscale().adjust_contrast(60.0).unsharpen(1.2, 3);
    let denoised = median_filter(&enhanced.to_luma8(), 1, 1);
    DynamicImage::ImageLuma8(denoised)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn preprocess_keeps_dimensions_and_goes_grayscale() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 30, Rgb([200, 100, 50])));
        let processed = preprocess_for_ocr(&img);
        assert_eq!(processed.width(), 80);
        assert_eq!(processed.height(), 30);
        assert!(matches!(processed, DynamicImage::ImageLuma8(_)));
    }
}
