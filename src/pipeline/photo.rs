//! Photo extraction helpers: blank detection, enhancement, quality scoring,
//! JPEG encoding.
//!
//! Grid slots without a registered voter leave the photo box blank (or as a
//! uniform grey placeholder). Pixel variance separates the two cases cheaply:
//! a real photograph of a face has far more variance than an empty box, so
//! anything under the threshold is treated as "no usable photo" rather than
//! encoded and shipped.

use crate::error::ExtractError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;

/// Photos with confidence below this are treated as blank cells.
pub const MIN_PHOTO_CONFIDENCE: f32 = 0.3;

/// JPEG quality for encoded photos.
pub const JPEG_QUALITY: u8 = 85;

/// Confidence that the region actually contains a photograph, from the
/// grey-level pixel variance. Tiered rather than continuous: the interesting
/// boundary is blank vs. not-blank, not a precise ranking.
pub fn photo_confidence(image: &DynamicImage) -> f32 {
    let gray = image.to_luma8();
    if gray.is_empty() {
        return 0.0;
    }

    let n = gray.len() as f64;
    let mean = gray.iter().map(|&p| p as f64).sum::<f64>() / n;
    let variance = gray.iter().map(|&p| (p as f64 - mean).powi(2)).sum::<f64>() / n;

    match variance {
        v if v < 100.0 => 0.1,
        v if v < 500.0 => 0.5,
        v if v < 1000.0 => 0.7,
        _ => 0.9,
    }
}

/// Quality score in `[0, 1]`: half contrast (grey-level spread), half
/// resolution (pixel count against a nominal photo size).
pub fn quality_score(image: &DynamicImage) -> f32 {
    let gray = image.to_luma8();
    if gray.is_empty() {
        return 0.0;
    }

    let n = gray.len() as f64;
    let mean = gray.iter().map(|&p| p as f64).sum::<f64>() / n;
    let std_dev = (gray.iter().map(|&p| (p as f64 - mean).powi(2)).sum::<f64>() / n).sqrt();

    let contrast_score = (std_dev / 128.0).min(1.0);
    let size_score = ((image.width() * image.height()) as f64 / 50_000.0).min(1.0);

    ((contrast_score * 0.5 + size_score * 0.5) as f32).clamp(0.0, 1.0)
}

/// Mild brightness / contrast / sharpness boost for scanned photos.
pub fn enhance(image: &DynamicImage) -> DynamicImage {
    image.brighten(12).adjust_contrast(20.0).unsharpen(1.0, 4)
}

/// Encode as base64 JPEG for the record payload.
pub fn encode_jpeg_base64(image: &DynamicImage) -> Result<String, ExtractError> {
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ExtractError::Internal(format!("photo encode: {e}")))?;
    Ok(STANDARD.encode(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn flat_image(value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 150, Rgb([value, value, value])))
    }

    fn noisy_image() -> DynamicImage {
        let mut img = image::GrayImage::new(120, 150);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            // Deterministic high-variance checker pattern.
            *pixel = Luma([if (x + y) % 2 == 0 { 10 } else { 240 }]);
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn blank_region_scores_below_threshold() {
        assert!(photo_confidence(&flat_image(255)) < MIN_PHOTO_CONFIDENCE);
        assert!(photo_confidence(&flat_image(128)) < MIN_PHOTO_CONFIDENCE);
    }

    #[test]
    fn textured_region_scores_above_threshold() {
        assert!(photo_confidence(&noisy_image()) >= MIN_PHOTO_CONFIDENCE);
    }

    #[test]
    fn quality_score_stays_in_unit_range() {
        for img in [flat_image(0), flat_image(255), noisy_image()] {
            let q = quality_score(&img);
            assert!((0.0..=1.0).contains(&q), "score out of range: {q}");
        }
        assert!(quality_score(&noisy_image()) > quality_score(&flat_image(128)));
    }

    #[test]
    fn encode_produces_valid_base64_jpeg() {
        let b64 = encode_jpeg_base64(&noisy_image()).unwrap();
        let bytes = STANDARD.decode(&b64).expect("valid base64");
        // JPEG SOI marker.
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
