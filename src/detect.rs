//! Contour-based box detection.
//!
//! An optional helper for rolls arriving without a grid template: detect the
//! ruled cell borders on a rendered page and organise them into a grid the
//! operator can confirm. This is an auxiliary path — the main pipeline runs
//! on operator-supplied geometry and never calls into here on its own.
//!
//! The detection chain is the classic one: grayscale → blur → inverted
//! binarisation (dark rules become foreground) → morphological close →
//! contours → area/aspect filtering.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One detected rectangular region, in pixels of the analysed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub area: u32,
    pub confidence: f32,
}

/// Boxes organised into rows, with the overall boundary.
#[derive(Debug, Clone, Default)]
pub struct DetectedGrid {
    pub rows: usize,
    pub columns: usize,
    pub grid: Vec<Vec<DetectedBox>>,
    pub boundary: Option<DetectedBox>,
}

/// Computer-vision cell-border detector.
#[derive(Debug, Clone)]
pub struct BoxDetector {
    /// Minimum area for a valid box (px²).
    pub min_box_area: u32,
    /// Maximum area for a valid box (px²).
    pub max_box_area: u32,
    /// Minimum width/height ratio.
    pub aspect_ratio_min: f32,
    /// Maximum width/height ratio.
    pub aspect_ratio_max: f32,
}

impl Default for BoxDetector {
    fn default() -> Self {
        Self {
            min_box_area: 5_000,
            max_box_area: 500_000,
            aspect_ratio_min: 0.3,
            aspect_ratio_max: 3.0,
        }
    }
}

impl BoxDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect candidate cell boxes in a rendered page image.
    ///
    /// Returns boxes sorted top-to-bottom, left-to-right.
    pub fn detect_boxes(&self, image: &DynamicImage) -> Vec<DetectedBox> {
        let gray = image.to_luma8();
        if gray.width() < 8 || gray.height() < 8 {
            return Vec::new();
        }

        let blurred = gaussian_blur_f32(&gray, 1.4);
        // Dark rules must be foreground for the contour pass.
        let mut inverted = GrayImage::new(blurred.width(), blurred.height());
        for (x, y, pixel) in blurred.enumerate_pixels() {
            inverted.put_pixel(x, y, Luma([if pixel[0] < 128 { 255 } else { 0 }]));
        }
        let closed = close(&inverted, Norm::LInf, 1);

        let mut boxes: Vec<DetectedBox> = Vec::new();
        for contour in find_contours::<i32>(&closed) {
            if contour.border_type != BorderType::Outer || contour.points.is_empty() {
                continue;
            }

            let min_x = contour.points.iter().map(|p| p.x).min().unwrap_or(0).max(0) as u32;
            let min_y = contour.points.iter().map(|p| p.y).min().unwrap_or(0).max(0) as u32;
            let max_x = contour.points.iter().map(|p| p.x).max().unwrap_or(0).max(0) as u32;
            let max_y = contour.points.iter().map(|p| p.y).max().unwrap_or(0).max(0) as u32;
            let width = max_x.saturating_sub(min_x);
            let height = max_y.saturating_sub(min_y);
            let area = width * height;

            if area < self.min_box_area || area > self.max_box_area {
                continue;
            }
            let aspect = if height > 0 {
                width as f32 / height as f32
            } else {
                0.0
            };
            if aspect < self.aspect_ratio_min || aspect > self.aspect_ratio_max {
                continue;
            }

            // A clean rectangle traces roughly its bounding-box perimeter;
            // ragged blobs trace much more or much less.
            let perimeter = 2 * (width + height);
            let confidence = if perimeter > 0 {
                (contour.points.len() as f32 / perimeter as f32).min(1.0)
            } else {
                0.0
            };

            boxes.push(DetectedBox {
                x: min_x,
                y: min_y,
                width,
                height,
                area,
                confidence,
            });
        }

        boxes.sort_by_key(|b| (b.y, b.x));
        debug!("detected {} candidate boxes", boxes.len());
        boxes
    }

    /// Group detected boxes into rows (within `tolerance` px vertically)
    /// and report the modal column count and overall boundary.
    pub fn organize_into_grid(&self, boxes: &[DetectedBox], tolerance: u32) -> DetectedGrid {
        if boxes.is_empty() {
            return DetectedGrid::default();
        }

        let mut sorted: Vec<DetectedBox> = boxes.to_vec();
        sorted.sort_by_key(|b| (b.y, b.x));

        let mut rows: Vec<Vec<DetectedBox>> = Vec::new();
        let mut current: Vec<DetectedBox> = vec![sorted[0]];
        let mut current_y = sorted[0].y;

        for b in sorted.into_iter().skip(1) {
            if b.y.abs_diff(current_y) <= tolerance {
                current.push(b);
            } else {
                current.sort_by_key(|b| b.x);
                rows.push(std::mem::take(&mut current));
                current.push(b);
                current_y = b.y;
            }
        }
        if !current.is_empty() {
            current.sort_by_key(|b| b.x);
            rows.push(current);
        }

        let mut length_counts: HashMap<usize, usize> = HashMap::new();
        for row in &rows {
            *length_counts.entry(row.len()).or_default() += 1;
        }
        let columns = length_counts
            .into_iter()
            .max_by_key(|&(len, count)| (count, len))
            .map(|(len, _)| len)
            .unwrap_or(0);

        let min_x = boxes.iter().map(|b| b.x).min().unwrap_or(0);
        let min_y = boxes.iter().map(|b| b.y).min().unwrap_or(0);
        let max_x2 = boxes.iter().map(|b| b.x + b.width).max().unwrap_or(0);
        let max_y2 = boxes.iter().map(|b| b.y + b.height).max().unwrap_or(0);
        let boundary = DetectedBox {
            x: min_x,
            y: min_y,
            width: max_x2 - min_x,
            height: max_y2 - min_y,
            area: (max_x2 - min_x) * (max_y2 - min_y),
            confidence: 1.0,
        };

        DetectedGrid {
            rows: rows.len(),
            columns,
            grid: rows,
            boundary: Some(boundary),
        }
    }
}
