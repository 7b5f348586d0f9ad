//! Embedded text-layer extraction.
//!
//! The fastest and most accurate strategy: when the PDF carries native text,
//! no recognition is needed at all. pdfium exposes per-character bounding
//! boxes; a region read collects every character whose box overlaps the
//! query rectangle, in content-stream order (which is reading order on
//! these rolls).
//!
//! Page coordinates in this crate are top-left-origin points (matching the
//! grid configuration); pdfium's text space is bottom-left-origin, so the
//! query rectangle is flipped here and nowhere else.

use crate::config::BoxRect;
use pdfium_render::prelude::*;

/// Read the native text inside `region` (page points, top-left origin).
///
/// Returns an empty string when the page has no text layer or the region
/// contains none — never an error, the strategy chain just moves on.
pub fn read_text(page: &PdfPage<'_>, region: &BoxRect) -> String {
    let text_page = match page.text() {
        Ok(t) => t,
        Err(_) => return String::new(),
    };

    let page_height = page.height().value;
    let left = region.x;
    let right = region.x + region.width;
    let top = page_height - region.y;
    let bottom = page_height - (region.y + region.height);

    let mut out = String::new();
    for ch in text_page.chars().iter() {
        let bounds = match ch.loose_bounds() {
            Ok(b) => b,
            Err(_) => continue,
        };
        let overlaps = bounds.left().value < right
            && bounds.right().value > left
            && bounds.bottom().value < top
            && bounds.top().value > bottom;
        if overlaps {
            if let Some(s) = ch.unicode_string() {
                out.push_str(&s);
            }
        }
    }

    out.trim().to_string()
}
