//! Page-level annotation pre-pass and page-level field extraction.
//!
//! Cloud OCR is billed and rate-limited per call, so the pipeline makes
//! exactly one page-batch call per physical page — never one per cell. The
//! pre-pass renders each page once at a fixed 2× scale, asks the vision
//! provider for every text span with its bounding box, and caches the result.
//! Cell workers then answer their lookups with pure in-memory intersection
//! queries against the cache.
//!
//! The pre-pass is strictly sequential and completes for *all* pages before
//! any cell dispatch begins; concurrent cells can therefore never race each
//! other into redundant calls. A page whose annotation fails simply has no
//! cache entry — its cells fall back to text-layer / local-OCR strategies
//! and the run continues.

use crate::config::{BoxRect, CellTemplate};
use crate::normalize::{collapse_whitespace, devanagari};
use crate::pipeline::{ocr, render, text_layer};
use crate::providers::{PageAnnotations, VisionProvider};
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fixed render scale for the page-batch annotation call. Cache queries in
/// PDF points are multiplied by this factor to reach annotation pixel space.
pub const ANNOTATION_RENDER_SCALE: f32 = 2.0;

/// Annotate every page in `start..end`, one provider call per page.
pub fn build_page_cache(
    document: &PdfDocument<'_>,
    start: usize,
    end: usize,
    vision: Option<&Arc<dyn VisionProvider>>,
) -> HashMap<usize, Arc<PageAnnotations>> {
    let mut cache = HashMap::new();
    let Some(vision) = vision else {
        return cache;
    };

    info!("annotating pages {}..{} (one call per page)", start + 1, end);
    let pages = document.pages();

    for page_num in start..end {
        let page = match pages.get(page_num as u16) {
            Ok(p) => p,
            Err(e) => {
                warn!("page {}: cannot open for annotation: {e:?}", page_num + 1);
                continue;
            }
        };
        let image = match render::render_page(&page, ANNOTATION_RENDER_SCALE) {
            Ok(img) => img,
            Err(e) => {
                warn!("page {}: annotation render failed: {e}", page_num + 1);
                continue;
            }
        };
        match vision.annotate_page(&image, &ocr::SCRIPT_HINTS) {
            Ok(annotations) if annotations.is_usable() => {
                debug!(
                    "page {}: {} spans cached",
                    page_num + 1,
                    annotations.spans.len()
                );
                cache.insert(page_num, Arc::new(annotations));
            }
            Ok(_) => warn!("page {}: annotation returned no spans", page_num + 1),
            Err(e) => warn!("page {}: annotation failed: {e}", page_num + 1),
        }
    }

    info!("annotation pre-pass complete: {}/{} pages cached", cache.len(), end - start);
    cache
}

/// Fields that appear once per page (in the header strip), not per cell.
#[derive(Debug, Clone, Default)]
pub struct PageFields {
    pub booth_center: String,
    pub booth_address: String,
}

/// Extract the page-level fields from the header area of one page.
///
/// Booth center falls back to the text layer when no annotation text is
/// found; booth address is annotation/vision-only, no text-layer fallback.
pub fn extract_page_fields(
    page: &PdfPage<'_>,
    template: &CellTemplate,
    skip_header_height: f32,
    annotations: Option<&PageAnnotations>,
    vision: Option<&Arc<dyn VisionProvider>>,
) -> PageFields {
    let mut fields = PageFields::default();

    let offset = |b: &BoxRect| BoxRect::new(b.x, skip_header_height + b.y, b.width, b.height);

    if let Some(b) = &template.booth_center_box {
        fields.booth_center =
            extract_header_region(page, &offset(b), annotations, vision, true);
    }
    if let Some(b) = &template.booth_address_box {
        fields.booth_address =
            extract_header_region(page, &offset(b), annotations, vision, false);
    }

    fields
}

fn extract_header_region(
    page: &PdfPage<'_>,
    region: &BoxRect,
    annotations: Option<&PageAnnotations>,
    vision: Option<&Arc<dyn VisionProvider>>,
    text_layer_fallback: bool,
) -> String {
    // Cached annotations first — no network involved.
    if let Some(ann) = annotations.filter(|a| a.is_usable()) {
        if let Some(text) = ann.query(region, ANNOTATION_RENDER_SCALE) {
            return devanagari::correct_text(&collapse_whitespace(&text));
        }
    } else if let Some(vision) = vision {
        // No usable cache for this page: a direct region call is allowed.
        if let Ok(page_image) = render::render_page(page, render::REGION_RENDER_SCALE) {
            if let Some(crop) = render::crop_region(&page_image, region, page.width().value) {
                match vision.annotate_region(&crop, &ocr::SCRIPT_HINTS) {
                    Ok(result) => {
                        let text = collapse_whitespace(&result.text);
                        if !text.is_empty() {
                            return devanagari::correct_text(&text);
                        }
                    }
                    Err(e) => debug!("header region call failed: {e}"),
                }
            }
        }
    }

    if text_layer_fallback {
        let text = collapse_whitespace(&text_layer::read_text(page, region));
        if !text.is_empty() {
            return devanagari::correct_text(&text);
        }
    }

    String::new()
}
