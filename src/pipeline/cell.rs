//! Per-cell extraction worker.
//!
//! One task = one grid cell. The task is fully self-contained: it carries
//! the raw PDF bytes (reopened here, since document handles cannot cross
//! worker boundaries), the resolved cell geometry, the read-only annotation
//! cache and the injected providers. Whatever goes wrong inside stays
//! inside — the worker returns a skip marker, never an error that could
//! abort the batch.
//!
//! Strategy order per field, first non-empty validated result wins:
//!
//! | field                         | strategies                                |
//! |-------------------------------|-------------------------------------------|
//! | voter ID                      | text layer only (strict EPIC validation)  |
//! | name / relative name          | local OCR → cached annotations (preferred)|
//! |                               | → direct region call iff no usable cache  |
//! | house no / gender / age / …   | text layer → cached annotations           |
//! | photo                         | 400 DPI crop + variance check (own path)  |

use crate::config::{BoxRect, CellTemplate, ExtractionConfig};
use crate::error::CellError;
use crate::grid::{scale_box, CellRect};
use crate::normalize::{
    clean_name_from_relative_labels, collapse_whitespace, devanagari, relative, translit, voter_id,
};
use crate::output::{ExtractedRecord, ExtractionStats, RecordMetadata};
use crate::pipeline::annotate::{PageFields, ANNOTATION_RENDER_SCALE};
use crate::pipeline::{ocr, photo, render, text_layer};
use crate::providers::{PageAnnotations, Providers};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::sync::Arc;
use tracing::{debug, warn};

/// A fully self-contained unit of work: one grid cell on one page.
#[derive(Clone)]
pub struct CellTask {
    pub pdf_bytes: Arc<Vec<u8>>,
    /// 0-indexed page number.
    pub page_num: usize,
    pub cell: CellRect,
    pub config: Arc<ExtractionConfig>,
    /// Vertical extraction band `[start, end]` in page points.
    pub band: (f32, f32),
    pub annotations: Option<Arc<PageAnnotations>>,
    pub page_fields: PageFields,
    pub providers: Providers,
}

/// Per-cell method counters, merged into the run totals at aggregation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellStats {
    pub text_layer: u32,
    pub local_ocr: u32,
    pub cloud_ocr: u32,
    pub photos: u32,
    pub photos_enhanced: u32,
}

impl CellStats {
    pub fn merge_into(&self, totals: &mut ExtractionStats) {
        totals.text_layer_fields += self.text_layer as usize;
        totals.local_ocr_fields += self.local_ocr as usize;
        totals.cloud_ocr_fields += self.cloud_ocr as usize;
        totals.photos_extracted += self.photos as usize;
        totals.photos_enhanced += self.photos_enhanced as usize;
    }
}

/// Worker result for one cell.
pub enum CellOutcome {
    /// The cell lies outside the vertical extraction band; not processed.
    OutOfBand,
    /// No usable voter ID (blank slot) or a worker failure — a normal,
    /// expected outcome, counted but never emitted.
    Skip {
        stats: CellStats,
        error: Option<CellError>,
    },
    /// A finished record.
    Record {
        record: Box<ExtractedRecord>,
        stats: CellStats,
    },
}

/// Run the full extraction chain for one cell.
pub fn run_cell(task: CellTask) -> CellOutcome {
    // Band check first: cells cut by the header/footer are skipped
    // entirely, never partially extracted.
    let (band_start, band_end) = task.band;
    if task.cell.y < band_start || task.cell.y + task.cell.height > band_end {
        return CellOutcome::OutOfBand;
    }

    let fail = |detail: String| CellOutcome::Skip {
        stats: CellStats::default(),
        error: Some(CellError::RenderFailed {
            page: task.page_num + 1,
            row: task.cell.row,
            col: task.cell.col,
            detail,
        }),
    };

    // Reopen the document from bytes — handles are not shareable.
    let pdfium = match render::bind_pdfium() {
        Ok(p) => p,
        Err(e) => return fail(e.to_string()),
    };
    let document = match render::load_document(&pdfium, &task.pdf_bytes) {
        Ok(d) => d,
        Err(e) => return fail(e.to_string()),
    };
    let pages = document.pages();
    let page = match pages.get(task.page_num as u16) {
        Ok(p) => p,
        Err(e) => return fail(format!("{e:?}")),
    };

    let mut ctx = CellContext {
        page: &page,
        page_width: page.width().value,
        cell: task.cell,
        template: &task.config.cell_template,
        annotations: task.annotations.as_deref(),
        providers: &task.providers,
        stats: CellStats::default(),
        hi_res: None,
    };

    // ── Raw extraction ───────────────────────────────────────────────────
    let (raw_voter_id, voter_id_confidence) = ctx.extract_voter_id();
    let (photo_base64, photo_quality) = ctx.extract_photo();

    let name_raw = ctx.extract_name_field(|t| t.name_box.as_ref());
    let relative_raw = ctx.extract_name_field(|t| t.relative_name_box.as_ref());
    let house_raw = ctx.extract_structured_field(|t| t.house_number_box.as_ref());
    let gender_raw = ctx.extract_structured_field(|t| t.gender_box.as_ref());
    let age_raw = ctx.extract_structured_field(|t| t.age_box.as_ref());
    let assembly_raw = ctx.extract_structured_field(|t| t.assembly_number_box.as_ref());
    let serial_raw = ctx.extract_structured_field(|t| t.serial_number_box.as_ref());
    let stats = ctx.stats;

    // ── Normalization cascade ────────────────────────────────────────────
    let name = normalize_person_name(&name_raw);
    let name = clean_name_from_relative_labels(&name);

    let relative_corrected = normalize_person_name(&relative_raw);
    let (relative_type, relative_name) = relative::extract_relative_type(&relative_corrected);

    let transliterator = task.providers.transliterator.as_deref();
    let name_english = translit::transliterate_name(&name, transliterator);
    let mut relative_name_english = translit::transliterate_name(&relative_name, transliterator);
    if let Some(colon) = relative_name_english.find(':') {
        relative_name_english = relative_name_english[colon + 1..].trim().to_string();
    }

    let house_number = devanagari::clean_house_number_field(&house_raw);
    let gender = devanagari::correct_gender_field(&gender_raw);
    let age = devanagari::clean_age_field(&age_raw);
    let assembly_number = devanagari::clean_assembly_number_field(&assembly_raw);
    let serial_number = devanagari::clean_serial_number_field(&serial_raw);

    // ── Voter-ID finalisation ────────────────────────────────────────────
    let mut voter_id_text = raw_voter_id;
    if !voter_id_text.is_empty() {
        voter_id_text = voter_id::correct_voter_id(&voter_id_text);
        if !voter_id::validate_voter_id(&voter_id_text) {
            match voter_id::find_epic_pattern(&voter_id_text) {
                Some(pattern) if voter_id::validate_voter_id(&pattern) => {
                    voter_id_text = pattern;
                }
                _ => warn!(
                    "cell [{},{}] page {}: voter ID failed validation: '{}'",
                    task.cell.row,
                    task.cell.col,
                    task.page_num + 1,
                    voter_id_text
                ),
            }
        }
    }

    // ── Skip policy ──────────────────────────────────────────────────────
    // Blank slots are normal: no ID, a sentinel, or nothing but noise.
    if voter_id::is_sentinel(&voter_id_text)
        || (voter_id_confidence <= 0.0 && photo_base64.is_empty())
    {
        return CellOutcome::Skip { stats, error: None };
    }

    let record = ExtractedRecord {
        page: task.page_num + 1,
        column: task.cell.col + 1,
        row: task.cell.row + 1,
        voter_id: voter_id_text,
        image_base64: photo_base64,
        name,
        name_english,
        relative_name,
        relative_name_english,
        relative_type,
        house_number,
        gender,
        age,
        assembly_number,
        serial_number,
        booth_center: task.page_fields.booth_center.clone(),
        booth_address: task.page_fields.booth_address.clone(),
        metadata: RecordMetadata {
            voter_id_confidence,
            photo_quality,
        },
    };

    CellOutcome::Record {
        record: Box::new(record),
        stats,
    }
}

/// Script-specific name correction; non-Devanagari text is only tidied.
fn normalize_person_name(raw: &str) -> String {
    if devanagari::contains_devanagari(raw) {
        devanagari::correct_name(raw)
    } else {
        collapse_whitespace(raw)
    }
}

// ── Worker context ───────────────────────────────────────────────────────────

struct CellContext<'a> {
    page: &'a PdfPage<'a>,
    page_width: f32,
    cell: CellRect,
    template: &'a CellTemplate,
    annotations: Option<&'a PageAnnotations>,
    providers: &'a Providers,
    stats: CellStats,
    /// Lazy 400 DPI render of the page, shared by every crop in this cell.
    hi_res: Option<DynamicImage>,
}

impl CellContext<'_> {
    /// Crop a scaled template box out of the lazily rendered 400 DPI page.
    fn region_image(&mut self, region: &BoxRect) -> Option<DynamicImage> {
        if self.hi_res.is_none() {
            self.hi_res = render::render_page(self.page, render::OCR_RENDER_SCALE).ok();
        }
        render::crop_region(self.hi_res.as_ref()?, region, self.page_width)
    }

    /// Voter ID comes from the text layer and nowhere else — OCR noise in
    /// an identifier is worse than a skipped cell.
    fn extract_voter_id(&mut self) -> (String, f32) {
        let Some(template_box) = self.template.voter_id_box.as_ref() else {
            return (String::new(), 0.0);
        };
        let region = scale_box(template_box, &self.cell);

        let raw = text_layer::read_text(self.page, &region);
        if raw.is_empty() {
            return (String::new(), 0.0);
        }

        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        // Correct first, validate, then fall back to a pattern re-search
        // within the raw text before giving up.
        let mut candidate = voter_id::correct_voter_id(&cleaned);
        if !voter_id::validate_voter_id(&candidate) {
            candidate = match voter_id::find_epic_pattern(&cleaned) {
                Some(pattern) => voter_id::correct_voter_id(&pattern),
                None => return (String::new(), 0.0),
            };
        }

        if voter_id::validate_voter_id(&candidate) {
            self.stats.text_layer += 1;
            debug!(
                "cell [{},{}]: voter ID '{}' from text layer",
                self.cell.row, self.cell.col, candidate
            );
            return (candidate, 0.99);
        }

        (String::new(), 0.0)
    }

    /// Photo path: high-DPI crop, blank check, enhancement, encode.
    fn extract_photo(&mut self) -> (String, f32) {
        let Some(template_box) = self.template.photo_box.as_ref() else {
            return (String::new(), 0.0);
        };
        let region = scale_box(template_box, &self.cell);
        let Some(crop) = self.region_image(&region) else {
            return (String::new(), 0.0);
        };

        let confidence = photo::photo_confidence(&crop);
        if confidence < photo::MIN_PHOTO_CONFIDENCE {
            debug!(
                "cell [{},{}]: photo region blank (confidence {confidence:.2})",
                self.cell.row, self.cell.col
            );
            return (String::new(), 0.0);
        }
        self.stats.photos += 1;

        let enhanced = photo::enhance(&crop);
        self.stats.photos_enhanced += 1;
        let quality = photo::quality_score(&enhanced);

        match photo::encode_jpeg_base64(&enhanced) {
            Ok(b64) => (b64, quality),
            Err(e) => {
                warn!("photo encode failed: {e}");
                (String::new(), 0.0)
            }
        }
    }

    /// Name-class fields: local OCR, then cached annotations (preferred for
    /// Devanagari even when OCR produced something), then a direct region
    /// call only when this page has no usable cache at all.
    fn extract_name_field(
        &mut self,
        pick: impl Fn(&CellTemplate) -> Option<&BoxRect>,
    ) -> String {
        let Some(template_box) = pick(self.template) else {
            return String::new();
        };
        let region = scale_box(template_box, &self.cell);

        let mut ocr_text = String::new();
        if let Some(recognizer) = self.providers.recognizer.clone() {
            if let Some(crop) = self.region_image(&region) {
                let prepared = ocr::preprocess_for_ocr(&crop);
                if let Ok(text) = recognizer.recognize(&prepared, &ocr::SCRIPT_HINTS) {
                    let text = collapse_whitespace(&text);
                    if !text.is_empty() {
                        self.stats.local_ocr += 1;
                        ocr_text = text;
                    }
                }
            }
        }

        if let Some(annotations) = self.annotations.filter(|a| a.is_usable()) {
            if let Some(text) = annotations.query(&region, ANNOTATION_RENDER_SCALE) {
                self.stats.cloud_ocr += 1;
                return devanagari::correct_text(&collapse_whitespace(&text));
            }
            // A usable cache with an empty region is final: no fresh call.
        } else if let Some(vision) = self.providers.vision.clone() {
            if let Some(crop) = self.region_image(&region) {
                if let Ok(result) = vision.annotate_region(&crop, &ocr::SCRIPT_HINTS) {
                    let text = collapse_whitespace(&result.text);
                    if !text.is_empty() {
                        self.stats.cloud_ocr += 1;
                        return devanagari::correct_text(&text);
                    }
                }
            }
        }

        devanagari::correct_text(&ocr_text)
    }

    /// Structured fields: text layer first, cached annotations only when
    /// the text layer yields nothing. Never a fresh network call.
    fn extract_structured_field(
        &mut self,
        pick: impl Fn(&CellTemplate) -> Option<&BoxRect>,
    ) -> String {
        let Some(template_box) = pick(self.template) else {
            return String::new();
        };
        let region = scale_box(template_box, &self.cell);

        let text = collapse_whitespace(&text_layer::read_text(self.page, &region));
        if !text.is_empty() {
            self.stats.text_layer += 1;
            return devanagari::correct_text(&text);
        }

        if let Some(annotations) = self.annotations.filter(|a| a.is_usable()) {
            if let Some(text) = annotations.query(&region, ANNOTATION_RENDER_SCALE) {
                self.stats.cloud_ocr += 1;
                return devanagari::correct_text(&collapse_whitespace(&text));
            }
        }

        String::new()
    }
}
