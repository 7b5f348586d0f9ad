//! End-to-end integration tests.
//!
//! The PDF fixtures are generated in-memory (minimal one-page documents
//! with an embedded text layer), so no test assets are required. Tests
//! that need a rasteriser self-skip when no pdfium library can be bound —
//! set PDFIUM_LIB_PATH to run them on machines without a system pdfium.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use votergrid::{
    extract_from_bytes, BoxRect, CellTemplate, ExtractError, ExtractionConfig, ExtractionOutput,
    GridConfig, PageAnnotations, ProviderError, Providers, RegionText, TextSpan, VisionProvider,
};

// ── PDF fixture builder ──────────────────────────────────────────────────────

/// Build a minimal single-page PDF (300×400 pt) with the given text
/// snippets placed at PDF-space coordinates (bottom-left origin).
fn minimal_pdf(texts: &[(&str, f32, f32)]) -> Vec<u8> {
    let mut content = String::new();
    for (text, x, y) in texts {
        content.push_str(&format!("BT /F1 12 Tf 1 0 0 1 {x} {y} Tm ({text}) Tj ET\n"));
    }

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 300 400] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in &offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    pdf.into_bytes()
}

/// Run an extraction, skipping the test when pdfium is unavailable.
async fn run_or_skip(
    pdf: Vec<u8>,
    config: &ExtractionConfig,
    providers: &Providers,
) -> Option<ExtractionOutput> {
    match extract_from_bytes(pdf, config, providers).await {
        Ok(output) => Some(output),
        Err(ExtractError::PdfiumBindingFailed(detail)) => {
            println!("SKIP — no pdfium library available: {detail}");
            None
        }
        Err(e) => panic!("extraction failed: {e}"),
    }
}

// ── Mock vision provider ─────────────────────────────────────────────────────

struct CountingVision {
    page_calls: Arc<AtomicUsize>,
    region_calls: Arc<AtomicUsize>,
    spans: Vec<TextSpan>,
}

impl VisionProvider for CountingVision {
    fn annotate_page(
        &self,
        image: &image::DynamicImage,
        _script_hints: &[&str],
    ) -> Result<PageAnnotations, ProviderError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PageAnnotations {
            spans: self.spans.clone(),
            image_width: image.width(),
            image_height: image.height(),
        })
    }

    fn annotate_region(
        &self,
        _image: &image::DynamicImage,
        _script_hints: &[&str],
    ) -> Result<RegionText, ProviderError> {
        self.region_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RegionText::default())
    }
}

// ── Configs ──────────────────────────────────────────────────────────────────

/// 2 rows × 1 column over the whole 300×400 page; ID box in each cell.
fn two_by_one_config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .grid(GridConfig {
            x: 0.0,
            y: 0.0,
            width: 300.0,
            height: 400.0,
            rows: 2,
            columns: 1,
            col_positions: None,
            row_positions: None,
        })
        .cell_template(CellTemplate {
            voter_id_box: Some(BoxRect::new(10.0, 10.0, 200.0, 40.0)),
            ..Default::default()
        })
        .build()
        .unwrap()
}

/// 2 × 2 grid with ID and name boxes per cell.
fn two_by_two_config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .grid(GridConfig {
            x: 0.0,
            y: 0.0,
            width: 300.0,
            height: 400.0,
            rows: 2,
            columns: 2,
            col_positions: None,
            row_positions: None,
        })
        .cell_template(CellTemplate {
            voter_id_box: Some(BoxRect::new(10.0, 10.0, 130.0, 30.0)),
            name_box: Some(BoxRect::new(10.0, 50.0, 130.0, 30.0)),
            ..Default::default()
        })
        .build()
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// One occupied cell, one blank cell: exactly one record, one skip.
#[tokio::test]
async fn occupied_and_blank_cell() {
    // Cell (0,0) covers page-space y 0..200 (top-left origin); its ID box
    // is y 10..50, i.e. PDF-space y 350..390. Baseline 365 lands inside.
    let pdf = minimal_pdf(&[("ABC1234567", 20.0, 365.0)]);
    let config = two_by_one_config();

    let Some(output) = run_or_skip(pdf, &config, &Providers::new()).await else {
        return;
    };

    assert_eq!(output.extracted_data.len(), 1);
    let record = &output.extracted_data[0];
    assert_eq!(record.voter_id, "ABC1234567");
    assert_eq!((record.page, record.column, record.row), (1, 1, 1));
    assert!((record.metadata.voter_id_confidence - 0.99).abs() < 1e-6);

    assert_eq!(output.stats.total_cells, 2);
    assert_eq!(output.stats.cells_skipped, 1);
    assert_eq!(output.stats.records_extracted, 1);
    assert!(output.stats.text_layer_fields >= 1);
    assert!(output.stats.accuracy_rate > 0.0);
}

/// A cell whose ID region reads "N/A" is a skip, never a record.
#[tokio::test]
async fn sentinel_cell_is_skipped() {
    // Second cell's ID box is page-space y 210..250 → PDF-space 150..190.
    let pdf = minimal_pdf(&[("ABC1234567", 20.0, 365.0), ("N/A", 20.0, 165.0)]);
    let config = two_by_one_config();

    let Some(output) = run_or_skip(pdf, &config, &Providers::new()).await else {
        return;
    };

    assert_eq!(output.extracted_data.len(), 1);
    assert_eq!(output.extracted_data[0].voter_id, "ABC1234567");
    assert_eq!(output.stats.cells_skipped, 1);
}

/// An ID with OCR-confused glyphs in the text layer is corrected.
#[tokio::test]
async fn voter_id_confusions_are_corrected() {
    // 'O' in the digit part: ABC12345O7 → ABC1234507.
    let pdf = minimal_pdf(&[("ABC12345O7", 20.0, 365.0)]);
    let config = two_by_one_config();

    let Some(output) = run_or_skip(pdf, &config, &Providers::new()).await else {
        return;
    };

    assert_eq!(output.extracted_data.len(), 1);
    assert_eq!(output.extracted_data[0].voter_id, "ABC1234507");
}

/// The page-batch annotation call fires exactly once per page no matter
/// how many cells the grid declares, and a usable cache suppresses all
/// direct region calls.
#[tokio::test]
async fn one_annotation_call_per_page() {
    let page_calls = Arc::new(AtomicUsize::new(0));
    let region_calls = Arc::new(AtomicUsize::new(0));

    // Span covering cell (0,0)'s name box in the 2×-scaled annotation
    // space: page-space (10,50)-(140,80) → (20,100)-(280,160).
    let vision = CountingVision {
        page_calls: Arc::clone(&page_calls),
        region_calls: Arc::clone(&region_calls),
        spans: vec![TextSpan {
            text: "जरशद".into(),
            x: 30.0,
            y: 110.0,
            width: 80.0,
            height: 30.0,
        }],
    };
    let providers = Providers::new().with_vision(Arc::new(vision));

    let pdf = minimal_pdf(&[("ABC1234567", 15.0, 368.0)]);
    let config = two_by_two_config();

    let Some(output) = run_or_skip(pdf, &config, &providers).await else {
        return;
    };

    // 4 cells, 1 page → exactly 1 page-batch call, 0 region calls.
    assert_eq!(page_calls.load(Ordering::SeqCst), 1);
    assert_eq!(region_calls.load(Ordering::SeqCst), 0);

    assert_eq!(output.stats.total_cells, 4);
    assert_eq!(output.extracted_data.len(), 1);
    assert_eq!(output.stats.pages_annotated, 1);

    // The cached span reached the record and went through Devanagari
    // correction (जरशद is the canonical जोशी misreading).
    let record = &output.extracted_data[0];
    assert_eq!(record.name, "जोशी");
    assert_eq!(record.name_english, "Joshee");
    assert!(output.stats.cloud_ocr_fields >= 1);
}

/// Cells cut by the header/footer band are not extracted at all.
#[tokio::test]
async fn extraction_band_excludes_header_cells() {
    let pdf = minimal_pdf(&[("ABC1234567", 20.0, 365.0)]);
    let mut config = two_by_one_config();
    // Band starts below cell (0,0): its ID would have been readable, but
    // the whole cell is out of band.
    config.skip_header_height = 100.0;

    let Some(output) = run_or_skip(pdf, &config, &Providers::new()).await else {
        return;
    };

    assert!(output.extracted_data.is_empty());
    assert_eq!(output.stats.total_cells, 2);
    // Cell (0,0) is out of band and never looked at — it does not count as
    // skipped. Cell (1,0) is in band, finds no ID, and skips normally.
    assert_eq!(output.stats.cells_skipped, 1);
    assert_eq!(output.stats.text_layer_fields, 0);
}

/// Corrupt bytes surface as a fatal error, not a partial result.
#[tokio::test]
async fn garbage_bytes_are_fatal() {
    let config = two_by_one_config();
    let err = extract_from_bytes(b"not a pdf at all".to_vec(), &config, &Providers::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::NotAPdf { .. }));
}

/// Config validation runs before any document work.
#[tokio::test]
async fn invalid_config_is_rejected_up_front() {
    let pdf = minimal_pdf(&[("ABC1234567", 20.0, 365.0)]);
    let mut config = two_by_one_config();
    config.grid.rows = 0;

    let err = extract_from_bytes(pdf, &config, &Providers::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::InvalidConfig(_)));
}
