//! Top-level extraction entry points.
//!
//! The run has three phases:
//!
//! 1. **Prepare** (one blocking task): open the document, measure pages,
//!    run the sequential annotation pre-pass (one cloud call per page) and
//!    the page-level field extraction. All of it completes before any cell
//!    work starts, so concurrent cells can never trigger redundant calls.
//! 2. **Dispatch**: one self-contained task per grid cell, fanned out on
//!    the blocking pool at the machine's core count. Each worker reopens
//!    the PDF from the shared byte buffer. When there is only one worker
//!    or one task the same code runs strictly sequentially — behaviour is
//!    identical, only throughput differs.
//! 3. **Aggregate**: merge counters in submission order, drop skips, sort
//!    records into the vertical reading order `(page, column, row)`.

use crate::config::ExtractionConfig;
use crate::error::{CellError, ExtractError};
use crate::grid::GridGeometry;
use crate::output::{ExtractedRecord, ExtractionOutput, ExtractionStats};
use crate::pipeline::annotate::{self, PageFields};
use crate::pipeline::cell::{run_cell, CellOutcome, CellStats, CellTask};
use crate::pipeline::{input, render};
use crate::providers::{PageAnnotations, Providers};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Timeout for PDFs supplied as URLs.
const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Extract voter records from a PDF file path or HTTP/HTTPS URL.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ExtractionOutput)` on success, even if some cells were skipped
/// (check `output.stats.cells_skipped`).
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal problems: unusable input,
/// corrupt PDF, invalid configuration.
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
    providers: &Providers,
) -> Result<ExtractionOutput, ExtractError> {
    let input_str = input_str.as_ref();
    info!("starting extraction: {}", input_str);
    let bytes = input::resolve_input(input_str, DOWNLOAD_TIMEOUT_SECS).await?;
    extract_from_bytes(bytes, config, providers).await
}

/// Extract voter records from in-memory PDF bytes.
///
/// The recommended API when the PDF arrives from an upload or a database
/// rather than the filesystem.
pub async fn extract_from_bytes(
    bytes: Vec<u8>,
    config: &ExtractionConfig,
    providers: &Providers,
) -> Result<ExtractionOutput, ExtractError> {
    let started = Instant::now();
    config.validate()?;
    input::check_pdf_magic(&bytes)?;

    let pdf_bytes = Arc::new(bytes);
    let config = Arc::new(config.clone());
    let providers = providers.clone();

    // ── Phase 1: prepare (blocking: pdfium + synchronous provider calls) ──
    let prepared = {
        let pdf_bytes = Arc::clone(&pdf_bytes);
        let config = Arc::clone(&config);
        let providers = providers.clone();
        tokio::task::spawn_blocking(move || prepare(&pdf_bytes, &config, &providers))
            .await
            .map_err(|e| ExtractError::Internal(format!("prepare task panicked: {e}")))??
    };

    info!(
        "PDF has {} pages, processing {}..{}",
        prepared.page_sizes.len(),
        prepared.start + 1,
        prepared.end
    );

    // ── Phase 2: plan one task per cell ──────────────────────────────────
    let geometry = GridGeometry::new(&config.grid);
    let mut stats = ExtractionStats {
        pages_annotated: prepared.pages_annotated,
        ..Default::default()
    };

    let mut tasks: Vec<CellTask> = Vec::new();
    for page_num in prepared.start..prepared.end {
        let (_, page_height) = prepared.page_sizes[page_num];
        let band = (
            config.skip_header_height,
            page_height - config.skip_footer_height,
        );
        let annotations = prepared.annotations.get(&page_num).cloned();
        let page_fields = prepared
            .page_fields
            .get(&page_num)
            .cloned()
            .unwrap_or_default();

        for cell in geometry.cells() {
            stats.total_cells += 1;
            tasks.push(CellTask {
                pdf_bytes: Arc::clone(&pdf_bytes),
                page_num,
                cell,
                config: Arc::clone(&config),
                band,
                annotations: annotations.clone(),
                page_fields: page_fields.clone(),
                providers: providers.clone(),
            });
        }
    }

    // ── Phase 3: dispatch ────────────────────────────────────────────────
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    info!("dispatching {} cell tasks across {} workers", tasks.len(), workers);

    let outcomes: Vec<CellOutcome> = if workers > 1 && tasks.len() > 1 {
        stream::iter(tasks.into_iter().map(|task| {
            tokio::task::spawn_blocking(move || run_cell(task))
        }))
        .buffered(workers)
        .map(|joined| {
            joined.unwrap_or_else(|e| CellOutcome::Skip {
                stats: CellStats::default(),
                error: Some(CellError::WorkerFailed {
                    detail: e.to_string(),
                }),
            })
        })
        .collect()
        .await
    } else {
        // Sequential fallback: same per-cell logic, one at a time.
        tokio::task::spawn_blocking(move || tasks.into_iter().map(run_cell).collect())
            .await
            .map_err(|e| ExtractError::Internal(format!("sequential run panicked: {e}")))?
    };

    // ── Phase 4: aggregate ───────────────────────────────────────────────
    let mut records: Vec<ExtractedRecord> = Vec::new();
    for outcome in outcomes {
        match outcome {
            CellOutcome::OutOfBand => {}
            CellOutcome::Skip { stats: cell_stats, error } => {
                stats.cells_skipped += 1;
                cell_stats.merge_into(&mut stats);
                if let Some(error) = error {
                    warn!("{error}");
                }
            }
            CellOutcome::Record { record, stats: cell_stats } => {
                cell_stats.merge_into(&mut stats);
                records.push(*record);
            }
        }
    }

    sort_records(&mut records);

    stats.records_extracted = records.len();
    stats.compute_accuracy_rate();
    stats.extraction_time_seconds =
        (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;

    info!(
        "extraction complete: {} records, {} skipped of {} cells in {:.2}s",
        stats.records_extracted,
        stats.cells_skipped,
        stats.total_cells,
        stats.extraction_time_seconds
    );

    Ok(ExtractionOutput {
        extracted_data: records,
        stats,
    })
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
    providers: &Providers,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(extract(input_str, config, providers))
}

/// Ordering invariant: vertical reading order — all rows of column 1 before
/// column 2, page by page. Distinct from natural page scan order.
pub fn sort_records(records: &mut [ExtractedRecord]) {
    records.sort_by_key(|r| (r.page, r.column, r.row));
}

// ── Prepare phase ────────────────────────────────────────────────────────────

struct Prepared {
    /// `(width, height)` in points per page, full document.
    page_sizes: Vec<(f32, f32)>,
    /// First page to process (0-indexed, inclusive).
    start: usize,
    /// One past the last page to process.
    end: usize,
    annotations: HashMap<usize, Arc<PageAnnotations>>,
    page_fields: HashMap<usize, PageFields>,
    pages_annotated: usize,
}

fn prepare(
    pdf_bytes: &[u8],
    config: &ExtractionConfig,
    providers: &Providers,
) -> Result<Prepared, ExtractError> {
    let pdfium = render::bind_pdfium()?;
    let document = render::load_document(&pdfium, pdf_bytes)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;

    let mut page_sizes = Vec::with_capacity(total_pages);
    for index in 0..total_pages {
        let page = pages.get(index as u16).map_err(|e| ExtractError::CorruptPdf {
            detail: format!("page {}: {e:?}", index + 1),
        })?;
        page_sizes.push((page.width().value, page.height().value));
    }

    let start = config.skip_pages_start.min(total_pages);
    let end = total_pages.saturating_sub(config.skip_pages_end).max(start);

    // Strictly sequential annotation pre-pass, all pages before any cell.
    let annotations =
        annotate::build_page_cache(&document, start, end, providers.vision.as_ref());
    let pages_annotated = annotations.len();

    // Page-level fields, once per page.
    let template = config.page_template().clone();
    let mut page_fields = HashMap::new();
    for page_num in start..end {
        let Ok(page) = pages.get(page_num as u16) else {
            continue;
        };
        let fields = annotate::extract_page_fields(
            &page,
            &template,
            config.skip_header_height,
            annotations.get(&page_num).map(|a| a.as_ref()),
            providers.vision.as_ref(),
        );
        page_fields.insert(page_num, fields);
    }

    Ok(Prepared {
        page_sizes,
        start,
        end,
        annotations,
        page_fields,
        pages_annotated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(page: usize, column: usize, row: usize) -> ExtractedRecord {
        ExtractedRecord {
            page,
            column,
            row,
            voter_id: format!("ABC{page}{column}{row}0000"),
            ..Default::default()
        }
    }

    #[test]
    fn records_sort_by_page_then_column_then_row() {
        let mut records = vec![
            record(2, 2, 1),
            record(1, 2, 2),
            record(2, 1, 2),
            record(1, 1, 1),
            record(1, 2, 1),
            record(1, 1, 2),
            record(2, 2, 2),
            record(2, 1, 1),
        ];
        sort_records(&mut records);

        let order: Vec<(usize, usize, usize)> =
            records.iter().map(|r| (r.page, r.column, r.row)).collect();
        assert_eq!(
            order,
            vec![
                (1, 1, 1),
                (1, 1, 2),
                (1, 2, 1),
                (1, 2, 2),
                (2, 1, 1),
                (2, 1, 2),
                (2, 2, 1),
                (2, 2, 2),
            ]
        );
    }
}
