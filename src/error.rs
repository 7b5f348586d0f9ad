//! Error types for the votergrid library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the extraction cannot proceed at all
//!   (bad input file, corrupt PDF, invalid grid configuration). Returned as
//!   `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`CellError`] — **Non-fatal**: a single grid cell failed (render glitch,
//!   worker panic) but every other cell is fine. Carried inside the cell's
//!   skip marker so callers can inspect partial success rather than losing
//!   the whole batch to one bad cell.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! cell failure, log and continue, or collect all errors for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the votergrid library.
///
/// Cell-level failures use [`CellError`] and are converted to skip markers
/// rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input exists and was read, but is not a PDF.
    #[error("Input is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder/ingestion validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium or set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single grid cell.
///
/// Stored inside the cell's skip marker when a worker fails.
/// The overall extraction continues; only the cell is lost.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum CellError {
    /// The worker could not reopen the document or render the cell region.
    #[error("cell [{row},{col}] page {page}: render failed: {detail}")]
    RenderFailed {
        page: usize,
        row: usize,
        col: usize,
        detail: String,
    },

    /// The worker task itself died (panic or cancellation).
    #[error("cell task failed: {detail}")]
    WorkerFailed { detail: String },
}
