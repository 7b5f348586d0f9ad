//! # votergrid
//!
//! Extract structured voter records from grid-laid-out scanned PDF rolls.
//!
//! ## Why this crate?
//!
//! Electoral rolls print one voter per grid cell — ID, photo, name, and
//! demographic fields in fixed sub-boxes. Generic PDF-to-text tools destroy
//! that structure: text comes out in stream order with no cell association.
//! This crate instead maps a declarative grid/cell-template configuration
//! onto absolute page coordinates and runs each cell through a
//! multi-strategy field-extraction chain, producing one typed record per
//! occupied cell.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Annotate  one cloud page-batch call per page (2× render, cached)
//!  ├─ 3. Resolve   grid config → per-cell page rectangles + scale factors
//!  ├─ 4. Cells     one worker per cell: text layer → local OCR → cached
//!  │               annotations → direct region call (strict priority)
//!  ├─ 5. Normalise Devanagari correction, field cleanup, transliteration
//!  └─ 6. Output    records sorted by (page, column, row) + run stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use votergrid::{extract, ExtractionConfig, Providers};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::from_json(&std::fs::read_to_string("grid.json")?)?;
//!     // No providers wired: text-layer-only extraction still works.
//!     let providers = Providers::new();
//!     let output = extract("roll.pdf", &config, &providers).await?;
//!     println!("{} records", output.extracted_data.len());
//!     eprintln!("accuracy: {:.1}%", output.stats.accuracy_rate);
//!     Ok(())
//! }
//! ```
//!
//! ## Capability providers
//!
//! OCR and vision backends are injected through the traits in
//! [`providers`] — the core never constructs a vendor client itself.
//! Without a [`providers::VisionProvider`] the pipeline runs on the
//! embedded text layer (and local OCR if a
//! [`providers::TextRecognizer`] is supplied); with one, each page costs
//! exactly one page-batch call regardless of how many cells it holds.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `votergrid` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod grid;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod providers;
pub mod sink;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BoxRect, CellTemplate, ExtractionConfig, ExtractionConfigBuilder, GridConfig};
pub use detect::{BoxDetector, DetectedBox, DetectedGrid};
pub use error::{CellError, ExtractError};
pub use extract::{extract, extract_from_bytes, extract_sync};
pub use grid::{CellRect, GridGeometry};
pub use output::{ExtractedRecord, ExtractionOutput, ExtractionStats, RecordMetadata};
pub use providers::{
    PageAnnotations, ProviderError, Providers, RegionText, TextRecognizer, TextSpan,
    Transliterator, VisionProvider,
};
pub use sink::{CsvSink, RecordSink, SPREADSHEET_COLUMNS};
