//! Pipeline stages for grid-based record extraction.
//!
//! Each submodule implements exactly one concern, so stages stay
//! independently testable and a backend can be swapped without touching
//! its neighbours.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ annotate ──▶ cell × N ──▶ aggregate
//! (bytes)   (1 call/page) (workers)   (sort + stats)
//!              │             │
//!              │             ├─ text_layer  (embedded text, no recognition)
//!              │             ├─ ocr         (local recognition preprocessing)
//!              │             ├─ photo       (variance check, enhance, encode)
//!              │             └─ render      (pdfium rasterisation + crops)
//!              └─ render
//! ```
//!
//! 1. [`input`]      — canonicalise the user-supplied path or URL to bytes
//! 2. [`annotate`]   — sequential page-batch cloud pre-pass + page fields
//! 3. [`cell`]       — the per-cell worker running the strategy chain
//! 4. [`render`]     — pdfium binding, page rasterisation, region crops
//! 5. [`text_layer`] — embedded-text reads within a region
//! 6. [`ocr`]        — local-OCR image preprocessing
//! 7. [`photo`]      — photo quality heuristics and JPEG encoding

pub mod annotate;
pub mod cell;
pub mod input;
pub mod ocr;
pub mod photo;
pub mod render;
pub mod text_layer;
