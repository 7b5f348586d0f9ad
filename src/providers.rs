//! Capability providers: the pluggable OCR / vision / transliteration seams.
//!
//! The extraction core never talks to a vendor SDK directly. Each external
//! capability sits behind a small trait, and a [`Providers`] bundle is
//! constructed once at pipeline start and passed through the task context —
//! never held as ambient global state. Any provider may be absent; the
//! strategy chain simply skips the strategies it cannot run.
//!
//! Provider calls are synchronous and blocking by contract: cell workers run
//! on the blocking pool, and implementations own their network timeouts
//! (30–60 s is typical). A timeout degrades that one strategy attempt to
//! "no result"; it never aborts the cell.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by capability providers.
///
/// All of them are soft from the pipeline's point of view: the strategy
/// chain logs and moves on to the next strategy.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider is not configured (missing credential, missing engine).
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded the provider's own timeout.
    #[error("provider call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The backing service returned an error.
    #[error("provider error: {0}")]
    Api(String),
}

/// Local text recognition over a pre-rendered region image.
///
/// Backed by whatever local engine the deployment ships (a Tesseract
/// binding, an ONNX recogniser, …). `script_hints` carries language codes
/// such as `["en", "hi"]`.
pub trait TextRecognizer: Send + Sync {
    fn recognize(
        &self,
        image: &DynamicImage,
        script_hints: &[&str],
    ) -> Result<String, ProviderError>;
}

/// Text extracted from a cropped region by a cloud backend.
#[derive(Debug, Clone, Default)]
pub struct RegionText {
    pub text: String,
    pub confidence: f32,
}

/// A positioned text span returned by a page-batch annotation call.
///
/// Coordinates are pixels in the rendered page image handed to
/// [`VisionProvider::annotate_page`] (2×-scaled relative to PDF points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// All positioned text spans for one physical page.
///
/// Built exactly once per page before any cell work begins, read-only
/// afterwards, and discarded when the run ends. Cell-level lookups are pure
/// in-memory intersection queries — no further network calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageAnnotations {
    pub spans: Vec<TextSpan>,
    pub image_width: u32,
    pub image_height: u32,
}

impl PageAnnotations {
    /// A cache is usable only if the call succeeded with real dimensions
    /// and at least one span. An unusable cache is treated as absent.
    pub fn is_usable(&self) -> bool {
        !self.spans.is_empty() && self.image_width > 0 && self.image_height > 0
    }

    /// Query a region given in PDF page points (top-left origin).
    ///
    /// The region is scaled by `render_scale` into the annotation image's
    /// pixel space; every span whose bounding box *overlaps* the region
    /// (shared area, not containment) contributes, joined with single
    /// spaces in encounter order.
    pub fn query(&self, region: &crate::config::BoxRect, render_scale: f32) -> Option<String> {
        let qx = region.x * render_scale;
        let qy = region.y * render_scale;
        let qw = region.width * render_scale;
        let qh = region.height * render_scale;

        let mut parts: Vec<&str> = Vec::new();
        for span in &self.spans {
            let overlaps = span.x < qx + qw
                && span.x + span.width > qx
                && span.y < qy + qh
                && span.y + span.height > qy;
            if overlaps && !span.text.is_empty() {
                parts.push(&span.text);
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" ").trim().to_string())
        }
    }
}

/// Cloud OCR backend, reached two ways: one page-batch annotation call per
/// physical page (the preferred, cache-building path) and a per-region call
/// used only when no usable page cache exists.
pub trait VisionProvider: Send + Sync {
    /// Annotate a full rendered page, returning every text span with its
    /// bounding box. Called exactly once per page by the pre-pass.
    fn annotate_page(
        &self,
        image: &DynamicImage,
        script_hints: &[&str],
    ) -> Result<PageAnnotations, ProviderError>;

    /// Recognise text in a cropped region. The only strategy that issues a
    /// fresh network call per field — the pipeline minimises its use.
    fn annotate_region(
        &self,
        image: &DynamicImage,
        script_hints: &[&str],
    ) -> Result<RegionText, ProviderError>;
}

/// Transliteration of Devanagari text to a Latin-script rendering.
///
/// On failure the pipeline falls back to the deterministic local
/// character-mapping transliterator.
pub trait Transliterator: Send + Sync {
    fn transliterate(&self, text: &str) -> Result<String, ProviderError>;
}

/// The injected provider bundle, cloned into every cell task.
///
/// All handles are `Arc`-shared and read-only; workers never mutate them.
#[derive(Clone, Default)]
pub struct Providers {
    pub recognizer: Option<Arc<dyn TextRecognizer>>,
    pub vision: Option<Arc<dyn VisionProvider>>,
    pub transliterator: Option<Arc<dyn Transliterator>>,
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionProvider>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_transliterator(mut self, transliterator: Arc<dyn Transliterator>) -> Self {
        self.transliterator = Some(transliterator);
        self
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("recognizer", &self.recognizer.as_ref().map(|_| "<dyn TextRecognizer>"))
            .field("vision", &self.vision.as_ref().map(|_| "<dyn VisionProvider>"))
            .field(
                "transliterator",
                &self.transliterator.as_ref().map(|_| "<dyn Transliterator>"),
            )
            .finish()
    }
}
