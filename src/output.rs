//! Output types: extracted records, run statistics, and the combined result.

use serde::{Deserialize, Serialize};

/// One extracted voter record.
///
/// Field names follow the wire shape consumed by the front-end and the
/// spreadsheet sink (`voterID`, `image_base64`, camelCase for the rest).
/// `page`, `column` and `row` are 1-indexed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub page: usize,
    pub column: usize,
    pub row: usize,
    #[serde(rename = "voterID")]
    pub voter_id: String,
    pub image_base64: String,
    pub name: String,
    #[serde(rename = "nameEnglish")]
    pub name_english: String,
    #[serde(rename = "relativeName")]
    pub relative_name: String,
    #[serde(rename = "relativeNameEnglish")]
    pub relative_name_english: String,
    #[serde(rename = "relativeType")]
    pub relative_type: String,
    #[serde(rename = "houseNumber")]
    pub house_number: String,
    pub gender: String,
    pub age: String,
    #[serde(rename = "assemblyNumber")]
    pub assembly_number: String,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    #[serde(rename = "boothCenter")]
    pub booth_center: String,
    #[serde(rename = "boothAddress")]
    pub booth_address: String,
    pub metadata: RecordMetadata,
}

/// Per-record extraction quality metadata.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub voter_id_confidence: f32,
    pub photo_quality: f32,
}

/// Aggregated run statistics.
///
/// Always produced, even when some cells failed, so callers can report
/// partial success instead of all-or-nothing failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Every cell the grid declared on the processed pages.
    pub total_cells: usize,
    /// Cells with no usable voter ID (blank slots are normal, not errors).
    pub cells_skipped: usize,
    pub records_extracted: usize,
    /// Fields read straight from the embedded PDF text layer.
    pub text_layer_fields: usize,
    /// Fields recognised by the local OCR engine.
    pub local_ocr_fields: usize,
    /// Fields resolved from cloud annotations (cached or direct).
    pub cloud_ocr_fields: usize,
    pub photos_extracted: usize,
    pub photos_enhanced: usize,
    /// Pages with a usable annotation cache (one page-batch call each).
    pub pages_annotated: usize,
    /// Weighted display metric in percent: text-layer fields weigh 0.99,
    /// local OCR 0.85, cloud 0.95. A reporting convenience, never a gate on
    /// record acceptance.
    pub accuracy_rate: f64,
    pub extraction_time_seconds: f64,
}

impl ExtractionStats {
    /// Recompute the weighted accuracy rate from the method counters.
    pub fn compute_accuracy_rate(&mut self) {
        let text = self.text_layer_fields as f64;
        let ocr = self.local_ocr_fields as f64;
        let cloud = self.cloud_ocr_fields as f64;
        let total = text + ocr + cloud;

        self.accuracy_rate = if total > 0.0 {
            let weighted = text * 0.99 + ocr * 0.85 + cloud * 0.95;
            ((weighted / total).min(1.0) * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };
    }
}

/// The full result of an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub extracted_data: Vec<ExtractedRecord>,
    pub stats: ExtractionStats,
}
