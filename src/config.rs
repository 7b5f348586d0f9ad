//! Configuration types for grid-based voter-record extraction.
//!
//! The operator supplies the geometry declaratively: where the grid sits on
//! the page, how many rows and columns it has, and where each labelled box
//! (voter ID, photo, name, …) sits *relative to the first cell*. Every other
//! cell reuses the same template, scaled by the ratio of its size to the
//! first cell's size — irregular grids are handled by scaling one template,
//! never by per-cell templates.
//!
//! All knobs live in [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`] or deserialised straight from the JSON shape
//! the upload front-end stores. Validation happens exactly once, at
//! ingestion, so no extraction work starts on out-of-range geometry.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in page points, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoxRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True overlap test (shared area, not containment).
    pub fn intersects(&self, other: &BoxRect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// The overall grid rectangle on a page.
///
/// `col_positions` / `row_positions`, when present, are ordered breakpoint
/// lists overriding uniform spacing: index `i` gives the left/top edge of
/// column/row `i`, and the last column/row extends to the grid boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rows: usize,
    pub columns: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_positions: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_positions: Option<Vec<f32>>,
}

/// Labelled sub-rectangles within a cell, relative to the first cell's
/// top-left corner. Any box may be omitted; its field is then left empty.
///
/// `booth_center_box` / `booth_address_box` are page-level: they locate
/// fields that appear once per page (in the header area), not per cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_id_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_name_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_number_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly_number_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booth_center_box: Option<BoxRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booth_address_box: Option<BoxRect>,
}

/// Full extraction configuration: grid geometry, cell template, page
/// trimming, and the vertical extraction band.
///
/// `skip_header_height` / `skip_footer_height` define the band
/// `[skip_header_height, page_height - skip_footer_height]`; any cell whose
/// vertical extent falls outside that band is skipped entirely, never
/// partially extracted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    pub grid: GridConfig,
    #[serde(default)]
    pub cell_template: CellTemplate,
    /// Template used for page-level fields; falls back to `cell_template`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_template: Option<CellTemplate>,
    #[serde(default)]
    pub skip_pages_start: usize,
    #[serde(default)]
    pub skip_pages_end: usize,
    #[serde(default)]
    pub skip_header_height: f32,
    #[serde(default)]
    pub skip_footer_height: f32,
}

impl ExtractionConfig {
    /// Create a new builder.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Parse a JSON configuration and validate it in one pass.
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ExtractError::InvalidConfig(format!("JSON parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// The single validation pass run at ingestion.
    ///
    /// Rejects geometry the resolver cannot even index (zero rows/columns,
    /// non-finite coordinates, unsorted breakpoints). Degenerate but finite
    /// rectangles are allowed — downstream skip logic tolerates them.
    pub fn validate(&self) -> Result<(), ExtractError> {
        let g = &self.grid;
        if g.rows == 0 {
            return Err(ExtractError::InvalidConfig("grid.rows must be >= 1".into()));
        }
        if g.columns == 0 {
            return Err(ExtractError::InvalidConfig(
                "grid.columns must be >= 1".into(),
            ));
        }
        for (name, v) in [
            ("grid.x", g.x),
            ("grid.y", g.y),
            ("grid.width", g.width),
            ("grid.height", g.height),
            ("skipHeaderHeight", self.skip_header_height),
            ("skipFooterHeight", self.skip_footer_height),
        ] {
            if !v.is_finite() {
                return Err(ExtractError::InvalidConfig(format!(
                    "{name} must be finite, got {v}"
                )));
            }
        }
        for (name, positions) in [
            ("colPositions", &g.col_positions),
            ("rowPositions", &g.row_positions),
        ] {
            if let Some(ps) = positions {
                if ps.iter().any(|p| !p.is_finite()) {
                    return Err(ExtractError::InvalidConfig(format!(
                        "{name} must contain only finite values"
                    )));
                }
                if ps.windows(2).any(|w| w[1] < w[0]) {
                    return Err(ExtractError::InvalidConfig(format!(
                        "{name} must be sorted ascending"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Template used for page-level fields (booth center / address).
    pub fn page_template(&self) -> &CellTemplate {
        self.header_template.as_ref().unwrap_or(&self.cell_template)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn grid(mut self, grid: GridConfig) -> Self {
        self.config.grid = grid;
        self
    }

    pub fn cell_template(mut self, template: CellTemplate) -> Self {
        self.config.cell_template = template;
        self
    }

    pub fn header_template(mut self, template: CellTemplate) -> Self {
        self.config.header_template = Some(template);
        self
    }

    pub fn skip_pages_start(mut self, n: usize) -> Self {
        self.config.skip_pages_start = n;
        self
    }

    pub fn skip_pages_end(mut self, n: usize) -> Self {
        self.config.skip_pages_end = n;
        self
    }

    pub fn skip_header_height(mut self, h: f32) -> Self {
        self.config.skip_header_height = h.max(0.0);
        self
    }

    pub fn skip_footer_height(mut self, h: f32) -> Self {
        self.config.skip_footer_height = h.max(0.0);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_2x3() -> GridConfig {
        GridConfig {
            x: 10.0,
            y: 20.0,
            width: 300.0,
            height: 400.0,
            rows: 2,
            columns: 3,
            col_positions: None,
            row_positions: None,
        }
    }

    #[test]
    fn builder_accepts_valid_grid() {
        let config = ExtractionConfig::builder()
            .grid(grid_2x3())
            .skip_header_height(50.0)
            .build()
            .unwrap();
        assert_eq!(config.grid.rows, 2);
        assert_eq!(config.skip_header_height, 50.0);
    }

    #[test]
    fn zero_rows_rejected() {
        let mut grid = grid_2x3();
        grid.rows = 0;
        let err = ExtractionConfig::builder().grid(grid).build().unwrap_err();
        assert!(err.to_string().contains("rows"));
    }

    #[test]
    fn non_finite_geometry_rejected() {
        let mut grid = grid_2x3();
        grid.width = f32::NAN;
        assert!(ExtractionConfig::builder().grid(grid).build().is_err());
    }

    #[test]
    fn unsorted_breakpoints_rejected() {
        let mut grid = grid_2x3();
        grid.col_positions = Some(vec![100.0, 50.0, 200.0]);
        let err = ExtractionConfig::builder().grid(grid).build().unwrap_err();
        assert!(err.to_string().contains("colPositions"));
    }

    #[test]
    fn json_round_trip_uses_wire_names() {
        let json = r#"{
            "grid": {"x": 0, "y": 0, "width": 600, "height": 800,
                     "rows": 4, "columns": 3, "colPositions": [0, 200, 400]},
            "cellTemplate": {"voterIdBox": {"x": 5, "y": 5, "width": 120, "height": 20}},
            "skipPagesStart": 1,
            "skipHeaderHeight": 40
        }"#;
        let config = ExtractionConfig::from_json(json).unwrap();
        assert_eq!(config.grid.columns, 3);
        assert_eq!(config.grid.col_positions.as_deref(), Some(&[0.0, 200.0, 400.0][..]));
        assert_eq!(config.skip_pages_start, 1);
        let id_box = config.cell_template.voter_id_box.unwrap();
        assert_eq!(id_box.width, 120.0);

        let back = serde_json::to_string(&config).unwrap();
        assert!(back.contains("voterIdBox"));
        assert!(back.contains("colPositions"));
    }

    #[test]
    fn box_intersection_is_overlap_not_containment() {
        let a = BoxRect::new(0.0, 0.0, 10.0, 10.0);
        let b = BoxRect::new(5.0, 5.0, 20.0, 20.0);
        let c = BoxRect::new(10.0, 10.0, 5.0, 5.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        // Edge-touching is not overlap.
        assert!(!a.intersects(&c));
    }
}
