//! Record sinks: serialise extracted records for download.
//!
//! The spreadsheet schema is fixed at 14 columns; any sink implementation
//! (CSV here, XLSX in a front-end service) writes the same columns in the
//! same order. The voter-ID corrector runs once more on the way out as a
//! safeguard — records normally arrive already validated.

use crate::error::ExtractError;
use crate::normalize::voter_id::correct_voter_id;
use crate::output::ExtractedRecord;
use std::io::Write;
use std::path::Path;

/// The fixed output schema, in column order.
pub const SPREADSHEET_COLUMNS: [&str; 14] = [
    "EPIC No",
    "Name",
    "Name (English)",
    "Relative Name",
    "Relative Name (English)",
    "Relative Type",
    "House Number",
    "Gender",
    "Age",
    "Assembly Number",
    "Serial Number",
    "Booth Center",
    "Booth Address",
    "Base64 Image String",
];

/// A consumer of extracted records.
pub trait RecordSink {
    fn write_records(&mut self, records: &[ExtractedRecord]) -> Result<(), ExtractError>;
}

/// CSV sink over any writer, emitting the 14-column schema with a header.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// Finish writing and recover the inner writer.
    pub fn into_inner(self) -> Result<W, ExtractError> {
        self.writer
            .into_inner()
            .map_err(|e| ExtractError::Internal(format!("csv flush: {e}")))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_records(&mut self, records: &[ExtractedRecord]) -> Result<(), ExtractError> {
        let csv_err = |e: csv::Error| ExtractError::Internal(format!("csv write: {e}"));

        self.writer
            .write_record(SPREADSHEET_COLUMNS)
            .map_err(csv_err)?;

        for record in records {
            let epic = if record.voter_id.is_empty() {
                String::new()
            } else {
                correct_voter_id(&record.voter_id)
            };
            self.writer
                .write_record([
                    epic.as_str(),
                    record.name.as_str(),
                    record.name_english.as_str(),
                    record.relative_name.as_str(),
                    record.relative_name_english.as_str(),
                    record.relative_type.as_str(),
                    record.house_number.as_str(),
                    record.gender.as_str(),
                    record.age.as_str(),
                    record.assembly_number.as_str(),
                    record.serial_number.as_str(),
                    record.booth_center.as_str(),
                    record.booth_address.as_str(),
                    record.image_base64.as_str(),
                ])
                .map_err(csv_err)?;
        }

        self.writer.flush().map_err(|e| ExtractError::Internal(format!("csv flush: {e}")))?;
        Ok(())
    }
}

/// Write records to a CSV file at `path`.
pub fn write_csv_file(
    records: &[ExtractedRecord],
    path: impl AsRef<Path>,
) -> Result<(), ExtractError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut sink = CsvSink::new(file);
    sink.write_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ExtractedRecord {
        ExtractedRecord {
            page: 1,
            column: 1,
            row: 1,
            voter_id: "ABC12345O7".into(), // O slips through → corrected on write
            name: "जोशी जगदीश".into(),
            name_english: "Joshi Jagdish".into(),
            gender: "पु".into(),
            age: "42".into(),
            ..Default::default()
        }
    }

    #[test]
    fn csv_has_header_and_corrected_epic() {
        let mut sink = CsvSink::new(Vec::new());
        sink.write_records(&[sample_record()]).unwrap();
        let bytes = sink.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("EPIC No,Name,"));
        assert_eq!(header.split(',').count(), SPREADSHEET_COLUMNS.len());

        let row = lines.next().unwrap();
        assert!(row.starts_with("ABC1234507,"), "got: {row}");
        assert!(row.contains("Joshi Jagdish"));
    }

    #[test]
    fn empty_record_list_writes_header_only() {
        let mut sink = CsvSink::new(Vec::new());
        sink.write_records(&[]).unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
