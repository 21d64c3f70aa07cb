use crate::pipeline::extraction::{sanitize_field_value, ExtractionError, FieldExtractor};

use super::{RawRecord, SourceVariant};

/// CSV strategy: one data row keyed by the header row.
///
/// Intake exports carry a single row; `row_index` picks another one when a
/// file holds several clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRowExtractor {
    pub row_index: usize,
}

impl CsvRowExtractor {
    pub fn new(row_index: usize) -> Self {
        Self { row_index }
    }
}

impl FieldExtractor for CsvRowExtractor {
    fn variant(&self) -> SourceVariant {
        SourceVariant::Csv
    }

    fn extract_fields(&self, bytes: &[u8]) -> Result<RawRecord, ExtractionError> {
        // Excel exports lead with a UTF-8 BOM that would otherwise stick to the first header.
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        let mut record = RawRecord::new();

        let Some(row) = reader.records().nth(self.row_index) else {
            tracing::debug!(row_index = self.row_index, "CSV has no such data row");
            return Ok(record);
        };
        let row = row?;

        for (header, value) in headers.iter().zip(row.iter()) {
            record.insert(header, sanitize_field_value(value));
        }
        Ok(record)
    }
}
