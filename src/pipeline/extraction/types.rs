use serde::{Deserialize, Serialize};

use super::ExtractionError;
use crate::pipeline::source::{RawRecord, SourceVariant};

/// Text of one PDF page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtraction {
    pub page_number: usize,
    pub text: String,
}

/// PDF text-layer abstraction (allows mocking for tests)
pub trait PdfExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError>;
}

/// One strategy turning document bytes into a raw label -> value mapping.
///
/// Form fields, scraped PDF text and CSV rows all sit behind this trait so the
/// loader can chain them and tests can swap any one out.
pub trait FieldExtractor {
    fn variant(&self) -> SourceVariant;

    fn extract_fields(&self, bytes: &[u8]) -> Result<RawRecord, ExtractionError>;
}
