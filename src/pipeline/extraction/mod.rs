pub mod types;
pub mod sanitize;
pub mod pdf;
pub mod form_fields;
pub mod sections;

pub use types::*;
pub use sanitize::*;
pub use pdf::*;
pub use form_fields::*;
pub use sections::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Malformed form dictionary: {0}")]
    FormStructure(String),

    #[error("CSV parsing failed: {0}")]
    CsvParsing(#[from] csv::Error),

    #[error("Text encoding error: {0}")]
    EncodingError(String),
}
