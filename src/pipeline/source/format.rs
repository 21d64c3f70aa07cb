use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SourceError;

/// Broad document kinds the loader understands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Delimited,
    Unsupported,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Delimited => "delimited",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Result of format detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDetection {
    pub mime_type: String,
    pub kind: DocumentKind,
    pub file_size_bytes: u64,
}

/// Upload limit of the intake web form.
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024; // 16MB

/// Detect file format from magic bytes (NOT file extensions).
/// An intake export saved as `.pdf` that is really a CSV still loads as CSV.
pub fn detect_format(path: &Path) -> Result<FormatDetection, SourceError> {
    let metadata = std::fs::metadata(path)?;
    let file_size = metadata.len();

    if file_size > MAX_FILE_SIZE {
        return Ok(FormatDetection {
            mime_type: "unknown".into(),
            kind: DocumentKind::Unsupported,
            file_size_bytes: file_size,
        });
    }

    let mut file = std::fs::File::open(path)?;
    let mut header = [0u8; 8];
    let bytes_read = file.read(&mut header)?;

    let (mime_type, kind) = match &header[..bytes_read] {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => ("application/pdf".to_string(), DocumentKind::Pdf),
        _ => {
            if is_likely_text(path)? {
                ("text/csv".to_string(), DocumentKind::Delimited)
            } else {
                (
                    "application/octet-stream".to_string(),
                    DocumentKind::Unsupported,
                )
            }
        }
    };

    Ok(FormatDetection {
        mime_type,
        kind,
        file_size_bytes: file_size,
    })
}

/// Check if a file is likely plain text (valid UTF-8, mostly printable)
fn is_likely_text(path: &Path) -> Result<bool, SourceError> {
    let mut file = std::fs::File::open(path)?;
    let mut buffer = vec![0u8; 4096];
    let n = file.read(&mut buffer)?;
    buffer.truncate(n);

    if n == 0 {
        return Ok(false);
    }

    // A multi-byte character may straddle the 4KB boundary.
    let text = match std::str::from_utf8(&buffer) {
        Ok(t) => t,
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&buffer[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return Ok(false),
    };

    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .count();
    let ratio = printable as f64 / text.chars().count().max(1) as f64;
    Ok(ratio > 0.80)
}

/// Sanitize a filename: strip path components, limit length
pub fn sanitize_filename(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("client");

    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .take(255)
        .collect();

    if clean.is_empty() {
        "client".to_string()
    } else {
        clean
    }
}
