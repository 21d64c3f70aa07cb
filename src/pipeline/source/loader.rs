use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::csv_row::CsvRowExtractor;
use super::format::{detect_format, DocumentKind};
use super::{RawRecord, SourceError, SourceVariant};
use crate::pipeline::extraction::{FieldExtractor, FormFieldExtractor, TextFieldExtractor};
use crate::pipeline::normalize::is_minimum_viable;

/// The raw mapping the loader settled on, and how it got there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedSource {
    pub variant: SourceVariant,
    pub path: PathBuf,
    pub fields: RawRecord,
    /// Whether `fields` holds the minimum viable set.
    pub viable: bool,
    /// Every path the loader looked at, in order.
    pub attempted: Vec<PathBuf>,
}

/// Priority chain over the three source strategies:
/// PDF form fields, then PDF text merged underneath them, then CSV.
pub struct SourceLoader {
    form: Box<dyn FieldExtractor + Send + Sync>,
    text: Box<dyn FieldExtractor + Send + Sync>,
    csv: Box<dyn FieldExtractor + Send + Sync>,
    fallback_csv: Vec<PathBuf>,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new(
            Box::new(FormFieldExtractor),
            Box::new(TextFieldExtractor::default()),
            Box::new(CsvRowExtractor::default()),
        )
    }
}

impl SourceLoader {
    pub fn new(
        form: Box<dyn FieldExtractor + Send + Sync>,
        text: Box<dyn FieldExtractor + Send + Sync>,
        csv: Box<dyn FieldExtractor + Send + Sync>,
    ) -> Self {
        Self {
            form,
            text,
            csv,
            fallback_csv: Vec::new(),
        }
    }

    /// CSV files tried after the upload's sibling `<stem>.csv`.
    pub fn with_fallback_csv(mut self, paths: Vec<PathBuf>) -> Self {
        self.fallback_csv = paths;
        self
    }

    /// Read data row `row_index` of CSV sources instead of the first.
    pub fn with_csv_row(mut self, row_index: usize) -> Self {
        self.csv = Box::new(CsvRowExtractor::new(row_index));
        self
    }

    /// Load the raw record for `primary`.
    ///
    /// Fails only when no document of a supported kind exists at any of the
    /// candidate paths. Unreadable or empty documents give an empty mapping.
    pub fn load(&self, primary: &Path) -> Result<LoadedSource, SourceError> {
        let mut attempted: Vec<PathBuf> = vec![primary.to_path_buf()];
        // Best non-viable result so far; PDF mappings take precedence.
        let mut fallback: Option<LoadedSource> = None;

        tracing::info!(file = %primary.display(), "Loading client source");

        // Step 1: PDF strategies on the upload itself
        let primary_kind = inspect_candidate(primary);
        match primary_kind {
            Some(DocumentKind::Pdf) => {
                let bytes = std::fs::read(primary)?;
                let (variant, fields) = self.load_pdf(&bytes, primary);
                if is_minimum_viable(&fields) {
                    return Ok(LoadedSource {
                        variant,
                        path: primary.to_path_buf(),
                        fields,
                        viable: true,
                        attempted,
                    });
                }
                tracing::info!(
                    file = %primary.display(),
                    field_count = fields.len(),
                    "PDF below minimum viable set, trying CSV fallback"
                );
                fallback = Some(LoadedSource {
                    variant,
                    path: primary.to_path_buf(),
                    fields,
                    viable: false,
                    attempted: Vec::new(),
                });
            }
            Some(DocumentKind::Unsupported) => {
                fallback = Some(empty_source(primary, SourceVariant::Csv));
            }
            Some(DocumentKind::Delimited) | None => {}
        }

        // Step 2: CSV candidates in priority order
        for candidate in self.csv_candidates(primary, primary_kind) {
            if !attempted.contains(&candidate) {
                attempted.push(candidate.clone());
            }
            if inspect_candidate(&candidate) != Some(DocumentKind::Delimited) {
                continue;
            }
            let bytes = std::fs::read(&candidate)?;
            let fields = run_strategy(self.csv.as_ref(), &bytes, &candidate);
            if fields.is_empty() {
                if fallback.is_none() {
                    fallback = Some(empty_source(&candidate, SourceVariant::Csv));
                }
                continue;
            }

            let viable = is_minimum_viable(&fields);
            tracing::info!(
                file = %candidate.display(),
                field_count = fields.len(),
                viable,
                "Client source loaded from CSV"
            );
            return Ok(LoadedSource {
                variant: SourceVariant::Csv,
                path: candidate,
                fields,
                viable,
                attempted,
            });
        }

        // Step 3: whatever the PDF gave, or nothing at all
        match fallback {
            Some(mut source) => {
                tracing::warn!(
                    file = %source.path.display(),
                    strategy = source.variant.as_str(),
                    field_count = source.fields.len(),
                    "No viable client source, continuing with partial extraction"
                );
                source.attempted = attempted;
                Ok(source)
            }
            None => {
                tracing::warn!(attempts = attempted.len(), "No client source document found");
                Err(SourceError::Unavailable { attempted })
            }
        }
    }

    /// Form fields first; when they fall short the text layer fills the gaps.
    fn load_pdf(&self, bytes: &[u8], path: &Path) -> (SourceVariant, RawRecord) {
        let mut fields = run_strategy(self.form.as_ref(), bytes, path);
        if is_minimum_viable(&fields) {
            tracing::info!(
                file = %path.display(),
                strategy = self.form.variant().as_str(),
                field_count = fields.len(),
                "Client source loaded from form fields"
            );
            return (self.form.variant(), fields);
        }

        tracing::info!(
            file = %path.display(),
            form_field_count = fields.len(),
            "Form fields below minimum viable set, scraping text layer"
        );
        let before = fields.len();
        fields.merge_missing(run_strategy(self.text.as_ref(), bytes, path));

        let variant = if fields.len() > before {
            self.text.variant()
        } else {
            self.form.variant()
        };
        (variant, fields)
    }

    fn csv_candidates(&self, primary: &Path, primary_kind: Option<DocumentKind>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if primary_kind == Some(DocumentKind::Delimited) {
            candidates.push(primary.to_path_buf());
        }
        let sibling = primary.with_extension("csv");
        if sibling != primary {
            candidates.push(sibling);
        }
        for path in &self.fallback_csv {
            if !candidates.contains(path) {
                candidates.push(path.clone());
            }
        }
        candidates
    }
}

/// Document kind at `path`, `None` when nothing usable is there.
///
/// A file whose bytes match no known format still counts as a (malformed)
/// document when its extension claims PDF or CSV.
fn inspect_candidate(path: &Path) -> Option<DocumentKind> {
    match detect_format(path) {
        Ok(format) if format.kind.is_supported() => {
            tracing::debug!(
                file = %path.display(),
                mime = %format.mime_type,
                size = format.file_size_bytes,
                kind = format.kind.as_str(),
                "Source candidate detected"
            );
            Some(format.kind)
        }
        Ok(_) if has_document_extension(path) => Some(DocumentKind::Unsupported),
        Ok(_) => None,
        Err(SourceError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Cannot inspect source candidate");
            None
        }
    }
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf") || e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Strategy failures degrade to an empty mapping.
fn run_strategy(extractor: &dyn FieldExtractor, bytes: &[u8], path: &Path) -> RawRecord {
    match extractor.extract_fields(bytes) {
        Ok(fields) => fields,
        Err(e) => {
            tracing::warn!(
                file = %path.display(),
                strategy = extractor.variant().as_str(),
                error = %e,
                "Extraction strategy failed"
            );
            RawRecord::new()
        }
    }
}

fn empty_source(path: &Path, variant: SourceVariant) -> LoadedSource {
    LoadedSource {
        variant,
        path: path.to_path_buf(),
        fields: RawRecord::new(),
        viable: false,
        attempted: Vec::new(),
    }
}
