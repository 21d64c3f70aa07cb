pub mod csv_row;
pub mod format;
pub mod loader;

pub use csv_row::*;
pub use format::*;
pub use loader::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No client intake document found (tried: {})", display_paths(.attempted))]
    Unavailable { attempted: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where a raw record came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceVariant {
    FormFieldPdf,
    TextPdf,
    Csv,
}

impl SourceVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FormFieldPdf => "form_field_pdf",
            Self::TextPdf => "text_pdf",
            Self::Csv => "csv",
        }
    }
}

/// Raw label -> value mapping produced by a source strategy.
///
/// Insertion order is preserved so that label collisions resolve
/// first-come. Empty values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the label is already present or the value is blank.
    /// Returns whether the value was stored.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) -> bool {
        let label = label.into();
        let value = value.into();
        let value = value.trim();
        if value.is_empty() || label.trim().is_empty() || self.contains(&label) {
            return false;
        }
        self.fields.push((label, value.to_string()));
        true
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.fields.iter().any(|(l, _)| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fill labels missing from `self` with values from `other`.
    pub fn merge_missing(&mut self, other: RawRecord) {
        for (label, value) in other.fields {
            self.insert(label, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}
