pub mod index;
pub mod matcher;
pub mod tables;

pub use index::*;
pub use matcher::*;
pub use tables::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ReferenceKind, StaffReference, SupportItemReference};

#[derive(Error, Debug)]
pub enum ReferenceTableError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("No rows with a usable key")]
    Empty,
}

/// Key normalization shared by both tiers: trim, collapse internal
/// whitespace to one space, case-fold. Idempotent.
pub fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Tier a lookup resolved at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Partial,
    NotFound,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Partial => "partial",
            Self::NotFound => "not_found",
        }
    }
}

/// Outcome of a single reference lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tier", content = "reference", rename_all = "snake_case")]
pub enum MatchResult<T> {
    Exact(T),
    /// Best-effort substring match; shown to the reviewer as such.
    Partial(T),
    NotFound,
}

impl<T> MatchResult<T> {
    pub fn tier(&self) -> MatchTier {
        match self {
            Self::Exact(_) => MatchTier::Exact,
            Self::Partial(_) => MatchTier::Partial,
            Self::NotFound => MatchTier::NotFound,
        }
    }

    pub fn reference(&self) -> Option<&T> {
        match self {
            Self::Exact(r) | Self::Partial(r) => Some(r),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MatchResult<U> {
        match self {
            Self::Exact(r) => MatchResult::Exact(f(r)),
            Self::Partial(r) => MatchResult::Partial(f(r)),
            Self::NotFound => MatchResult::NotFound,
        }
    }
}

/// A reference-table row with a lookup key.
pub trait ReferenceRecord {
    const KIND: ReferenceKind;

    fn key(&self) -> &str;
}

impl ReferenceRecord for SupportItemReference {
    const KIND: ReferenceKind = ReferenceKind::SupportItem;

    fn key(&self) -> &str {
        &self.name
    }
}

impl ReferenceRecord for StaffReference {
    const KIND: ReferenceKind = ReferenceKind::Staff;

    fn key(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_collapses_and_folds() {
        assert_eq!(normalize_key("  John   SMITH\t"), "john smith");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn normalize_key_is_idempotent() {
        for s in [
            "Assistance With Self-Care Activities - Standard - Weekday Daytime",
            "  john\n smith ",
            "ÉLODIE  Martin",
            "",
        ] {
            let once = normalize_key(s);
            assert_eq!(normalize_key(&once), once);
        }
    }

    #[test]
    fn match_result_accessors() {
        let exact: MatchResult<u8> = MatchResult::Exact(1);
        assert_eq!(exact.tier(), MatchTier::Exact);
        assert_eq!(exact.reference(), Some(&1));

        let partial = MatchResult::Partial(2).map(|v: u8| v * 10);
        assert_eq!(partial, MatchResult::Partial(20));

        let none: MatchResult<u8> = MatchResult::NotFound;
        assert!(!none.is_found());
        assert_eq!(none.reference(), None);
        assert_eq!(none.tier().as_str(), "not_found");
    }

    #[test]
    fn match_result_serializes_with_tier_tag() {
        let json = serde_json::to_value(MatchResult::Partial("x")).unwrap();
        assert_eq!(json["tier"], "partial");
        assert_eq!(json["reference"], "x");
    }
}
