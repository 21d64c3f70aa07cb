use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{MatchResult, ReferenceIndex, ReferenceRecord, ReferenceTables};
use crate::models::{ClientRecord, ReferenceKind, StaffReference, SupportItemReference};

/// One lookup: what was asked and what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution<T> {
    pub query: String,
    pub result: MatchResult<T>,
}

/// Every reference lookup made for one client record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedReferences {
    /// `None` when the record names no respondent.
    pub respondent: Option<Resolution<StaffReference>>,
    /// One per requested support item, in slot order.
    pub support_items: Vec<Resolution<SupportItemReference>>,
}

/// Resolves free-text names against the two injected reference indexes.
#[derive(Debug, Clone)]
pub struct ReferenceMatcher {
    support_items: Arc<ReferenceIndex<SupportItemReference>>,
    staff: Arc<ReferenceIndex<StaffReference>>,
}

impl ReferenceMatcher {
    pub fn new(
        support_items: Arc<ReferenceIndex<SupportItemReference>>,
        staff: Arc<ReferenceIndex<StaffReference>>,
    ) -> Self {
        Self {
            support_items,
            staff,
        }
    }

    pub fn from_tables(tables: &ReferenceTables) -> Self {
        Self::new(tables.support_items.clone(), tables.staff.clone())
    }

    pub fn resolve_staff(&self, name: &str) -> MatchResult<StaffReference> {
        lookup(&self.staff, name)
    }

    pub fn resolve_support_item(&self, name: &str) -> MatchResult<SupportItemReference> {
        lookup(&self.support_items, name)
    }

    pub fn resolve(&self, record: &ClientRecord) -> ResolvedReferences {
        let respondent = record.respondent.as_deref().map(|name| Resolution {
            query: name.to_string(),
            result: self.resolve_staff(name),
        });

        let support_items = record
            .support_items
            .iter()
            .map(|name| Resolution {
                query: name.clone(),
                result: self.resolve_support_item(name),
            })
            .collect();

        ResolvedReferences {
            respondent,
            support_items,
        }
    }
}

fn lookup<T: ReferenceRecord + Clone>(index: &ReferenceIndex<T>, query: &str) -> MatchResult<T> {
    let result = index.lookup(query);
    tracing::debug!(
        kind = %T::KIND,
        tier = result.tier().as_str(),
        matched = result.reference().map(|r| r.key()).unwrap_or(""),
        "Reference lookup"
    );
    result
}

impl ResolvedReferences {
    /// Lookups that did not resolve at the Exact tier, with their kind.
    pub fn inexact(&self) -> Vec<(ReferenceKind, &str, Option<&str>)> {
        let staff = self.respondent.iter().filter_map(inexact_entry);
        let items = self.support_items.iter().filter_map(inexact_entry);
        staff.chain(items).collect()
    }
}

fn inexact_entry<T: ReferenceRecord>(
    resolution: &Resolution<T>,
) -> Option<(ReferenceKind, &str, Option<&str>)> {
    match &resolution.result {
        MatchResult::Exact(_) => None,
        MatchResult::Partial(r) => Some((T::KIND, resolution.query.as_str(), Some(r.key()))),
        MatchResult::NotFound => Some((T::KIND, resolution.query.as_str(), None)),
    }
}
