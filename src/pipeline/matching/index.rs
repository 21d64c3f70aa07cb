use std::collections::HashMap;

use super::{normalize_key, MatchResult, ReferenceRecord};

/// In-memory lookup index over one reference table.
///
/// Rows keep load order. A key that normalizes equal to an earlier row's
/// key is dropped, so the first row wins in both tiers. Rows with a blank
/// key are skipped. Read-only after construction.
#[derive(Debug, Clone)]
pub struct ReferenceIndex<T> {
    entries: Vec<(String, T)>,
    exact: HashMap<String, usize>,
    duplicates_skipped: usize,
}

impl<T: ReferenceRecord + Clone> ReferenceIndex<T> {
    pub fn from_rows(rows: impl IntoIterator<Item = T>) -> Self {
        let mut entries: Vec<(String, T)> = Vec::new();
        let mut exact = HashMap::new();
        let mut duplicates_skipped = 0;

        for row in rows {
            let key = normalize_key(row.key());
            if key.is_empty() {
                continue;
            }
            if exact.contains_key(&key) {
                duplicates_skipped += 1;
                continue;
            }
            exact.insert(key.clone(), entries.len());
            entries.push((key, row));
        }

        if duplicates_skipped > 0 {
            tracing::debug!(
                kind = %T::KIND,
                duplicates_skipped,
                "Duplicate reference keys ignored, first row kept"
            );
        }

        Self {
            entries,
            exact,
            duplicates_skipped,
        }
    }

    /// Two-tier lookup: normalized equality, then substring either way in load order.
    pub fn lookup(&self, query: &str) -> MatchResult<T> {
        let query = normalize_key(query);
        if query.is_empty() {
            return MatchResult::NotFound;
        }

        if let Some(&i) = self.exact.get(&query) {
            return MatchResult::Exact(self.entries[i].1.clone());
        }

        self.entries
            .iter()
            .find(|(key, _)| key.contains(&query) || query.contains(key.as_str()))
            .map(|(_, row)| MatchResult::Partial(row.clone()))
            .unwrap_or(MatchResult::NotFound)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_skipped
    }

    /// Rows in load order.
    pub fn rows(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, row)| row)
    }
}
