use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::{normalize_key, ReferenceIndex, ReferenceRecord, ReferenceTableError};
use crate::models::{StaffReference, SupportItemReference};
use crate::pipeline::normalize::parse_currency;

/// Both reference tables, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub support_items: Arc<ReferenceIndex<SupportItemReference>>,
    pub staff: Arc<ReferenceIndex<StaffReference>>,
}

impl ReferenceTables {
    /// Build from in-memory rows, bypassing the filesystem.
    pub fn from_rows(
        support_items: impl IntoIterator<Item = SupportItemReference>,
        staff: impl IntoIterator<Item = StaffReference>,
    ) -> Self {
        Self {
            support_items: Arc::new(ReferenceIndex::from_rows(support_items)),
            staff: Arc::new(ReferenceIndex::from_rows(staff)),
        }
    }
}

/// Header row of a delimited table, looked up by normalized name.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        let mut map = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            map.entry(normalize_key(header.trim_start_matches('\u{feff}')))
                .or_insert(i);
        }
        Self(map)
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.0.get(&normalize_key(name)).copied()
    }

    fn required(&self, name: &str) -> Result<usize, ReferenceTableError> {
        self.optional(name)
            .ok_or_else(|| ReferenceTableError::MissingColumn(name.to_string()))
    }
}

fn cell(row: &csv::StringRecord, column: usize) -> String {
    row.get(column).unwrap_or_default().trim().to_string()
}

fn open_table(path: &Path) -> Result<csv::Reader<std::fs::File>, ReferenceTableError> {
    if !path.is_file() {
        return Err(ReferenceTableError::NotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

/// Load the support-item price list, reading prices from `price_column`.
pub fn load_support_items(
    path: &Path,
    price_column: &str,
) -> Result<ReferenceIndex<SupportItemReference>, ReferenceTableError> {
    let mut reader = open_table(path)?;
    let columns = Columns::new(reader.headers()?);
    let name_col = columns.required("Support Item Name")?;
    let number_col = columns.required("Support Item Number")?;
    let unit_col = columns.required("Unit")?;
    let price_col = columns.required(price_column)?;

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let name = cell(&row, name_col);
        if name.is_empty() {
            continue;
        }
        rows.push(SupportItemReference {
            name,
            number: cell(&row, number_col),
            unit: cell(&row, unit_col),
            price: parse_currency(&cell(&row, price_col)),
        });
    }

    finish(ReferenceIndex::from_rows(rows), path)
}

/// Load the staff directory. `team` comes from `area`, else `role`.
pub fn load_staff(path: &Path) -> Result<ReferenceIndex<StaffReference>, ReferenceTableError> {
    let mut reader = open_table(path)?;
    let columns = Columns::new(reader.headers()?);
    let name_col = columns.required("name")?;
    let mobile_col = columns.required("mobile")?;
    let email_col = columns.required("email")?;
    let area_col = columns.optional("area");
    let role_col = columns.optional("role");

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let name = cell(&row, name_col);
        if name.is_empty() {
            continue;
        }
        let team = [area_col, role_col]
            .into_iter()
            .flatten()
            .map(|col| cell(&row, col))
            .find(|v| !v.is_empty());
        rows.push(StaffReference {
            name,
            mobile: cell(&row, mobile_col),
            email: cell(&row, email_col),
            team,
        });
    }

    finish(ReferenceIndex::from_rows(rows), path)
}

fn finish<T: ReferenceRecord + Clone>(
    index: ReferenceIndex<T>,
    path: &Path,
) -> Result<ReferenceIndex<T>, ReferenceTableError> {
    if index.is_empty() {
        return Err(ReferenceTableError::Empty);
    }
    tracing::info!(
        table = %T::KIND,
        file = %path.display(),
        rows = index.len(),
        duplicates_skipped = index.duplicates_skipped(),
        "Reference table loaded"
    );
    Ok(index)
}
