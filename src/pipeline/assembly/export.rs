use serde::{Deserialize, Serialize};

use super::fields::{support_item_slot, AgreementFields};
use super::RenderError;
use crate::config::{MISSING_PLACEHOLDER, NOT_FOUND_PLACEHOLDER};

/// Client-management import columns, in import order.
pub const OUTPUT_FIELDS: &[&str] = &[
    "Salutation",
    "First Name",
    "Middle Name",
    "Family Name",
    "Display Name",
    "Date of Birth",
    "Gender",
    "Address",
    "Address Unit/Apartment Number",
    "General Information",
    "Phone Number",
    "Mobile Number",
    "Email",
    "Marital Status",
    "Nationality",
    "Languages",
    "NDIS Number",
    "Age Care Recipient ID",
    "Reference Number",
    "Purchase Order Number",
];

/// Import columns with an agreement slot behind them. The rest have no
/// source on the intake form and export empty.
const SOURCED_COLUMNS: &[(&str, &str)] = &[
    ("First Name", "participant.first_name"),
    ("Middle Name", "participant.middle_name"),
    ("Family Name", "participant.surname"),
    ("Display Name", "participant.display_name"),
    ("Date of Birth", "participant.date_of_birth"),
    ("Gender", "participant.gender"),
    ("Address", "participant.address"),
    ("Phone Number", "participant.home_phone"),
    ("Mobile Number", "participant.mobile_phone"),
    ("Email", "participant.email"),
    ("NDIS Number", "participant.ndis_number"),
];

const KEY_CONTACT_COLUMNS: &[(&str, &str)] = &[
    ("Key Contact", "key_contact.name"),
    ("Key Contact Phone", "key_contact.phone"),
    ("Key Contact Email", "key_contact.email"),
    ("Team", "key_contact.team"),
    ("Key Contact Match", "key_contact.match"),
];

const SUPPORT_ITEM_COLUMNS: &[(&str, &str)] = &[
    ("Name", "name"),
    ("Number", "number"),
    ("Unit", "unit"),
    ("Price", "price"),
    ("Match", "match"),
];

/// One flat client-export row: ordered `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    columns: Vec<(String, String)>,
}

impl ExportRow {
    /// Build the export row from assembled agreement slots.
    pub fn from_fields(fields: &AgreementFields) -> Self {
        let mut row = Self::default();

        for column in OUTPUT_FIELDS {
            let value = match *column {
                "Salutation" => "They".to_string(),
                "Email" => first_email(fields.value("participant.email")),
                _ => SOURCED_COLUMNS
                    .iter()
                    .find(|(c, _)| c == column)
                    .map(|(_, slot)| fields.value(slot).to_string())
                    .unwrap_or_default(),
            };
            row.push(*column, value);
        }

        for (column, slot) in KEY_CONTACT_COLUMNS {
            row.push(*column, fields.get(slot).unwrap_or(NOT_FOUND_PLACEHOLDER));
        }

        for n in 1..=fields.support_item_count() {
            for (suffix, field) in SUPPORT_ITEM_COLUMNS {
                let value = fields
                    .get(&support_item_slot(n, field))
                    .unwrap_or(NOT_FOUND_PLACEHOLDER);
                row.push(format!("Support Item {n} {suffix}"), value);
            }
        }

        row
    }

    fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Header line plus this single row, comma-delimited.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.headers())
            .map_err(|e| RenderError::Export(e.to_string()))?;
        writer
            .write_record(self.values())
            .map_err(|e| RenderError::Export(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| RenderError::Export(e.to_string()))
    }
}

/// First address of a `;`-separated list.
fn first_email(value: &str) -> String {
    match value.split(';').map(str::trim).find(|e| !e.is_empty()) {
        Some(email) => email.to_string(),
        None => MISSING_PLACEHOLDER.to_string(),
    }
}
