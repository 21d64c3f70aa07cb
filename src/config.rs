use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "IntakeAgreement";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rendered wherever a reference lookup (staff, support item) found nothing.
pub const NOT_FOUND_PLACEHOLDER: &str = "[Not Found]";

/// Rendered wherever the intake form did not yield a value.
pub const MISSING_PLACEHOLDER: &str = "[To be filled in]";

/// Prefix marking a Partial-tier reference match in the agreement.
pub const BEST_EFFORT_MARKER: &str = "[Best-effort match]";

/// Default price column in the support-item table.
pub const DEFAULT_PRICE_REGION: &str = "WA";

/// The intake form numbers its support item slots 1..=19.
pub const MAX_SUPPORT_ITEMS: usize = 19;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,intake_agreement_lib=debug,lopdf=warn,pdf_extract=warn"
}

/// Get the application data directory
/// ~/IntakeAgreement/ on all platforms
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Directory holding the two reference tables when no path is given.
pub fn reference_dir() -> PathBuf {
    app_data_dir().join("reference")
}

pub fn default_support_table() -> PathBuf {
    reference_dir().join("support_items.csv")
}

pub fn default_staff_table() -> PathBuf {
    reference_dir().join("staff.csv")
}

/// Per-run generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Column of the support-item table holding the regional price.
    pub price_column: String,
    /// Extra CSV candidates tried after the sibling `<stem>.csv` of the upload.
    pub fallback_csv: Vec<PathBuf>,
    pub max_support_items: usize,
    /// Data row of a CSV source read as the record.
    pub csv_row: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            price_column: DEFAULT_PRICE_REGION.to_string(),
            fallback_csv: Vec::new(),
            max_support_items: MAX_SUPPORT_ITEMS,
            csv_row: 0,
        }
    }
}

impl GeneratorConfig {
    /// Defaults overridden by `INTAKE_PRICE_REGION`, `INTAKE_CSV_ROW` and
    /// `INTAKE_FALLBACK_CSV`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(region) = std::env::var("INTAKE_PRICE_REGION") {
            let region = region.trim();
            if !region.is_empty() {
                config.price_column = region.to_string();
            }
        }
        if let Ok(row) = std::env::var("INTAKE_CSV_ROW") {
            match row.trim().parse::<usize>() {
                Ok(row) => config.csv_row = row,
                Err(e) => tracing::warn!(value = %row, error = %e, "Ignoring invalid INTAKE_CSV_ROW"),
            }
        }
        if let Some(paths) = std::env::var_os("INTAKE_FALLBACK_CSV") {
            config.fallback_csv = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        config
    }
}
