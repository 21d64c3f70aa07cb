use serde::{Deserialize, Serialize};

/// One row of the support-item price list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportItemReference {
    pub name: String,
    pub number: String,
    pub unit: String,
    /// Regional price, `None` when the cell held no readable amount.
    pub price: Option<f64>,
}

impl SupportItemReference {
    /// Price without currency symbol, two decimals.
    pub fn price_display(&self) -> Option<String> {
        self.price.map(|p| format!("{p:.2}"))
    }
}

/// One row of the staff directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffReference {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub team: Option<String>,
}
