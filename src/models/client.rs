use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::enums::{ConsentKind, ContactMethod, SigningParty};

/// A date field that may not have parsed.
///
/// Unparseable input is kept verbatim rather than dropped so the reviewer
/// still sees what the form said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum DateValue {
    Parsed(NaiveDate),
    Unparsed(String),
}

impl DateValue {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Parsed(date) => Some(date.year()),
            Self::Unparsed(_) => None,
        }
    }

    /// DD/MM/YYYY for parsed dates, the original text otherwise.
    pub fn display(&self) -> String {
        match self {
            Self::Parsed(date) => date.format("%d/%m/%Y").to_string(),
            Self::Unparsed(raw) => raw.clone(),
        }
    }
}

/// A currency amount as written on the form, with its numeric value when readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub raw: String,
    pub value: Option<f64>,
}

impl Amount {
    pub fn display(&self) -> String {
        match self.value {
            Some(v) => format!("${v:.2}"),
            None => self.raw.clone(),
        }
    }
}

/// Someone other than the client named on the form (signer, carer, emergency contact).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub relationship: Option<String>,
    pub address: Option<String>,
    pub home_phone: Option<String>,
    pub work_phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub email: Option<String>,
    pub preferred_contact: Option<String>,
}

impl Party {
    pub fn full_name(&self) -> Option<String> {
        join_present(&[self.first_name.as_deref(), self.surname.as_deref()])
    }

    pub fn contact_by(&self, method: ContactMethod) -> Option<&str> {
        match method {
            ContactMethod::HomePhone => self.home_phone.as_deref(),
            ContactMethod::MobilePhone => self.mobile_phone.as_deref(),
            ContactMethod::WorkPhone => self.work_phone.as_deref(),
            ContactMethod::Email => self.email.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanManagement {
    pub management_type: Option<String>,
    pub manager_name: Option<String>,
    pub manager_address: Option<String>,
    pub manager_phone: Option<String>,
    pub manager_email: Option<String>,
}

impl PlanManagement {
    /// Agency-managed and insurer-funded plans have no plan manager.
    pub fn has_external_manager(&self) -> bool {
        !matches!(
            self.management_type.as_deref().map(str::trim),
            Some("NDIA Agency Managed") | Some("Insurance Commission of WA")
        )
    }
}

/// Canonical representation of one intake form.
///
/// Every field is optional; absence degrades to a placeholder downstream.
/// The NDIS number is an opaque string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub surname: Option<String>,
    pub ndis_number: Option<String>,
    pub date_of_birth: Option<DateValue>,
    pub gender: Option<String>,

    pub address: Option<String>,
    pub home_phone: Option<String>,
    pub work_phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub email: Option<String>,
    pub preferred_contact: Option<String>,

    pub core_budget: Option<Amount>,
    pub capacity_budget: Option<Amount>,
    pub plan_start: Option<DateValue>,
    pub plan_end: Option<DateValue>,
    pub service_start: Option<DateValue>,
    pub service_end: Option<DateValue>,

    /// Free-text answer to "Person signing the agreement".
    pub person_signing: Option<String>,
    pub signer: Party,
    pub primary_carer: Party,
    pub emergency_contact: Party,
    pub carer_is_emergency_contact: bool,

    pub plan_management: PlanManagement,

    /// Lookup key into the staff directory.
    pub respondent: Option<String>,
    pub representative_team: Option<String>,

    /// Requested support item names in slot order.
    pub support_items: Vec<String>,

    pub consents: BTreeMap<ConsentKind, bool>,
}

impl ClientRecord {
    /// First + middle + surname.
    pub fn participant_name(&self) -> Option<String> {
        join_present(&[
            self.first_name.as_deref(),
            self.middle_name.as_deref(),
            self.surname.as_deref(),
        ])
    }

    /// First + surname.
    pub fn display_name(&self) -> Option<String> {
        join_present(&[self.first_name.as_deref(), self.surname.as_deref()])
    }

    pub fn signing_party(&self) -> SigningParty {
        self.person_signing
            .as_deref()
            .map(SigningParty::from_free_text)
            .unwrap_or(SigningParty::Other)
    }

    /// The client's own details viewed as a party, for signatory resolution.
    pub fn as_party(&self) -> Party {
        Party {
            first_name: self.first_name.clone(),
            surname: self.surname.clone(),
            relationship: Some("Participant".to_string()),
            address: self.address.clone(),
            home_phone: self.home_phone.clone(),
            work_phone: self.work_phone.clone(),
            mobile_phone: self.mobile_phone.clone(),
            email: self.email.clone(),
            preferred_contact: self.preferred_contact.clone(),
        }
    }

    pub fn consent(&self, kind: ConsentKind) -> bool {
        self.consents.get(&kind).copied().unwrap_or(false)
    }
}

/// Join the present, non-blank parts with single spaces.
pub(crate) fn join_present(parts: &[Option<&str>]) -> Option<String> {
    let joined = parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_name_skips_missing_middle_name() {
        let record = ClientRecord {
            first_name: Some("Jane".into()),
            surname: Some("Doe".into()),
            ..Default::default()
        };
        assert_eq!(record.participant_name().as_deref(), Some("Jane Doe"));
        assert_eq!(record.display_name().as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn empty_record_has_no_names() {
        let record = ClientRecord::default();
        assert!(record.participant_name().is_none());
        assert!(record.display_name().is_none());
        assert_eq!(record.signing_party(), SigningParty::Other);
    }

    #[test]
    fn parsed_date_displays_day_first() {
        let date = DateValue::Parsed(NaiveDate::from_ymd_opt(1990, 3, 7).unwrap());
        assert_eq!(date.display(), "07/03/1990");
        assert_eq!(date.year(), Some(1990));
    }

    #[test]
    fn unparsed_date_displays_verbatim() {
        let date = DateValue::Unparsed("sometime in spring".into());
        assert_eq!(date.display(), "sometime in spring");
        assert!(!date.is_parsed());
        assert_eq!(date.year(), None);
    }

    #[test]
    fn agency_managed_plan_has_no_manager() {
        let plan = PlanManagement {
            management_type: Some("NDIA Agency Managed".into()),
            ..Default::default()
        };
        assert!(!plan.has_external_manager());

        let plan = PlanManagement {
            management_type: Some("Plan Managed".into()),
            ..Default::default()
        };
        assert!(plan.has_external_manager());
    }

    #[test]
    fn party_contact_by_method() {
        let party = Party {
            mobile_phone: Some("0400 000 000".into()),
            email: Some("carer@example.com".into()),
            ..Default::default()
        };
        assert_eq!(party.contact_by(ContactMethod::MobilePhone), Some("0400 000 000"));
        assert_eq!(party.contact_by(ContactMethod::Email), Some("carer@example.com"));
        assert_eq!(party.contact_by(ContactMethod::HomePhone), None);
    }

    #[test]
    fn amount_display_formats_two_decimals() {
        let amount = Amount { raw: "$1200".into(), value: Some(1200.0) };
        assert_eq!(amount.display(), "$1200.00");
        let amount = Amount { raw: "TBC".into(), value: None };
        assert_eq!(amount.display(), "TBC");
    }
}
