//! Canonical client-record fields and the raw label spellings that feed them.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::values::clean_value;
use crate::pipeline::extraction::normalize_label;
use crate::pipeline::source::RawRecord;

/// The three people other than the client the form asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Signer,
    PrimaryCarer,
    EmergencyContact,
}

impl PartyRole {
    pub const ALL: &'static [PartyRole] = &[Self::Signer, Self::PrimaryCarer, Self::EmergencyContact];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signer => "signer",
            Self::PrimaryCarer => "primary_carer",
            Self::EmergencyContact => "emergency_contact",
        }
    }

    /// Section qualifier and free prefixes used for this party's labels.
    fn spellings(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Signer => (
                "Person Signing the Agreement",
                &["person signing", "person signing the agreement", "signatory", "signer"],
            ),
            Self::PrimaryCarer => ("Primary carer", &["primary carer", "carer"]),
            Self::EmergencyContact => (
                "Emergency contact",
                &["emergency contact", "emergency"],
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyField {
    FirstName,
    Surname,
    Relationship,
    Address,
    HomePhone,
    WorkPhone,
    MobilePhone,
    Email,
    PreferredContact,
}

impl PartyField {
    pub const ALL: &'static [PartyField] = &[
        Self::FirstName,
        Self::Surname,
        Self::Relationship,
        Self::Address,
        Self::HomePhone,
        Self::WorkPhone,
        Self::MobilePhone,
        Self::Email,
        Self::PreferredContact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::Surname => "surname",
            Self::Relationship => "relationship",
            Self::Address => "address",
            Self::HomePhone => "home_phone",
            Self::WorkPhone => "work_phone",
            Self::MobilePhone => "mobile_phone",
            Self::Email => "email",
            Self::PreferredContact => "preferred_contact",
        }
    }

    /// Form label first, then accepted synonyms.
    fn spellings(&self) -> &'static [&'static str] {
        match self {
            Self::FirstName => &["First name", "firstname", "given name"],
            Self::Surname => &["Surname", "family name", "last name", "lastname"],
            Self::Relationship => &["Relationship to client", "relationship"],
            Self::Address => &["Home address", "address"],
            Self::HomePhone => &["Home phone", "home phone number"],
            Self::WorkPhone => &["Work phone", "work phone number"],
            Self::MobilePhone => &["Mobile phone", "mobile phone number", "mobile"],
            Self::Email => &["Email address", "email"],
            Self::PreferredContact => &["Preferred method of contact", "preferred contact method"],
        }
    }
}

/// A normalized client-record attribute, independent of any form's wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    FirstName,
    MiddleName,
    Surname,
    /// Whole-name column of CSV exports; split when first/surname are absent.
    FullName,
    NdisNumber,
    DateOfBirth,
    Gender,
    Address,
    HomePhone,
    WorkPhone,
    MobilePhone,
    Email,
    PreferredContact,
    CoreBudget,
    CapacityBudget,
    PlanStart,
    PlanEnd,
    ServiceStart,
    ServiceEnd,
    PersonSigning,
    CarerIsEmergencyContact,
    PlanManagementType,
    PlanManagerName,
    PlanManagerAddress,
    PlanManagerPhone,
    PlanManagerEmail,
    Respondent,
    RepresentativeTeam,
    Party(PartyRole, PartyField),
}

/// Fields a PDF extraction must yield before the loader accepts it.
pub const MINIMUM_VIABLE: &[CanonicalField] = &[
    CanonicalField::Respondent,
    CanonicalField::FirstName,
    CanonicalField::Surname,
];

const CLIENT_QUALIFIERS: &[&str] = &["Details of the Client", "Contact Details of the Client"];

impl CanonicalField {
    /// Stable snake_case name used in warnings.
    pub fn label(&self) -> String {
        match self {
            Self::Party(role, field) => format!("{}.{}", role.as_str(), field.as_str()),
            other => other.simple_name().to_string(),
        }
    }

    fn simple_name(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::MiddleName => "middle_name",
            Self::Surname => "surname",
            Self::FullName => "full_name",
            Self::NdisNumber => "ndis_number",
            Self::DateOfBirth => "date_of_birth",
            Self::Gender => "gender",
            Self::Address => "address",
            Self::HomePhone => "home_phone",
            Self::WorkPhone => "work_phone",
            Self::MobilePhone => "mobile_phone",
            Self::Email => "email",
            Self::PreferredContact => "preferred_contact",
            Self::CoreBudget => "core_budget",
            Self::CapacityBudget => "capacity_budget",
            Self::PlanStart => "plan_start",
            Self::PlanEnd => "plan_end",
            Self::ServiceStart => "service_start",
            Self::ServiceEnd => "service_end",
            Self::PersonSigning => "person_signing",
            Self::CarerIsEmergencyContact => "carer_is_emergency_contact",
            Self::PlanManagementType => "plan_management_type",
            Self::PlanManagerName => "plan_manager_name",
            Self::PlanManagerAddress => "plan_manager_address",
            Self::PlanManagerPhone => "plan_manager_phone",
            Self::PlanManagerEmail => "plan_manager_email",
            Self::Respondent => "respondent",
            Self::RepresentativeTeam => "representative_team",
            Self::Party(..) => "party",
        }
    }

    /// Client fields labelled per form section; all spellings of each.
    fn client_spellings(&self) -> Option<&'static [&'static str]> {
        let spellings: &'static [&'static str] = match self {
            Self::FirstName => PartyField::FirstName.spellings(),
            Self::Surname => PartyField::Surname.spellings(),
            Self::MiddleName => &["Middle name", "middlename", "middle names"],
            Self::NdisNumber => &["NDIS number", "ndis no", "ndis"],
            Self::DateOfBirth => &["Date of birth", "dob", "birth date"],
            Self::Gender => &["Gender", "sex"],
            Self::Address => PartyField::Address.spellings(),
            Self::HomePhone => PartyField::HomePhone.spellings(),
            Self::WorkPhone => PartyField::WorkPhone.spellings(),
            Self::MobilePhone => PartyField::MobilePhone.spellings(),
            Self::Email => PartyField::Email.spellings(),
            Self::PreferredContact => PartyField::PreferredContact.spellings(),
            _ => return None,
        };
        Some(spellings)
    }

    /// Form-wide fields with a single label each (plus synonyms).
    fn global_spellings(&self) -> &'static [&'static str] {
        match self {
            Self::FullName => &["name", "full name", "client name", "participant name"],
            Self::CoreBudget => &[
                "Total core budget to allocate to Neighbourhood Care",
                "total core budget",
                "core budget",
            ],
            Self::CapacityBudget => &[
                "Total capacity building budget to allocate to Neighbourhood Care",
                "total capacity building budget",
                "capacity building budget",
            ],
            Self::PlanStart => &["Plan start date", "plan start"],
            Self::PlanEnd => &["Plan end date", "plan end"],
            Self::ServiceStart => &["Service start date", "service start"],
            Self::ServiceEnd => &["Service end date", "service end"],
            Self::PersonSigning => &["Person signing the agreement", "who is signing", "signatory"],
            Self::CarerIsEmergencyContact => &[
                "Is the primary carer also the emergency contact for the participant?",
                "primary carer also emergency contact",
                "is primary carer emergency contact",
            ],
            Self::PlanManagementType => &["Plan management type", "plan management"],
            Self::PlanManagerName => &["Plan manager name", "plan manager"],
            Self::PlanManagerAddress => &["Plan manager postal address", "plan manager address"],
            Self::PlanManagerPhone => &["Plan manager phone number", "plan manager phone"],
            Self::PlanManagerEmail => &["Plan manager email address", "plan manager email"],
            Self::Respondent => &[
                "Respondent",
                "Neighbourhood Care representative",
                "representative",
                "staff name",
            ],
            Self::RepresentativeTeam => &[
                "Neighbourhood Care representative team",
                "representative team",
                "team",
            ],
            _ => &[],
        }
    }

    /// Every accepted raw spelling, normalized, in priority order.
    fn variants(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |s: String| {
            let n = normalize_label(&s);
            if !n.is_empty() && !out.contains(&n) {
                out.push(n);
            }
        };

        match self {
            Self::Party(role, field) => {
                let (qualifier, prefixes) = role.spellings();
                for spelling in field.spellings() {
                    push(format!("{spelling} ({qualifier})"));
                }
                for prefix in prefixes {
                    for spelling in field.spellings() {
                        push(format!("{prefix} {spelling}"));
                    }
                }
            }
            other => {
                if let Some(spellings) = other.client_spellings() {
                    for qualifier in CLIENT_QUALIFIERS {
                        for spelling in spellings {
                            push(format!("{spelling} ({qualifier})"));
                        }
                    }
                    for spelling in spellings {
                        push(format!("client {spelling}"));
                    }
                    for spelling in spellings {
                        push(spelling.to_string());
                    }
                }
                for spelling in other.global_spellings() {
                    push(spelling.to_string());
                }
            }
        }
        out
    }

    /// Every canonical field, client fields first.
    pub fn all() -> Vec<CanonicalField> {
        let mut all = vec![
            Self::FirstName,
            Self::MiddleName,
            Self::Surname,
            Self::FullName,
            Self::NdisNumber,
            Self::DateOfBirth,
            Self::Gender,
            Self::Address,
            Self::HomePhone,
            Self::WorkPhone,
            Self::MobilePhone,
            Self::Email,
            Self::PreferredContact,
            Self::CoreBudget,
            Self::CapacityBudget,
            Self::PlanStart,
            Self::PlanEnd,
            Self::ServiceStart,
            Self::ServiceEnd,
            Self::PersonSigning,
            Self::CarerIsEmergencyContact,
            Self::PlanManagementType,
            Self::PlanManagerName,
            Self::PlanManagerAddress,
            Self::PlanManagerPhone,
            Self::PlanManagerEmail,
            Self::Respondent,
            Self::RepresentativeTeam,
        ];
        for role in PartyRole::ALL {
            for field in PartyField::ALL {
                all.push(Self::Party(*role, *field));
            }
        }
        all
    }
}

/// Canonical field -> accepted normalized raw labels, built once.
static LABEL_VARIANTS: LazyLock<HashMap<CanonicalField, Vec<String>>> = LazyLock::new(|| {
    CanonicalField::all()
        .into_iter()
        .map(|field| (field, field.variants()))
        .collect()
});

/// Accepted normalized raw labels for `field`, highest priority first.
pub fn label_variants(field: CanonicalField) -> &'static [String] {
    LABEL_VARIANTS
        .get(&field)
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Raw record re-keyed by normalized label. The first raw label to
/// normalize to a given key keeps it.
pub struct LabelIndex<'a> {
    by_label: HashMap<String, &'a str>,
}

impl<'a> LabelIndex<'a> {
    pub fn new(raw: &'a RawRecord) -> Self {
        let mut by_label = HashMap::with_capacity(raw.len());
        for (label, value) in raw.iter() {
            by_label.entry(normalize_label(label)).or_insert(value);
        }
        Self { by_label }
    }

    /// Value under the first accepted spelling whose value survives
    /// [`clean_value`]. A glyph-only or blank entry falls through to the
    /// next spelling.
    pub fn get(&self, field: CanonicalField) -> Option<&'a str> {
        label_variants(field).iter().find_map(|variant| {
            self.by_label
                .get(variant.as_str())
                .copied()
                .filter(|value| clean_value(value).is_some())
        })
    }

    /// Value under the first accepted spelling present, glyphs included.
    pub fn get_raw(&self, field: CanonicalField) -> Option<&'a str> {
        label_variants(field)
            .iter()
            .find_map(|variant| self.by_label.get(variant.as_str()).copied())
    }
}

/// Minimum-viable fields the raw record cannot supply.
///
/// A whole-name column with at least two words stands in for first name
/// and surname.
pub fn missing_minimum(raw: &RawRecord) -> Vec<CanonicalField> {
    let index = LabelIndex::new(raw);
    let full_name_words = index
        .get(CanonicalField::FullName)
        .map(|n| n.split_whitespace().count())
        .unwrap_or(0);

    MINIMUM_VIABLE
        .iter()
        .copied()
        .filter(|field| {
            if index.get(*field).is_some() {
                return false;
            }
            match field {
                CanonicalField::FirstName => full_name_words == 0,
                CanonicalField::Surname => full_name_words < 2,
                _ => true,
            }
        })
        .collect()
}

pub fn is_minimum_viable(raw: &RawRecord) -> bool {
    missing_minimum(raw).is_empty()
}
