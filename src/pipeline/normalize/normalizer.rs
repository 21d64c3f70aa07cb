use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::dates::parse_date;
use super::labels::{CanonicalField, LabelIndex, PartyField, PartyRole};
use super::values::{clean_value, is_affirmative, parse_currency};
use crate::config::MAX_SUPPORT_ITEMS;
use crate::models::{Amount, ClientRecord, ConsentKind, DateValue, Party, PlanManagement};
use crate::pipeline::extraction::normalize_label;
use crate::pipeline::source::RawRecord;

/// Normalized support slot label: `support item 3` or
/// `support item 3 support items required`.
static SUPPORT_SLOT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^support item (\d{1,2})(?: support items required)?$").unwrap()
});

/// Maps a raw label -> value record onto the canonical [`ClientRecord`].
///
/// Never fails: unresolved fields stay `None` and are rendered as
/// placeholders downstream.
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    max_support_items: usize,
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new(MAX_SUPPORT_ITEMS)
    }
}

impl FieldNormalizer {
    pub fn new(max_support_items: usize) -> Self {
        Self { max_support_items }
    }

    pub fn normalize(&self, raw: &RawRecord) -> ClientRecord {
        let index = LabelIndex::new(raw);
        let text = |field: CanonicalField| index.get(field).and_then(clean_value);
        let date = |field: CanonicalField| text(field).map(|v| parse_date(&v));
        let amount = |field: CanonicalField| {
            text(field).map(|raw| Amount {
                value: parse_currency(&raw),
                raw,
            })
        };
        let party = |role: PartyRole| normalize_party(&index, role);

        let mut record = ClientRecord {
            first_name: text(CanonicalField::FirstName),
            middle_name: text(CanonicalField::MiddleName),
            surname: text(CanonicalField::Surname),
            ndis_number: text(CanonicalField::NdisNumber),
            date_of_birth: date(CanonicalField::DateOfBirth),
            gender: text(CanonicalField::Gender),

            address: text(CanonicalField::Address),
            home_phone: text(CanonicalField::HomePhone),
            work_phone: text(CanonicalField::WorkPhone),
            mobile_phone: text(CanonicalField::MobilePhone),
            email: text(CanonicalField::Email),
            preferred_contact: text(CanonicalField::PreferredContact),

            core_budget: amount(CanonicalField::CoreBudget),
            capacity_budget: amount(CanonicalField::CapacityBudget),
            plan_start: date(CanonicalField::PlanStart),
            plan_end: date(CanonicalField::PlanEnd),
            service_start: date(CanonicalField::ServiceStart),
            service_end: date(CanonicalField::ServiceEnd),

            person_signing: text(CanonicalField::PersonSigning),
            signer: party(PartyRole::Signer),
            primary_carer: party(PartyRole::PrimaryCarer),
            emergency_contact: party(PartyRole::EmergencyContact),
            carer_is_emergency_contact: index
                .get_raw(CanonicalField::CarerIsEmergencyContact)
                .map(is_affirmative)
                .unwrap_or(false),

            plan_management: PlanManagement {
                management_type: text(CanonicalField::PlanManagementType),
                manager_name: text(CanonicalField::PlanManagerName),
                manager_address: text(CanonicalField::PlanManagerAddress),
                manager_phone: text(CanonicalField::PlanManagerPhone),
                manager_email: text(CanonicalField::PlanManagerEmail),
            },

            respondent: text(CanonicalField::Respondent),
            representative_team: text(CanonicalField::RepresentativeTeam),

            support_items: self.support_items(raw),
            consents: consents(raw),
        };

        if record.first_name.is_none() && record.surname.is_none() {
            if let Some(full_name) = text(CanonicalField::FullName) {
                split_full_name(&full_name, &mut record);
            }
        }

        tracing::debug!(
            raw_field_count = raw.len(),
            support_item_count = record.support_items.len(),
            dates_unparsed = [
                &record.date_of_birth,
                &record.plan_start,
                &record.plan_end,
                &record.service_start,
                &record.service_end,
            ]
            .iter()
            .filter(|d| matches!(d, Some(DateValue::Unparsed(_))))
            .count(),
            "Client record normalized"
        );

        record
    }

    /// Requested item names ordered by slot number. Slots outside
    /// `1..=max_support_items` are ignored; the first label seen for a slot wins.
    fn support_items(&self, raw: &RawRecord) -> Vec<String> {
        let mut slots: BTreeMap<usize, String> = BTreeMap::new();
        for (label, value) in raw.iter() {
            let label = normalize_label(label);
            let Some(slot) = SUPPORT_SLOT_LABEL
                .captures(&label)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<usize>().ok())
            else {
                continue;
            };
            if slot == 0 || slot > self.max_support_items {
                continue;
            }
            if let Some(value) = clean_value(value) {
                slots.entry(slot).or_insert(value);
            }
        }
        slots.into_values().collect()
    }
}

fn normalize_party(index: &LabelIndex<'_>, role: PartyRole) -> Party {
    let get = |field: PartyField| {
        index
            .get(CanonicalField::Party(role, field))
            .and_then(clean_value)
    };
    Party {
        first_name: get(PartyField::FirstName),
        surname: get(PartyField::Surname),
        relationship: get(PartyField::Relationship),
        address: get(PartyField::Address),
        home_phone: get(PartyField::HomePhone),
        work_phone: get(PartyField::WorkPhone),
        mobile_phone: get(PartyField::MobilePhone),
        email: get(PartyField::Email),
        preferred_contact: get(PartyField::PreferredContact),
    }
}

/// A consent label is any raw label containing the statement's opening
/// clause, or the consent's snake_case name.
fn consents(raw: &RawRecord) -> BTreeMap<ConsentKind, bool> {
    let labels: Vec<(String, &str)> = raw
        .iter()
        .map(|(label, value)| (normalize_label(label), value))
        .collect();

    ConsentKind::ALL
        .iter()
        .map(|kind| {
            let statement = kind.statement();
            let opening = normalize_label(statement.split('.').next().unwrap_or(statement));
            let short = normalize_label(kind.as_str());
            let given = labels
                .iter()
                .find(|(label, _)| label.contains(&opening) || *label == short)
                .map(|(_, value)| is_affirmative(value))
                .unwrap_or(false);
            (*kind, given)
        })
        .collect()
}

/// First word -> first name, last word -> surname, anything between -> middle name.
fn split_full_name(full_name: &str, record: &mut ClientRecord) {
    let words: Vec<&str> = full_name.split_whitespace().collect();
    match words.as_slice() {
        [] => {}
        [only] => record.first_name = Some(only.to_string()),
        [first, middle @ .., last] => {
            record.first_name = Some(first.to_string());
            record.surname = Some(last.to_string());
            if record.middle_name.is_none() && !middle.is_empty() {
                record.middle_name = Some(middle.join(" "));
            }
        }
    }
}
