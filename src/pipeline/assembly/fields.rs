use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{BEST_EFFORT_MARKER, MISSING_PLACEHOLDER, NOT_FOUND_PLACEHOLDER};
use crate::models::{
    ClientRecord, ConsentKind, ContactMethod, DateValue, Party, SigningParty, StaffReference,
    SupportItemReference,
};
use crate::pipeline::extraction::strip_checkbox_glyphs;
use crate::pipeline::matching::{MatchResult, Resolution, ResolvedReferences};

/// Rendered for plan manager slots on agency-managed and insurer-funded plans.
pub const NOT_APPLICABLE: &str = "Not applicable";

/// Flat slot name -> value mapping consumed by the renderer and the export row.
///
/// Every slot the assembler writes holds a non-empty value: either real
/// data or one of the placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgreementFields {
    slots: BTreeMap<String, String>,
}

impl AgreementFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: impl Into<String>, value: impl Into<String>) {
        self.slots.insert(slot.into(), value.into());
    }

    pub fn get(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }

    /// Value of a slot, or the missing-data placeholder when it was never set.
    pub fn value(&self, slot: &str) -> &str {
        self.get(slot).unwrap_or(MISSING_PLACEHOLDER)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding either placeholder.
    pub fn placeholder_count(&self) -> usize {
        self.slots
            .values()
            .filter(|v| {
                v.as_str() == MISSING_PLACEHOLDER
                    || v.as_str() == NOT_FOUND_PLACEHOLDER
                    || v.starts_with(BEST_EFFORT_MARKER)
            })
            .count()
    }

    /// Number of requested support items written into `support_item.N.*` slots.
    pub fn support_item_count(&self) -> usize {
        self.get("support_items.count")
            .and_then(|c| c.parse().ok())
            .unwrap_or(0)
    }
}

/// Slot name for field `field` of support item `n` (1-based).
pub fn support_item_slot(n: usize, field: &str) -> String {
    format!("support_item.{n}.{field}")
}

pub fn consent_slot(kind: ConsentKind) -> String {
    format!("consent.{}", kind.as_str())
}

/// Map a client record and its resolved references onto agreement slots.
pub fn assemble_agreement(record: &ClientRecord, resolved: &ResolvedReferences) -> AgreementFields {
    let mut fields = AgreementFields::new();

    fill_participant(&mut fields, record);
    fill_plan(&mut fields, record);
    fill_signatory(&mut fields, record);
    fill_emergency_contact(&mut fields, record);
    fill_plan_manager(&mut fields, record);
    fill_key_contact(&mut fields, record, resolved);
    fill_support_items(&mut fields, resolved);

    for kind in ConsentKind::ALL {
        let answer = if record.consent(*kind) { "Yes" } else { "No" };
        fields.set(consent_slot(*kind), answer);
    }

    tracing::debug!(
        slots = fields.len(),
        placeholders = fields.placeholder_count(),
        "Agreement fields assembled"
    );
    fields
}

fn or_missing(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => MISSING_PLACEHOLDER.to_string(),
    }
}

fn date_or_missing(value: Option<&DateValue>) -> String {
    or_missing(value.map(DateValue::display).as_deref())
}

fn fill_participant(fields: &mut AgreementFields, record: &ClientRecord) {
    fields.set("participant.name", or_missing(record.participant_name().as_deref()));
    fields.set("participant.display_name", or_missing(record.display_name().as_deref()));
    fields.set("participant.first_name", or_missing(record.first_name.as_deref()));
    fields.set("participant.middle_name", or_missing(record.middle_name.as_deref()));
    fields.set("participant.surname", or_missing(record.surname.as_deref()));
    fields.set("participant.client_id", client_id(record));
    fields.set("participant.ndis_number", or_missing(record.ndis_number.as_deref()));
    fields.set("participant.date_of_birth", date_or_missing(record.date_of_birth.as_ref()));
    fields.set("participant.gender", or_missing(record.gender.as_deref()));
    fields.set("participant.address", or_missing(record.address.as_deref()));
    fields.set("participant.home_phone", or_missing(record.home_phone.as_deref()));
    fields.set("participant.work_phone", or_missing(record.work_phone.as_deref()));
    fields.set("participant.mobile_phone", or_missing(record.mobile_phone.as_deref()));
    fields.set("participant.email", or_missing(record.email.as_deref()));
    fields.set(
        "participant.preferred_contact",
        or_missing(record.preferred_contact.as_deref().map(strip_checkbox_glyphs).as_deref()),
    );
}

/// "First Surname YYYY" from the birth year.
fn client_id(record: &ClientRecord) -> String {
    let year = record.date_of_birth.as_ref().and_then(DateValue::year);
    match (record.display_name(), year, &record.surname) {
        (Some(name), Some(year), Some(_)) => format!("{name} {year}"),
        _ => MISSING_PLACEHOLDER.to_string(),
    }
}

fn fill_plan(fields: &mut AgreementFields, record: &ClientRecord) {
    fields.set(
        "plan.core_budget",
        or_missing(record.core_budget.as_ref().map(|a| a.display()).as_deref()),
    );
    fields.set(
        "plan.capacity_budget",
        or_missing(record.capacity_budget.as_ref().map(|a| a.display()).as_deref()),
    );
    fields.set("plan.start", date_or_missing(record.plan_start.as_ref()));
    fields.set("plan.end", date_or_missing(record.plan_end.as_ref()));
    fields.set(
        "plan.management_type",
        or_missing(record.plan_management.management_type.as_deref()),
    );
    fields.set("service.start", date_or_missing(record.service_start.as_ref()));
    fields.set("service.end", date_or_missing(record.service_end.as_ref()));
}

fn fill_signatory(fields: &mut AgreementFields, record: &ClientRecord) {
    let (name, party) = match record.signing_party() {
        SigningParty::Participant => (record.participant_name(), record.as_party()),
        SigningParty::PrimaryCarer => (
            record.primary_carer.full_name(),
            record.primary_carer.clone(),
        ),
        SigningParty::Other => (record.signer.full_name(), record.signer.clone()),
    };

    fields.set("signatory.name", or_missing(name.as_deref()));
    fields.set("signatory.relationship", or_missing(party.relationship.as_deref()));
    fields.set("signatory.address", or_missing(party.address.as_deref()));
    fields.set(
        "signatory.contact",
        or_missing(preferred_contact_detail(&party, record).as_deref()),
    );
}

/// The detail matching the party's preferred contact method, falling back
/// to the client's preference. When no detail is on file for that method
/// the stated preference itself is returned.
fn preferred_contact_detail(party: &Party, record: &ClientRecord) -> Option<String> {
    let preferred = party
        .preferred_contact
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .or(record.preferred_contact.as_deref())
        .map(strip_checkbox_glyphs)?;

    let detail = ContactMethod::from_free_text(&preferred)
        .and_then(|method| party.contact_by(method))
        .map(str::trim)
        .filter(|d| !d.is_empty());

    match detail {
        Some(d) => Some(d.to_string()),
        None => Some(preferred),
    }
}

fn fill_emergency_contact(fields: &mut AgreementFields, record: &ClientRecord) {
    let party = if record.carer_is_emergency_contact {
        &record.primary_carer
    } else {
        &record.emergency_contact
    };
    let phone = party
        .mobile_phone
        .as_deref()
        .or(party.home_phone.as_deref())
        .or(party.work_phone.as_deref());

    fields.set("emergency_contact.name", or_missing(party.full_name().as_deref()));
    fields.set(
        "emergency_contact.relationship",
        or_missing(party.relationship.as_deref()),
    );
    fields.set("emergency_contact.phone", or_missing(phone));
}

fn fill_plan_manager(fields: &mut AgreementFields, record: &ClientRecord) {
    let plan = &record.plan_management;
    let slots = [
        ("plan_manager.name", plan.manager_name.as_deref()),
        ("plan_manager.address", plan.manager_address.as_deref()),
        ("plan_manager.phone", plan.manager_phone.as_deref()),
        ("plan_manager.email", plan.manager_email.as_deref()),
    ];
    for (slot, value) in slots {
        if plan.has_external_manager() {
            fields.set(slot, or_missing(value));
        } else {
            fields.set(slot, NOT_APPLICABLE);
        }
    }
}

/// Reference-derived value: placeholder when the cell itself was blank.
fn or_not_found(value: &str) -> String {
    if value.trim().is_empty() {
        NOT_FOUND_PLACEHOLDER.to_string()
    } else {
        value.trim().to_string()
    }
}

/// The matched name, prefixed when it came from the Partial tier.
fn matched_name<T>(result: &MatchResult<T>, name: &str) -> String {
    match result {
        MatchResult::Partial(_) => format!("{BEST_EFFORT_MARKER} {}", name.trim()),
        _ => or_not_found(name),
    }
}

fn fill_key_contact(
    fields: &mut AgreementFields,
    record: &ClientRecord,
    resolved: &ResolvedReferences,
) {
    fields.set("key_contact.requested", or_missing(record.respondent.as_deref()));

    let resolution: Option<&Resolution<StaffReference>> = resolved.respondent.as_ref();
    let tier = resolution
        .map(|r| r.result.tier().as_str())
        .unwrap_or("not_found");
    fields.set("key_contact.match", tier);

    let Some((result, staff)) = resolution.and_then(|r| r.result.reference().map(|s| (&r.result, s)))
    else {
        for slot in [
            "key_contact.name",
            "key_contact.phone",
            "key_contact.email",
            "key_contact.team",
        ] {
            fields.set(slot, NOT_FOUND_PLACEHOLDER);
        }
        return;
    };

    fields.set("key_contact.name", matched_name(result, &staff.name));
    fields.set("key_contact.phone", or_not_found(&staff.mobile));
    fields.set("key_contact.email", or_not_found(&staff.email));
    let team = staff
        .team
        .as_deref()
        .or(record.representative_team.as_deref())
        .unwrap_or("");
    fields.set("key_contact.team", or_not_found(team));
}

fn fill_support_items(fields: &mut AgreementFields, resolved: &ResolvedReferences) {
    fields.set("support_items.count", resolved.support_items.len().to_string());

    for (i, resolution) in resolved.support_items.iter().enumerate() {
        let n = i + 1;
        fields.set(support_item_slot(n, "requested"), or_missing(Some(&resolution.query)));
        fields.set(support_item_slot(n, "match"), resolution.result.tier().as_str());

        let item: Option<&SupportItemReference> = resolution.result.reference();
        match item {
            Some(item) => {
                fields.set(support_item_slot(n, "name"), matched_name(&resolution.result, &item.name));
                fields.set(support_item_slot(n, "number"), or_not_found(&item.number));
                fields.set(support_item_slot(n, "unit"), or_not_found(&item.unit));
                fields.set(
                    support_item_slot(n, "price"),
                    item.price_display()
                        .unwrap_or_else(|| NOT_FOUND_PLACEHOLDER.to_string()),
                );
            }
            None => {
                for field in ["name", "number", "unit", "price"] {
                    fields.set(support_item_slot(n, field), NOT_FOUND_PLACEHOLDER);
                }
            }
        }
    }
}
