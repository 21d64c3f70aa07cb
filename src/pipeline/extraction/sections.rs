//! Label/value scraping of the intake form's text layer.
//!
//! Used when a PDF has no usable form fields. The text is split into the
//! form's sections by their header lines; inside the client and party
//! sections each known field label yields the text that follows it, keyed
//! `"<label> (<section title>)"` the same way the interactive form names
//! its fields. A handful of labels that appear once per form (respondent,
//! plan dates, plan manager) are searched across the whole text, as are the
//! numbered support item slots and the consent statements.

use std::sync::LazyLock;

use regex::Regex;

use super::pdf::PdfTextExtractor;
use super::sanitize::{
    is_glyph_only, sanitize_extracted_text, strip_checkbox_glyphs, CHECKBOX_GLYPHS,
};
use super::types::{FieldExtractor, PdfExtractor};
use super::ExtractionError;
use crate::models::ConsentKind;
use crate::pipeline::source::{RawRecord, SourceVariant};

/// Header lines are short and never carry a value.
const MAX_HEADER_LEN: usize = 50;
/// Longer lines are guidance text, not values.
const MAX_VALUE_LINE_LEN: usize = 80;
/// Lines scanned after a section label for its value.
const SECTION_VALUE_WINDOW: usize = 4;
/// Lines scanned after a form-wide label for its value.
const GLOBAL_VALUE_WINDOW: usize = 2;

const INSTRUCTION_MARKERS: &[&str] = &["write", "below", "same as", "if their"];

static SUPPORT_SLOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^support item\s*\((\d{1,2})\)\s*(?:\(support items required\))?\s*:?\s*(.*)$")
        .unwrap()
});

/// Sections of the intake form template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSection {
    ClientDetails,
    ClientContact,
    PrimaryCarer,
    EmergencyContact,
    PersonSigning,
    NdisInformation,
    SupportItems,
    Consents,
    /// Any other heading of the template; ends the previous section.
    Other,
}

impl FormSection {
    /// Title used to qualify labels scraped inside the section.
    /// Sections without per-person fields return `None`.
    pub fn qualifier(&self) -> Option<&'static str> {
        match self {
            Self::ClientDetails => Some("Details of the Client"),
            Self::ClientContact => Some("Contact Details of the Client"),
            Self::PrimaryCarer => Some("Primary carer"),
            Self::EmergencyContact => Some("Emergency contact"),
            Self::PersonSigning => Some("Person Signing the Agreement"),
            Self::NdisInformation | Self::SupportItems | Self::Consents | Self::Other => None,
        }
    }
}

/// Normalized header prefix -> section. Order matters: the contact header
/// contains the details header.
const SECTION_HEADERS: &[(&str, FormSection)] = &[
    ("contact details of the client", FormSection::ClientContact),
    ("details of the client", FormSection::ClientDetails),
    ("primary carer", FormSection::PrimaryCarer),
    ("emergency contact", FormSection::EmergencyContact),
    ("person signing the agreement", FormSection::PersonSigning),
    ("ndis information", FormSection::NdisInformation),
    ("plan management", FormSection::NdisInformation),
    ("support items", FormSection::SupportItems),
    ("consents", FormSection::Consents),
    ("needs of the client", FormSection::Other),
    ("formal supports", FormSection::Other),
    ("important people", FormSection::Other),
    ("home life", FormSection::Other),
    ("health information", FormSection::Other),
    ("care requirements", FormSection::Other),
    ("behaviour requirements", FormSection::Other),
    ("other information", FormSection::Other),
];

/// Per-person labels: emitted label and the normalized spellings that introduce it.
const SECTION_LABELS: &[(&str, &[&str])] = &[
    ("First name", &["first name", "firstname"]),
    ("Middle name", &["middle name"]),
    ("Surname", &["surname", "family name", "last name"]),
    ("NDIS number", &["ndis number"]),
    ("Date of birth", &["date of birth", "dob"]),
    ("Gender", &["gender"]),
    ("Home address", &["home address", "address"]),
    ("Postal address", &["postal address"]),
    ("Home phone", &["home phone"]),
    ("Work phone", &["work phone"]),
    ("Mobile phone", &["mobile phone", "mobile"]),
    ("Email address", &["email address", "email"]),
    ("Relationship to client", &["relationship to client", "relationship"]),
    ("Preferred method of contact", &["preferred method of contact", "preferred contact method"]),
    ("Preferred name", &["preferred name"]),
    ("Key code", &["key code"]),
];

/// Labels that occur once per form, searched over the whole text.
const GLOBAL_LABELS: &[(&str, &[&str])] = &[
    ("Respondent", &["respondent"]),
    (
        "Neighbourhood Care representative team",
        &["neighbourhood care representative team", "representative team"],
    ),
    ("Person signing the agreement", &["person signing the agreement", "who is signing"]),
    ("Preferred method of contact", &["preferred method of contact", "preferred contact method"]),
    (
        "Is the primary carer also the emergency contact for the participant?",
        &["is the primary carer also the emergency contact"],
    ),
    (
        "Total core budget to allocate to Neighbourhood Care",
        &["total core budget", "core budget"],
    ),
    (
        "Total capacity building budget to allocate to Neighbourhood Care",
        &["total capacity building budget", "capacity building budget"],
    ),
    ("Plan start date", &["plan start date", "plan start"]),
    ("Plan end date", &["plan end date", "plan end"]),
    ("Service start date", &["service start date", "service start"]),
    ("Service end date", &["service end date", "service end"]),
    ("Plan management type", &["plan management type"]),
    ("Plan manager name", &["plan manager name"]),
    ("Plan manager postal address", &["plan manager postal address", "plan manager address"]),
    ("Plan manager phone number", &["plan manager phone number", "plan manager phone"]),
    ("Plan manager email address", &["plan manager email address", "plan manager email"]),
];

/// Lowercase, punctuation to spaces, whitespace collapsed.
pub fn normalize_label(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_glyph(line: &str) -> bool {
    line.contains(|c: char| CHECKBOX_GLYPHS.contains(&c))
}

/// Label part of a line and the inline value after `:`, if any.
fn split_label(line: &str) -> (&str, Option<&str>) {
    match line.split_once(':') {
        Some((head, tail)) => {
            let tail = tail.trim();
            (head, if tail.is_empty() { None } else { Some(tail) })
        }
        None => (line, None),
    }
}

fn classify_header(line: &str) -> Option<FormSection> {
    if line.len() >= MAX_HEADER_LEN
        || line.contains(|c: char| c == ':' || c == '(')
        || has_glyph(line)
    {
        return None;
    }
    let norm = normalize_label(line);
    SECTION_HEADERS
        .iter()
        .find(|(prefix, _)| norm.starts_with(prefix))
        .map(|(_, section)| *section)
}

/// Match a per-person label line, with or without a section qualifier.
fn section_label(line: &str) -> Option<(&'static str, Option<&str>)> {
    if has_glyph(line) {
        return None;
    }
    let (head, inline) = split_label(line);
    let head = normalize_label(head);
    SECTION_LABELS.iter().find_map(|(label, spellings)| {
        let matched = spellings.iter().any(|s| {
            head == *s
                || head
                    .strip_prefix(s)
                    .map(|rest| {
                        SECTION_HEADERS
                            .iter()
                            .any(|(title, _)| rest.trim() == *title)
                    })
                    .unwrap_or(false)
        });
        matched.then_some((*label, inline))
    })
}

fn global_label(line: &str) -> Option<(&'static str, Option<&str>)> {
    if has_glyph(line) {
        return None;
    }
    let (head, inline) = split_label(line);
    let head = normalize_label(head);
    GLOBAL_LABELS.iter().find_map(|(label, spellings)| {
        spellings
            .iter()
            .any(|s| head.starts_with(s))
            .then_some((*label, inline))
    })
}

fn support_slot(line: &str) -> Option<(usize, Option<String>)> {
    let caps = SUPPORT_SLOT.captures(line.trim())?;
    let slot = caps.get(1)?.as_str().parse().ok()?;
    let inline = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty());
    Some((slot, inline))
}

fn is_label_line(line: &str) -> bool {
    section_label(line).is_some() || global_label(line).is_some() || support_slot(line).is_some()
}

fn is_instruction(line: &str) -> bool {
    if line.chars().count() > MAX_VALUE_LINE_LEN {
        return true;
    }
    let norm = normalize_label(line);
    INSTRUCTION_MARKERS.iter().any(|m| norm.contains(m))
}

/// Section boundaries as (section, first line, end line exclusive).
/// Lines before the first header form an unqualified leading block.
fn section_spans(lines: &[&str]) -> Vec<(Option<FormSection>, usize, usize)> {
    let mut starts: Vec<(Option<FormSection>, usize)> = vec![(None, 0)];
    for (i, line) in lines.iter().enumerate() {
        if let Some(section) = classify_header(line) {
            starts.push((Some(section), i + 1));
        }
    }

    let mut spans = Vec::with_capacity(starts.len());
    for (idx, (section, start)) in starts.iter().enumerate() {
        let end = starts
            .get(idx + 1)
            .map(|(_, next)| next - 1)
            .unwrap_or(lines.len());
        spans.push((*section, *start, end.max(*start)));
    }
    spans
}

/// Phone values never contain an email address; an address line after an
/// empty phone label belongs to the email label below it.
fn is_phone_label(label: &str) -> bool {
    label.ends_with("phone") || label.ends_with("phone number")
}

/// Value lines following a section label, joined with spaces.
fn section_value(
    lines: &[&str],
    label_idx: usize,
    end: usize,
    exclude_email: bool,
) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    let window_end = (label_idx + 1 + SECTION_VALUE_WINDOW).min(end);
    for line in &lines[label_idx + 1..window_end] {
        if is_glyph_only(line) || is_instruction(line) {
            continue;
        }
        if is_label_line(line) || classify_header(line).is_some() {
            break;
        }
        if exclude_email && line.contains('@') {
            break;
        }
        parts.push(line);
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// First value line following a form-wide label.
fn global_value(lines: &[&str], label_idx: usize) -> Option<String> {
    let window_end = (label_idx + 1 + GLOBAL_VALUE_WINDOW).min(lines.len());
    for line in &lines[label_idx + 1..window_end] {
        if is_glyph_only(line) || is_instruction(line) {
            continue;
        }
        if is_label_line(line) {
            return None;
        }
        return Some(line.to_string());
    }
    None
}

fn scrape_section_labels(lines: &[&str], record: &mut RawRecord) {
    for (section, start, end) in section_spans(lines) {
        let qualifier = match section {
            Some(s) => match s.qualifier() {
                Some(q) => Some(q),
                None => continue,
            },
            None => None,
        };
        for i in start..end {
            let Some((label, inline)) = section_label(lines[i]) else {
                continue;
            };
            let exclude_email = is_phone_label(label);
            let value = match inline {
                Some(v) if exclude_email && v.contains('@') => None,
                Some(v) => Some(v.to_string()),
                None => section_value(lines, i, end, exclude_email),
            };
            if let Some(value) = value {
                let key = match qualifier {
                    Some(q) => format!("{label} ({q})"),
                    None => label.to_string(),
                };
                record.insert(key, value);
            }
        }
    }
}

fn scrape_global_labels(lines: &[&str], record: &mut RawRecord) {
    for (i, line) in lines.iter().enumerate() {
        let Some((label, inline)) = global_label(line) else {
            continue;
        };
        if record.contains(label) {
            continue;
        }
        let value = match inline {
            Some(v) => Some(v.to_string()),
            None => global_value(lines, i),
        };
        if let Some(value) = value {
            if is_phone_label(label) && value.contains('@') {
                continue;
            }
            record.insert(label, value);
        }
    }
}

fn scrape_support_slots(lines: &[&str], record: &mut RawRecord) {
    for (i, line) in lines.iter().enumerate() {
        let Some((slot, inline)) = support_slot(line) else {
            continue;
        };
        let value = inline.or_else(|| global_value(lines, i));
        if let Some(value) = value {
            record.insert(format!("Support item ({slot}) (Support Items Required)"), value);
        }
    }
}

fn yes_no(line: &str) -> Option<&'static str> {
    match normalize_label(&strip_checkbox_glyphs(line)).as_str() {
        "yes" => Some("Yes"),
        "no" => Some("No"),
        _ => None,
    }
}

/// Each consent statement takes the nearest Yes/No line from two lines
/// before to four lines after it, preferring lines after on ties.
fn scrape_consents(lines: &[&str], record: &mut RawRecord) {
    let normalized: Vec<String> = lines.iter().map(|l| normalize_label(l)).collect();
    for kind in ConsentKind::ALL {
        let statement = kind.statement();
        let opening = normalize_label(statement.split('.').next().unwrap_or(statement));
        let Some(i) = normalized.iter().position(|l| l.contains(&opening)) else {
            continue;
        };
        let answer = (1..=4usize)
            .flat_map(|d| [i.checked_add(d), if d <= 2 { i.checked_sub(d) } else { None }])
            .flatten()
            .filter(|&j| j < lines.len())
            .find_map(|j| yes_no(lines[j]));
        if let Some(answer) = answer {
            record.insert(statement, answer);
        }
    }
}

/// Scrape a raw label -> value mapping out of form text.
pub fn scrape_form_text(text: &str) -> RawRecord {
    let clean = sanitize_extracted_text(text);
    let lines: Vec<&str> = clean.lines().collect();

    let mut record = RawRecord::new();
    scrape_section_labels(&lines, &mut record);
    scrape_global_labels(&lines, &mut record);
    scrape_support_slots(&lines, &mut record);
    scrape_consents(&lines, &mut record);
    record
}

/// Text-layer strategy: PDF text through [`scrape_form_text`].
pub struct TextFieldExtractor {
    pdf: Box<dyn PdfExtractor + Send + Sync>,
}

impl TextFieldExtractor {
    pub fn new(pdf: Box<dyn PdfExtractor + Send + Sync>) -> Self {
        Self { pdf }
    }
}

impl Default for TextFieldExtractor {
    fn default() -> Self {
        Self::new(Box::new(PdfTextExtractor))
    }
}

impl FieldExtractor for TextFieldExtractor {
    fn variant(&self) -> SourceVariant {
        SourceVariant::TextPdf
    }

    fn extract_fields(&self, bytes: &[u8]) -> Result<RawRecord, ExtractionError> {
        let pages = self.pdf.extract_text(bytes)?;
        let text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let record = scrape_form_text(&text);
        tracing::debug!(
            page_count = pages.len(),
            field_count = record.len(),
            "Text layer scraped"
        );
        Ok(record)
    }
}
