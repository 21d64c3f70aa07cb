//! Service Agreement rendering via `printpdf` builtin fonts.

use std::io::BufWriter;

use printpdf::*;

use super::fields::{consent_slot, support_item_slot, AgreementFields};
use super::RenderError;
use crate::models::ConsentKind;

/// Turns assembled slots into a finished document.
pub trait DocumentRenderer {
    fn render(&self, fields: &AgreementFields) -> Result<Vec<u8>, RenderError>;
}

/// Label/slot rows of each fixed agreement section.
const PARTICIPANT_ROWS: &[(&str, &str)] = &[
    ("Participant", "participant.name"),
    ("Client ID", "participant.client_id"),
    ("NDIS number", "participant.ndis_number"),
    ("Date of birth", "participant.date_of_birth"),
    ("Address", "participant.address"),
    ("Home phone", "participant.home_phone"),
    ("Mobile phone", "participant.mobile_phone"),
    ("Email", "participant.email"),
    ("Preferred contact", "participant.preferred_contact"),
];

const SIGNATORY_ROWS: &[(&str, &str)] = &[
    ("Name", "signatory.name"),
    ("Relationship", "signatory.relationship"),
    ("Address", "signatory.address"),
    ("Contact", "signatory.contact"),
];

const EMERGENCY_ROWS: &[(&str, &str)] = &[
    ("Name", "emergency_contact.name"),
    ("Relationship", "emergency_contact.relationship"),
    ("Phone", "emergency_contact.phone"),
];

const PLAN_ROWS: &[(&str, &str)] = &[
    ("Plan management", "plan.management_type"),
    ("Plan start", "plan.start"),
    ("Plan end", "plan.end"),
    ("Service start", "service.start"),
    ("Service end", "service.end"),
    ("Core budget", "plan.core_budget"),
    ("Capacity building budget", "plan.capacity_budget"),
];

const PLAN_MANAGER_ROWS: &[(&str, &str)] = &[
    ("Plan manager", "plan_manager.name"),
    ("Address", "plan_manager.address"),
    ("Phone", "plan_manager.phone"),
    ("Email", "plan_manager.email"),
];

const KEY_CONTACT_ROWS: &[(&str, &str)] = &[
    ("Key contact", "key_contact.name"),
    ("Mobile", "key_contact.phone"),
    ("Email", "key_contact.email"),
    ("Team", "key_contact.team"),
];

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: Mm = Mm(280.0);
const BOTTOM_MARGIN: f32 = 20.0;
const WRAP_CHARS: usize = 90;

/// A4 Service Agreement in Helvetica.
#[derive(Debug, Clone, Default)]
pub struct PrintPdfRenderer;

impl PrintPdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PrintPdfRenderer {
    fn render(&self, fields: &AgreementFields) -> Result<Vec<u8>, RenderError> {
        let title = format!(
            "Service Agreement - {}",
            fields.value("participant.display_name")
        );
        let (doc, page1, layer1) = PdfDocument::new(&title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Font(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Font(e.to_string()))?;

        let layer = doc.get_page(page1).get_layer(layer1);
        let mut page = PageCursor {
            doc: &doc,
            layer,
            y: TOP,
            pages: 1,
        };

        page.text("SERVICE AGREEMENT", 14.0, Mm(20.0), &bold);
        page.gap(4.0);

        section(&mut page, "PARTICIPANT DETAILS", PARTICIPANT_ROWS, fields, &font, &bold);
        section(&mut page, "PERSON SIGNING THE AGREEMENT", SIGNATORY_ROWS, fields, &font, &bold);
        section(&mut page, "EMERGENCY CONTACT", EMERGENCY_ROWS, fields, &font, &bold);
        section(&mut page, "NDIS PLAN", PLAN_ROWS, fields, &font, &bold);
        section(&mut page, "PLAN MANAGER", PLAN_MANAGER_ROWS, fields, &font, &bold);

        // Support items
        page.text("SUPPORT ITEMS:", 11.0, Mm(20.0), &bold);
        page.gap(1.5);
        let count = fields.support_item_count();
        if count == 0 {
            page.wrapped("No support items requested.", 9.0, Mm(25.0), &font);
        }
        for n in 1..=count {
            let name = format!("{n}. {}", fields.value(&support_item_slot(n, "name")));
            page.wrapped(&name, 9.0, Mm(25.0), &bold);
            let detail = format!(
                "Number: {}   Unit: {}   Price: {}",
                fields.value(&support_item_slot(n, "number")),
                fields.value(&support_item_slot(n, "unit")),
                fields.value(&support_item_slot(n, "price")),
            );
            page.wrapped(&detail, 9.0, Mm(30.0), &font);
            page.gap(1.5);
        }
        page.gap(4.0);

        // Consents
        page.text("CONSENTS:", 11.0, Mm(20.0), &bold);
        page.gap(1.5);
        for kind in ConsentKind::ALL {
            let text = format!("[{}] {}", fields.value(&consent_slot(*kind)), kind.statement());
            page.wrapped(&text, 9.0, Mm(25.0), &font);
            page.gap(1.0);
        }
        page.gap(4.0);

        section(&mut page, "KEY CONTACT", KEY_CONTACT_ROWS, fields, &font, &bold);

        tracing::debug!(pages = page.pages, "Agreement rendered");

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| RenderError::Save(e.to_string()))?;
        buf.into_inner()
            .map_err(|e| RenderError::Save(format!("PDF buffer error: {e}")))
    }
}

/// Current layer and baseline; starts a new page when the baseline nears the bottom.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
    pages: usize,
}

impl PageCursor<'_> {
    fn text(&mut self, text: &str, size: f32, x: Mm, font: &IndirectFontRef) {
        if self.y.0 < BOTTOM_MARGIN {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
            self.pages += 1;
        }
        self.layer.use_text(text, size, x, self.y, font);
        self.y -= Mm(if size >= 11.0 { 6.0 } else { 4.5 });
    }

    fn wrapped(&mut self, text: &str, size: f32, x: Mm, font: &IndirectFontRef) {
        for line in wrap_text(text, WRAP_CHARS) {
            self.text(&line, size, x, font);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= Mm(mm);
    }
}

fn section(
    page: &mut PageCursor<'_>,
    heading: &str,
    rows: &[(&str, &str)],
    fields: &AgreementFields,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    page.text(&format!("{heading}:"), 11.0, Mm(20.0), bold);
    for (label, slot) in rows {
        let text = format!("{label}: {}", fields.value(slot));
        page.wrapped(&text, 9.0, Mm(25.0), font);
    }
    page.gap(4.0);
}

/// Simple word-wrap for PDF text lines.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientRecord;
    use crate::pipeline::assembly::assemble_agreement;
    use crate::pipeline::matching::{MatchResult, Resolution, ResolvedReferences};

    fn fields_with_items(count: usize) -> AgreementFields {
        let record = ClientRecord {
            first_name: Some("Jane".into()),
            surname: Some("Doe".into()),
            ..Default::default()
        };
        let resolved = ResolvedReferences {
            respondent: None,
            support_items: (0..count)
                .map(|i| Resolution {
                    query: format!("Requested item {i}"),
                    result: MatchResult::NotFound,
                })
                .collect(),
        };
        assemble_agreement(&record, &resolved)
    }

    fn page_count(bytes: &[u8]) -> usize {
        lopdf::Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn renders_a_pdf() {
        let bytes = PrintPdfRenderer::new().render(&fields_with_items(2)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(page_count(&bytes) >= 1);
    }

    #[test]
    fn long_item_list_breaks_pages() {
        let renderer = PrintPdfRenderer::new();
        let short = renderer.render(&fields_with_items(0)).unwrap();
        let long = renderer.render(&fields_with_items(40)).unwrap();
        assert!(page_count(&long) > page_count(&short));
    }

    #[test]
    fn wrap_text_respects_width() {
        let lines = wrap_text("one two three four five six", 10);
        assert!(lines.iter().all(|l| l.len() <= 10));
        assert_eq!(lines.join(" "), "one two three four five six");
    }

    #[test]
    fn wrap_text_empty_yields_one_line() {
        assert_eq!(wrap_text("", 20), vec![String::new()]);
    }
}
