//! Interactive form (AcroForm) field reader using lopdf.
//!
//! Walks `/Root /AcroForm /Fields`, descending into `/Kids`, and emits one
//! entry per terminal field that carries a value. Each value is stored under
//! the field's fully qualified dotted name and, when different, its own
//! partial name, so `Client.First name` also answers to `First name`.

use lopdf::{Dictionary, Document, Object};

use super::sanitize::sanitize_field_value;
use super::types::FieldExtractor;
use super::ExtractionError;
use crate::pipeline::source::{RawRecord, SourceVariant};

/// Guards against reference cycles in malformed field trees.
const MAX_FIELD_DEPTH: usize = 32;

pub struct FormFieldExtractor;

impl FieldExtractor for FormFieldExtractor {
    fn variant(&self) -> SourceVariant {
        SourceVariant::FormFieldPdf
    }

    fn extract_fields(&self, bytes: &[u8]) -> Result<RawRecord, ExtractionError> {
        let doc =
            Document::load_mem(bytes).map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        let mut record = RawRecord::new();
        let Some(acroform) = acroform_dict(&doc) else {
            tracing::debug!("PDF has no AcroForm dictionary");
            return Ok(record);
        };

        let fields = match acroform.get(b"Fields").map(|o| resolve_object(&doc, o)) {
            Ok(Object::Array(fields)) => fields,
            Ok(_) => {
                return Err(ExtractionError::FormStructure(
                    "/Fields is not an array".into(),
                ))
            }
            Err(_) => return Ok(record),
        };

        for field in fields {
            collect_field(&doc, field, None, 0, &mut record);
        }

        tracing::debug!(field_count = record.len(), "Form fields extracted");
        Ok(record)
    }
}

fn acroform_dict(doc: &Document) -> Option<&Dictionary> {
    let root = doc.trailer.get(b"Root").ok()?;
    let catalog = resolve_object(doc, root).as_dict().ok()?;
    let acroform = catalog.get(b"AcroForm").ok()?;
    resolve_object(doc, acroform).as_dict().ok()
}

fn collect_field(
    doc: &Document,
    obj: &Object,
    parent_name: Option<&str>,
    depth: usize,
    record: &mut RawRecord,
) {
    if depth > MAX_FIELD_DEPTH {
        tracing::warn!(depth, "Form field tree too deep, skipping branch");
        return;
    }
    let Ok(dict) = resolve_object(doc, obj).as_dict() else {
        return;
    };

    let partial = dict.get(b"T").ok().and_then(decode_text);
    let qualified = match (parent_name, partial.as_deref()) {
        (Some(parent), Some(own)) => Some(format!("{parent}.{own}")),
        (None, Some(own)) => Some(own.to_string()),
        (Some(parent), None) => Some(parent.to_string()),
        (None, None) => None,
    };

    if let Ok(value) = dict.get(b"V") {
        if let (Some(name), Some(value)) = (qualified.as_deref(), field_value(doc, value)) {
            record.insert(name, value.clone());
            if let Some(own) = partial.as_deref() {
                if own != name {
                    record.insert(own, value);
                }
            }
        }
    }

    if let Ok(Object::Array(kids)) = dict.get(b"Kids").map(|o| resolve_object(doc, o)) {
        for kid in kids {
            collect_field(doc, kid, qualified.as_deref(), depth + 1, record);
        }
    }
}

/// Text value of a `/V` entry. Unchecked boxes (`/Off`) yield nothing.
fn field_value(doc: &Document, obj: &Object) -> Option<String> {
    let value = match resolve_object(doc, obj) {
        Object::Name(name) => {
            let name = String::from_utf8_lossy(name).to_string();
            if name == "Off" {
                return None;
            }
            name
        }
        Object::Array(items) => items
            .iter()
            .filter_map(|item| field_value(doc, item))
            .collect::<Vec<_>>()
            .join(", "),
        Object::Boolean(true) => "Yes".to_string(),
        Object::Integer(i) => i.to_string(),
        Object::Real(r) => r.to_string(),
        other => decode_text(other)?,
    };
    let value = sanitize_field_value(&value);
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise byte-per-char.
fn decode_text(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => {
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                Some(bytes.iter().map(|&b| b as char).collect())
            }
        }
        _ => None,
    }
}

/// Follow an indirect reference, returning the object itself otherwise.
fn resolve_object<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::pdf::test_pdf::{finish_form_pdf, make_form_pdf, make_text_pdf};
    use lopdf::dictionary;

    #[test]
    fn reads_flat_text_fields() {
        let pdf = make_form_pdf(&[
            ("First name", Some("Jane")),
            ("Surname", Some("Doe")),
            ("Middle name", None),
        ]);
        let record = FormFieldExtractor.extract_fields(&pdf).unwrap();
        assert_eq!(record.get("First name"), Some("Jane"));
        assert_eq!(record.get("Surname"), Some("Doe"));
        assert!(!record.contains("Middle name"));
    }

    #[test]
    fn pdf_without_form_yields_empty_record() {
        let pdf = make_text_pdf(&["Details of the Client"]);
        let record = FormFieldExtractor.extract_fields(&pdf).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let result = FormFieldExtractor.extract_fields(b"%PDF-1.4 truncated");
        assert!(matches!(result, Err(ExtractionError::PdfParsing(_))));
    }

    #[test]
    fn nested_fields_get_qualified_and_partial_names() {
        let mut doc = Document::with_version("1.4");
        let kid = doc.add_object(dictionary! {
            "T" => Object::string_literal("First name"),
            "V" => Object::string_literal("Sam"),
        });
        let parent = doc.add_object(dictionary! {
            "T" => Object::string_literal("Carer"),
            "Kids" => vec![kid.into()],
        });
        let buf = finish_form_pdf(doc, vec![parent.into()]);

        let record = FormFieldExtractor.extract_fields(&buf).unwrap();
        assert_eq!(record.get("Carer.First name"), Some("Sam"));
        assert_eq!(record.get("First name"), Some("Sam"));
    }

    #[test]
    fn checkbox_names_become_text() {
        let mut doc = Document::with_version("1.4");
        let on = doc.add_object(dictionary! {
            "FT" => "Btn",
            "T" => Object::string_literal("Smoke free"),
            "V" => Object::Name(b"Yes".to_vec()),
        });
        let off = doc.add_object(dictionary! {
            "FT" => "Btn",
            "T" => Object::string_literal("Photography"),
            "V" => Object::Name(b"Off".to_vec()),
        });
        let buf = finish_form_pdf(doc, vec![on.into(), off.into()]);

        let record = FormFieldExtractor.extract_fields(&buf).unwrap();
        assert_eq!(record.get("Smoke free"), Some("Yes"));
        assert!(!record.contains("Photography"));
    }

    #[test]
    fn utf16_strings_decode() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Zoë".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let obj = Object::String(bytes, lopdf::StringFormat::Literal);
        assert_eq!(decode_text(&obj).as_deref(), Some("Zoë"));
    }
}
