use super::types::{PageExtraction, PdfExtractor};
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers; scanned pages come back empty.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError> {
        // pdf-extract panics on some malformed content streams.
        let page_texts = std::panic::catch_unwind(|| {
            pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        })
        .map_err(|_| ExtractionError::PdfParsing("text extraction panicked".into()))?
        .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        let pages = page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageExtraction {
                page_number: i + 1,
                text,
            })
            .collect();

        Ok(pages)
    }
}

#[cfg(test)]
pub(crate) mod test_pdf {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    /// Build a one-page PDF, one `Tj` per line, 24pt apart.
    pub(crate) fn make_text_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut content = String::from("BT /F1 12 Tf 72 760 Td ");
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                content.push_str("0 -24 Td ");
            }
            let escaped = line
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            content.push_str(&format!("({escaped}) Tj "));
        }
        content.push_str("ET");

        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            },
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Build a blank one-page PDF whose AcroForm carries the given fields.
    /// A `None` value leaves `/V` unset.
    pub(crate) fn make_form_pdf(fields: &[(&str, Option<&str>)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");
        let mut field_refs: Vec<Object> = Vec::new();
        for (name, value) in fields {
            let mut field = dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal(*name),
            };
            if let Some(value) = value {
                field.set("V", Object::string_literal(*value));
            }
            field_refs.push(doc.add_object(field).into());
        }
        finish_form_pdf(doc, field_refs)
    }

    /// Attach a page tree and an AcroForm holding `fields` to `doc`, then serialize.
    pub(crate) fn finish_form_pdf(mut doc: Document, fields: Vec<Object>) -> Vec<u8> {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
        });
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });
        if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let acroform_id = doc.add_object(dictionary! {
            "Fields" => fields,
        });

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => acroform_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::test_pdf::make_text_pdf;
    use super::*;

    #[test]
    fn extract_text_from_digital_pdf() {
        let extractor = PdfTextExtractor;
        let pdf_bytes = make_text_pdf(&["Details of the Client", "First name"]);
        let pages = extractor.extract_text(&pdf_bytes).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
        assert!(
            pages[0].text.contains("Details") || pages[0].text.contains("Client"),
            "Expected text to contain the section header, got: {}",
            pages[0].text
        );
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let extractor = PdfTextExtractor;
        let result = extractor.extract_text(b"not a pdf");
        assert!(result.is_err());
    }
}
