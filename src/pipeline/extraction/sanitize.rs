/// Bullet and checkbox glyphs the intake form template prints next to options.
/// `\u{f0d7}` is the Symbol-font bullet some exporters leave in the text layer.
pub const CHECKBOX_GLYPHS: &[char] = &['\u{f0d7}', '•', '●', '○', '☐', '☑', '✓'];

/// A line holding nothing but glyphs and whitespace.
pub fn is_glyph_only(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_whitespace() || CHECKBOX_GLYPHS.contains(&c))
}

/// Remove checkbox glyphs from a value.
///
/// When the value lists options with both ticked and unticked boxes
/// (`☐ Home phone ☑ Mobile`), only the ticked options are kept.
pub fn strip_checkbox_glyphs(value: &str) -> String {
    let has_checked = value.contains(|c: char| matches!(c, '☑' | '✓'));
    let has_unchecked = value.contains(|c: char| matches!(c, '☐' | '○'));

    if has_checked && has_unchecked {
        let mut picked: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut checked = false;
        for c in value.chars() {
            if CHECKBOX_GLYPHS.contains(&c) {
                if checked && !current.trim().is_empty() {
                    picked.push(current.trim().to_string());
                }
                current.clear();
                checked = matches!(c, '☑' | '✓');
            } else {
                current.push(c);
            }
        }
        if checked && !current.trim().is_empty() {
            picked.push(current.trim().to_string());
        }
        return sanitize_field_value(&picked.join(", "));
    }

    let stripped: String = value
        .chars()
        .filter(|c| !CHECKBOX_GLYPHS.contains(c))
        .collect();
    sanitize_field_value(&stripped)
}

/// Sanitize extracted text before passing downstream.
/// Strips control characters, folds non-breaking spaces, trims lines and
/// drops the empty ones. Checkbox glyphs survive; the normalizer reads them.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
            '\r' => '\n',
            other => other,
        })
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sanitize a single form-field value: control characters out, inner
/// whitespace collapsed to single spaces.
pub fn sanitize_field_value(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_control() || c == '\u{00A0}' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_null_bytes() {
        let raw = "First name: Jane\x00Doe";
        let clean = sanitize_extracted_text(raw);
        assert!(!clean.contains('\x00'));
        assert!(clean.contains("JaneDoe"));
    }

    #[test]
    fn strips_control_characters() {
        let raw = "NDIS number\x01\x02\x03\nDate of birth: 07/03/1990";
        let clean = sanitize_extracted_text(raw);
        assert!(!clean.contains('\x01'));
        assert!(clean.contains("NDIS number"));
        assert!(clean.contains("07/03/1990"));
    }

    #[test]
    fn drops_blank_lines_and_trims() {
        let raw = "  Details of the Client  \n\n\n   First name\r\nJane  ";
        assert_eq!(
            sanitize_extracted_text(raw),
            "Details of the Client\nFirst name\nJane"
        );
    }

    #[test]
    fn keeps_checkbox_glyphs() {
        let clean = sanitize_extracted_text("☑ Yes ☐ No");
        assert!(clean.contains('☑'));
        assert!(clean.contains('☐'));
    }

    #[test]
    fn glyph_only_lines() {
        assert!(is_glyph_only("☐"));
        assert!(is_glyph_only(" • "));
        assert!(is_glyph_only(""));
        assert!(!is_glyph_only("☑ Yes"));
    }

    #[test]
    fn strips_glyphs_from_single_choice() {
        assert_eq!(strip_checkbox_glyphs("☑ Participant"), "Participant");
        assert_eq!(strip_checkbox_glyphs("\u{f0d7} Primary carer"), "Primary carer");
        assert_eq!(strip_checkbox_glyphs("Jane"), "Jane");
    }

    #[test]
    fn keeps_only_ticked_options() {
        assert_eq!(strip_checkbox_glyphs("☐ Home phone ☑ Mobile"), "Mobile");
        assert_eq!(strip_checkbox_glyphs("☐ Yes ☑ No"), "No");
        assert_eq!(strip_checkbox_glyphs("☑ Email ☐ Work phone ✓ Mobile"), "Email, Mobile");
    }

    #[test]
    fn field_value_collapses_whitespace() {
        assert_eq!(sanitize_field_value(" 12  Main\tSt\n Perth "), "12 Main St Perth");
        assert_eq!(sanitize_field_value("Jane\u{00A0}Doe"), "Jane Doe");
    }
}
