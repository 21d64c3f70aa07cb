use crate::pipeline::extraction::strip_checkbox_glyphs;

/// Tokens read as a ticked box or a "yes" answer.
const AFFIRMATIVE: &[&str] = &["yes", "y", "true", "1", "on", "x", "checked", "ticked"];

/// Trimmed value with checkbox glyphs removed; `None` when nothing is left.
pub fn clean_value(raw: &str) -> Option<String> {
    let clean = strip_checkbox_glyphs(raw);
    if clean.is_empty() {
        None
    } else {
        Some(clean)
    }
}

/// Whether a consent or yes/no answer is affirmative.
pub fn is_affirmative(raw: &str) -> bool {
    let ticked = raw.contains(|c: char| matches!(c, '☑' | '✓'));
    let unticked = raw.contains(|c: char| matches!(c, '☐' | '○'));
    let clean = strip_checkbox_glyphs(raw).to_lowercase();
    if clean.is_empty() {
        return ticked && !unticked;
    }
    AFFIRMATIVE.contains(&clean.as_str())
}

/// Parse a currency-formatted amount such as `$65.47` or `$1,200`.
///
/// Leading non-numeric characters are dropped, thousands separators
/// ignored, and reading stops at the first character that cannot belong
/// to the number.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let start = raw.trim_start_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let number: String = start
        .chars()
        .filter(|c| *c != ',')
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !number.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}
