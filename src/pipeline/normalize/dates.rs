use chrono::NaiveDate;

use crate::models::DateValue;

/// Formats spelling the month out, tried before the numeric fallback.
const NAMED_MONTH_FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%A, %d %B %Y",
];

/// Parse a form date permissively.
///
/// Numeric dates are read day-first (`07/03/1990` is 7 March) unless the
/// first group has four digits (ISO order) or the month would exceed 12.
/// Anything unreadable is kept verbatim as [`DateValue::Unparsed`].
pub fn parse_date(raw: &str) -> DateValue {
    let trimmed = raw.trim();

    for format in NAMED_MONTH_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return DateValue::Parsed(date);
        }
    }

    match parse_numeric(trimmed) {
        Some(date) => DateValue::Parsed(date),
        None => DateValue::Unparsed(trimmed.to_string()),
    }
}

fn parse_numeric(text: &str) -> Option<NaiveDate> {
    // Letters other than an ISO time separator mean this is not a numeric date.
    if text.chars().any(|c| c.is_alphabetic() && c != 'T') {
        return None;
    }

    let groups: Vec<&str> = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|g| !g.is_empty())
        .collect();
    if groups.len() < 3 {
        return None;
    }

    let (year, month, day) = if groups[0].len() == 4 {
        (groups[0], groups[1], groups[2])
    } else {
        (groups[2], groups[1], groups[0])
    };

    let mut day: u32 = day.parse().ok()?;
    let mut month: u32 = month.parse().ok()?;
    let year = expand_year(year)?;

    if month > 12 && day <= 12 {
        std::mem::swap(&mut day, &mut month);
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Two-digit years pivot like `%y`: 69-99 are 1900s, 00-68 are 2000s.
fn expand_year(year: &str) -> Option<i32> {
    let value: i32 = year.parse().ok()?;
    match year.len() {
        4 => Some(value),
        1 | 2 if value >= 69 => Some(1900 + value),
        1 | 2 => Some(2000 + value),
        _ => None,
    }
}
