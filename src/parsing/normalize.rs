//! Locale-aware number and date normalizers.
//!
//! Russian financial sites format numbers with a decimal comma and group
//! thousands with spaces (regular, no-break or narrow no-break), and dates
//! as `DD.MM.YYYY`. All functions here are pure and total: they never panic
//! and resolve unparsable input to a typed default. Missing-value sentinels
//! differ per source and are recognized before any numeric parse.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel written into quote-table cells whose source element is absent.
pub const NO_INFORMATION: &str = "No information!";

/// Missing-value tokens used by the dividend table.
const MISSING_TOKENS: [&str; 4] = ["n/a", "na", "-", "—"];

/// First numeric substring: optional sign, space-grouped thousands,
/// comma or dot decimals.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("-?\\d+(?:[ \u{00A0}\u{202F}]\\d{3})*(?:[.,]\\d+)?").expect("valid number pattern")
});

/// `DD.MM.YYYY` anywhere in the text.
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{2}\.\d{2}\.\d{4}\b").expect("valid date pattern"));

/// Whether the text is one of the known "no value here" spellings.
pub fn is_missing(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == NO_INFORMATION {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    MISSING_TOKENS.iter().any(|token| lowered == *token)
}

/// Parse the first decimal number out of locale-formatted text.
///
/// Accepts a leading Unicode minus (`−`), space/NBSP/narrow-NBSP thousands
/// separators and either `,` or `.` as the decimal point. Returns `None`
/// when the text is a missing-value sentinel or carries no parsable number.
pub fn parse_decimal(text: &str) -> Option<f64> {
    if is_missing(text) {
        return None;
    }
    let signed = text.replace('−', "-");
    let matched = NUMBER_RE.find(&signed)?;
    let cleaned: String = matched
        .as_str()
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '\u{00A0}' | '\u{202F}'))
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();
    cleaned.parse::<f64>().ok()
}

/// [`parse_decimal`] with a trailing (or embedded) percent sign stripped.
pub fn parse_percent(text: &str) -> Option<f64> {
    if is_missing(text) {
        return None;
    }
    parse_decimal(&text.replace('%', ""))
}

/// Find and parse a `DD.MM.YYYY` date anywhere in the text.
///
/// Returns `None` on no match or an invalid calendar date (`31.04.2025`).
pub fn parse_date_ddmmyyyy(text: &str) -> Option<NaiveDate> {
    if is_missing(text) {
        return None;
    }
    let matched = DATE_RE.find(text)?;
    NaiveDate::parse_from_str(matched.as_str(), "%d.%m.%Y").ok()
}

/// Numeric cleanup for quote-table cell text, applied at persist time.
///
/// Quote cells arrive as sentinel-filled strings; this resolves them to a
/// number with `0.0` standing in for anything missing or unparsable. The
/// zero default is deliberate for this source and differs from the dividend
/// parser's null policy.
pub fn clean_quote_number(text: &str) -> f64 {
    if is_missing(text) {
        return 0.0;
    }
    let cleaned: String = text
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '\u{00A0}' | '\u{202F}' | '%' | '+'))
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}
