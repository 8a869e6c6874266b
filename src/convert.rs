//! Small text, date and enum conversion helpers
//!
//! Every helper is deterministic and never fails: unparsable input yields
//! `None` or a documented fallback.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Compile-time description table for a fieldless enum
///
/// Each row pairs a variant with its canonical name and a human-readable
/// description.
pub trait EnumDescription: Copy + PartialEq + 'static {
    const TABLE: &'static [(Self, &'static str, &'static str)];

    fn name(&self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(variant, _, _)| variant == self)
            .map(|(_, name, _)| *name)
            .unwrap_or_default()
    }

    /// Description for this variant, falling back to its name
    fn description(&self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(variant, _, _)| variant == self)
            .map(|(_, name, description)| if description.is_empty() { *name } else { *description })
            .unwrap_or_default()
    }
}

/// Find the variant whose name matches `text`, ignoring case
pub fn parse_insensitive<T: EnumDescription>(text: &str) -> Option<T> {
    T::TABLE
        .iter()
        .find(|(_, name, _)| equals_insensitive(name, text.trim()))
        .map(|(variant, _, _)| *variant)
}

pub fn equals_insensitive(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

pub fn is_blank(source: &str) -> bool {
    source.trim().is_empty()
}

pub fn has_value(source: &str) -> bool {
    !is_blank(source)
}

/// `source` when it has a value, else `default` when that has one, else an empty string
pub fn or_default(source: Option<&str>, default: &str) -> String {
    match source {
        Some(value) if has_value(value) => value.to_string(),
        _ if has_value(default) => default.to_string(),
        _ => String::new(),
    }
}

/// Shorten `source` to at most `max_length` characters, `suffix` included
pub fn truncate(source: &str, max_length: usize, suffix: &str) -> String {
    if is_blank(source) {
        return String::new();
    }
    if source.chars().count() <= max_length {
        return source.to_string();
    }

    let keep = max_length.saturating_sub(suffix.chars().count());
    let mut truncated: String = source.chars().take(keep).collect();
    truncated.push_str(suffix);
    truncated
}

/// Upper-case the first letter, or the first letter of every word
///
/// In `every_word` mode the rest of each word is lower-cased, except for words
/// written entirely in capitals, which are kept as acronyms.
pub fn capitalize_first_letter(source: &str, every_word: bool) -> String {
    if is_blank(source) {
        return String::new();
    }

    if !every_word {
        let mut chars = source.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }

    source
        .split(' ')
        .map(|word| {
            let is_acronym = word.chars().any(char::is_alphabetic)
                && word.chars().all(|c| !c.is_lowercase());
            if is_acronym {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse trimmed `source`, or `None` when it is blank or unparsable
pub fn parse_or_none<T: FromStr>(source: &str) -> Option<T> {
    if is_blank(source) {
        return None;
    }
    source.trim().parse().ok()
}

/// `true`/`false`, `yes`/`no` and `1`/`0`, case-insensitively
pub fn parse_bool_lenient(source: &str) -> Option<bool> {
    match source.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Lenient boolean with `false` for anything unrecognized
pub fn to_bool(source: &str) -> bool {
    parse_bool_lenient(source).unwrap_or(false)
}

/// `M/D/YYYY`, or an empty string for `None`
pub fn short_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%-m/%-d/%Y").to_string())
        .unwrap_or_default()
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%m/%d/%Y %H:%M:%S"];

/// Parse a calendar date; blank or unparseable text gives `None`
///
/// Accepts ISO dates, `M/D/YYYY`, long month names, and date-times (whose
/// time part is dropped).
pub fn parse_date_or_none(source: &str) -> Option<NaiveDate> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(source, format).ok())
        .or_else(|| parse_date_time_or_none(source).map(|dt| dt.date()))
}

/// Parse a date-time; an RFC 3339 offset is applied and dropped
pub fn parse_date_time_or_none(source: &str) -> Option<NaiveDateTime> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(source) {
        return Some(with_offset.naive_utc());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(source, format).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|format| {
                NaiveDate::parse_from_str(source, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
}

/// Like [`parse_date_or_none`], falling back to [`NaiveDate::MIN`]
pub fn to_date(source: &str) -> NaiveDate {
    parse_date_or_none(source).unwrap_or(NaiveDate::MIN)
}
