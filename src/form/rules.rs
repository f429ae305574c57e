use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

const LENIENT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y"];

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap_or_else(|error| panic!("email grammar must compile: {error}"))
});

static DATE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$")
        .unwrap_or_else(|error| panic!("date shape must compile: {error}"))
});

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Exactly `digits` ASCII decimal digits, nothing else.
pub fn is_digits(value: &str, digits: usize) -> bool {
    value.len() == digits && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Strict `YYYY-MM-DD`: exact shape and an existing calendar day.
pub fn parse_strict_date(value: &str) -> Option<NaiveDate> {
    if !DATE_SHAPE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, CANONICAL_DATE_FORMAT).ok()
}

pub fn is_strict_date(value: &str) -> bool {
    parse_strict_date(value).is_some()
}

/// Best-effort date parse used when normalizing submitted values.
pub fn parse_lenient_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Some(date) = parse_strict_date(trimmed) {
        return Some(date);
    }
    LENIENT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|moment| moment.date_naive())
        })
}

/// Rewrites a parseable date into `YYYY-MM-DD`; anything else is returned
/// unchanged.
pub fn normalize_date(value: &str) -> String {
    match parse_lenient_date(value) {
        Some(date) => date.format(CANONICAL_DATE_FORMAT).to_string(),
        None => value.to_string(),
    }
}

/// Length in Unicode scalar values, so an astral-plane character counts once.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_grammars_compile() {
        assert!(LazyLock::force(&EMAIL).is_match("bob@x.com"));
        assert!(LazyLock::force(&DATE_SHAPE).is_match("2024-05-01"));
    }

    #[test]
    fn char_len_counts_scalar_values() {
        assert_eq!(char_len("abc"), 3);
        assert_eq!(char_len("ääää"), 4);
        assert_eq!(char_len("😀😀"), 2);
    }

    #[test]
    fn email_grammar_matches_common_addresses() {
        assert!(is_email("bob@x.com"));
        assert!(is_email("first.last+tag@sub.example.org"));
        assert!(is_email("user@localhost"));
        assert!(!is_email("not-an-email"));
        assert!(!is_email("a@-bad.com"));
        assert!(!is_email("a b@example.com"));
        assert!(!is_email("@example.com"));
    }

    #[test]
    fn digits_rule_counts_ascii_digits_only() {
        assert!(is_digits("1234567890", 10));
        assert!(!is_digits("12345", 10));
        assert!(!is_digits("12345678901", 10));
        assert!(!is_digits("12345abcde", 10));
        assert!(!is_digits("١٢٣٤٥٦٧٨٩٠", 10));
    }

    #[test]
    fn strict_date_rejects_clamped_or_malformed_days() {
        assert!(is_strict_date("2024-03-05"));
        assert!(is_strict_date("2024-02-29"));
        assert!(!is_strict_date("2024-02-30"));
        assert!(!is_strict_date("2023-02-29"));
        assert!(!is_strict_date("2024-13-40"));
        assert!(!is_strict_date("2024-3-5"));
        assert!(!is_strict_date("24-03-05"));
        assert!(!is_strict_date(""));
    }

    #[test]
    fn normalize_date_canonicalizes_parseable_input() {
        assert_eq!(normalize_date("2024-03-05"), "2024-03-05");
        assert_eq!(normalize_date("2024/3/5"), "2024-03-05");
        assert_eq!(normalize_date("2024-05-01T10:30:00Z"), "2024-05-01");
        assert_eq!(normalize_date("garbage"), "garbage");
    }
}
