use chrono::{NaiveDate, NaiveDateTime, DateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("valid regex"));
static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid regex"));

const DATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y.%m.%d",
];

const DATETIME_FORMATS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Permissive calendar-date parser. Accepts ISO and RFC forms, common
/// slash/dash layouts (month-first before day-first), month names, `YYYY-MM`
/// and a bare four-digit year.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    // "2023-07" and "2023" have no day component, which chrono refuses on its own
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if BARE_YEAR.is_match(s) {
        let year = s.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0);
    }

    None
}

pub fn is_date_string(s: &str) -> bool {
    parse_date(s).is_some()
}

/// Maps an arbitrary header to a storage-safe identifier. Uniqueness is the
/// caller's job; see `clean_column_name`.
pub fn sanitize_column_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let underscored = WHITESPACE.replace_all(&lowered, "_").replace('.', "_");
    let cleaned = UNSAFE_CHARS.replace_all(&underscored, "").into_owned();

    if cleaned.is_empty() {
        return "column".to_string();
    }

    match cleaned.chars().next() {
        Some(c) if c.is_ascii_digit() || c == '_' => format!("col_{}", cleaned),
        _ => cleaned,
    }
}

/// Sanitizes `name` and makes it unique against `existing_names`, appending
/// `_1`, `_2`, ... on collision. The chosen name is recorded in the set.
pub fn clean_column_name(name: &str, existing_names: &mut HashSet<String>) -> String {
    let base_name = sanitize_column_name(name);

    let mut cleaned = base_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", base_name, counter);
        counter += 1;
    }

    cleaned
}
