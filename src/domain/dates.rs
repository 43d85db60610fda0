// src/domain/dates.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Whole days elapsed between `since` and `now`; negative for future dates.
pub fn days_since(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_days()
}

/// Parses `<input type="datetime-local">` values (with or without seconds).
pub fn parse_datetime_input(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .or_else(|| {
            parse_date_input(raw)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
}

/// Parses `<input type="date">` values and the common French format.
pub fn parse_date_input(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

pub fn format_date(d: DateTime<Utc>) -> String {
    d.format("%d/%m/%Y").to_string()
}

pub fn format_datetime(d: DateTime<Utc>) -> String {
    d.format("%d/%m/%Y %H:%M").to_string()
}

/// Value for a `datetime-local` input.
pub fn datetime_input_value(d: DateTime<Utc>) -> String {
    d.format("%Y-%m-%dT%H:%M").to_string()
}
