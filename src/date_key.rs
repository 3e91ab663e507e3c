//! Calendar-day keys, display dates and entry identifiers.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rand::Rng;
use std::fmt;

const KEY_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%A, %B %-d, %Y";
const ID_SUFFIX_LEN: usize = 11;

/// `YYYY-MM-DD` of the instant's UTC calendar day.
pub fn date_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant.with_timezone(&Utc).format(KEY_FORMAT).to_string()
}

pub fn today_key() -> String {
    date_key(&Utc::now())
}

/// Long-form date for headers, e.g. "Monday, October 19, 2026". Never used as a key.
pub fn format_display<Tz: TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    instant.format(DISPLAY_FORMAT).to_string()
}

pub fn parse_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, KEY_FORMAT).ok()
}

/// Display form of a stored date key; falls back to the raw key if it does not parse.
pub fn format_key_display(key: &str) -> String {
    match parse_key(key) {
        Some(date) => date.format(DISPLAY_FORMAT).to_string(),
        None => key.to_string(),
    }
}

pub fn is_today(key: &str) -> bool {
    key == today_key()
}

/// Base-36 millisecond timestamp followed by a random base-36 suffix.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut id = to_base36(millis);
    let mut rng = rand::thread_rng();
    for _ in 0..ID_SUFFIX_LEN {
        let digit = rng.gen_range(0..36u32);
        // digit < 36 always yields a char
        id.push(char::from_digit(digit, 36).unwrap_or('0'));
    }
    id
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let digit = (value % 36) as u32;
        digits.push(char::from_digit(digit, 36).unwrap_or('0'));
        value /= 36;
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use std::collections::HashSet;

    #[test]
    fn same_utc_day_gives_same_key() {
        let morning = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 1).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        assert_eq!(date_key(&morning), "2024-03-09");
        assert_eq!(date_key(&morning), date_key(&night));
    }

    #[test]
    fn key_changes_across_day_boundary() {
        let before = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_ne!(date_key(&before), date_key(&after));
    }

    #[test]
    fn key_uses_utc_not_local_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let local_morning = tokyo.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        assert_eq!(date_key(&local_morning), "2024-03-09");
    }

    #[test]
    fn keys_sort_chronologically() {
        let mut keys = vec!["2024-11-02", "2023-12-31", "2024-01-15"];
        keys.sort();
        assert_eq!(keys, vec!["2023-12-31", "2024-01-15", "2024-11-02"]);
    }

    #[test]
    fn display_is_long_form() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(format_display(&instant), "Saturday, March 9, 2024");
        assert_eq!(format_key_display("2024-03-09"), "Saturday, March 9, 2024");
        assert_eq!(format_key_display("not-a-date"), "not-a-date");
    }

    #[test]
    fn is_today_matches_current_key() {
        assert!(is_today(&today_key()));
        assert!(!is_today("1999-01-01"));
    }

    #[test]
    fn generated_ids_are_distinct() {
        let ids: HashSet<String> = (0..500).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 500);
        assert!(ids.iter().all(|id| id.chars().all(|c| c.is_ascii_alphanumeric())));
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
