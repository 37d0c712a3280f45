//! Entry keys: the timestamp strings that identify journal entries.
//!
//! Format: `MM-DD-YY_hh:mm:ssAM` (12-hour clock, zero-padded, uppercase meridiem).
//! A key is generated once at save time and never changes; it is the storage
//! lookup key, the sort key and the calendar grouping key at the same time.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENTRY_KEY_FORMAT: &str = "%m-%d-%y_%I:%M:%S%p";
const READABLE_FORMAT: &str = "%-m-%d-%Y %-I:%M:%S %p";
const TIME_LABEL_FORMAT: &str = "%-I:%M:%S %p";

/// The two-digit year only decodes back to 1969..=2068.
pub const MIN_KEY_YEAR: i32 = 1969;
pub const MAX_KEY_YEAR: i32 = 2068;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryKeyError {
    #[error("malformed entry key '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("entry key '{0}' is not in canonical MM-DD-YY_hh:mm:ssAM form")]
    NonCanonical(String),

    #[error("year {0} cannot be keyed; entries must fall in 1969..=2068")]
    YearOutOfRange(i32),
}

/// A parsed, canonical entry key.
///
/// Ordering is chronological, not lexicographic: the string form puts the
/// month first, so string order breaks across years and across AM/PM.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryKey {
    raw: String,
    at: NaiveDateTime,
}

impl EntryKey {
    /// Encodes a timestamp, truncated to whole seconds.
    pub fn from_datetime(at: NaiveDateTime) -> Result<Self, EntryKeyError> {
        if !(MIN_KEY_YEAR..=MAX_KEY_YEAR).contains(&at.year()) {
            return Err(EntryKeyError::YearOutOfRange(at.year()));
        }
        let at = at.with_nanosecond(0).unwrap_or(at);
        Ok(Self {
            raw: at.format(ENTRY_KEY_FORMAT).to_string().to_uppercase(),
            at,
        })
    }

    /// Key for an entry recorded right now (local wall clock).
    pub fn now() -> Result<Self, EntryKeyError> {
        Self::from_datetime(Local::now().naive_local())
    }

    /// Key for a backfilled entry: the chosen calendar date with the current
    /// local time-of-day.
    pub fn with_date(date: NaiveDate) -> Result<Self, EntryKeyError> {
        Self::with_date_at(date, Local::now().time())
    }

    pub fn with_date_at(date: NaiveDate, time: NaiveTime) -> Result<Self, EntryKeyError> {
        Self::from_datetime(date.and_time(time))
    }

    /// Parses a key. The meridiem is accepted in either case; every other
    /// field must have its fixed width.
    pub fn parse(key: &str) -> Result<Self, EntryKeyError> {
        let at = NaiveDateTime::parse_from_str(key, ENTRY_KEY_FORMAT).map_err(|source| {
            EntryKeyError::Malformed {
                key: key.to_string(),
                source,
            }
        })?;
        let parsed = Self::from_datetime(at)?;
        if parsed.raw != key.to_ascii_uppercase() {
            return Err(EntryKeyError::NonCanonical(key.to_string()));
        }
        Ok(parsed)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.at
    }

    /// The calendar date this entry belongs to.
    pub fn calendar_date(&self) -> NaiveDate {
        self.at.date()
    }

    /// Human-readable form, e.g. `6-01-2024 9:00:00 AM`.
    pub fn readable(&self) -> String {
        self.at.format(READABLE_FORMAT).to_string().to_uppercase()
    }

    /// Display label for an entry. When several entries share a date the
    /// date is already shown as a section header, so only the time is used.
    pub fn label(&self, is_ambiguous_date: bool) -> String {
        if is_ambiguous_date {
            self.at.format(TIME_LABEL_FORMAT).to_string().to_uppercase()
        } else {
            self.readable()
        }
    }
}

impl Ord for EntryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for EntryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for EntryKey {
    type Err = EntryKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntryKey {
    type Error = EntryKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntryKey> for String {
    fn from(key: EntryKey) -> Self {
        key.raw
    }
}

/// Sorts keys newest-first, the order storage hands them to callers.
pub fn sort_newest_first(keys: &mut [EntryKey]) {
    keys.sort_by(|a, b| b.cmp(a));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_format_morning_and_afternoon() {
        assert_eq!(
            EntryKey::from_datetime(dt(2024, 6, 1, 9, 0, 0)).unwrap().as_str(),
            "06-01-24_09:00:00AM"
        );
        assert_eq!(
            EntryKey::from_datetime(dt(2024, 6, 1, 14, 5, 9)).unwrap().as_str(),
            "06-01-24_02:05:09PM"
        );
    }

    #[test]
    fn test_midnight_and_noon_use_twelve() {
        assert_eq!(
            EntryKey::from_datetime(dt(2024, 12, 31, 0, 0, 1)).unwrap().as_str(),
            "12-31-24_12:00:01AM"
        );
        assert_eq!(
            EntryKey::from_datetime(dt(2024, 12, 31, 12, 30, 0)).unwrap().as_str(),
            "12-31-24_12:30:00PM"
        );
    }

    #[test]
    fn test_round_trip_truncates_to_seconds() {
        let at = dt(2025, 3, 9, 23, 59, 58)
            .with_nanosecond(987_654_321)
            .unwrap();
        let key = EntryKey::from_datetime(at).unwrap();
        let parsed = EntryKey::parse(key.as_str()).unwrap();
        assert_eq!(parsed.timestamp(), dt(2025, 3, 9, 23, 59, 58));
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_round_trip_every_hour() {
        for hour in 0..24 {
            let at = dt(2023, 1, 15, hour, 7, 42);
            let key = EntryKey::from_datetime(at).unwrap();
            assert_eq!(EntryKey::parse(key.as_str()).unwrap().timestamp(), at);
        }
    }

    #[test]
    fn test_parse_accepts_lowercase_meridiem() {
        let key = EntryKey::parse("06-01-24_02:00:00pm").unwrap();
        assert_eq!(key.as_str(), "06-01-24_02:00:00PM");
        assert_eq!(key.timestamp(), dt(2024, 6, 1, 14, 0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            EntryKey::parse("not-a-key"),
            Err(EntryKeyError::Malformed { .. })
        ));
        assert!(EntryKey::parse("").is_err());
        assert!(EntryKey::parse("13-01-24_09:00:00AM").is_err());
    }

    #[test]
    fn test_parse_rejects_unpadded_fields() {
        assert!(EntryKey::parse("6-1-24_9:00:00AM").is_err());
    }

    #[test]
    fn test_with_date_keeps_time_of_day() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 14).unwrap();
        let time = NaiveTime::from_hms_opt(20, 15, 3).unwrap();
        let key = EntryKey::with_date_at(date, time).unwrap();
        assert_eq!(key.as_str(), "07-14-24_08:15:03PM");
        assert_eq!(key.calendar_date(), date);
    }

    #[test]
    fn test_with_date_on_populated_day_makes_second_key() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 14).unwrap();
        let first = EntryKey::with_date_at(date, NaiveTime::from_hms_opt(9, 0, 0).unwrap()).unwrap();
        let second = EntryKey::with_date_at(date, NaiveTime::from_hms_opt(10, 0, 0).unwrap()).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.calendar_date(), second.calendar_date());
    }

    #[test]
    fn test_readable_and_labels() {
        let key = EntryKey::parse("06-01-24_09:00:00AM").unwrap();
        assert_eq!(key.readable(), "6-01-2024 9:00:00 AM");
        assert_eq!(key.label(false), "6-01-2024 9:00:00 AM");
        assert_eq!(key.label(true), "9:00:00 AM");
    }

    #[test]
    fn test_ordering_is_chronological() {
        let mut keys: Vec<EntryKey> = [
            "06-01-24_02:00:00PM",
            "12-31-23_11:00:00PM",
            "06-01-24_09:00:00AM",
            "01-02-25_08:00:00AM",
        ]
        .iter()
        .map(|k| EntryKey::parse(k).unwrap())
        .collect();
        sort_newest_first(&mut keys);
        let raw: Vec<&str> = keys.iter().map(EntryKey::as_str).collect();
        assert_eq!(
            raw,
            vec![
                "01-02-25_08:00:00AM",
                "06-01-24_02:00:00PM",
                "06-01-24_09:00:00AM",
                "12-31-23_11:00:00PM",
            ]
        );
    }

    #[test]
    fn test_serde_as_plain_string() {
        let key = EntryKey::parse("06-02-24_08:30:00AM").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"06-02-24_08:30:00AM\"");
        let back: EntryKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<EntryKey>("\"bogus\"").is_err());
    }

    #[test]
    fn test_round_trip_at_year_window_edges() {
        for at in [dt(1969, 1, 1, 0, 0, 0), dt(2068, 12, 31, 23, 59, 59)] {
            let key = EntryKey::from_datetime(at).unwrap();
            let parsed = EntryKey::parse(key.as_str()).unwrap();
            assert_eq!(parsed.timestamp(), at);
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn test_years_outside_window_rejected() {
        for year in [1968, 2069, 2070] {
            let date = NaiveDate::from_ymd_opt(year, 3, 1).unwrap();
            let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
            assert_eq!(
                EntryKey::with_date_at(date, time),
                Err(EntryKeyError::YearOutOfRange(year))
            );
        }
    }
}
