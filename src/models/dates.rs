//! Calendar-day handling
//!
//! Day fields arrive as `YYYY-MM-DD` and are stored as UTC midnight BSON
//! dates, so range filters compare like with like.

use bson::DateTime;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use crate::types::HrmError;

/// Accepted wire format for day fields and filters
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Message returned for any malformed day value
pub const INVALID_DATE_MESSAGE: &str = "Invalid date format. Use YYYY-MM-DD";

/// Parse a `YYYY-MM-DD` value
///
/// Only the fixed ten-character shape is accepted; chrono on its own also
/// takes signed and unpadded years.
pub fn parse_day(raw: &str) -> Result<NaiveDate, HrmError> {
    let raw = raw.trim();
    if !is_day_shaped(raw) {
        return Err(invalid_date());
    }
    NaiveDate::parse_from_str(raw, DAY_FORMAT).map_err(|_| invalid_date())
}

fn is_day_shaped(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn invalid_date() -> HrmError {
    HrmError::BadRequest(INVALID_DATE_MESSAGE.to_string())
}

/// UTC midnight at the start of `day`
pub fn day_start(day: NaiveDate) -> DateTime {
    DateTime::from_chrono(Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)))
}

/// UTC midnight at the start of the day after `day` (exclusive upper bound)
///
/// Saturates at the latest representable date.
pub fn day_end_exclusive(day: NaiveDate) -> DateTime {
    day.succ_opt().map(day_start).unwrap_or(DateTime::MAX)
}

/// Format a stored date as `YYYY-MM-DD`
pub fn format_day(date: DateTime) -> String {
    date.to_chrono().format(DAY_FORMAT).to_string()
}

/// Format a stored timestamp as RFC 3339
pub fn format_timestamp(date: DateTime) -> String {
    date.to_chrono().to_rfc3339()
}

/// Inclusive day range; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DayRange {
    /// Parse optional `from` / `to` query values
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, HrmError> {
        let from = from.filter(|s| !s.trim().is_empty()).map(parse_day).transpose()?;
        let to = to.filter(|s| !s.trim().is_empty()).map(parse_day).transpose()?;
        Ok(Self { from, to })
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether a stored date falls inside the range
    pub fn contains(&self, date: DateTime) -> bool {
        if let Some(from) = self.from {
            if date < day_start(from) {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date >= day_end_exclusive(to) {
                return false;
            }
        }
        true
    }

    /// MongoDB condition for the range, `None` when unbounded
    pub fn to_condition(&self) -> Option<bson::Document> {
        if self.is_open() {
            return None;
        }
        let mut cond = bson::Document::new();
        if let Some(from) = self.from {
            cond.insert("$gte", day_start(from));
        }
        if let Some(to) = self.to {
            cond.insert("$lt", day_end_exclusive(to));
        }
        Some(cond)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(day("2024-01-31"), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let err = parse_day("31/01/2024").unwrap_err();
        assert_eq!(err.to_string(), INVALID_DATE_MESSAGE);
        assert!(parse_day("2024-02-30").is_err());
    }

    #[test]
    fn test_range_is_inclusive_of_to_day() {
        let range = DayRange::parse(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        assert!(range.contains(day_start(day("2024-01-01"))));
        assert!(range.contains(day_start(day("2024-01-31"))));
        assert!(!range.contains(day_start(day("2024-02-01"))));
        assert!(!range.contains(day_start(day("2023-12-31"))));
    }

    #[test]
    fn test_half_open_ranges() {
        let range = DayRange::parse(Some("2024-03-01"), None).unwrap();
        assert!(range.contains(day_start(day("2030-01-01"))));
        assert!(!range.contains(day_start(day("2024-02-29"))));

        let cond = range.to_condition().unwrap();
        assert!(cond.contains_key("$gte"));
        assert!(!cond.contains_key("$lt"));

        assert!(DayRange::parse(Some(""), None).unwrap().to_condition().is_none());
    }

    #[test]
    fn test_parse_day_rejects_loose_shapes() {
        for raw in ["+262142-12-31", "-0001-01-01", "2024-1-5", "20240-01-01", "2024/01/05"] {
            let err = parse_day(raw).unwrap_err();
            assert_eq!(err.to_string(), INVALID_DATE_MESSAGE, "{raw}");
        }
        assert_eq!(day(" 0001-01-01 "), NaiveDate::from_ymd_opt(1, 1, 1).unwrap());
    }

    #[test]
    fn test_end_of_calendar_does_not_overflow() {
        assert_eq!(day_end_exclusive(NaiveDate::MAX), DateTime::MAX);

        let range = DayRange {
            from: None,
            to: Some(NaiveDate::MAX),
        };
        assert!(range.contains(day_start(day("9999-12-31"))));
        assert!(range.to_condition().unwrap().contains_key("$lt"));
    }

    #[test]
    fn test_format_round_trip() {
        assert_eq!(format_day(day_start(day("2024-05-17"))), "2024-05-17");
    }
}
