use adlens_common::AdLensError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Inclusive calendar-day window applied to an ad's start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AdLensError> {
        if start > end {
            return Err(AdLensError::Validation(format!(
                "date range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, AdLensError> {
        let day = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|e| AdLensError::Validation(format!("invalid date '{s}': {e}")))
        };
        Self::new(day(start)?, day(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Whether an ad start date falls inside `range`.
///
/// Blank or unparseable dates are kept: an ad is only dropped when its date
/// is known to be outside the window.
pub fn is_date_in_range(date: &str, range: &DateRange) -> bool {
    match parse_day(date) {
        Some(day) => range.contains(day),
        None => true,
    }
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = raw.parse().ok()?;
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive());
    }

    if raw.contains('T') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        let naive = raw.trim_end_matches('Z');
        return NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M"))
            .ok()
            .map(|dt| dt.date());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn may() -> DateRange {
        DateRange::parse("2024-05-01", "2024-05-31").unwrap()
    }

    #[test]
    fn plain_dates_are_inclusive() {
        assert!(is_date_in_range("2024-05-01", &may()));
        assert!(is_date_in_range("2024-05-31", &may()));
        assert!(!is_date_in_range("2024-06-01", &may()));
        assert!(!is_date_in_range("2024-04-30", &may()));
    }

    #[test]
    fn iso_datetimes_use_their_calendar_day() {
        assert!(is_date_in_range("2024-05-31T23:59:59Z", &may()));
        assert!(is_date_in_range("2024-05-10T08:00:00+02:00", &may()));
        assert!(is_date_in_range("2024-05-10T08:00:00", &may()));
        assert!(!is_date_in_range("2024-06-02T00:00:00.000Z", &may()));
    }

    #[test]
    fn unix_seconds_are_accepted() {
        // 2024-05-15T00:00:00Z
        assert!(is_date_in_range("1715731200", &may()));
        // 2024-07-01T00:00:00Z
        assert!(!is_date_in_range("1719792000", &may()));
    }

    #[test]
    fn blank_or_garbage_is_kept() {
        assert!(is_date_in_range("", &may()));
        assert!(is_date_in_range("   ", &may()));
        assert!(is_date_in_range("last tuesday", &may()));
        assert!(is_date_in_range("2024-13-45", &may()));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(DateRange::parse("2024-06-01", "2024-05-01").is_err());
        assert!(DateRange::parse("2024-06-01", "June").is_err());
    }
}
