//! Harvest-timestamp parsing and the trailing recency window.
//!
//! A resource counts as "new" when its first-harvested timestamp lies
//! strictly after midnight seven days before today. Timestamps arrive in
//! ISO-8601 `Z` form, with or without fractional seconds; anything else is
//! treated as absent, never as an error.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::upstream::bindings::{binding_value, Binding};

const FORMAT_WITH_FRACTION: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const FORMAT_WITHOUT_FRACTION: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse a harvest timestamp, accepting both fractional-second and
/// whole-second forms.
pub fn parse_harvested(timestamp: &str) -> Option<DateTime<Utc>> {
    for format in [FORMAT_WITH_FRACTION, FORMAT_WITHOUT_FRACTION] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(timestamp, format) {
            return Some(parsed.and_utc());
        }
    }
    None
}

/// True when the timestamp parses and lies strictly after the cutoff.
pub fn timestamp_is_after(timestamp: &str, cutoff: DateTime<Utc>) -> bool {
    match parse_harvested(timestamp) {
        Some(parsed) => parsed > cutoff,
        None => false,
    }
}

/// Midnight seven days before the given date, the lower bound of the
/// "new last week" window.
pub fn week_cutoff(today: NaiveDate) -> DateTime<Utc> {
    let week_ago = today.checked_sub_days(Days::new(7)).unwrap_or(today);
    week_ago.and_time(NaiveTime::MIN).and_utc()
}

/// True when a result row's `issued` value falls inside the recency window.
pub fn issued_is_new(row: &Binding, cutoff: DateTime<Utc>) -> bool {
    binding_value(row, "issued")
        .map(|issued| timestamp_is_after(issued, cutoff))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::bindings::BoundValue;

    fn fixed_cutoff() -> DateTime<Utc> {
        // Today pinned at 2024-01-15.
        week_cutoff(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    }

    fn issued_row(value: &str) -> Binding {
        let mut row = Binding::new();
        row.insert(
            "issued".to_string(),
            BoundValue {
                value: value.to_string(),
            },
        );
        row
    }

    #[test]
    fn test_recent_date_is_new() {
        assert!(issued_is_new(
            &issued_row("2024-01-12T10:00:00.000Z"),
            fixed_cutoff()
        ));
    }

    #[test]
    fn test_old_date_is_not_new() {
        assert!(!issued_is_new(
            &issued_row("2024-01-05T10:00:00.000Z"),
            fixed_cutoff()
        ));
    }

    #[test]
    fn test_exactly_seven_days_ago_is_new() {
        assert!(issued_is_new(
            &issued_row("2024-01-08T10:00:00.000Z"),
            fixed_cutoff()
        ));
    }

    #[test]
    fn test_future_date_is_new() {
        assert!(issued_is_new(
            &issued_row("2024-01-20T10:00:00.000Z"),
            fixed_cutoff()
        ));
    }

    #[test]
    fn test_missing_issued_is_not_new() {
        assert!(!issued_is_new(&Binding::new(), fixed_cutoff()));
    }

    #[test]
    fn test_invalid_date_is_not_new() {
        assert!(!issued_is_new(
            &issued_row("invalid-date-format"),
            fixed_cutoff()
        ));
    }

    #[test]
    fn test_parses_whole_second_form() {
        assert!(timestamp_is_after("2024-01-12T10:00:00Z", fixed_cutoff()));
    }

    #[test]
    fn test_parses_short_fraction_form() {
        let parsed = parse_harvested("2021-04-23T10:00:04.16Z").unwrap();
        assert_eq!(parsed.timestamp(), 1_619_172_004);
    }
}
