//! Date filter validation
//!
//! Dates are accepted as `YYYY{sep}MM{sep}DD` or `MM{sep}DD{sep}YYYY`,
//! where `sep` is any single non-digit character used consistently.
//! Both `before:` and `after:` filters must name a date in the past.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

use crate::error::{MailError, Result};

/// Infer the separator character used by a date string
pub fn infer_separator(value: &str) -> Result<char> {
    let separators: BTreeSet<char> = value.chars().filter(|c| !c.is_ascii_digit()).collect();

    let mut iter = separators.into_iter();
    match (iter.next(), iter.next()) {
        (Some(sep), None) => Ok(sep),
        (None, _) => Err(MailError::invalid_date(value, "has no separator")),
        (Some(_), Some(_)) => Err(MailError::invalid_date(value, "used multiple separators")),
    }
}

/// Check that `value` parses under a supported format and is strictly
/// earlier than `now`, returning the parsed date.
pub fn validate_before(value: &str, now: NaiveDateTime) -> Result<NaiveDate> {
    let value = value.trim();
    let sep = infer_separator(value)?;
    // `%` would be read as a format directive
    let sep = if sep == '%' { "%%".to_string() } else { sep.to_string() };

    let formats = [
        format!("%Y{sep}%m{sep}%d"),
        format!("%m{sep}%d{sep}%Y"),
    ];

    formats
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .find(|date| date.and_time(chrono::NaiveTime::MIN) < now)
        .ok_or_else(|| MailError::invalid_date(value, "did not parse or is in the future"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, 0, 0).unwrap())
    }

    #[test]
    fn test_year_first_and_month_first() {
        let now = at(2024, 6, 1, 12);
        assert_eq!(
            validate_before("2024/01/05", now).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(
            validate_before("01-05-2024", now).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(validate_before("2024.1.5", now).is_ok());
    }

    #[test]
    fn test_mixed_separators_rejected() {
        let now = at(2024, 6, 1, 12);
        let err = validate_before("2024-01/05", now).unwrap_err();
        assert!(matches!(err, MailError::InvalidDateFormat { .. }));
        assert!(err.to_string().contains("multiple separators"));
    }

    #[test]
    fn test_no_separator_rejected() {
        assert!(validate_before("20240105", at(2024, 6, 1, 12)).is_err());
    }

    #[test]
    fn test_future_date_rejected() {
        let now = at(2024, 6, 1, 12);
        assert!(validate_before("2024/06/02", now).is_err());
        assert!(validate_before("2030/01/01", now).is_err());
    }

    #[test]
    fn test_today_accepted_after_midnight() {
        assert!(validate_before("2024/06/01", at(2024, 6, 1, 12)).is_ok());
        assert!(validate_before("2024/06/01", at(2024, 6, 1, 0)).is_err());
    }

    #[test]
    fn test_unparseable_rejected() {
        let now = at(2024, 6, 1, 12);
        assert!(validate_before("2024/13/45", now).is_err());
        assert!(validate_before("yesterday", now).is_err());
    }
}
