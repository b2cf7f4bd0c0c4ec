//! Conversions between the crop model's condensed date encodings and calendar dates.
//!
//! Simulation outputs carry separate `YEAR` and `DOY` columns; observation files
//! pack both into a single `YYDDD` integer with a 1940–2039 century window.

use chrono::{Datelike, Duration, NaiveDate};

use crate::constants::MISSING_VALUE;

/// Two-digit years at or above this pivot belong to the 1900s
pub const CENTURY_PIVOT: i32 = 40;

/// Calendar date for a year and day-of-year.
///
/// Returns `None` unless both are positive, `doy` is within 1–366 and the
/// resulting date still falls in `year` (day 366 of a non-leap year is rejected).
pub fn from_year_doy(year: i32, doy: u32) -> Option<NaiveDate> {
    if year <= 0 || !(1..=366).contains(&doy) {
        return None;
    }

    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let date = jan_first.checked_add_signed(Duration::days(i64::from(doy) - 1))?;
    (date.year() == year).then_some(date)
}

/// Calendar date for a packed `YYDDD` value
pub fn from_packed_yyddd(yyddd: u32) -> Option<NaiveDate> {
    let doy = yyddd % 1000;
    let yy = yyddd / 1000;
    if yy > 99 {
        return None;
    }

    from_year_doy(expand_two_digit_year(yy as i32), doy)
}

/// Apply the century pivot to a two-digit year
pub fn expand_two_digit_year(yy: i32) -> i32 {
    if yy >= CENTURY_PIVOT { 1900 + yy } else { 2000 + yy }
}

/// Date from raw `YEAR` and `DOY` tokens; sentinel or non-integer input yields `None`
pub fn year_doy_from_tokens(year: &str, doy: &str) -> Option<NaiveDate> {
    let year = parse_positive(year)?;
    let doy = parse_positive(doy)?;
    from_year_doy(i32::try_from(year).ok()?, doy)
}

/// Date from a raw packed `YYDDD` token
pub fn packed_from_token(token: &str) -> Option<NaiveDate> {
    parse_positive(token).and_then(from_packed_yyddd)
}

/// Two-digit year of a packed token expanded with the century pivot
///
/// Only the year part is checked, so a malformed day still yields a year.
pub fn year_of_packed_token(token: &str) -> Option<i32> {
    let packed = parse_positive(token)?;
    let yy = packed / 1000;
    (yy <= 99).then(|| expand_two_digit_year(yy as i32))
}

/// Inverse of [`from_year_doy`]
pub fn to_year_doy(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.ordinal())
}

/// Inverse of [`from_packed_yyddd`], formatted as the five-digit token
pub fn to_packed_yyddd(date: NaiveDate) -> String {
    format!("{:02}{:03}", date.year().rem_euclid(100), date.ordinal())
}

fn parse_positive(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.is_empty() || token == MISSING_VALUE {
        return None;
    }
    token.parse::<u32>().ok().filter(|value| *value > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_year_doy_basic() {
        assert_eq!(
            from_year_doy(2020, 1),
            NaiveDate::from_ymd_opt(2020, 1, 1)
        );
        assert_eq!(
            from_year_doy(2020, 60),
            NaiveDate::from_ymd_opt(2020, 2, 29)
        );
        assert_eq!(
            from_year_doy(2021, 365),
            NaiveDate::from_ymd_opt(2021, 12, 31)
        );
    }

    #[test]
    fn test_from_year_doy_rejects_out_of_range() {
        assert_eq!(from_year_doy(2020, 0), None);
        assert_eq!(from_year_doy(2020, 367), None);
        assert_eq!(from_year_doy(0, 10), None);
        assert_eq!(from_year_doy(-5, 10), None);
        // 2021 is not a leap year
        assert_eq!(from_year_doy(2021, 366), None);
        assert_eq!(from_year_doy(2020, 366), NaiveDate::from_ymd_opt(2020, 12, 31));
    }

    #[test]
    fn test_year_doy_round_trip() {
        for year in [1940, 1982, 1999, 2000, 2020, 2039] {
            let days = if NaiveDate::from_ymd_opt(year, 12, 31).unwrap().ordinal() == 366 {
                366
            } else {
                365
            };
            for doy in 1..=days {
                let date = from_year_doy(year, doy).unwrap();
                assert_eq!(to_year_doy(date), (year, doy));
            }
        }
    }

    #[test]
    fn test_packed_century_pivot() {
        assert_eq!(
            from_packed_yyddd(82166),
            NaiveDate::from_ymd_opt(1982, 6, 15)
        );
        assert_eq!(from_packed_yyddd(40001).unwrap().year(), 1940);
        assert_eq!(from_packed_yyddd(39001).unwrap().year(), 2039);
        assert_eq!(from_packed_yyddd(20001), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(from_packed_yyddd(1), NaiveDate::from_ymd_opt(2000, 1, 1));

        for yy in 0..100u32 {
            let date = from_packed_yyddd(yy * 1000 + 100).unwrap();
            let expected = if yy >= 40 { 1900 + yy } else { 2000 + yy };
            assert_eq!(date.year(), expected as i32);
        }
    }

    #[test]
    fn test_packed_rejects_invalid_day() {
        assert_eq!(from_packed_yyddd(20000), None);
        assert_eq!(from_packed_yyddd(20367), None);
        assert_eq!(from_packed_yyddd(123456), None);
    }

    #[test]
    fn test_packed_text_round_trip() {
        for token in ["82166", "00001", "39365", "20060"] {
            let date = packed_from_token(token).unwrap();
            assert_eq!(to_packed_yyddd(date), token);
        }
    }

    #[test]
    fn test_tokens_reject_sentinel_and_garbage() {
        assert_eq!(packed_from_token("-99"), None);
        assert_eq!(packed_from_token(""), None);
        assert_eq!(packed_from_token("abc"), None);
        assert_eq!(year_doy_from_tokens("2020", "-99"), None);
        assert_eq!(year_doy_from_tokens("20x0", "5"), None);
        assert_eq!(
            year_doy_from_tokens(" 2020", "5 "),
            NaiveDate::from_ymd_opt(2020, 1, 5)
        );
    }

    #[test]
    fn test_year_of_packed_token() {
        assert_eq!(year_of_packed_token("82000"), Some(1982));
        assert_eq!(year_of_packed_token("05123"), Some(2005));
        assert_eq!(year_of_packed_token("-99"), None);
    }
}
