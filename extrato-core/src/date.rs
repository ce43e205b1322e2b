//! Date tokens: `DD-MM-YYYY`, and `DD-MM-YY` as a fallback.

use chrono::NaiveDate;
use regex::Regex;
use std::ops::Range;

/// Century applied to two-digit years unless configured otherwise.
pub const DEFAULT_YEAR_BASE: i32 = 2000;

/// A date token found somewhere in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateHit {
    /// Byte span of the token in the searched text.
    pub span: Range<usize>,
    /// `None` when the token has the right shape but names no real day
    /// (e.g. `31-02-2024`).
    pub date: Option<NaiveDate>,
}

/// Finds and parses date tokens, preferring four-digit years.
#[derive(Debug, Clone)]
pub struct DateScanner {
    four: Regex,
    two: Regex,
    year_base: i32,
}

impl DateScanner {
    pub fn new(year_base: i32) -> Result<Self, regex::Error> {
        Ok(Self {
            four: Regex::new(r"\b(\d{2})-(\d{2})-(\d{4})\b")?,
            two: Regex::new(r"\b(\d{2})-(\d{2})-(\d{2})\b")?,
            year_base,
        })
    }

    /// First date token in `text`. A two-digit-year token is only considered
    /// when no four-digit-year token exists anywhere in the line.
    pub fn find(&self, text: &str) -> Option<DateHit> {
        let caps = self
            .four
            .captures(text)
            .or_else(|| self.two.captures(text))?;
        let whole = caps.get(0)?;
        let date = self.date_from_parts(&caps[1], &caps[2], &caps[3]);
        Some(DateHit {
            span: whole.range(),
            date,
        })
    }

    /// Parse a token that is exactly `DD-MM-YY` or `DD-MM-YYYY`.
    pub fn parse_token(&self, token: &str) -> Option<NaiveDate> {
        let mut parts = token.trim().split('-');
        let (d, m, y) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || d.len() != 2 || m.len() != 2 {
            return None;
        }
        if y.len() != 2 && y.len() != 4 {
            return None;
        }
        self.date_from_parts(d, m, y)
    }

    fn date_from_parts(&self, d: &str, m: &str, y: &str) -> Option<NaiveDate> {
        let day: u32 = d.parse().ok()?;
        let month: u32 = m.parse().ok()?;
        let mut year: i32 = y.parse().ok()?;
        if y.len() == 2 {
            year += self.year_base;
        }
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> DateScanner {
        DateScanner::new(DEFAULT_YEAR_BASE).unwrap()
    }

    #[test]
    fn test_four_digit_year() {
        let hit = scanner().find("10-01-2024 PIX").unwrap();
        assert_eq!(hit.date, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(hit.span, 0..10);
    }

    #[test]
    fn test_two_digit_year_normalized() {
        let hit = scanner().find("saldo em 05-03-24").unwrap();
        assert_eq!(hit.date, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn test_four_digit_preferred_anywhere_in_line() {
        // The short token comes first but the long one wins.
        let hit = scanner().find("01-02-23 ref 03-04-2025").unwrap();
        assert_eq!(hit.date, NaiveDate::from_ymd_opt(2025, 4, 3));
    }

    #[test]
    fn test_iso_timestamp_is_not_a_token() {
        assert!(scanner().find("Data de geração: 2024-01-15").is_none());
    }

    #[test]
    fn test_invalid_calendar_day() {
        let hit = scanner().find("31-02-2024").unwrap();
        assert_eq!(hit.date, None);
    }

    #[test]
    fn test_parse_token() {
        let s = scanner();
        assert_eq!(s.parse_token("15-02-2024"), NaiveDate::from_ymd_opt(2024, 2, 15));
        assert_eq!(s.parse_token("15-02-24"), NaiveDate::from_ymd_opt(2024, 2, 15));
        assert_eq!(s.parse_token("15-02-024"), None);
        assert_eq!(s.parse_token("1-02-2024"), None);
    }

    #[test]
    fn test_custom_year_base() {
        let s = DateScanner::new(1900).unwrap();
        assert_eq!(s.parse_token("01-01-99"), NaiveDate::from_ymd_opt(1999, 1, 1));
    }
}
