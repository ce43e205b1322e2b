//! Locale amount handling: `1.234,56` style tokens <-> exact decimals.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::MalformedAmount;

/// Currency marker the statements print in front of amounts.
pub const CURRENCY_PREFIX: &str = "R$";

/// Parse a statement amount such as `R$ 1.234,56`, `-350,00` or `-R$ 12,00`.
///
/// Dots are thousands separators and are dropped wherever they appear; the
/// comma is the decimal separator and must be followed by exactly two digits.
pub fn parse_amount(token: &str) -> Result<Decimal, MalformedAmount> {
    let mut s = token.trim();
    let mut negative = false;

    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_prefix(CURRENCY_PREFIX) {
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_prefix('-') {
        if negative {
            return Err(MalformedAmount::new(token, "sign appears twice"));
        }
        negative = true;
        s = rest;
    }

    let digits = s.replace('.', "");
    let (int_part, frac_part) = digits
        .split_once(',')
        .ok_or_else(|| MalformedAmount::new(token, "missing decimal comma"))?;

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedAmount::new(token, "integer part is not numeric"));
    }
    if frac_part.len() != 2 || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedAmount::new(
            token,
            "expected exactly 2 fractional digits",
        ));
    }

    let value = Decimal::from_str(&format!("{int_part}.{frac_part}"))
        .map_err(|e| MalformedAmount::new(token, e.to_string()))?;

    Ok(if negative { -value } else { value })
}

/// Render an amount as `-1.234,56`: two decimals, dot-grouped thousands,
/// no currency marker.
pub fn format_amount(value: Decimal) -> String {
    let mut abs = value.abs().round_dp(2);
    abs.rescale(2);

    let plain = abs.to_string();
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() && !abs.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped},{frac_part}")
}

/// `format_amount` with a leading marker, e.g. `R$ -350,00`.
pub fn format_amount_with_prefix(value: Decimal, prefix: &str) -> String {
    format!("{prefix}{}", format_amount(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grouped_with_prefix() {
        assert_eq!(parse_amount("R$ 1.234,56").unwrap(), Decimal::new(123456, 2));
        assert_eq!(parse_amount("R$5.000,00").unwrap(), Decimal::new(500000, 2));
        assert_eq!(parse_amount("  12,30 ").unwrap(), Decimal::new(1230, 2));
    }

    #[test]
    fn test_parse_negative_forms() {
        assert_eq!(parse_amount("-350,00").unwrap(), Decimal::new(-35000, 2));
        assert_eq!(parse_amount("R$ -1.000,01").unwrap(), Decimal::new(-100001, 2));
        assert_eq!(parse_amount("-R$ 12,00").unwrap(), Decimal::new(-1200, 2));
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        assert!(parse_amount("1234.56").is_err());
        assert!(parse_amount("12,3").is_err());
        assert!(parse_amount("12,345").is_err());
        assert!(parse_amount("R$").is_err());
        assert!(parse_amount("--1,00").is_err());
        assert!(parse_amount("abc,12").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(-35000, 2)), "-350,00");
        assert_eq!(format_amount(Decimal::new(123456, 2)), "1.234,56");
        assert_eq!(format_amount(Decimal::new(123456789, 2)), "1.234.567,89");
        assert_eq!(format_amount(Decimal::new(5, 0)), "5,00");
        assert_eq!(format_amount(Decimal::ZERO), "0,00");
        assert_eq!(format_amount(Decimal::new(100000, 2)), "1.000,00");
    }

    #[test]
    fn test_round_trip() {
        let samples = [
            Decimal::new(0, 2),
            Decimal::new(1, 2),
            Decimal::new(-1, 2),
            Decimal::new(99999, 2),
            Decimal::new(-100000, 2),
            Decimal::new(123456789012, 2),
            Decimal::new(-35000, 2),
        ];
        for x in samples {
            assert_eq!(parse_amount(&format_amount(x)).unwrap(), x, "round trip of {x}");
        }
    }

    #[test]
    fn test_format_with_prefix() {
        assert_eq!(
            format_amount_with_prefix(Decimal::new(-35000, 2), "R$ "),
            "R$ -350,00"
        );
    }
}
