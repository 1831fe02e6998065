//! Normalization of free-text numeric entry fields.
//!
//! Calculator fields are typed one keystroke at a time, so partial states
//! such as `""`, `"-"` or `"12."` must be accepted while anything else that
//! is not a plain decimal number is rejected. Whatever text survives is
//! converted with [`parse_or_zero`], which never fails.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::types::{Money, Rate};

static UNSIGNED_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d*\.?\d*$").expect("valid regex"));
static SIGNED_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d*\.?\d*$").expect("valid regex"));
static LEADING_ZEROS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-?)0+(\d)").expect("valid regex"));

/// Whether `candidate` is an acceptable (possibly partial) field value.
pub fn accepts(candidate: &str, allow_negative: bool) -> bool {
    if allow_negative {
        SIGNED_ENTRY.is_match(candidate)
    } else {
        UNSIGNED_ENTRY.is_match(candidate)
    }
}

/// Validate a keystroke and return the text the field should display.
///
/// Returns `None` when the edit must be rejected. Redundant leading zeros
/// are stripped (`"007"` becomes `"7"`, `"00.5"` becomes `"0.5"`).
pub fn normalize_entry(candidate: &str, allow_negative: bool) -> Option<String> {
    if !accepts(candidate, allow_negative) {
        return None;
    }
    Some(LEADING_ZEROS.replace(candidate, "${1}${2}").into_owned())
}

/// Parse a field value, coercing anything malformed to zero.
///
/// Thousands separators, surrounding whitespace, a leading `$` and a
/// trailing `%` are tolerated.
pub fn parse_or_zero(text: &str) -> Decimal {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || cleaned == "-" || cleaned == "." || cleaned == "-." {
        return Decimal::ZERO;
    }

    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

/// Parse a money field.
pub fn parse_money(text: &str) -> Money {
    parse_or_zero(text)
}

/// Parse a percentage field (`"6.5"` → 0.065).
pub fn parse_percent_or_zero(text: &str) -> Rate {
    parse_or_zero(text) / Decimal::ONE_HUNDRED
}

/// Parse a whole-number field such as a term in years; negatives and
/// fractions are truncated toward zero.
pub fn parse_count_or_zero(text: &str) -> u32 {
    let value = parse_or_zero(text);
    if value <= Decimal::ZERO {
        return 0;
    }
    value.trunc().to_u32().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accepts_partial_states() {
        for s in ["", "0", "0.", "12.5", ".5", "100"] {
            assert!(accepts(s, false), "should accept {s:?}");
        }
        assert!(accepts("-", true));
        assert!(accepts("-3.", true));
    }

    #[test]
    fn test_rejects_malformed() {
        for s in ["1.2.3", "abc", "1e5", "--1", "1-", " 1"] {
            assert!(!accepts(s, true), "should reject {s:?}");
        }
        assert!(!accepts("-1", false));
    }

    #[test]
    fn test_strips_leading_zeros() {
        assert_eq!(normalize_entry("007", false).as_deref(), Some("7"));
        assert_eq!(normalize_entry("00.5", false).as_deref(), Some("0.5"));
        assert_eq!(normalize_entry("-0012", true).as_deref(), Some("-12"));
        assert_eq!(normalize_entry("0.", false).as_deref(), Some("0."));
        assert_eq!(normalize_entry("0", false).as_deref(), Some("0"));
        assert_eq!(normalize_entry("", false).as_deref(), Some(""));
        assert_eq!(normalize_entry("1a", false), None);
    }

    #[test]
    fn test_parse_or_zero() {
        assert_eq!(parse_or_zero("1,250.75"), dec!(1250.75));
        assert_eq!(parse_or_zero(" $300 "), dec!(300));
        assert_eq!(parse_or_zero("0."), Decimal::ZERO);
        assert_eq!(parse_or_zero("-"), Decimal::ZERO);
        assert_eq!(parse_or_zero("twelve"), Decimal::ZERO);
        assert_eq!(parse_or_zero("-4.5"), dec!(-4.5));
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent_or_zero("6.5"), dec!(0.065));
        assert_eq!(parse_percent_or_zero("4.5%"), dec!(0.045));
        assert_eq!(parse_percent_or_zero(""), Decimal::ZERO);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count_or_zero("30"), 30);
        assert_eq!(parse_count_or_zero("5.9"), 5);
        assert_eq!(parse_count_or_zero("-2"), 0);
        assert_eq!(parse_count_or_zero("x"), 0);
    }
}
