pub mod loans;
pub mod savings;

use rust_decimal::Decimal;

use loancalc_core::input::{parse_count_or_zero, parse_money, parse_percent_or_zero};

/// A flag that must be present when no `--input` or stdin is given.
fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str, String> {
    value
        .as_deref()
        .ok_or_else(|| format!("--{flag} is required (or provide --input)"))
}

fn money_flag(value: &Option<String>, flag: &str) -> Result<Decimal, String> {
    required(value, flag).map(parse_money)
}

fn percent_flag(value: &Option<String>, flag: &str) -> Result<Decimal, String> {
    required(value, flag).map(parse_percent_or_zero)
}

/// `--years` and `--months` combined into months; at least one is required.
fn term_months(years: &Option<String>, months: &Option<String>) -> Result<u32, String> {
    if years.is_none() && months.is_none() {
        return Err("--years or --months is required (or provide --input)".into());
    }
    let y = years.as_deref().map(parse_count_or_zero).unwrap_or(0);
    let m = months.as_deref().map(parse_count_or_zero).unwrap_or(0);
    Ok(y.saturating_mul(12).saturating_add(m))
}
