//! Closed-form annuity arithmetic on a per-period rate.
//!
//! Amounts use the calculator convention: principal, payments and balances
//! are all positive numbers.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::CalcError;
use crate::types::{Money, Rate};
use crate::CalcResult;

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
///
/// Returns `None` once the product no longer fits in a `Decimal`.
pub fn compound(rate: Rate, n: u32) -> Option<Decimal> {
    let factor = Decimal::ONE + rate;
    (0..n).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(factor))
}

/// Error for a result that outgrows the `Decimal` range.
pub fn out_of_range(field: &str) -> CalcError {
    CalcError::InvalidInput {
        field: field.into(),
        reason: "Result exceeds the supported numeric range; reduce the rate or term".into(),
    }
}

/// Level payment that retires `principal` over `nper` periods, leaving
/// `balloon` outstanding after the last payment.
///
/// PMT = (P·(1+i)^N − B)·i / ((1+i)^N − 1); straight line when i = 0.
pub fn annuity_payment(rate: Rate, nper: u32, principal: Money, balloon: Money) -> CalcResult<Money> {
    if nper == 0 {
        return Err(CalcError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok((principal - balloon) / Decimal::from(nper));
    }

    let factor = compound(rate, nper).ok_or_else(|| out_of_range("term"))?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "annuity payment factor".into(),
        });
    }

    principal
        .checked_mul(factor)
        .and_then(|grown| grown.checked_sub(balloon))
        .and_then(|owed| owed.checked_mul(rate))
        .and_then(|scaled| scaled.checked_div(denominator))
        .ok_or_else(|| out_of_range("principal"))
}

/// Present value of `nper` level payments plus an optional lump sum at the end.
///
/// A growth factor too large to represent discounts to zero, leaving the
/// perpetuity value `payment / rate`.
pub fn present_value(rate: Rate, nper: u32, payment: Money, lump_sum: Money) -> CalcResult<Money> {
    if rate.is_zero() {
        return payment
            .checked_mul(Decimal::from(nper))
            .and_then(|total| total.checked_add(lump_sum))
            .ok_or_else(|| out_of_range("payment"));
    }
    let discount = compound(rate, nper).map_or(Decimal::ZERO, |factor| Decimal::ONE / factor);
    let annuity_factor = (Decimal::ONE - discount) / rate;
    payment
        .checked_mul(annuity_factor)
        .and_then(|pv| pv.checked_add(lump_sum * discount))
        .ok_or_else(|| out_of_range("payment"))
}

/// Future value of a starting balance plus `nper` level contributions.
///
/// When `due` is true contributions are made at the start of each period
/// (annuity due) and earn one extra period of interest.
pub fn future_value(rate: Rate, nper: u32, payment: Money, starting: Money, due: bool) -> CalcResult<Money> {
    if rate.is_zero() {
        return payment
            .checked_mul(Decimal::from(nper))
            .and_then(|total| total.checked_add(starting))
            .ok_or_else(|| out_of_range("contribution"));
    }
    let factor = compound(rate, nper).ok_or_else(|| out_of_range("years"))?;
    let growth = if due { Decimal::ONE + rate } else { Decimal::ONE };
    payment
        .checked_mul((factor - Decimal::ONE) / rate)
        .and_then(|annuity| annuity.checked_mul(growth))
        .and_then(|annuity| starting.checked_mul(factor)?.checked_add(annuity))
        .ok_or_else(|| out_of_range("years"))
}

/// Number of periods (possibly fractional) for `payment` to retire `principal`.
///
/// N = −ln(1 − P·i / PMT) / ln(1 + i). Returns `None` when the payment does
/// not exceed the interest accruing each period.
pub fn periods_to_repay(rate: Rate, payment: Money, principal: Money) -> Option<Decimal> {
    if principal <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    if payment <= Decimal::ZERO {
        return None;
    }
    if rate.is_zero() {
        return Some(principal / payment);
    }

    let interest = principal.checked_mul(rate)?;
    if payment <= interest {
        return None;
    }

    let ratio = Decimal::ONE - interest / payment;
    let numerator = ratio.checked_ln()?;
    let denominator = (Decimal::ONE + rate).checked_ln()?;
    if denominator.is_zero() {
        return None;
    }
    Some(-numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_compound_basic() {
        assert_eq!(compound(dec!(0.10), 2), Some(dec!(1.21)));
        assert_eq!(compound(dec!(0.05), 0), Some(Decimal::ONE));
    }

    #[test]
    fn test_compound_overflow_is_none() {
        // 1.25^360 is around 1e34, past Decimal::MAX
        assert_eq!(compound(dec!(0.25), 360), None);
    }

    #[test]
    fn test_payment_overflow_is_error() {
        let err = annuity_payment(dec!(0.25), 360, dec!(200000), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "term"));
    }

    #[test]
    fn test_present_value_overflow_is_perpetuity() {
        let pv = present_value(dec!(0.25), 360, dec!(100), Decimal::ZERO).unwrap();
        assert_eq!(pv, dec!(400));
    }

    #[test]
    fn test_future_value_overflow_is_error() {
        assert!(future_value(dec!(0.25), 360, dec!(100), dec!(1000), false).is_err());
    }

    #[test]
    fn test_car_loan_payment() {
        // 25,000 at 6.5% over 60 months ≈ 489.15
        let pmt = annuity_payment(dec!(0.065) / dec!(12), 60, dec!(25000), Decimal::ZERO).unwrap();
        assert!(approx_eq(pmt, dec!(489.15), dec!(0.01)));
    }

    #[test]
    fn test_payment_with_balloon_is_lower() {
        let rate = dec!(0.05) / dec!(12);
        let full = annuity_payment(rate, 60, dec!(30000), Decimal::ZERO).unwrap();
        let balloon = annuity_payment(rate, 60, dec!(30000), dec!(10000)).unwrap();
        assert!(balloon < full);
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let pmt = annuity_payment(Decimal::ZERO, 10, dec!(1000), Decimal::ZERO).unwrap();
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_zero_periods_rejected() {
        assert!(annuity_payment(dec!(0.01), 0, dec!(1000), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_present_value_inverts_payment() {
        let rate = dec!(0.004);
        let pmt = annuity_payment(rate, 120, dec!(50000), Decimal::ZERO).unwrap();
        let pv = present_value(rate, 120, pmt, Decimal::ZERO).unwrap();
        assert!(approx_eq(pv, dec!(50000), dec!(0.0001)));
    }

    #[test]
    fn test_future_value_annuity_due() {
        // 100 per year at 10% for 2 years, paid at start: 100*1.21 + 100*1.1 = 231
        let fv = future_value(dec!(0.10), 2, dec!(100), Decimal::ZERO, true).unwrap();
        assert_eq!(fv, dec!(231));
        let fv_end = future_value(dec!(0.10), 2, dec!(100), Decimal::ZERO, false).unwrap();
        assert_eq!(fv_end, dec!(210));
    }

    #[test]
    fn test_periods_to_repay_matches_term() {
        let rate = dec!(0.005);
        let pmt = annuity_payment(rate, 48, dec!(12000), Decimal::ZERO).unwrap();
        let n = periods_to_repay(rate, pmt, dec!(12000)).unwrap();
        assert!(approx_eq(n, dec!(48), dec!(0.001)));
    }

    #[test]
    fn test_periods_to_repay_insufficient_payment() {
        // Interest alone is 10000 * 0.05/12 ≈ 41.67
        let rate = dec!(0.05) / dec!(12);
        assert!(periods_to_repay(rate, dec!(40), dec!(10000)).is_none());
        assert!(periods_to_repay(rate, dec!(0), dec!(10000)).is_none());
    }
}
