//! Raw text as typed into a loan calculator, converted into [`LoanInput`].

use serde::{Deserialize, Serialize};

use crate::dates::parse_date;
use crate::frequency::{Compounding, Frequency};
use crate::input::{parse_count_or_zero, parse_money, parse_percent_or_zero};
use crate::loans::engine::{LoanInput, LoanTerm, OneTimePayment, PaymentPlan};

/// String fields of a loan calculator form. Blank or malformed numbers
/// become zero; an unparseable start date is dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanForm {
    pub principal: String,
    /// Annual rate in percent, e.g. "6.5".
    pub annual_rate: String,
    pub term_years: String,
    pub term_months: String,
    /// When non-blank, pay this amount until the loan is gone instead of
    /// solving a payment for the term.
    pub payment: String,
    pub extra_payment: String,
    pub one_time_payment: String,
    pub one_time_period: String,
    pub balloon: String,
    pub start_date: String,
    pub payment_frequency: Frequency,
    pub compounding: Option<Compounding>,
}

impl LoanForm {
    pub fn to_input(&self) -> LoanInput {
        let months = parse_count_or_zero(&self.term_years)
            .saturating_mul(12)
            .saturating_add(parse_count_or_zero(&self.term_months));

        let fixed = parse_money(&self.payment);
        let plan = if self.payment.trim().is_empty() {
            PaymentPlan::Term(LoanTerm::Months(months))
        } else {
            PaymentPlan::FixedPayment(fixed)
        };

        let optional = |text: &str| {
            let value = parse_money(text);
            (!value.is_zero()).then_some(value)
        };

        let one_time_payments = match optional(&self.one_time_payment) {
            Some(amount) => vec![OneTimePayment {
                period: Some(parse_count_or_zero(&self.one_time_period).max(1)),
                date: None,
                amount,
            }],
            None => Vec::new(),
        };

        LoanInput {
            principal: parse_money(&self.principal),
            annual_rate: parse_percent_or_zero(&self.annual_rate),
            compounding: self.compounding,
            payment_frequency: self.payment_frequency,
            plan,
            extra_payment: optional(&self.extra_payment),
            one_time_payments,
            balloon: optional(&self.balloon),
            start_date: parse_date(&self.start_date).ok(),
            max_periods: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_form_to_term_loan() {
        let form = LoanForm {
            principal: "25,000".into(),
            annual_rate: "6.5".into(),
            term_years: "5".into(),
            start_date: "2025-01-01".into(),
            ..Default::default()
        };
        let input = form.to_input();
        assert_eq!(input.principal, dec!(25000));
        assert_eq!(input.annual_rate, dec!(0.065));
        assert_eq!(input.plan, PaymentPlan::Term(LoanTerm::Months(60)));
        assert_eq!(input.start_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert!(input.extra_payment.is_none());
    }

    #[test]
    fn test_form_fixed_payment() {
        let form = LoanForm {
            principal: "10000".into(),
            annual_rate: "5".into(),
            payment: "250".into(),
            extra_payment: "0.".into(),
            one_time_payment: "1000".into(),
            one_time_period: "6".into(),
            ..Default::default()
        };
        let input = form.to_input();
        assert_eq!(input.plan, PaymentPlan::FixedPayment(dec!(250)));
        assert!(input.extra_payment.is_none());
        assert_eq!(input.one_time_payments.len(), 1);
        assert_eq!(input.one_time_payments[0].period, Some(6));
    }

    #[test]
    fn test_garbage_becomes_zero() {
        let form = LoanForm {
            principal: "abc".into(),
            annual_rate: "-".into(),
            term_years: "".into(),
            start_date: "not a date".into(),
            ..Default::default()
        };
        let input = form.to_input();
        assert_eq!(input.principal, Decimal::ZERO);
        assert_eq!(input.annual_rate, Decimal::ZERO);
        assert_eq!(input.plan, PaymentPlan::Term(LoanTerm::Months(0)));
        assert!(input.start_date.is_none());
    }
}
