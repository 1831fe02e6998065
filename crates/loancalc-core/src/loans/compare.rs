//! Side-by-side comparison of a loan with and without extra payments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::frequency::describe_duration;
use crate::loans::engine::{build_outcome, AmortizationOutcome, LoanInput, LoanSummary};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::CalcResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioSummary {
    Repayable(LoanSummary),
    NotRepayable { message: String },
}

impl ScenarioSummary {
    fn from_outcome(outcome: &AmortizationOutcome) -> Self {
        match outcome {
            AmortizationOutcome::Repayable(s) => ScenarioSummary::Repayable(s.summary.clone()),
            AmortizationOutcome::NotRepayable(n) => ScenarioSummary::NotRepayable {
                message: n.message.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraPaymentComparison {
    pub baseline: ScenarioSummary,
    pub with_extra: ScenarioSummary,
    /// Present only when both scenarios pay off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_saved: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments_saved: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_saved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_payoff_date: Option<NaiveDate>,
}

/// Amortize `input` as given and again with all extra and one-time payments
/// removed, and report the difference.
pub fn compare_extra_payments(input: &LoanInput) -> CalcResult<ComputationOutput<ExtraPaymentComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut baseline_input = input.clone();
    baseline_input.extra_payment = None;
    baseline_input.one_time_payments.clear();

    // Warnings about shared inputs would otherwise be reported twice.
    let mut baseline_warnings: Vec<String> = Vec::new();
    let baseline = build_outcome(&baseline_input, &mut baseline_warnings)?;
    let accelerated = build_outcome(input, &mut warnings)?;

    let comparison = match (baseline.summary(), accelerated.summary()) {
        (Some(base), Some(fast)) => {
            let payments_saved = base.number_of_payments.saturating_sub(fast.number_of_payments);
            ExtraPaymentComparison {
                baseline: ScenarioSummary::Repayable(base.clone()),
                with_extra: ScenarioSummary::Repayable(fast.clone()),
                interest_saved: Some((base.total_interest - fast.total_interest).max(Decimal::ZERO)),
                payments_saved: Some(payments_saved),
                time_saved: Some(describe_duration(payments_saved, input.payment_frequency)),
                new_payoff_date: fast.payoff_date,
            }
        }
        _ => {
            if !accelerated.is_repayable() {
                warnings.push("The loan is not repayable even with the extra payments".into());
            }
            ExtraPaymentComparison {
                baseline: ScenarioSummary::from_outcome(&baseline),
                with_extra: ScenarioSummary::from_outcome(&accelerated),
                interest_saved: None,
                payments_saved: None,
                time_saved: None,
                new_payoff_date: accelerated.summary().and_then(|s| s.payoff_date),
            }
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Amortization with vs. without extra payments",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "extra_payment": input.extra_payment.map(|e| e.to_string()),
            "one_time_payments": input.one_time_payments.len(),
            "payment_frequency": input.payment_frequency,
        }),
        warnings,
        elapsed,
        comparison,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::Frequency;
    use crate::loans::engine::{LoanTerm, PaymentPlan};
    use rust_decimal_macros::dec;

    #[test]
    fn test_extra_saves_interest_and_time() {
        let mut input = LoanInput::term_loan(dec!(250000), dec!(0.045), Frequency::Monthly, LoanTerm::Years(30));
        input.extra_payment = Some(dec!(200));
        let out = compare_extra_payments(&input).unwrap().result;
        assert!(out.interest_saved.unwrap() > dec!(30000));
        assert!(out.payments_saved.unwrap() > 60);
        assert!(matches!(out.baseline, ScenarioSummary::Repayable(_)));
    }

    #[test]
    fn test_no_extra_saves_nothing() {
        let input = LoanInput::term_loan(dec!(10000), dec!(0.05), Frequency::Monthly, LoanTerm::Years(2));
        let out = compare_extra_payments(&input).unwrap().result;
        assert_eq!(out.interest_saved, Some(Decimal::ZERO));
        assert_eq!(out.payments_saved, Some(0));
        assert_eq!(out.time_saved.as_deref(), Some("0 months"));
    }

    #[test]
    fn test_extra_rescues_insufficient_payment() {
        let mut input = LoanInput::term_loan(dec!(10000), dec!(0.05), Frequency::Monthly, LoanTerm::Years(1));
        input.plan = PaymentPlan::FixedPayment(dec!(30));
        input.extra_payment = Some(dec!(170));
        let out = compare_extra_payments(&input).unwrap().result;
        assert!(matches!(out.baseline, ScenarioSummary::NotRepayable { .. }));
        assert!(matches!(out.with_extra, ScenarioSummary::Repayable(_)));
        assert!(out.interest_saved.is_none());
    }
}
