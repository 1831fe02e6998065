//! Mortgage refinance analysis: new payment, monthly savings and the
//! break-even point on closing costs.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::frequency::Frequency;
use crate::loans::engine::{build_outcome, AmortizationOutcome, LoanInput, LoanSummary, LoanTerm};
use crate::types::{non_negative, with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub current_balance: Money,
    pub current_rate: Rate,
    pub remaining_months: u32,
    pub new_rate: Rate,
    pub new_term_months: u32,
    #[serde(default)]
    pub closing_costs: Money,
    /// Roll closing costs into the new loan instead of paying them up front.
    #[serde(default)]
    pub finance_closing_costs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_out: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceOutput {
    pub current_payment: Money,
    pub current_remaining_interest: Money,
    pub current_total_remaining: Money,
    pub new_principal: Money,
    pub new_payment: Money,
    pub new_total_interest: Money,
    /// New loan payments plus any closing costs paid up front.
    pub new_total_cost: Money,
    /// Positive when the new payment is lower.
    pub monthly_savings: Money,
    /// Months of savings needed to recover the closing costs; `None` when
    /// the new payment is not lower.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_months: Option<u32>,
    /// Remaining cost of keeping the current loan minus the cost of refinancing
    /// (excluding cash taken out).
    pub net_lifetime_savings: Money,
}

fn monthly_summary(
    principal: Money,
    rate: Rate,
    months: u32,
    warnings: &mut Vec<String>,
) -> CalcResult<LoanSummary> {
    let input = LoanInput::term_loan(principal, rate, Frequency::Monthly, LoanTerm::Months(months));
    match build_outcome(&input, warnings)? {
        AmortizationOutcome::Repayable(s) => Ok(s.summary),
        AmortizationOutcome::NotRepayable(n) => {
            warnings.push(n.message);
            Ok(LoanSummary {
                periodic_rate: n.periodic_rate,
                scheduled_payment: n.scheduled_payment,
                number_of_payments: 0,
                total_paid: Decimal::ZERO,
                total_interest: Decimal::ZERO,
                total_principal: Decimal::ZERO,
                total_extra: Decimal::ZERO,
                years_to_payoff: Decimal::ZERO,
                time_to_payoff: "never".into(),
                payoff_date: None,
            })
        }
    }
}

/// Compare keeping the current mortgage with refinancing into a new one.
pub fn analyze_refinance(input: &RefinanceInput) -> CalcResult<ComputationOutput<RefinanceOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let closing_costs = non_negative(input.closing_costs, "closing_costs", &mut warnings);
    let cash_out = non_negative(input.cash_out.unwrap_or(Decimal::ZERO), "cash_out", &mut warnings);

    let current = monthly_summary(
        input.current_balance,
        input.current_rate,
        input.remaining_months,
        &mut warnings,
    )?;

    let mut new_principal = input.current_balance.max(Decimal::ZERO) + cash_out;
    let upfront_costs = if input.finance_closing_costs {
        new_principal += closing_costs;
        Decimal::ZERO
    } else {
        closing_costs
    };

    let new = monthly_summary(new_principal, input.new_rate, input.new_term_months, &mut warnings)?;

    let monthly_savings = current.scheduled_payment - new.scheduled_payment;
    let break_even_months = if monthly_savings > Decimal::ZERO {
        (closing_costs / monthly_savings).ceil().to_u32()
    } else {
        warnings.push("The new payment is not lower; closing costs are never recovered".into());
        None
    };

    if input.new_term_months > input.remaining_months {
        warnings.push(format!(
            "The new term ({} months) extends past the current payoff ({} months remaining)",
            input.new_term_months, input.remaining_months
        ));
    }

    let new_total_cost = new.total_paid + upfront_costs;
    let net_lifetime_savings = current.total_paid - (new_total_cost - cash_out);

    debug!(
        monthly_savings = %monthly_savings,
        break_even = ?break_even_months,
        "refinance analysed"
    );

    let output = RefinanceOutput {
        current_payment: current.scheduled_payment,
        current_remaining_interest: current.total_interest,
        current_total_remaining: current.total_paid,
        new_principal,
        new_payment: new.scheduled_payment,
        new_total_interest: new.total_interest,
        new_total_cost,
        monthly_savings,
        break_even_months,
        net_lifetime_savings,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Refinance comparison (monthly amortization of current and new loans)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_input() -> RefinanceInput {
        RefinanceInput {
            current_balance: dec!(200000),
            current_rate: dec!(0.07),
            remaining_months: 300,
            new_rate: dec!(0.055),
            new_term_months: 300,
            closing_costs: dec!(4000),
            finance_closing_costs: false,
            cash_out: None,
        }
    }

    #[test]
    fn test_lower_rate_breaks_even() {
        let out = analyze_refinance(&base_input()).unwrap().result;
        assert!(out.monthly_savings > dec!(150));
        let months = out.break_even_months.unwrap();
        // 4000 / ~186 per month
        assert!((20..=24).contains(&months));
        assert!(out.net_lifetime_savings > Decimal::ZERO);
        assert!(out.new_total_interest < out.current_remaining_interest);
    }

    #[test]
    fn test_higher_rate_never_breaks_even() {
        let mut input = base_input();
        input.new_rate = dec!(0.08);
        let out = analyze_refinance(&input).unwrap();
        assert!(out.result.break_even_months.is_none());
        assert!(out.result.monthly_savings < Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_financed_closing_costs_raise_principal() {
        let mut input = base_input();
        input.finance_closing_costs = true;
        let financed = analyze_refinance(&input).unwrap().result;
        let upfront = analyze_refinance(&base_input()).unwrap().result;
        assert_eq!(financed.new_principal, dec!(204000));
        assert!(financed.new_payment > upfront.new_payment);
        // Nothing paid at closing: total cost is the loan payments alone.
        assert!((financed.new_total_cost - financed.new_payment * dec!(300)).abs() < dec!(0.01));
        assert_eq!(financed.break_even_months, Some(25));
    }

    #[test]
    fn test_cash_out_increases_principal() {
        let mut input = base_input();
        input.cash_out = Some(dec!(20000));
        let out = analyze_refinance(&input).unwrap().result;
        assert_eq!(out.new_principal, dec!(220000));
    }

    #[test]
    fn test_longer_term_warns() {
        let mut input = base_input();
        input.new_term_months = 360;
        let out = analyze_refinance(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("extends past")));
    }
}
