//! Closed-form solvers built on the annuity formula: payment for a target
//! term, time to pay off a given payment, and the principal a payment can
//! support.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::CalcError;
use crate::frequency::{describe_duration, periodic_rate, Compounding, Frequency};
use crate::loans::engine::LoanTerm;
use crate::time_value::{annuity_payment, out_of_range, periods_to_repay, present_value};
use crate::types::{non_negative, with_metadata, ComputationOutput, Money, Rate, Years};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Payment for a target term
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSolveInput {
    pub principal: Money,
    pub annual_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounding: Option<Compounding>,
    #[serde(default)]
    pub payment_frequency: Frequency,
    pub term: LoanTerm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balloon: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSolveOutput {
    pub periodic_rate: Rate,
    pub number_of_payments: u32,
    pub payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
}

/// Level payment that retires the principal in exactly the target number of payments.
pub fn solve_payment(input: &PaymentSolveInput) -> CalcResult<ComputationOutput<PaymentSolveOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let principal = non_negative(input.principal, "principal", &mut warnings);
    let annual_rate = non_negative(input.annual_rate, "annual_rate", &mut warnings);
    let balloon = non_negative(input.balloon.unwrap_or(Decimal::ZERO), "balloon", &mut warnings);

    let n = input.term.periods(input.payment_frequency);
    if n == 0 {
        return Err(CalcError::InvalidInput {
            field: "term".into(),
            reason: "Term must contain at least one payment".into(),
        });
    }

    let compounding = input
        .compounding
        .unwrap_or_else(|| Compounding::from(input.payment_frequency));
    let rate = periodic_rate(annual_rate, compounding, input.payment_frequency)?;
    let payment = annuity_payment(rate, n, principal, balloon)?;
    let total_paid = payment
        .checked_mul(Decimal::from(n))
        .and_then(|paid| paid.checked_add(balloon))
        .ok_or_else(|| out_of_range("term"))?;

    debug!(payments = n, payment = %payment, "solved payment for target term");

    let output = PaymentSolveOutput {
        periodic_rate: rate,
        number_of_payments: n,
        payment,
        total_paid,
        total_interest: total_paid - principal,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity payment: PMT = (P(1+i)^N - B) i / ((1+i)^N - 1)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Time to pay off a fixed payment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffSolveInput {
    pub principal: Money,
    pub annual_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounding: Option<Compounding>,
    #[serde(default)]
    pub payment_frequency: Frequency,
    pub payment: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PayoffEstimate {
    Repayable {
        /// Fractional number of payments from the closed form.
        exact_periods: Decimal,
        /// Payments actually made (the last one partial).
        number_of_payments: u32,
        years_to_payoff: Years,
        time_to_payoff: String,
        /// Approximate: `payment × exact_periods`.
        total_paid: Money,
        total_interest: Money,
    },
    NotRepayable {
        interest_per_period: Money,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffSolveOutput {
    pub periodic_rate: Rate,
    pub payment: Money,
    pub estimate: PayoffEstimate,
}

/// How long a fixed payment takes to retire the principal:
/// N = -ln(1 - P·i/PMT) / ln(1+i).
pub fn solve_payoff_time(input: &PayoffSolveInput) -> CalcResult<ComputationOutput<PayoffSolveOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let principal = non_negative(input.principal, "principal", &mut warnings);
    let annual_rate = non_negative(input.annual_rate, "annual_rate", &mut warnings);
    let payment = non_negative(input.payment, "payment", &mut warnings);

    let compounding = input
        .compounding
        .unwrap_or_else(|| Compounding::from(input.payment_frequency));
    let rate = periodic_rate(annual_rate, compounding, input.payment_frequency)?;
    let interest = principal.checked_mul(rate).ok_or_else(|| out_of_range("annual_rate"))?;

    let estimate = match periods_to_repay(rate, payment, principal) {
        Some(exact) => {
            let number_of_payments = exact.ceil().to_u32().unwrap_or(u32::MAX);
            let total_paid = payment.checked_mul(exact).ok_or_else(|| out_of_range("payment"))?;
            PayoffEstimate::Repayable {
                exact_periods: exact,
                number_of_payments,
                years_to_payoff: exact / Decimal::from(input.payment_frequency.periods_per_year()),
                time_to_payoff: describe_duration(number_of_payments, input.payment_frequency),
                total_paid,
                total_interest: total_paid - principal,
            }
        }
        None => {
            let message = format!(
                "A payment of {} never repays the loan; at least {} of interest accrues each period",
                payment.round_dp(2),
                interest.round_dp(2),
            );
            warnings.push(message.clone());
            PayoffEstimate::NotRepayable {
                interest_per_period: interest,
                message,
            }
        }
    };

    let output = PayoffSolveOutput {
        periodic_rate: rate,
        payment,
        estimate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Number of periods: N = -ln(1 - P i / PMT) / ln(1 + i)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Affordability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    /// Payment the borrower can afford each period.
    pub payment: Money,
    pub annual_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounding: Option<Compounding>,
    #[serde(default)]
    pub payment_frequency: Frequency,
    pub term: LoanTerm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityOutput {
    pub periodic_rate: Rate,
    pub number_of_payments: u32,
    pub max_principal: Money,
    pub max_purchase_price: Money,
    pub total_paid: Money,
    pub total_interest: Money,
}

/// Largest principal the payment retires over the term (present value of the annuity).
pub fn solve_affordable_principal(
    input: &AffordabilityInput,
) -> CalcResult<ComputationOutput<AffordabilityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let payment = non_negative(input.payment, "payment", &mut warnings);
    let annual_rate = non_negative(input.annual_rate, "annual_rate", &mut warnings);
    let down_payment = non_negative(input.down_payment.unwrap_or(Decimal::ZERO), "down_payment", &mut warnings);

    let n = input.term.periods(input.payment_frequency);
    if n == 0 {
        return Err(CalcError::InvalidInput {
            field: "term".into(),
            reason: "Term must contain at least one payment".into(),
        });
    }

    let compounding = input
        .compounding
        .unwrap_or_else(|| Compounding::from(input.payment_frequency));
    let rate = periodic_rate(annual_rate, compounding, input.payment_frequency)?;
    let max_principal = present_value(rate, n, payment, Decimal::ZERO)?;
    let total_paid = payment
        .checked_mul(Decimal::from(n))
        .ok_or_else(|| out_of_range("payment"))?;

    let output = AffordabilityOutput {
        periodic_rate: rate,
        number_of_payments: n,
        max_principal,
        max_purchase_price: max_principal
            .checked_add(down_payment)
            .ok_or_else(|| out_of_range("down_payment"))?,
        total_paid,
        total_interest: total_paid - max_principal,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Present value of annuity: PV = PMT (1 - (1+i)^-N) / i",
        input,
        warnings,
        elapsed,
        output,
    ))
}
