//! Period-by-period amortization of a fixed-payment loan.
//!
//! One engine serves every loan-style calculator: term loans (payment solved
//! from the annuity formula, optionally leaving a balloon), fixed-payment
//! payoff schedules, recurring extra payments and one-time lump sums. Loans
//! that can never be repaid come back as [`AmortizationOutcome::NotRepayable`]
//! rather than as sentinel numbers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::dates::payment_date;
use crate::frequency::{describe_duration, periodic_rate, Compounding, Frequency};
use crate::time_value::annuity_payment;
use crate::types::{non_negative, with_metadata, ComputationOutput, Money, Rate, Years};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Remaining balance at or below this amount is treated as paid off.
pub const BALANCE_EPSILON: Decimal = dec!(0.01);

/// Safety cap for fixed-payment schedules, in years.
pub const MAX_PAYOFF_YEARS: u32 = 50;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Length of a term loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanTerm {
    Years(u32),
    Months(u32),
    /// Number of payments at the loan's payment frequency.
    Periods(u32),
}

impl LoanTerm {
    /// Number of payments the term spans at `frequency`, rounded up.
    pub fn periods(self, frequency: Frequency) -> u32 {
        let per_year = frequency.periods_per_year();
        match self {
            LoanTerm::Years(y) => y.saturating_mul(per_year),
            LoanTerm::Months(m) => {
                let scaled = u64::from(m) * u64::from(per_year);
                u32::try_from(scaled.div_ceil(12)).unwrap_or(u32::MAX)
            }
            LoanTerm::Periods(n) => n,
        }
    }
}

/// How the periodic payment is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPlan {
    /// Solve the level payment that retires the loan over the term.
    Term(LoanTerm),
    /// Pay a fixed amount each period until the balance reaches zero.
    FixedPayment(Money),
}

/// A lump sum applied on top of the regular payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimePayment {
    /// Payment number the lump sum is applied with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    /// Alternatively, the first payment on or after this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub amount: Money,
}

/// Immutable parameters for one amortization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    /// Nominal annual rate (0.065 = 6.5%).
    pub annual_rate: Rate,
    /// Defaults to the payment frequency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounding: Option<Compounding>,
    #[serde(default)]
    pub payment_frequency: Frequency,
    pub plan: PaymentPlan,
    /// Recurring extra principal paid with every payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_payment: Option<Money>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_time_payments: Vec<OneTimePayment>,
    /// Amount left outstanding after the last scheduled payment of a term
    /// loan and paid together with it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balloon: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Overrides the default iteration cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_periods: Option<u32>,
}

impl LoanInput {
    /// A plain term loan with no extras.
    pub fn term_loan(principal: Money, annual_rate: Rate, frequency: Frequency, term: LoanTerm) -> Self {
        LoanInput {
            principal,
            annual_rate,
            compounding: None,
            payment_frequency: frequency,
            plan: PaymentPlan::Term(term),
            extra_payment: None,
            one_time_payments: Vec::new(),
            balloon: None,
            start_date: None,
            max_periods: None,
        }
    }

    pub fn effective_compounding(&self) -> Compounding {
        self.compounding
            .unwrap_or_else(|| Compounding::from(self.payment_frequency))
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One simulated payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Total paid this period; always `principal + interest`.
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    /// Part of `principal` that came from extra, one-time or balloon payments.
    pub extra: Money,
    pub balance: Money,
    pub cumulative_principal: Money,
    pub cumulative_interest: Money,
}

/// Totals for a completed schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub periodic_rate: Rate,
    /// Regular payment before extras.
    pub scheduled_payment: Money,
    pub number_of_payments: u32,
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_extra: Money,
    pub years_to_payoff: Years,
    /// e.g. "4 years 7 months"
    pub time_to_payoff: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub payment_frequency: Frequency,
    pub summary: LoanSummary,
    pub rows: Vec<PaymentRow>,
}

/// Why a loan cannot be paid off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotRepayableReason {
    /// The payment does not exceed the interest charged each period.
    PaymentBelowInterest,
    /// The balance was still outstanding when the iteration cap was reached.
    ExceedsMaximumTerm { max_periods: u32 },
    /// A term of zero leaves no payments to repay the principal with.
    NoPaymentPeriods,
    /// The rate compounds past the largest representable amount.
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotRepayable {
    pub reason: NotRepayableReason,
    pub message: String,
    pub periodic_rate: Rate,
    pub scheduled_payment: Money,
    /// Interest charged in the first period; the payment must exceed it.
    pub first_period_interest: Money,
    pub remaining_balance: Money,
    /// Rows simulated before the cap was hit (empty when detected up front).
    pub partial_rows: Vec<PaymentRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AmortizationOutcome {
    Repayable(AmortizationSchedule),
    NotRepayable(NotRepayable),
}

impl AmortizationOutcome {
    pub fn is_repayable(&self) -> bool {
        matches!(self, AmortizationOutcome::Repayable(_))
    }

    pub fn schedule(&self) -> Option<&AmortizationSchedule> {
        match self {
            AmortizationOutcome::Repayable(s) => Some(s),
            AmortizationOutcome::NotRepayable(_) => None,
        }
    }

    pub fn summary(&self) -> Option<&LoanSummary> {
        self.schedule().map(|s| &s.summary)
    }

    /// Rows of the full schedule, or the partial rows of a capped run.
    pub fn rows(&self) -> &[PaymentRow] {
        match self {
            AmortizationOutcome::Repayable(s) => &s.rows,
            AmortizationOutcome::NotRepayable(n) => &n.partial_rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map each one-time payment onto the payment number it is applied with.
fn resolve_one_time_payments(
    input: &LoanInput,
    max_periods: u32,
    warnings: &mut Vec<String>,
) -> CalcResult<BTreeMap<u32, Money>> {
    let mut by_period: BTreeMap<u32, Money> = BTreeMap::new();

    for (idx, otp) in input.one_time_payments.iter().enumerate() {
        let amount = non_negative(otp.amount, &format!("one_time_payments[{idx}].amount"), warnings);
        if amount.is_zero() {
            continue;
        }

        let period = match (otp.period, otp.date, input.start_date) {
            (Some(p), _, _) => Some(p.max(1)),
            (None, Some(date), Some(start)) => {
                let mut found = None;
                for k in 1..=max_periods {
                    if payment_date(start, input.payment_frequency, k)? >= date {
                        found = Some(k);
                        break;
                    }
                }
                if found.is_none() {
                    warnings.push(format!(
                        "One-time payment of {amount} dated {date} falls after the last possible \
                         payment and was not applied"
                    ));
                }
                found
            }
            (None, Some(_), None) => {
                warnings.push(format!(
                    "One-time payment {idx} is dated but the loan has no start_date; ignored"
                ));
                None
            }
            (None, None, _) => {
                warnings.push(format!(
                    "One-time payment {idx} has neither a period nor a date; ignored"
                ));
                None
            }
        };

        if let Some(p) = period {
            *by_period.entry(p).or_insert(Decimal::ZERO) += amount;
        }
    }

    Ok(by_period)
}

fn summarize(
    rows: &[PaymentRow],
    rate: Rate,
    scheduled_payment: Money,
    frequency: Frequency,
) -> LoanSummary {
    let number_of_payments = rows.len() as u32;
    let total_paid: Money = rows.iter().map(|r| r.payment).sum();
    let total_extra: Money = rows.iter().map(|r| r.extra).sum();
    let (total_principal, total_interest) = rows
        .last()
        .map(|r| (r.cumulative_principal, r.cumulative_interest))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));

    LoanSummary {
        periodic_rate: rate,
        scheduled_payment,
        number_of_payments,
        total_paid,
        total_interest,
        total_principal,
        total_extra,
        years_to_payoff: Decimal::from(number_of_payments) / Decimal::from(frequency.periods_per_year()),
        time_to_payoff: describe_duration(number_of_payments, frequency),
        payoff_date: rows.last().and_then(|r| r.date),
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Build the full amortization schedule for a loan.
pub fn amortize(input: &LoanInput) -> CalcResult<ComputationOutput<AmortizationOutcome>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let outcome = build_outcome(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-payment amortization (annuity formula with period-by-period simulation)",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "payment_frequency": input.payment_frequency,
            "compounding": input.effective_compounding(),
            "plan": input.plan,
        }),
        warnings,
        elapsed,
        outcome,
    ))
}

/// Run the simulation without the metadata envelope.
pub fn build_outcome(input: &LoanInput, warnings: &mut Vec<String>) -> CalcResult<AmortizationOutcome> {
    let principal = non_negative(input.principal, "principal", warnings);
    let annual_rate = non_negative(input.annual_rate, "annual_rate", warnings);
    let extra = non_negative(input.extra_payment.unwrap_or(Decimal::ZERO), "extra_payment", warnings);

    let frequency = input.payment_frequency;
    let compounding = input.effective_compounding();
    let Ok(rate) = periodic_rate(annual_rate, compounding, frequency) else {
        return Ok(out_of_range_outcome(warnings, Decimal::ZERO, Decimal::ZERO, principal));
    };

    if compounding.periods_per_year() != Some(frequency.periods_per_year()) && !annual_rate.is_zero() {
        warnings.push(format!(
            "Interest compounds {compounding} but payments are {frequency}; \
             using the equivalent periodic rate {rate}"
        ));
    }

    let (scheduled_payment, term_periods, balloon) = match input.plan {
        PaymentPlan::Term(term) => {
            let n = term.periods(frequency);
            let mut balloon = non_negative(input.balloon.unwrap_or(Decimal::ZERO), "balloon", warnings);
            if balloon > principal {
                warnings.push(format!(
                    "Balloon {balloon} exceeds the principal; capped at {principal}"
                ));
                balloon = principal;
            }
            if n == 0 {
                if principal.is_zero() {
                    return Ok(empty_schedule(rate, frequency));
                }
                return Ok(not_repayable(
                    NotRepayableReason::NoPaymentPeriods,
                    "The loan term is zero, so there are no payments to repay it with".into(),
                    rate,
                    Decimal::ZERO,
                    principal,
                    Vec::new(),
                ));
            }
            match annuity_payment(rate, n, principal, balloon) {
                Ok(payment) => (payment, Some(n), balloon),
                Err(_) => return Ok(out_of_range_outcome(warnings, rate, Decimal::ZERO, principal)),
            }
        }
        PaymentPlan::FixedPayment(amount) => {
            if input.balloon.is_some() {
                warnings.push("Balloon applies only to term loans; ignored".into());
            }
            (non_negative(amount, "payment", warnings), None, Decimal::ZERO)
        }
    };

    if principal.is_zero() {
        return Ok(empty_schedule(rate, frequency));
    }

    let per_year = frequency.periods_per_year();
    let max_periods = input.max_periods.unwrap_or(match term_periods {
        Some(n) => n.saturating_mul(2),
        None => MAX_PAYOFF_YEARS * per_year,
    });

    let one_time = resolve_one_time_payments(input, max_periods, warnings)?;
    let lump_sums: Money = one_time.values().copied().sum();

    debug!(
        principal = %principal,
        periodic_rate = %rate,
        scheduled_payment = %scheduled_payment,
        max_periods,
        "building amortization schedule"
    );

    let Some(first_interest) = principal.checked_mul(rate) else {
        return Ok(out_of_range_outcome(warnings, rate, scheduled_payment, principal));
    };
    // Term payments always amortize (a full balloon makes them interest-only).
    if term_periods.is_none() && scheduled_payment + extra <= first_interest && lump_sums < principal {
        warn!(payment = %scheduled_payment, interest = %first_interest, "payment does not cover interest");
        let message = format!(
            "A payment of {} does not cover the {} of interest charged each period; \
             the balance would never decrease",
            (scheduled_payment + extra).round_dp(2),
            first_interest.round_dp(2),
        );
        warnings.push(message.clone());
        return Ok(not_repayable(
            NotRepayableReason::PaymentBelowInterest,
            message,
            rate,
            scheduled_payment,
            principal,
            Vec::new(),
        ));
    }

    let mut rows: Vec<PaymentRow> = Vec::new();
    let mut balance = principal;
    let mut cumulative_principal = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;

    for period in 1..=max_periods {
        let interest = balance * rate;
        let mut extra_this = extra + one_time.get(&period).copied().unwrap_or(Decimal::ZERO);
        if term_periods == Some(period) {
            extra_this += balloon;
        }

        let regular_principal = scheduled_payment - interest;
        let mut principal_part = if regular_principal >= balance {
            balance
        } else {
            (regular_principal + extra_this).min(balance)
        };
        let extra_part = (principal_part - regular_principal).max(Decimal::ZERO);

        balance -= principal_part;
        if balance > Decimal::ZERO && balance <= BALANCE_EPSILON {
            principal_part += balance;
            balance = Decimal::ZERO;
        }

        cumulative_principal += principal_part;
        let Some(total_interest) = cumulative_interest
            .checked_add(interest)
            .filter(|t| t.checked_add(cumulative_principal).is_some())
        else {
            return Ok(out_of_range_outcome(warnings, rate, scheduled_payment, principal));
        };
        cumulative_interest = total_interest;

        let date = match input.start_date {
            Some(start) => Some(payment_date(start, frequency, period)?),
            None => None,
        };

        rows.push(PaymentRow {
            period,
            date,
            payment: principal_part + interest,
            principal: principal_part,
            interest,
            extra: extra_part,
            balance,
            cumulative_principal,
            cumulative_interest,
        });

        if balance.is_zero() {
            break;
        }
    }

    let paid_off_at = rows.len() as u32;
    for (&p, amount) in &one_time {
        if p > paid_off_at {
            warnings.push(format!(
                "One-time payment of {amount} at period {p} falls after payoff and was not applied"
            ));
        }
    }

    if balance > Decimal::ZERO {
        let years = Decimal::from(max_periods) / Decimal::from(per_year);
        let message = format!(
            "This loan will take over {} years to repay; {} is still outstanding after {} payments",
            years.round_dp(1).normalize(),
            balance.round_dp(2),
            max_periods,
        );
        warn!(max_periods, remaining = %balance, "iteration cap reached");
        warnings.push(message.clone());
        return Ok(not_repayable(
            NotRepayableReason::ExceedsMaximumTerm { max_periods },
            message,
            rate,
            scheduled_payment,
            balance,
            rows,
        ));
    }

    let summary = summarize(&rows, rate, scheduled_payment, frequency);
    Ok(AmortizationOutcome::Repayable(AmortizationSchedule {
        payment_frequency: frequency,
        summary,
        rows,
    }))
}

fn out_of_range_outcome(
    warnings: &mut Vec<String>,
    rate: Rate,
    scheduled_payment: Money,
    principal: Money,
) -> AmortizationOutcome {
    let message = "The interest rate and term are too large to calculate; \
                   reduce the rate or shorten the term"
        .to_string();
    warn!(periodic_rate = %rate, "amortization out of numeric range");
    warnings.push(message.clone());
    AmortizationOutcome::NotRepayable(NotRepayable {
        reason: NotRepayableReason::OutOfRange,
        message,
        periodic_rate: rate,
        scheduled_payment,
        first_period_interest: principal.checked_mul(rate).unwrap_or(Decimal::MAX),
        remaining_balance: principal,
        partial_rows: Vec::new(),
    })
}

fn empty_schedule(rate: Rate, frequency: Frequency) -> AmortizationOutcome {
    AmortizationOutcome::Repayable(AmortizationSchedule {
        payment_frequency: frequency,
        summary: summarize(&[], rate, Decimal::ZERO, frequency),
        rows: Vec::new(),
    })
}

fn not_repayable(
    reason: NotRepayableReason,
    message: String,
    rate: Rate,
    scheduled_payment: Money,
    remaining_balance: Money,
    partial_rows: Vec<PaymentRow>,
) -> AmortizationOutcome {
    let opening = partial_rows
        .first()
        .map(|r| r.balance + r.principal)
        .unwrap_or(remaining_balance);
    AmortizationOutcome::NotRepayable(NotRepayable {
        reason,
        message,
        periodic_rate: rate,
        scheduled_payment,
        first_period_interest: opening * rate,
        remaining_balance,
        partial_rows,
    })
}
