//! Savings growth: period-by-period projection of deposits and interest, and
//! the level contribution needed to reach a target balance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::dates::payment_date;
use crate::error::CalcError;
use crate::frequency::{describe_duration, periodic_rate, Compounding, Frequency};
use crate::time_value::{compound, out_of_range};
use crate::types::{non_negative, with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// When in each period the contribution lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionTiming {
    /// Annuity due: the deposit earns interest for the period it is made in.
    Beginning,
    #[default]
    End,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsInput {
    #[serde(default)]
    pub initial_balance: Money,
    pub contribution: Money,
    #[serde(default)]
    pub contribution_frequency: Frequency,
    pub annual_rate: Rate,
    /// Defaults to the contribution frequency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounding: Option<Compounding>,
    pub years: u32,
    #[serde(default)]
    pub timing: ContributionTiming,
    /// Yearly step-up of the contribution, e.g. 0.03 for 3%.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_contribution_increase: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsRow {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub contribution: Money,
    pub interest: Money,
    pub balance: Money,
    pub total_contributions: Money,
    pub total_interest: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsYear {
    pub year: u32,
    pub contributions: Money,
    pub interest: Money,
    pub ending_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProgress {
    pub target: Money,
    pub reached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reached_at_period: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reached_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_target: Option<String>,
    /// Amount still missing at the end of the horizon; zero when reached.
    pub shortfall: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsOutput {
    pub periodic_rate: Rate,
    pub number_of_contributions: u32,
    pub final_balance: Money,
    pub total_contributions: Money,
    pub total_interest: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetProgress>,
    pub yearly: Vec<SavingsYear>,
    pub rows: Vec<SavingsRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsTargetInput {
    pub target: Money,
    #[serde(default)]
    pub initial_balance: Money,
    #[serde(default)]
    pub contribution_frequency: Frequency,
    pub annual_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounding: Option<Compounding>,
    pub years: u32,
    #[serde(default)]
    pub timing: ContributionTiming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsTargetOutput {
    pub periodic_rate: Rate,
    pub number_of_contributions: u32,
    /// Level contribution per period.
    pub contribution: Money,
    pub total_contributions: Money,
    /// What the initial balance alone grows to over the horizon.
    pub initial_balance_grows_to: Money,
    pub projected_interest: Money,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn savings_rate(annual_rate: Rate, compounding: Option<Compounding>, frequency: Frequency) -> CalcResult<Rate> {
    let compounding = compounding.unwrap_or_else(|| Compounding::from(frequency));
    periodic_rate(annual_rate, compounding, frequency)
}

/// Future value of 1 per period over `n` periods.
fn contribution_factor(rate: Rate, n: u32, timing: ContributionTiming) -> CalcResult<Decimal> {
    if rate.is_zero() {
        return Ok(Decimal::from(n));
    }
    let growth = compound(rate, n).ok_or_else(|| out_of_range("years"))?;
    let factor = (growth - Decimal::ONE) / rate;
    match timing {
        ContributionTiming::Beginning => factor
            .checked_mul(Decimal::ONE + rate)
            .ok_or_else(|| out_of_range("years")),
        ContributionTiming::End => Ok(factor),
    }
}

/// Add `amount` to `total`, failing once the sum leaves the `Decimal` range.
fn accumulate(total: &mut Money, amount: Money) -> CalcResult<()> {
    *total = total.checked_add(amount).ok_or_else(|| out_of_range("years"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Project a savings balance period by period, with an optional yearly
/// contribution step-up and target check.
pub fn project_savings(input: &SavingsInput) -> CalcResult<ComputationOutput<SavingsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let initial = non_negative(input.initial_balance, "initial_balance", &mut warnings);
    let base_contribution = non_negative(input.contribution, "contribution", &mut warnings);
    let increase = non_negative(
        input.annual_contribution_increase.unwrap_or(Decimal::ZERO),
        "annual_contribution_increase",
        &mut warnings,
    );
    if input.annual_rate < Decimal::ZERO {
        warnings.push("Negative interest rate treated as 0".into());
    }
    if input.years == 0 {
        warnings.push("Zero-year horizon: balance is the initial deposit".into());
    }

    let frequency = input.contribution_frequency;
    let per_year = frequency.periods_per_year();
    let rate = savings_rate(input.annual_rate, input.compounding, frequency)?;

    let mut balance = initial;
    let mut total_contributions = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut rows: Vec<SavingsRow> = Vec::new();
    let mut yearly: Vec<SavingsYear> = Vec::new();
    let mut reached_at: Option<u32> = None;

    for year in 0..input.years {
        let contribution = compound(increase, year)
            .and_then(|step| base_contribution.checked_mul(step))
            .ok_or_else(|| out_of_range("annual_contribution_increase"))?;
        let mut year_contributions = Decimal::ZERO;
        let mut year_interest = Decimal::ZERO;

        for p in 1..=per_year {
            let period = year * per_year + p;
            if input.timing == ContributionTiming::Beginning {
                accumulate(&mut balance, contribution)?;
            }
            let interest = balance.checked_mul(rate).ok_or_else(|| out_of_range("years"))?;
            accumulate(&mut balance, interest)?;
            if input.timing == ContributionTiming::End {
                accumulate(&mut balance, contribution)?;
            }

            accumulate(&mut year_contributions, contribution)?;
            accumulate(&mut year_interest, interest)?;
            accumulate(&mut total_contributions, contribution)?;
            accumulate(&mut total_interest, interest)?;

            if reached_at.is_none() && input.target.is_some_and(|t| balance >= t) {
                reached_at = Some(period);
            }

            let date = match input.start_date {
                Some(d) => Some(payment_date(d, frequency, period)?),
                None => None,
            };

            rows.push(SavingsRow {
                period,
                date,
                contribution,
                interest,
                balance,
                total_contributions,
                total_interest,
            });
        }

        yearly.push(SavingsYear {
            year: year + 1,
            contributions: year_contributions,
            interest: year_interest,
            ending_balance: balance,
        });
    }

    let target = match input.target {
        Some(goal) => {
            // A starting balance already at the goal counts as reached at period 0.
            let reached_at = if initial >= goal { Some(0) } else { reached_at };
            let reached_date = match (reached_at, input.start_date) {
                (Some(0), Some(d)) => Some(d),
                (Some(p), Some(d)) => Some(payment_date(d, frequency, p)?),
                _ => None,
            };
            if reached_at.is_none() {
                warnings.push(format!("Target of {goal} is not reached within {} years", input.years));
            }
            Some(TargetProgress {
                target: goal,
                reached: reached_at.is_some(),
                reached_at_period: reached_at,
                reached_date,
                time_to_target: reached_at.map(|p| describe_duration(p, frequency)),
                shortfall: (goal - balance).max(Decimal::ZERO),
            })
        }
        None => None,
    };

    debug!(
        periods = rows.len(),
        final_balance = %balance,
        "savings projected"
    );

    let output = SavingsOutput {
        periodic_rate: rate,
        number_of_contributions: rows.len() as u32,
        final_balance: balance,
        total_contributions,
        total_interest,
        target,
        yearly,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Savings projection (periodic compounding, level or stepped contributions)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Level contribution that grows `initial_balance` to `target` in `years`.
pub fn required_contribution(input: &SavingsTargetInput) -> CalcResult<ComputationOutput<SavingsTargetOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.years == 0 {
        return Err(CalcError::InvalidInput {
            field: "years".into(),
            reason: "Savings horizon must be at least one year".into(),
        });
    }
    let target = non_negative(input.target, "target", &mut warnings);
    let initial = non_negative(input.initial_balance, "initial_balance", &mut warnings);

    let frequency = input.contribution_frequency;
    let n = input.years.saturating_mul(frequency.periods_per_year());
    let rate = savings_rate(input.annual_rate, input.compounding, frequency)?;

    let grown = compound(rate, n)
        .and_then(|growth| initial.checked_mul(growth))
        .ok_or_else(|| out_of_range("years"))?;
    let contribution = if grown >= target {
        warnings.push("The initial balance alone reaches the target; no contributions needed".into());
        Decimal::ZERO
    } else {
        let factor = contribution_factor(rate, n, input.timing)?;
        if factor.is_zero() {
            return Err(CalcError::DivisionByZero {
                context: "savings contribution factor".into(),
            });
        }
        (target - grown) / factor
    };

    let total_contributions = contribution
        .checked_mul(Decimal::from(n))
        .ok_or_else(|| out_of_range("target"))?;
    let final_balance = grown.max(target);
    let projected_interest = final_balance - initial - total_contributions;

    let output = SavingsTargetOutput {
        periodic_rate: rate,
        number_of_contributions: n,
        contribution,
        total_contributions,
        initial_balance_grows_to: grown,
        projected_interest,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Required contribution (future value of an annuity, solved for payment)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
