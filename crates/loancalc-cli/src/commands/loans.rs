use clap::Args;
use serde_json::Value;

use loancalc_core::frequency::{Compounding, Frequency};
use loancalc_core::input::{parse_count_or_zero, parse_money};
use loancalc_core::loans::aggregate::{aggregate, Granularity};
use loancalc_core::loans::chart::{cost_breakdown, schedule_series};
use loancalc_core::loans::compare::compare_extra_payments;
use loancalc_core::loans::form::LoanForm;
use loancalc_core::loans::refinance::{analyze_refinance, RefinanceInput};
use loancalc_core::loans::solve::{
    solve_affordable_principal, solve_payment, solve_payoff_time, AffordabilityInput, PaymentSolveInput,
    PayoffSolveInput,
};
use loancalc_core::loans::{amortize, LoanInput, LoanTerm};

use super::{money_flag, percent_flag, required, term_months};
use crate::input;

/// Loan parameters shared by `schedule` and `compare-extra`
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed, e.g. "25,000"
    #[arg(long)]
    pub principal: Option<String>,

    /// Annual interest rate in percent, e.g. "6.5"
    #[arg(long)]
    pub rate: Option<String>,

    /// Term in years
    #[arg(long)]
    pub years: Option<String>,

    /// Term in months (added to --years)
    #[arg(long)]
    pub months: Option<String>,

    /// Pay this fixed amount until the loan is repaid instead of a term
    #[arg(long)]
    pub payment: Option<String>,

    /// Extra principal paid with every payment
    #[arg(long)]
    pub extra: Option<String>,

    /// One-time lump sum
    #[arg(long)]
    pub lump_sum: Option<String>,

    /// Payment number the lump sum is paid with
    #[arg(long, default_value = "1")]
    pub lump_sum_period: String,

    /// Balance left to pay with the last scheduled payment
    #[arg(long)]
    pub balloon: Option<String>,

    /// Loan start date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Payment frequency
    #[arg(long, default_value = "monthly")]
    pub frequency: Frequency,

    /// Compounding frequency (defaults to the payment frequency)
    #[arg(long)]
    pub compounding: Option<Compounding>,

    /// Iteration cap override
    #[arg(long)]
    pub max_periods: Option<u32>,
}

impl LoanArgs {
    fn to_input(&self) -> Result<LoanInput, Box<dyn std::error::Error>> {
        if let Some(loan) = input::read_input::<LoanInput>(self.input.as_deref())? {
            return Ok(loan);
        }

        required(&self.principal, "principal")?;
        required(&self.rate, "rate")?;
        if self.payment.is_none() {
            term_months(&self.years, &self.months)?;
        }

        let form = LoanForm {
            principal: self.principal.clone().unwrap_or_default(),
            annual_rate: self.rate.clone().unwrap_or_default(),
            term_years: self.years.clone().unwrap_or_default(),
            term_months: self.months.clone().unwrap_or_default(),
            payment: self.payment.clone().unwrap_or_default(),
            extra_payment: self.extra.clone().unwrap_or_default(),
            one_time_payment: self.lump_sum.clone().unwrap_or_default(),
            one_time_period: self.lump_sum_period.clone(),
            balloon: self.balloon.clone().unwrap_or_default(),
            start_date: self.start_date.clone().unwrap_or_default(),
            payment_frequency: self.frequency,
            compounding: self.compounding,
        };
        let mut loan = form.to_input();
        loan.max_periods = self.max_periods;
        Ok(loan)
    }
}

#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Include chart series (balance, principal and interest over time)
    #[arg(long)]
    pub chart: bool,
}

pub fn run_schedule(args: ScheduleArgs, granularity: Granularity) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = args.loan.to_input()?;
    let output = amortize(&loan)?;
    let mut value = serde_json::to_value(&output)?;

    if let Some(schedule) = output.result.schedule() {
        if granularity != Granularity::Period {
            let grouped = aggregate(&schedule.rows, schedule.payment_frequency, granularity);
            value["result"]["rows"] = serde_json::to_value(grouped)?;
        }
        if args.chart {
            let chart_granularity = match granularity {
                Granularity::Period => Granularity::Year,
                other => other,
            };
            value["result"]["chart"] = serde_json::json!({
                "series": schedule_series(&schedule.rows, schedule.payment_frequency, chart_granularity),
                "breakdown": cost_breakdown(&schedule.summary),
            });
        }
    }

    Ok(value)
}

#[derive(Args)]
pub struct CompareExtraArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

pub fn run_compare_extra(args: CompareExtraArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = args.loan.to_input()?;
    let result = compare_extra_payments(&loan)?;
    Ok(serde_json::to_value(result)?)
}

#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PaymentArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub principal: Option<String>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<String>,

    #[arg(long)]
    pub years: Option<String>,

    #[arg(long)]
    pub months: Option<String>,

    #[arg(long)]
    pub balloon: Option<String>,

    #[arg(long, default_value = "monthly")]
    pub frequency: Frequency,

    #[arg(long)]
    pub compounding: Option<Compounding>,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let solve_input = match input::read_input::<PaymentSolveInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => PaymentSolveInput {
            principal: money_flag(&args.principal, "principal")?,
            annual_rate: percent_flag(&args.rate, "rate")?,
            compounding: args.compounding,
            payment_frequency: args.frequency,
            term: LoanTerm::Months(term_months(&args.years, &args.months)?),
            balloon: args.balloon.as_deref().map(parse_money),
        },
    };
    let result = solve_payment(&solve_input)?;
    Ok(serde_json::to_value(result)?)
}

#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PayoffArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub principal: Option<String>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<String>,

    /// Amount paid each period
    #[arg(long)]
    pub payment: Option<String>,

    #[arg(long, default_value = "monthly")]
    pub frequency: Frequency,

    #[arg(long)]
    pub compounding: Option<Compounding>,
}

pub fn run_payoff(args: PayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input = match input::read_input::<PayoffSolveInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => PayoffSolveInput {
            principal: money_flag(&args.principal, "principal")?,
            annual_rate: percent_flag(&args.rate, "rate")?,
            compounding: args.compounding,
            payment_frequency: args.frequency,
            payment: money_flag(&args.payment, "payment")?,
        },
    };
    let result = solve_payoff_time(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}

#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AffordabilityArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Payment the borrower can afford each period
    #[arg(long)]
    pub payment: Option<String>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<String>,

    #[arg(long)]
    pub years: Option<String>,

    #[arg(long)]
    pub months: Option<String>,

    #[arg(long)]
    pub down_payment: Option<String>,

    #[arg(long, default_value = "monthly")]
    pub frequency: Frequency,

    #[arg(long)]
    pub compounding: Option<Compounding>,
}

pub fn run_affordability(args: AffordabilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let afford_input = match input::read_input::<AffordabilityInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => AffordabilityInput {
            payment: money_flag(&args.payment, "payment")?,
            annual_rate: percent_flag(&args.rate, "rate")?,
            compounding: args.compounding,
            payment_frequency: args.frequency,
            term: LoanTerm::Months(term_months(&args.years, &args.months)?),
            down_payment: args.down_payment.as_deref().map(parse_money),
        },
    };
    let result = solve_affordable_principal(&afford_input)?;
    Ok(serde_json::to_value(result)?)
}

#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RefinanceArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Current outstanding balance
    #[arg(long)]
    pub balance: Option<String>,

    /// Current annual rate in percent
    #[arg(long)]
    pub current_rate: Option<String>,

    /// Months left on the current loan
    #[arg(long)]
    pub remaining_months: Option<String>,

    /// New annual rate in percent
    #[arg(long)]
    pub new_rate: Option<String>,

    /// Term of the new loan in months
    #[arg(long)]
    pub new_term_months: Option<String>,

    #[arg(long)]
    pub closing_costs: Option<String>,

    /// Roll the closing costs into the new loan
    #[arg(long)]
    pub finance_closing_costs: bool,

    /// Cash taken out on top of the current balance
    #[arg(long)]
    pub cash_out: Option<String>,
}

pub fn run_refinance(args: RefinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let refi_input = match input::read_input::<RefinanceInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => RefinanceInput {
            current_balance: money_flag(&args.balance, "balance")?,
            current_rate: percent_flag(&args.current_rate, "current-rate")?,
            remaining_months: parse_count_or_zero(required(&args.remaining_months, "remaining-months")?),
            new_rate: percent_flag(&args.new_rate, "new-rate")?,
            new_term_months: parse_count_or_zero(required(&args.new_term_months, "new-term-months")?),
            closing_costs: args.closing_costs.as_deref().map(parse_money).unwrap_or_default(),
            finance_closing_costs: args.finance_closing_costs,
            cash_out: args.cash_out.as_deref().map(parse_money),
        },
    };
    let result = analyze_refinance(&refi_input)?;
    Ok(serde_json::to_value(result)?)
}
