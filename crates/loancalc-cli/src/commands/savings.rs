use clap::Args;
use serde_json::Value;

use loancalc_core::dates::parse_date;
use loancalc_core::frequency::{Compounding, Frequency};
use loancalc_core::input::{parse_count_or_zero, parse_money, parse_percent_or_zero};
use loancalc_core::loans::aggregate::Granularity;
use loancalc_core::savings::{
    project_savings, required_contribution, ContributionTiming, SavingsInput, SavingsTargetInput,
};

use super::{money_flag, percent_flag, required};
use crate::input;

#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SavingsArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Starting balance
    #[arg(long)]
    pub initial: Option<String>,

    /// Amount deposited each period
    #[arg(long)]
    pub contribution: Option<String>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<String>,

    #[arg(long)]
    pub years: Option<String>,

    /// Yearly contribution increase in percent
    #[arg(long)]
    pub increase: Option<String>,

    /// Balance to reach
    #[arg(long)]
    pub target: Option<String>,

    #[arg(long)]
    pub start_date: Option<String>,

    /// Deposit at the start of each period instead of the end
    #[arg(long)]
    pub beginning: bool,

    #[arg(long, default_value = "monthly")]
    pub frequency: Frequency,

    #[arg(long)]
    pub compounding: Option<Compounding>,
}

fn timing(beginning: bool) -> ContributionTiming {
    if beginning {
        ContributionTiming::Beginning
    } else {
        ContributionTiming::End
    }
}

pub fn run_savings(args: SavingsArgs, granularity: Granularity) -> Result<Value, Box<dyn std::error::Error>> {
    let savings_input = match input::read_input::<SavingsInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => SavingsInput {
            initial_balance: args.initial.as_deref().map(parse_money).unwrap_or_default(),
            contribution: money_flag(&args.contribution, "contribution")?,
            contribution_frequency: args.frequency,
            annual_rate: percent_flag(&args.rate, "rate")?,
            compounding: args.compounding,
            years: parse_count_or_zero(required(&args.years, "years")?),
            timing: timing(args.beginning),
            annual_contribution_increase: args.increase.as_deref().map(parse_percent_or_zero),
            target: args.target.as_deref().map(parse_money),
            start_date: args.start_date.as_deref().and_then(|d| parse_date(d).ok()),
        },
    };

    let result = project_savings(&savings_input)?;
    let mut value = serde_json::to_value(&result)?;
    // The yearly rollup replaces the per-period rows when asked for.
    if granularity == Granularity::Year {
        value["result"]["rows"] = serde_json::to_value(&result.result.yearly)?;
    }
    Ok(value)
}

#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SavingsTargetArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Balance to reach
    #[arg(long)]
    pub target: Option<String>,

    /// Starting balance
    #[arg(long)]
    pub initial: Option<String>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<String>,

    #[arg(long)]
    pub years: Option<String>,

    /// Deposit at the start of each period instead of the end
    #[arg(long)]
    pub beginning: bool,

    #[arg(long, default_value = "monthly")]
    pub frequency: Frequency,

    #[arg(long)]
    pub compounding: Option<Compounding>,
}

pub fn run_savings_target(args: SavingsTargetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let target_input = match input::read_input::<SavingsTargetInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => SavingsTargetInput {
            target: money_flag(&args.target, "target")?,
            initial_balance: args.initial.as_deref().map(parse_money).unwrap_or_default(),
            contribution_frequency: args.frequency,
            annual_rate: percent_flag(&args.rate, "rate")?,
            compounding: args.compounding,
            years: parse_count_or_zero(required(&args.years, "years")?),
            timing: timing(args.beginning),
        },
    };
    let result = required_contribution(&target_input)?;
    Ok(serde_json::to_value(result)?)
}
