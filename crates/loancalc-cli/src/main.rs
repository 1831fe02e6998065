mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::loans::{AffordabilityArgs, CompareExtraArgs, PaymentArgs, PayoffArgs, RefinanceArgs, ScheduleArgs};
use commands::savings::{SavingsArgs, SavingsTargetArgs};
use loancalc_core::loans::aggregate::Granularity;

/// Loan amortization and savings calculations
#[derive(Parser)]
#[command(
    name = "loancalc",
    version,
    about = "Loan amortization and savings calculations",
    long_about = "A CLI for loan and savings calculations with decimal precision. \
                  Builds amortization schedules, solves payments, payoff times and \
                  affordability, compares extra payments and refinancing, and \
                  projects savings goals."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true, env = "LOANCALC_OUTPUT")]
    output: OutputFormat,

    /// Roll schedules up by period, month or year
    #[arg(long, global = true)]
    granularity: Option<Granularity>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a full amortization schedule
    Schedule(ScheduleArgs),
    /// Solve the level payment for a loan term
    Payment(PaymentArgs),
    /// How long a fixed payment takes to repay a loan
    Payoff(PayoffArgs),
    /// How much a payment can borrow
    Affordability(AffordabilityArgs),
    /// Compare a loan with and without extra payments
    CompareExtra(CompareExtraArgs),
    /// Compare keeping a mortgage with refinancing it
    Refinance(RefinanceArgs),
    /// Project a savings balance over time
    Savings(SavingsArgs),
    /// Contribution needed to reach a savings target
    SavingsTarget(SavingsTargetArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let granularity = cli.granularity.unwrap_or_default();
    debug!(output = ?cli.output, %granularity, "dispatching command");
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::loans::run_schedule(args, granularity),
        Commands::Payment(args) => commands::loans::run_payment(args),
        Commands::Payoff(args) => commands::loans::run_payoff(args),
        Commands::Affordability(args) => commands::loans::run_affordability(args),
        Commands::CompareExtra(args) => commands::loans::run_compare_extra(args),
        Commands::Refinance(args) => commands::loans::run_refinance(args),
        Commands::Savings(args) => commands::savings::run_savings(args, granularity),
        Commands::SavingsTarget(args) => commands::savings::run_savings_target(args),
        Commands::Version => {
            println!("loancalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
