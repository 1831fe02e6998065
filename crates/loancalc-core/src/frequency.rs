//! Payment and compounding frequencies, and the conversion of a nominal
//! annual rate into the rate that applies to a single payment period.
//!
//! When payments and compounding share a frequency the periodic rate is
//! simply `r / m`. Otherwise the actuarial equivalent rate is used:
//!
//! ```text
//! i = (1 + r/m)^(m/n) - 1      (periodic compounding, m per year)
//! i = e^(r/n) - 1              (continuous compounding)
//! ```
//!
//! where `n` is the number of payments per year. The same convention is
//! applied by every calculator in the crate.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::time_value::{compound, out_of_range};
use crate::types::Rate;
use crate::CalcResult;

/// How often a payment (or contribution) is made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    #[serde(alias = "biweekly")]
    BiWeekly,
    #[serde(alias = "semimonthly")]
    SemiMonthly,
    #[default]
    Monthly,
    Quarterly,
    #[serde(alias = "semiannually")]
    SemiAnnually,
    Annually,
}

impl Frequency {
    pub const ALL: [Frequency; 8] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::BiWeekly,
        Frequency::SemiMonthly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::SemiAnnually,
        Frequency::Annually,
    ];

    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Daily => 365,
            Frequency::Weekly => 52,
            Frequency::BiWeekly => 26,
            Frequency::SemiMonthly => 24,
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::SemiAnnually => 2,
            Frequency::Annually => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::BiWeekly => "bi-weekly",
            Frequency::SemiMonthly => "semi-monthly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::SemiAnnually => "semi-annually",
            Frequency::Annually => "annually",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        Frequency::ALL
            .into_iter()
            .find(|f| normalize_key(f.label()) == key)
            .ok_or_else(|| format!("unknown frequency '{s}'"))
    }
}

/// How often interest is compounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compounding {
    Daily,
    Weekly,
    #[serde(alias = "biweekly")]
    BiWeekly,
    #[serde(alias = "semimonthly")]
    SemiMonthly,
    #[default]
    Monthly,
    Quarterly,
    #[serde(alias = "semiannually")]
    SemiAnnually,
    Annually,
    Continuous,
}

impl Compounding {
    /// Compounding periods per year; `None` for continuous compounding.
    pub fn periods_per_year(self) -> Option<u32> {
        self.as_frequency().map(Frequency::periods_per_year)
    }

    fn as_frequency(self) -> Option<Frequency> {
        match self {
            Compounding::Daily => Some(Frequency::Daily),
            Compounding::Weekly => Some(Frequency::Weekly),
            Compounding::BiWeekly => Some(Frequency::BiWeekly),
            Compounding::SemiMonthly => Some(Frequency::SemiMonthly),
            Compounding::Monthly => Some(Frequency::Monthly),
            Compounding::Quarterly => Some(Frequency::Quarterly),
            Compounding::SemiAnnually => Some(Frequency::SemiAnnually),
            Compounding::Annually => Some(Frequency::Annually),
            Compounding::Continuous => None,
        }
    }
}

impl From<Frequency> for Compounding {
    fn from(f: Frequency) -> Self {
        match f {
            Frequency::Daily => Compounding::Daily,
            Frequency::Weekly => Compounding::Weekly,
            Frequency::BiWeekly => Compounding::BiWeekly,
            Frequency::SemiMonthly => Compounding::SemiMonthly,
            Frequency::Monthly => Compounding::Monthly,
            Frequency::Quarterly => Compounding::Quarterly,
            Frequency::SemiAnnually => Compounding::SemiAnnually,
            Frequency::Annually => Compounding::Annually,
        }
    }
}

impl fmt::Display for Compounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_frequency() {
            Some(freq) => f.write_str(freq.label()),
            None => f.write_str("continuous"),
        }
    }
}

impl FromStr for Compounding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if normalize_key(s) == "continuous" {
            return Ok(Compounding::Continuous);
        }
        s.parse::<Frequency>()
            .map(Compounding::from)
            .map_err(|_| format!("unknown compounding '{s}'"))
    }
}

fn normalize_key(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Human-readable duration of `periods` payments, e.g. "29 years 4 months".
pub fn describe_duration(periods: u32, frequency: Frequency) -> String {
    let per_year = frequency.periods_per_year();
    let total_months = (u64::from(periods) * 12).div_ceil(u64::from(per_year));
    let years = total_months / 12;
    let months = total_months % 12;

    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };

    match (years, months) {
        (0, 0) => "0 months".to_string(),
        (0, m) => plural(m, "month"),
        (y, 0) => plural(y, "year"),
        (y, m) => format!("{} {}", plural(y, "year"), plural(m, "month")),
    }
}

/// Rate applied to the balance once per payment period.
///
/// `annual_rate` is nominal (0.06 = 6% APR). Negative rates are treated as 0.
/// Fails only when the equivalent rate outgrows the `Decimal` range.
pub fn periodic_rate(annual_rate: Rate, compounding: Compounding, payment: Frequency) -> CalcResult<Rate> {
    if annual_rate <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let n = payment.periods_per_year();

    let m = match compounding.periods_per_year() {
        Some(m) => m,
        None => {
            let per_period = annual_rate / Decimal::from(n);
            return per_period
                .checked_exp()
                .map(|growth| growth - Decimal::ONE)
                .ok_or_else(|| out_of_range("annual_rate"));
        }
    };

    let rate_per_compounding = annual_rate / Decimal::from(m);
    if m == n {
        return Ok(rate_per_compounding);
    }
    // Whole number of compounding periods per payment: exact multiplication.
    let growth = if m % n == 0 {
        compound(rate_per_compounding, m / n)
    } else {
        let exponent = Decimal::from(m) / Decimal::from(n);
        (Decimal::ONE + rate_per_compounding).checked_powd(exponent)
    };
    growth
        .map(|g| g - Decimal::ONE)
        .ok_or_else(|| out_of_range("annual_rate"))
}

/// Effective annual rate implied by a nominal rate and compounding.
pub fn effective_annual_rate(annual_rate: Rate, compounding: Compounding) -> CalcResult<Rate> {
    periodic_rate(annual_rate, compounding, Frequency::Annually)
}
