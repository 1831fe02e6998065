//! Yearly and monthly rollups of a payment schedule for table and chart views.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dates::year_month;
use crate::frequency::Frequency;
use crate::loans::engine::PaymentRow;
use crate::types::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One entry per payment.
    #[default]
    Period,
    Month,
    Year,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "period" | "payment" => Ok(Granularity::Period),
            "month" | "monthly" => Ok(Granularity::Month),
            "year" | "yearly" | "annual" => Ok(Granularity::Year),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Period => f.write_str("period"),
            Granularity::Month => f.write_str("month"),
            Granularity::Year => f.write_str("year"),
        }
    }
}

/// Sums over a group of consecutive payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPeriod {
    /// "2026", "2026-03", "Year 2", "Month 14" or "Payment 7".
    pub label: String,
    pub first_period: u32,
    pub last_period: u32,
    pub payments: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub extra: Money,
    pub ending_balance: Money,
    pub cumulative_principal: Money,
    pub cumulative_interest: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GroupKey {
    Calendar(i32, Option<u32>),
    LoanIndex(u32),
}

fn group_key(row: &PaymentRow, frequency: Frequency, granularity: Granularity) -> GroupKey {
    let per_year = frequency.periods_per_year();
    match (granularity, row.date) {
        (Granularity::Period, _) => GroupKey::LoanIndex(row.period),
        (Granularity::Year, Some(date)) => GroupKey::Calendar(date.year(), None),
        (Granularity::Month, Some(date)) => {
            let (y, m) = year_month(date);
            GroupKey::Calendar(y, Some(m))
        }
        // Period 0 only arrives from hand-built rows; it joins the first group.
        (Granularity::Year, None) => GroupKey::LoanIndex(row.period.saturating_sub(1) / per_year + 1),
        (Granularity::Month, None) => {
            let months = u64::from(row.period.saturating_sub(1)) * 12 / u64::from(per_year);
            GroupKey::LoanIndex(months as u32 + 1)
        }
    }
}

fn label_for(key: &GroupKey, granularity: Granularity) -> String {
    match (key, granularity) {
        (GroupKey::Calendar(y, Some(m)), _) => format!("{y}-{m:02}"),
        (GroupKey::Calendar(y, None), _) => y.to_string(),
        (GroupKey::LoanIndex(i), Granularity::Year) => format!("Year {i}"),
        (GroupKey::LoanIndex(i), Granularity::Month) => format!("Month {i}"),
        (GroupKey::LoanIndex(i), Granularity::Period) => format!("Payment {i}"),
    }
}

/// Group consecutive rows by calendar year/month (dated schedules) or by
/// loan year/month (undated), carrying forward the period-end balance.
pub fn aggregate(rows: &[PaymentRow], frequency: Frequency, granularity: Granularity) -> Vec<AggregatedPeriod> {
    let mut out: Vec<AggregatedPeriod> = Vec::new();
    let mut current: Option<GroupKey> = None;

    for row in rows {
        let key = group_key(row, frequency, granularity);
        let same_group = current.as_ref() == Some(&key);

        if !same_group {
            out.push(AggregatedPeriod {
                label: label_for(&key, granularity),
                first_period: row.period,
                last_period: row.period,
                payments: 0,
                payment: Decimal::ZERO,
                principal: Decimal::ZERO,
                interest: Decimal::ZERO,
                extra: Decimal::ZERO,
                ending_balance: row.balance,
                cumulative_principal: row.cumulative_principal,
                cumulative_interest: row.cumulative_interest,
            });
            current = Some(key);
        }

        if let Some(group) = out.last_mut() {
            group.last_period = row.period;
            group.payments += 1;
            group.payment += row.payment;
            group.principal += row.principal;
            group.interest += row.interest;
            group.extra += row.extra;
            group.ending_balance = row.balance;
            group.cumulative_principal = row.cumulative_principal;
            group.cumulative_interest = row.cumulative_interest;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loans::engine::{amortize, LoanInput, LoanTerm};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn schedule(start: Option<NaiveDate>, frequency: Frequency) -> Vec<PaymentRow> {
        let mut input = LoanInput::term_loan(dec!(12000), dec!(0.06), frequency, LoanTerm::Years(3));
        input.start_date = start;
        amortize(&input).unwrap().result.rows().to_vec()
    }

    #[test]
    fn test_loan_years_undated() {
        let rows = schedule(None, Frequency::Monthly);
        let years = aggregate(&rows, Frequency::Monthly, Granularity::Year);
        assert_eq!(years.len(), 3);
        assert_eq!(years[0].label, "Year 1");
        assert!(years.iter().all(|y| y.payments == 12));
        assert_eq!(years[2].ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_sums_match_rows() {
        let rows = schedule(None, Frequency::Monthly);
        let years = aggregate(&rows, Frequency::Monthly, Granularity::Year);
        let total_interest: Decimal = years.iter().map(|y| y.interest).sum();
        let row_interest: Decimal = rows.iter().map(|r| r.interest).sum();
        assert!((total_interest - row_interest).abs() < dec!(0.0000001));
        assert_eq!(
            years.last().unwrap().cumulative_interest,
            rows.last().unwrap().cumulative_interest
        );
    }

    #[test]
    fn test_calendar_years_dated() {
        // Starts in October: first calendar year holds 2 payments (Nov, Dec).
        let rows = schedule(NaiveDate::from_ymd_opt(2024, 10, 1), Frequency::Monthly);
        let years = aggregate(&rows, Frequency::Monthly, Granularity::Year);
        assert_eq!(years[0].label, "2024");
        assert_eq!(years[0].payments, 2);
        assert_eq!(years.len(), 4);
        assert_eq!(years.last().unwrap().label, "2027");
        assert_eq!(years.last().unwrap().payments, 10);
    }

    #[test]
    fn test_weekly_rolls_up_to_months() {
        let rows = schedule(None, Frequency::Weekly);
        let months = aggregate(&rows, Frequency::Weekly, Granularity::Month);
        assert_eq!(months.len(), 36);
        let counted: u32 = months.iter().map(|m| m.payments).sum();
        assert_eq!(counted, 156);
    }

    #[test]
    fn test_dated_months_label() {
        let rows = schedule(NaiveDate::from_ymd_opt(2025, 1, 1), Frequency::BiWeekly);
        let months = aggregate(&rows, Frequency::BiWeekly, Granularity::Month);
        assert_eq!(months[0].label, "2025-01");
        assert_eq!(months[0].payments, 2);
    }

    #[test]
    fn test_period_granularity_is_identity() {
        let rows = schedule(None, Frequency::Quarterly);
        let periods = aggregate(&rows, Frequency::Quarterly, Granularity::Period);
        assert_eq!(periods.len(), rows.len());
        assert_eq!(periods[3].label, "Payment 4");
    }

    #[test]
    fn test_period_zero_joins_first_group() {
        let mut rows = schedule(None, Frequency::Monthly);
        rows[0].period = 0;
        let years = aggregate(&rows, Frequency::Monthly, Granularity::Year);
        assert_eq!(years[0].label, "Year 1");
        assert_eq!(years[0].first_period, 0);
        assert_eq!(years[0].payments, 12);
        let months = aggregate(&rows[..2], Frequency::Monthly, Granularity::Month);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].label, "Month 1");
    }

    #[test]
    fn test_empty_schedule() {
        assert!(aggregate(&[], Frequency::Monthly, Granularity::Year).is_empty());
    }
}
