//! Payment dates computed directly from the start date and period index.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::CalcError;
use crate::frequency::Frequency;
use crate::CalcResult;

/// Date of the `period`-th payment (1-based) for a loan that starts on `start`.
///
/// Month-based frequencies clamp to the last day of shorter months, so a
/// loan starting on 31 January pays on 28/29 February and 31 March. Period
/// 0 is the start date itself.
pub fn payment_date(start: NaiveDate, frequency: Frequency, period: u32) -> CalcResult<NaiveDate> {
    let overflow = || CalcError::DateError(format!("payment {period} after {start} is out of range"));

    let date = match frequency {
        Frequency::Daily => start.checked_add_days(Days::new(u64::from(period))),
        Frequency::Weekly => start.checked_add_days(Days::new(7 * u64::from(period))),
        Frequency::BiWeekly => start.checked_add_days(Days::new(14 * u64::from(period))),
        Frequency::SemiMonthly => {
            let base = start.checked_add_months(Months::new(period / 2));
            if period % 2 == 1 {
                base.and_then(|d| d.checked_add_days(Days::new(15)))
            } else {
                base
            }
        }
        Frequency::Monthly => start.checked_add_months(Months::new(period)),
        Frequency::Quarterly => period
            .checked_mul(3)
            .and_then(|m| start.checked_add_months(Months::new(m))),
        Frequency::SemiAnnually => period
            .checked_mul(6)
            .and_then(|m| start.checked_add_months(Months::new(m))),
        Frequency::Annually => period
            .checked_mul(12)
            .and_then(|m| start.checked_add_months(Months::new(m))),
    };

    date.ok_or_else(overflow)
}

/// Calendar (year, month) key used when grouping dated rows.
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> CalcResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| CalcError::DateError(format!("'{s}' is not a YYYY-MM-DD date: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_monthly_dates_clamp_to_month_end() {
        let start = d(2024, 1, 31);
        assert_eq!(payment_date(start, Frequency::Monthly, 1).unwrap(), d(2024, 2, 29));
        // Computed from the start date, not from the clamped February date.
        assert_eq!(payment_date(start, Frequency::Monthly, 2).unwrap(), d(2024, 3, 31));
    }

    #[test]
    fn test_weekly_and_biweekly() {
        let start = d(2024, 1, 1);
        assert_eq!(payment_date(start, Frequency::Weekly, 2).unwrap(), d(2024, 1, 15));
        assert_eq!(payment_date(start, Frequency::BiWeekly, 2).unwrap(), d(2024, 1, 29));
    }

    #[test]
    fn test_semi_monthly_alternates() {
        let start = d(2024, 1, 1);
        assert_eq!(payment_date(start, Frequency::SemiMonthly, 1).unwrap(), d(2024, 1, 16));
        assert_eq!(payment_date(start, Frequency::SemiMonthly, 2).unwrap(), d(2024, 2, 1));
        assert_eq!(payment_date(start, Frequency::SemiMonthly, 3).unwrap(), d(2024, 2, 16));
    }

    #[test]
    fn test_period_zero_is_start() {
        let start = d(2024, 6, 15);
        for f in Frequency::ALL {
            assert_eq!(payment_date(start, f, 0).unwrap(), start);
        }
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let start = d(2025, 3, 10);
        let first = payment_date(start, Frequency::Quarterly, 4).unwrap();
        let again = payment_date(start, Frequency::Quarterly, 4).unwrap();
        assert_eq!(first, again);
        assert_eq!(first, d(2026, 3, 10));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let start = NaiveDate::MAX;
        assert!(payment_date(start, Frequency::Annually, 1).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-29").unwrap(), d(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_err());
    }
}
