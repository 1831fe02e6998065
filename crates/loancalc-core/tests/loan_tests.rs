use chrono::NaiveDate;
use loancalc_core::frequency::{Compounding, Frequency};
use loancalc_core::loans::aggregate::{aggregate, Granularity};
use loancalc_core::loans::compare::compare_extra_payments;
use loancalc_core::loans::form::LoanForm;
use loancalc_core::loans::solve::{solve_payment, solve_payoff_time, PaymentSolveInput, PayoffEstimate, PayoffSolveInput};
use loancalc_core::loans::{
    amortize, AmortizationOutcome, AmortizationSchedule, LoanInput, LoanTerm, NotRepayableReason, OneTimePayment,
    PaymentPlan,
};
use loancalc_core::time_value::{annuity_payment, compound};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
    (a - b).abs() < eps
}

fn repayable(input: &LoanInput) -> AmortizationSchedule {
    match amortize(input).unwrap().result {
        AmortizationOutcome::Repayable(s) => s,
        AmortizationOutcome::NotRepayable(n) => panic!("expected repayable, got {}", n.message),
    }
}

fn car_loan() -> LoanInput {
    LoanInput::term_loan(dec!(25000), dec!(0.065), Frequency::Monthly, LoanTerm::Years(5))
}

fn mortgage() -> LoanInput {
    LoanInput::term_loan(dec!(250000), dec!(0.045), Frequency::Monthly, LoanTerm::Years(30))
}

// ===========================================================================
// Schedule properties
// ===========================================================================

#[test]
fn test_principal_is_conserved() {
    for input in [car_loan(), mortgage()] {
        let sched = repayable(&input);
        let repaid: Decimal = sched.rows.iter().map(|r| r.principal).sum();
        assert!(
            approx_eq(repaid, input.principal, dec!(0.000001)),
            "repaid {repaid} of {}",
            input.principal
        );
    }
}

#[test]
fn test_balance_never_increases_and_ends_at_zero() {
    let mut input = mortgage();
    input.extra_payment = Some(dec!(150));
    let sched = repayable(&input);
    assert!(sched.rows.windows(2).all(|w| w[1].balance <= w[0].balance));
    assert_eq!(sched.rows.last().unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_totals_reconcile() {
    let mut input = car_loan();
    input.one_time_payments.push(OneTimePayment {
        period: Some(12),
        date: None,
        amount: dec!(2000),
    });
    let s = repayable(&input).summary;
    assert!(approx_eq(
        s.total_paid,
        s.total_principal + s.total_interest,
        dec!(0.000001)
    ));
    assert!(approx_eq(s.total_principal, dec!(25000), dec!(0.000001)));
}

#[test]
fn test_every_row_is_consistent() {
    let mut input = mortgage();
    input.extra_payment = Some(dec!(175));
    input.one_time_payments = vec![
        OneTimePayment {
            period: Some(24),
            date: None,
            amount: dec!(10000),
        },
        OneTimePayment {
            period: Some(90),
            date: None,
            amount: dec!(5000),
        },
    ];
    let sched = repayable(&input);

    let mut principal_so_far = Decimal::ZERO;
    let mut interest_so_far = Decimal::ZERO;
    for (idx, row) in sched.rows.iter().enumerate() {
        assert_eq!(row.period as usize, idx + 1);
        assert!(
            approx_eq(row.payment, row.principal + row.interest, dec!(0.000001)),
            "period {}: {} != {} + {}",
            row.period,
            row.payment,
            row.principal,
            row.interest
        );
        assert!(row.principal >= Decimal::ZERO && row.interest >= Decimal::ZERO);
        assert!(row.extra <= row.principal);

        principal_so_far += row.principal;
        interest_so_far += row.interest;
        assert!(approx_eq(row.cumulative_principal, principal_so_far, dec!(0.000001)));
        assert!(approx_eq(row.cumulative_interest, interest_so_far, dec!(0.000001)));
    }
    assert!(sched
        .rows
        .windows(2)
        .all(|w| w[1].cumulative_principal >= w[0].cumulative_principal
            && w[1].cumulative_interest >= w[0].cumulative_interest));
    assert!(sched.rows[23].extra >= dec!(10000));
    assert_eq!(sched.rows.last().unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_closed_form_matches_simulation() {
    for frequency in [Frequency::Monthly, Frequency::BiWeekly, Frequency::Quarterly] {
        let input = LoanInput::term_loan(dec!(40000), dec!(0.07), frequency, LoanTerm::Years(6));
        let sched = repayable(&input);
        let n = frequency.periods_per_year() * 6;
        let expected = annuity_payment(sched.summary.periodic_rate, n, dec!(40000), Decimal::ZERO).unwrap();
        assert_eq!(sched.summary.scheduled_payment, expected);
        assert_eq!(sched.rows.len() as u32, n);
        // Every full payment equals the scheduled amount.
        assert!(sched.rows[..sched.rows.len() - 1]
            .iter()
            .all(|r| approx_eq(r.payment, expected, dec!(0.0000001))));
    }
}

#[test]
fn test_amortize_is_idempotent() {
    let mut input = mortgage();
    input.extra_payment = Some(dec!(100));
    input.start_date = NaiveDate::from_ymd_opt(2025, 3, 1);
    let first = amortize(&input).unwrap();
    let second = amortize(&input).unwrap();
    assert_eq!(first.result, second.result);
    assert_eq!(first.warnings, second.warnings);
}

// ===========================================================================
// Worked scenarios
// ===========================================================================

#[test]
fn test_car_loan_scenario() {
    let s = repayable(&car_loan()).summary;
    assert_eq!(s.scheduled_payment.round_dp(2), dec!(489.15));
    assert_eq!(s.total_interest.round_dp(2), dec!(4349.22));
    assert_eq!(s.number_of_payments, 60);
    assert_eq!(s.time_to_payoff, "5 years");
}

#[test]
fn test_mortgage_with_extra_payment_scenario() {
    let mut input = mortgage();
    input.extra_payment = Some(dec!(200));
    let out = compare_extra_payments(&input).unwrap().result;
    let saved = out.interest_saved.unwrap();
    assert!(saved > dec!(55000) && saved < dec!(58000), "interest saved {saved}");
    let payments_saved = out.payments_saved.unwrap();
    assert!((80..=95).contains(&payments_saved), "payments saved {payments_saved}");
}

#[test]
fn test_biweekly_payments_under_monthly_compounding() {
    let mut input = LoanInput::term_loan(dec!(20000), dec!(0.06), Frequency::BiWeekly, LoanTerm::Years(3));
    input.compounding = Some(Compounding::Monthly);
    let out = amortize(&input).unwrap();
    assert!(out.warnings.iter().any(|w| w.contains("equivalent periodic rate")));
    let sched = out.result.schedule().unwrap();
    assert_eq!(sched.rows.len(), 78);
    // 26 periods at the equivalent rate compound to the monthly effective annual rate.
    let annual = compound(sched.summary.periodic_rate, 26).unwrap() - Decimal::ONE;
    let monthly_effective = compound(dec!(0.005), 12).unwrap() - Decimal::ONE;
    assert!(approx_eq(annual, monthly_effective, dec!(0.000001)));
}

// ===========================================================================
// Not repayable
// ===========================================================================

#[test]
fn test_payment_below_interest_is_not_repayable() {
    let mut input = LoanInput::term_loan(dec!(10000), dec!(0.05), Frequency::Monthly, LoanTerm::Years(1));
    input.plan = PaymentPlan::FixedPayment(dec!(40));
    match amortize(&input).unwrap().result {
        AmortizationOutcome::NotRepayable(n) => {
            assert_eq!(n.reason, NotRepayableReason::PaymentBelowInterest);
            assert!(n.partial_rows.is_empty());
            assert_eq!(n.first_period_interest.round_dp(2), dec!(41.67));
        }
        other => panic!("expected not repayable, got {other:?}"),
    }
}

#[test]
fn test_barely_covering_payment_exceeds_cap() {
    let mut input = LoanInput::term_loan(dec!(10000), dec!(0.05), Frequency::Monthly, LoanTerm::Years(1));
    input.plan = PaymentPlan::FixedPayment(dec!(41.67));
    match amortize(&input).unwrap().result {
        AmortizationOutcome::NotRepayable(n) => {
            assert_eq!(n.reason, NotRepayableReason::ExceedsMaximumTerm { max_periods: 600 });
            assert_eq!(n.partial_rows.len(), 600);
            assert!(n.message.contains("over 50 years"));
        }
        other => panic!("expected not repayable, got {other:?}"),
    }
}

#[test]
fn test_not_repayable_serializes_with_tag() {
    let mut input = car_loan();
    input.plan = PaymentPlan::FixedPayment(dec!(10));
    let json = serde_json::to_value(amortize(&input).unwrap().result).unwrap();
    assert_eq!(json["status"], "not_repayable");
    assert_eq!(json["reason"]["kind"], "payment_below_interest");
}

// ===========================================================================
// Solvers, forms and views working together
// ===========================================================================

#[test]
fn test_solved_payment_pays_off_in_term() {
    let solved = solve_payment(&PaymentSolveInput {
        principal: dec!(18000),
        annual_rate: dec!(0.049),
        compounding: None,
        payment_frequency: Frequency::Monthly,
        term: LoanTerm::Months(48),
        balloon: None,
    })
    .unwrap()
    .result;
    // Round up to the cent so the last payment is a partial one.
    let payment = (solved.payment * dec!(100)).ceil() / dec!(100);

    let payoff = solve_payoff_time(&PayoffSolveInput {
        principal: dec!(18000),
        annual_rate: dec!(0.049),
        compounding: None,
        payment_frequency: Frequency::Monthly,
        payment,
    })
    .unwrap()
    .result;

    match payoff.estimate {
        PayoffEstimate::Repayable {
            exact_periods,
            number_of_payments,
            ..
        } => {
            assert!(exact_periods < dec!(48) && exact_periods > dec!(47.9));
            assert_eq!(number_of_payments, 48);
        }
        other => panic!("expected repayable, got {other:?}"),
    }
}

#[test]
fn test_form_drives_engine() {
    let form = LoanForm {
        principal: "$25,000".into(),
        annual_rate: "6.5%".into(),
        term_years: "5".into(),
        start_date: "2025-01-15".into(),
        ..Default::default()
    };
    let sched = repayable(&form.to_input());
    assert_eq!(sched.summary.scheduled_payment.round_dp(2), dec!(489.15));
    assert_eq!(sched.summary.payoff_date, NaiveDate::from_ymd_opt(2030, 1, 15));

    let years = aggregate(&sched.rows, Frequency::Monthly, Granularity::Year);
    // Feb-Dec 2025, then four full years, then January 2030.
    assert_eq!(years.len(), 6);
    assert_eq!(years[0].payments, 11);
    assert_eq!(years[5].payments, 1);
}

#[test]
fn test_form_with_runaway_term_is_out_of_range() {
    let form = LoanForm {
        principal: "250000".into(),
        annual_rate: "5".into(),
        term_years: "2000".into(),
        ..Default::default()
    };
    let out = amortize(&form.to_input()).unwrap();
    match out.result {
        AmortizationOutcome::NotRepayable(n) => {
            assert_eq!(n.reason, NotRepayableReason::OutOfRange);
            assert!(n.partial_rows.is_empty());
        }
        other => panic!("expected not repayable, got {other:?}"),
    }
    assert!(!out.warnings.is_empty());
}
