use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use loancalc_core::frequency::Frequency;
use loancalc_core::loans::aggregate::{aggregate, Granularity};
use loancalc_core::loans::chart::schedule_series;
use loancalc_core::loans::PaymentRow;
use loancalc_core::navigation::{MenuId, MenuState};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    let input: loancalc_core::loans::LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loancalc_core::loans::amortize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Amortize straight from the calculator's raw text fields.
#[napi]
pub fn amortize_form(form_json: String) -> NapiResult<String> {
    let form: loancalc_core::loans::form::LoanForm = serde_json::from_str(&form_json).map_err(to_napi_error)?;
    let output = loancalc_core::loans::amortize(&form.to_input()).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_extra_payments(input_json: String) -> NapiResult<String> {
    let input: loancalc_core::loans::LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loancalc_core::loans::compare::compare_extra_payments(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn solve_payment(input_json: String) -> NapiResult<String> {
    let input: loancalc_core::loans::solve::PaymentSolveInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loancalc_core::loans::solve::solve_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn solve_payoff_time(input_json: String) -> NapiResult<String> {
    let input: loancalc_core::loans::solve::PayoffSolveInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loancalc_core::loans::solve::solve_payoff_time(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn solve_affordable_principal(input_json: String) -> NapiResult<String> {
    let input: loancalc_core::loans::solve::AffordabilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loancalc_core::loans::solve::solve_affordable_principal(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_refinance(input_json: String) -> NapiResult<String> {
    let input: loancalc_core::loans::refinance::RefinanceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loancalc_core::loans::refinance::analyze_refinance(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedule views
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScheduleView {
    rows: Vec<PaymentRow>,
    #[serde(default)]
    payment_frequency: Frequency,
    #[serde(default)]
    granularity: Granularity,
}

#[napi]
pub fn aggregate_schedule(view_json: String) -> NapiResult<String> {
    let view: ScheduleView = serde_json::from_str(&view_json).map_err(to_napi_error)?;
    let grouped = aggregate(&view.rows, view.payment_frequency, view.granularity);
    serde_json::to_string(&grouped).map_err(to_napi_error)
}

#[napi]
pub fn schedule_chart(view_json: String) -> NapiResult<String> {
    let view: ScheduleView = serde_json::from_str(&view_json).map_err(to_napi_error)?;
    let series = schedule_series(&view.rows, view.payment_frequency, view.granularity);
    serde_json::to_string(&series).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Savings
// ---------------------------------------------------------------------------

#[napi]
pub fn project_savings(input_json: String) -> NapiResult<String> {
    let input: loancalc_core::savings::SavingsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loancalc_core::savings::project_savings(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn required_contribution(input_json: String) -> NapiResult<String> {
    let input: loancalc_core::savings::SavingsTargetInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loancalc_core::savings::required_contribution(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Form entry and menus
// ---------------------------------------------------------------------------

/// The normalized field text, or `null` when the keystroke should be rejected.
#[napi]
pub fn normalize_entry(candidate: String, allow_negative: bool) -> Option<String> {
    loancalc_core::input::normalize_entry(&candidate, allow_negative)
}

#[napi]
pub fn toggle_menu(state_json: String, menu: String) -> NapiResult<String> {
    let mut state: MenuState = serde_json::from_str(&state_json).map_err(to_napi_error)?;
    state.toggle(MenuId::new(menu));
    serde_json::to_string(&state).map_err(to_napi_error)
}

/// `inside` is the menu the interaction landed in, if any.
#[napi]
pub fn menu_outside_interaction(state_json: String, inside: Option<String>) -> NapiResult<String> {
    let mut state: MenuState = serde_json::from_str(&state_json).map_err(to_napi_error)?;
    let inside = inside.map(MenuId::new);
    state.on_outside_interaction(inside.as_ref());
    serde_json::to_string(&state).map_err(to_napi_error)
}
