pub mod aggregate;
pub mod chart;
pub mod compare;
pub mod engine;
pub mod form;
pub mod solve;

#[cfg(feature = "refinance")]
pub mod refinance;

pub use engine::{
    amortize, AmortizationOutcome, AmortizationSchedule, LoanInput, LoanSummary, LoanTerm,
    NotRepayable, NotRepayableReason, OneTimePayment, PaymentPlan, PaymentRow,
};
