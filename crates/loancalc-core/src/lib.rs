pub mod dates;
pub mod error;
pub mod frequency;
pub mod input;
pub mod time_value;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "savings")]
pub mod savings;

#[cfg(feature = "navigation")]
pub mod navigation;

pub use error::CalcError;
pub use frequency::{Compounding, Frequency};
pub use types::*;

/// Standard result type for all loancalc operations
pub type CalcResult<T> = Result<T, CalcError>;
