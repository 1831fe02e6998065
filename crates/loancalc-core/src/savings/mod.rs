pub mod goal;

pub use goal::{
    project_savings, required_contribution, ContributionTiming, SavingsInput, SavingsOutput, SavingsRow,
    SavingsTargetInput, SavingsTargetOutput, SavingsYear, TargetProgress,
};
