pub mod learner;
pub mod scheduling;
pub mod units;
