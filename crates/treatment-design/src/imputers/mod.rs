//! Imputation module for handling missing values.

mod missing_values;

pub use missing_values::{FillPlan, MissingValueFiller, PlannedFill};
