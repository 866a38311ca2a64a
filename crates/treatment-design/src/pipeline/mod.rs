//! Pipeline module.
//!
//! This module provides the treatment design orchestrator and the column
//! reordering it finishes with.

mod design;
mod reindex;

pub use design::{FittedState, Transformed, TreatmentDesign, TreatmentDesignBuilder};
pub use reindex::ColumnReindexer;
