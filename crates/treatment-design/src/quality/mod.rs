//! Column quality checks.
//!
//! This module identifies columns that carry no information and separates
//! text columns with many rare levels from those that can be treated as
//! categories.

mod cardinality;
mod zero_variance;

pub use cardinality::CardinalitySplitter;
pub use zero_variance::ZeroVarianceDetector;
