//! Column rewriting stages.
//!
//! This module provides:
//! - Recovery of numbers and booleans stored as text
//! - Casting of whole-number float columns to integers
//! - Lenient coercions used to replay recoveries on new data

mod converters;
mod float_to_int;
mod hidden_types;

pub(crate) use converters::coerce_to_bucket;
pub use float_to_int::FloatToIntCaster;
pub use hidden_types::HiddenTypeRecoverer;
