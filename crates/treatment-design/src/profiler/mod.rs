//! Column profiling module.
//!
//! This module inspects declared column dtypes and assigns each column to a
//! semantic [`Bucket`](crate::types::Bucket). Column contents are never parsed
//! here; recovering numbers hidden in text is the job of
//! [`crate::cleaner::HiddenTypeRecoverer`].

mod dtype_classifier;

pub use dtype_classifier::{ColumnClassifier, DtypeClassifier};
