//! Feature Treatment Design Library
//!
//! Learns, from a training table, how each column should be treated before
//! modelling, and replays those decisions on new tables. Built on Polars.
//!
//! # Overview
//!
//! A fit runs these stages in order:
//!
//! - **Dtype Classification**: every column except the identifier and target
//!   is assigned to a [`Bucket`] by its declared dtype
//! - **Hidden Type Recovery** (optional): text columns holding numbers or
//!   `true`/`false` are promoted to integer, float or boolean
//! - **Missing Value Fill**: per-bucket constants, or the column mean for
//!   floats with [`MissingValueStrategy::Random`]
//! - **Zero Variance**: single-valued columns are dropped from treatment
//! - **Float To Int** (optional): whole-number float columns are marked for
//!   integer storage
//! - **Cardinality Split**: text columns are split into high-cardinality and
//!   categorical by the share of rows in rare levels
//! - **Reindex**: identifier first, target last
//!
//! Problems with a single column never abort a fit. They are collected as
//! [`SkippedColumn`] diagnostics and the stage moves on.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use treatment_design::{TreatmentConfig, TreatmentDesign};
//! use polars::prelude::*;
//!
//! let train = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("train.csv".into()))?
//!     .finish()?;
//!
//! let config = TreatmentConfig::builder()
//!     .index_feature("id")
//!     .target_feature("label")
//!     .find_hidden_numerics(true)
//!     .floats_to_ints(true)
//!     .build()?;
//!
//! let mut design = TreatmentDesign::builder().config(config).build()?;
//! let fitted = design.fit(&train)?;
//!
//! println!("Treatment columns: {:?}", fitted.treatment_columns());
//! println!("High cardinality: {:?}", fitted.high_cardinality());
//!
//! let treated = design.transform(&test)?;
//! for skipped in &treated.diagnostics {
//!     println!("{}: {}", skipped.column, skipped.reason);
//! }
//! ```
//!
//! # Custom Classification
//!
//! The dtype-to-bucket mapping sits behind the [`ColumnClassifier`] trait and
//! can be replaced through [`TreatmentDesignBuilder::classifier`].
//!
//! # Scaling
//!
//! Numeric scaling is left to the caller. [`FittedState::scaling_request`]
//! lists the treated float columns and [`FittedState::scale`] hands them to
//! any [`NumericScaler`].

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod pipeline;
pub mod profiler;
pub mod quality;
pub mod scaling;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{FloatToIntCaster, HiddenTypeRecoverer};
pub use config::{
    ConfigValidationError, MissingValueStrategy, TargetKind, TreatmentConfig,
    TreatmentConfigBuilder,
};
pub use error::{Result as TreatmentResult, ResultExt, TreatmentError};
pub use imputers::{FillPlan, MissingValueFiller, PlannedFill};
pub use pipeline::{
    ColumnReindexer, FittedState, Transformed, TreatmentDesign, TreatmentDesignBuilder,
};
pub use profiler::{ColumnClassifier, DtypeClassifier};
pub use quality::{CardinalitySplitter, ZeroVarianceDetector};
pub use scaling::{NumericScaler, ScalingOptions, ScalingRequest};
pub use types::{
    Bucket, BucketAssignment, CardinalityProfile, CardinalitySplit, ColumnOutcome, FillValue,
    RecoveredColumn, SkippedColumn, TreatmentStage, TreatmentSummary,
};
