//! Constant and mean filling of missing values.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::{MissingValueStrategy, TreatmentConfig};
use crate::error::Result;
use crate::types::{Bucket, BucketAssignment, FillValue, SkippedColumn, TreatmentStage};
use crate::utils::{
    fill_categorical_nulls, fill_float_nulls, fill_integer_nulls, fill_string_nulls,
};

/// A fill decision for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedFill {
    pub column: String,
    pub value: FillValue,
    /// True when `value` is the column mean learned during fit.
    pub learned: bool,
}

/// Per-column fill values learned during fit and replayed on new data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillPlan {
    fills: Vec<PlannedFill>,
}

impl FillPlan {
    pub fn fills(&self) -> &[PlannedFill] {
        &self.fills
    }

    /// Fill value for `column`, if it is tracked.
    pub fn value_for(&self, column: &str) -> Option<&FillValue> {
        self.fills
            .iter()
            .find(|fill| fill.column == column)
            .map(|fill| &fill.value)
    }

    /// Fill values keyed by column name.
    pub fn values(&self) -> BTreeMap<String, FillValue> {
        self.fills
            .iter()
            .map(|fill| (fill.column.clone(), fill.value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}

/// Builds and applies [`FillPlan`]s.
///
/// Text and categorical columns get `categorical_fill_value`, integer columns
/// get `numerical_fill_value` truncated toward zero and float columns get
/// `numerical_fill_value`. With [`MissingValueStrategy::Random`] a float
/// column gets its own mean instead, computed before any fill.
pub struct MissingValueFiller;

impl MissingValueFiller {
    /// Decide the fill value of every fill-tracked column in `buckets`.
    pub fn plan(
        df: &DataFrame,
        buckets: &BucketAssignment,
        config: &TreatmentConfig,
    ) -> Result<FillPlan> {
        let mut fills = Vec::new();

        for (name, bucket) in buckets.iter().filter(|(_, bucket)| bucket.is_fill_tracked()) {
            let (value, learned) = match bucket {
                Bucket::Text | Bucket::Categorical => {
                    (FillValue::Text(config.categorical_fill_value.clone()), false)
                }
                Bucket::Integer => (FillValue::Integer(config.integer_fill_value()), false),
                Bucket::Float => Self::float_fill(df, name, config)?,
                _ => continue,
            };

            debug!("Planned fill for '{}': {}", name, value);
            fills.push(PlannedFill {
                column: name.to_string(),
                value,
                learned,
            });
        }

        Ok(FillPlan { fills })
    }

    fn float_fill(df: &DataFrame, name: &str, config: &TreatmentConfig) -> Result<(FillValue, bool)> {
        if config.missing_value_strategy == MissingValueStrategy::Systematic {
            return Ok((FillValue::Float(config.numerical_fill_value), false));
        }

        let series = df.column(name)?.as_materialized_series();
        match series.mean() {
            Some(mean) => Ok((FillValue::Float(mean), true)),
            None => {
                debug!("'{}' has no values to average, using the constant", name);
                Ok((FillValue::Float(config.numerical_fill_value), false))
            }
        }
    }

    /// Fill the missing entries of every planned column in `df`.
    ///
    /// Columns without missing entries are not rewritten, so applying a plan
    /// twice changes nothing. Absent or incompatible columns are recorded in
    /// `diagnostics`.
    pub fn apply(
        df: &mut DataFrame,
        plan: &FillPlan,
        diagnostics: &mut Vec<SkippedColumn>,
    ) -> Result<usize> {
        let mut filled = 0;

        for fill in plan.fills() {
            let Ok(column) = df.column(&fill.column) else {
                diagnostics.push(SkippedColumn::new(
                    fill.column.as_str(),
                    TreatmentStage::MissingValueFill,
                    "column not present",
                ));
                continue;
            };

            let series = column.as_materialized_series();
            if series.null_count() == 0 {
                continue;
            }

            match Self::fill_series(series, &fill.value) {
                Ok(new_series) => {
                    df.replace(&fill.column, new_series)?;
                    filled += 1;
                }
                Err(e) => diagnostics.push(SkippedColumn::new(
                    fill.column.as_str(),
                    TreatmentStage::MissingValueFill,
                    e.to_string(),
                )),
            }
        }

        info!("Filled missing values in {} columns", filled);
        Ok(filled)
    }

    fn fill_series(series: &Series, value: &FillValue) -> PolarsResult<Series> {
        match (value, series.dtype()) {
            (FillValue::Text(text), DataType::Categorical(..) | DataType::Enum(..)) => {
                fill_categorical_nulls(series, text)
            }
            (FillValue::Text(text), _) => fill_string_nulls(series, text),
            (FillValue::Integer(int), _) => fill_integer_nulls(series, *int),
            (FillValue::Float(float), _) => fill_float_nulls(series, *float),
        }
    }
}
