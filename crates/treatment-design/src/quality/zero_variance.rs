//! Detection of columns holding a single value.

use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{Bucket, BucketAssignment, ColumnOutcome, SkippedColumn, TreatmentStage};
use crate::utils::normalize_upper;

/// Finds numeric and text columns with fewer than two distinct values.
///
/// Numeric columns compare raw values with a missing entry counting as a
/// value of its own. Text values are compared after trimming and
/// upper-casing, so `"a"` and `" A "` are the same level.
#[derive(Debug, Clone, Copy)]
pub struct ZeroVarianceDetector {
    enabled: bool,
}

impl ZeroVarianceDetector {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Zero-variance columns among the Integer, Float and Text buckets.
    ///
    /// Returns an empty list without reading `df` when detection is disabled.
    pub fn detect(
        &self,
        df: &DataFrame,
        buckets: &BucketAssignment,
        diagnostics: &mut Vec<SkippedColumn>,
    ) -> Result<Vec<String>> {
        if !self.enabled {
            debug!("Zero-variance detection disabled");
            return Ok(Vec::new());
        }

        let mut zero_variance = Vec::new();

        let numeric = buckets
            .columns(Bucket::Integer)
            .iter()
            .chain(buckets.columns(Bucket::Float));
        for name in numeric {
            let series = df.column(name)?.as_materialized_series();
            if series.n_unique()? < 2 {
                debug!("Numeric column '{}' has zero variance", name);
                zero_variance.push(name.clone());
            }
        }

        for name in buckets.columns(Bucket::Text) {
            let series = df.column(name)?.as_materialized_series();
            let distinct = Self::text_distinct(series).record(
                name,
                TreatmentStage::ZeroVariance,
                diagnostics,
            );
            if distinct.is_some_and(|n| n < 2) {
                debug!("Text column '{}' has zero variance", name);
                zero_variance.push(name.clone());
            }
        }

        info!("Found {} zero-variance columns", zero_variance.len());
        Ok(zero_variance)
    }

    /// Number of distinct normalized text values.
    pub fn text_distinct(series: &Series) -> ColumnOutcome<usize> {
        let values = match series.str() {
            Ok(values) => values,
            Err(e) => return ColumnOutcome::Skipped(e.to_string()),
        };

        let mut distinct = HashSet::new();
        for value in values.into_iter() {
            match value {
                Some(v) => {
                    distinct.insert(normalize_upper(v));
                }
                None => {
                    return ColumnOutcome::Skipped(
                        "missing values cannot be normalized".to_string(),
                    );
                }
            }
        }

        ColumnOutcome::Done(distinct.len())
    }
}
