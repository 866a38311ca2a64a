//! Splitting text columns into high-cardinality and categorical.

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{
    Bucket, CardinalityProfile, CardinalitySplit, ColumnOutcome, SkippedColumn, TreatmentStage,
};

/// Partitions text columns by how much of the table their rare levels occupy.
///
/// A level is rare when its row share is at most `rare_level_threshold`.
/// A column is high-cardinality when every row holds a distinct value, or
/// when its rare levels together cover more than `max_rare_percentage` of
/// the rows. Every other column is categorical.
#[derive(Debug, Clone, Copy)]
pub struct CardinalitySplitter {
    rare_level_threshold: f64,
    max_rare_percentage: f64,
}

impl CardinalitySplitter {
    pub fn new(rare_level_threshold: f64, max_rare_percentage: f64) -> Self {
        Self {
            rare_level_threshold,
            max_rare_percentage,
        }
    }

    /// Split `columns` of `df`, keeping their order within each side.
    pub fn split(
        &self,
        df: &DataFrame,
        columns: &[String],
        diagnostics: &mut Vec<SkippedColumn>,
    ) -> Result<CardinalitySplit> {
        let mut split = CardinalitySplit::default();

        for name in columns {
            let series = df.column(name)?.as_materialized_series();
            let Some(profile) =
                self.profile(series)
                    .record(name, TreatmentStage::CardinalitySplit, diagnostics)
            else {
                continue;
            };

            debug!(
                "Column '{}': {} levels, {:.1}% of rows in rare levels -> {}",
                name,
                profile.distinct_count,
                profile.rare_percent * 100.0,
                profile.bucket.display_name()
            );

            match profile.bucket {
                Bucket::HighCardinality => split.high_cardinality.push(name.clone()),
                _ => split.categorical.push(name.clone()),
            }
            split.profiles.push(profile);
        }

        info!(
            "Cardinality split: {} high-cardinality, {} categorical",
            split.high_cardinality.len(),
            split.categorical.len()
        );

        Ok(split)
    }

    /// Rare-level statistics of one column.
    ///
    /// Missing entries count toward the distinct values but never form a
    /// level of their own.
    pub fn profile(&self, series: &Series) -> ColumnOutcome<CardinalityProfile> {
        let rows = series.len();
        let column = series.name().to_string();

        let distinct_count = match series.n_unique() {
            Ok(n) => n,
            Err(e) => return ColumnOutcome::Skipped(e.to_string()),
        };

        if distinct_count == rows {
            return ColumnOutcome::Done(CardinalityProfile {
                column,
                distinct_count,
                rare_percent: 1.0,
                rare_levels: Vec::new(),
                bucket: Bucket::HighCardinality,
            });
        }

        let counts = match Self::level_counts(series) {
            Ok(counts) => counts,
            Err(e) => return ColumnOutcome::Skipped(e.to_string()),
        };

        let mut rare_levels = Vec::new();
        let mut rare_count = 0usize;
        for (level, count) in counts {
            if count as f64 / rows as f64 <= self.rare_level_threshold {
                rare_levels.push(level);
                rare_count += count;
            }
        }
        rare_levels.sort();

        let rare_percent = rare_count as f64 / rows as f64;
        let bucket = if rare_percent > self.max_rare_percentage {
            Bucket::HighCardinality
        } else {
            Bucket::Categorical
        };

        ColumnOutcome::Done(CardinalityProfile {
            column,
            distinct_count,
            rare_percent,
            rare_levels,
            bucket,
        })
    }

    /// Occurrences of every non-missing level, read as text.
    fn level_counts(series: &Series) -> PolarsResult<Vec<(String, usize)>> {
        let levels = series
            .cast(&DataType::String)?
            .drop_nulls()
            .with_name("level".into());
        let counted = levels.value_counts(false, false, "count".into(), false)?;

        let values = counted.column("level")?.as_materialized_series();
        let counts = counted
            .column("count")?
            .as_materialized_series()
            .cast(&DataType::UInt64)?;

        Ok(values
            .str()?
            .into_iter()
            .zip(counts.u64()?)
            .filter_map(|(level, count)| Some((level?.to_string(), count? as usize)))
            .collect())
    }
}
