//! Recovery of numeric and boolean columns stored as text.

use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::error::{Result, ResultExt};
use crate::types::{Bucket, ColumnOutcome, RecoveredColumn, SkippedColumn, TreatmentStage};
use crate::utils::{is_blank, normalize_lower, parse_finite_float, parse_integer_literal};

/// Promotes text columns whose values are really numbers or booleans.
///
/// Numeric recovery is tried first. A column is numeric only if every
/// non-missing value converts; blank strings count as missing. It becomes
/// an integer column when every value is an integer literal and a float column
/// otherwise. Columns that are not numeric are tested for boolean text: no
/// missing entries and exactly the two normalized values `true` and `false`.
pub struct HiddenTypeRecoverer;

impl HiddenTypeRecoverer {
    /// Try to recover the given text columns of `df` in place.
    ///
    /// Returns the recovered columns in input order. Columns that stay text
    /// are recorded in `diagnostics` with the reason.
    pub fn recover(
        df: &mut DataFrame,
        text_columns: &[String],
        diagnostics: &mut Vec<SkippedColumn>,
    ) -> Result<Vec<RecoveredColumn>> {
        let mut recovered = Vec::new();

        for name in text_columns {
            let series = df.column(name)?.as_materialized_series().clone();

            let outcome = Self::recover_series(&series);
            let Some((bucket, converted)) =
                outcome.record(name, TreatmentStage::HiddenTypeRecovery, diagnostics)
            else {
                continue;
            };

            df.replace(name, converted)
                .context(format!("Failed to replace recovered column '{}'", name))?;
            debug!("Recovered '{}' as {}", name, bucket.display_name());
            recovered.push(RecoveredColumn {
                column: name.clone(),
                bucket,
            });
        }

        info!(
            "Recovered {} of {} text columns",
            recovered.len(),
            text_columns.len()
        );

        Ok(recovered)
    }

    /// Recover one text series, returning its new bucket and values.
    pub fn recover_series(series: &Series) -> ColumnOutcome<(Bucket, Series)> {
        let values = match series.str() {
            Ok(values) => values,
            Err(e) => return ColumnOutcome::Skipped(e.to_string()),
        };

        let numeric_failure = match Self::try_numeric(series.name(), values) {
            Ok(recovered) => return ColumnOutcome::Done(recovered),
            Err(reason) => reason,
        };

        match Self::try_boolean(series.name(), values) {
            Ok(recovered) => ColumnOutcome::Done(recovered),
            Err(reason) => ColumnOutcome::Skipped(format!("{}; {}", numeric_failure, reason)),
        }
    }

    fn try_numeric(
        name: &PlSmallStr,
        values: &StringChunked,
    ) -> std::result::Result<(Bucket, Series), String> {
        let mut floats: Vec<Option<f64>> = Vec::with_capacity(values.len());
        let mut ints: Vec<Option<i64>> = Vec::with_capacity(values.len());
        let mut all_integers = true;
        let mut present = 0usize;

        for opt_val in values.into_iter() {
            let Some(val) = opt_val.filter(|v| !is_blank(v)) else {
                floats.push(None);
                ints.push(None);
                continue;
            };
            present += 1;

            let int_val = parse_integer_literal(val);
            all_integers &= int_val.is_some();
            ints.push(int_val);

            match parse_finite_float(val) {
                Some(f) => floats.push(Some(f)),
                None => return Err(format!("value '{}' is not numeric", val.trim())),
            }
        }

        if present == 0 {
            return Err("no values to convert".to_string());
        }

        if all_integers {
            Ok((Bucket::Integer, Series::new(name.clone(), ints)))
        } else {
            Ok((Bucket::Float, Series::new(name.clone(), floats)))
        }
    }

    fn try_boolean(
        name: &PlSmallStr,
        values: &StringChunked,
    ) -> std::result::Result<(Bucket, Series), String> {
        if values.null_count() > 0 {
            return Err("missing values prevent boolean recovery".to_string());
        }

        let normalized: Vec<String> = values
            .into_iter()
            .flatten()
            .map(normalize_lower)
            .collect();
        let distinct: BTreeSet<&str> = normalized.iter().map(String::as_str).collect();

        if distinct != BTreeSet::from(["false", "true"]) {
            return Err(format!("{} distinct values are not true/false", distinct.len()));
        }

        let bools: Vec<Option<bool>> = normalized.iter().map(|v| Some(v == "true")).collect();
        Ok((Bucket::Boolean, Series::new(name.clone(), bools)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recover_one(values: &[Option<&str>]) -> ColumnOutcome<(Bucket, Series)> {
        let series = Series::new("col".into(), values);
        HiddenTypeRecoverer::recover_series(&series)
    }

    fn bucket_of(outcome: ColumnOutcome<(Bucket, Series)>) -> Option<Bucket> {
        match outcome {
            ColumnOutcome::Done((bucket, _)) => Some(bucket),
            ColumnOutcome::Skipped(_) => None,
        }
    }

    #[test]
    fn test_integers_recovered() {
        let outcome = recover_one(&[Some("1"), Some("2"), Some("3"), Some("4"), None]);
        let ColumnOutcome::Done((bucket, series)) = outcome else {
            panic!("expected recovery");
        };
        assert_eq!(bucket, Bucket::Integer);
        assert_eq!(series.dtype(), &DataType::Int64);
        assert_eq!(series.null_count(), 1);
    }

    #[test]
    fn test_blank_strings_count_as_missing() {
        let outcome = recover_one(&[Some("1"), Some("2"), Some("3"), Some("4"), Some("")]);
        let ColumnOutcome::Done((bucket, series)) = outcome else {
            panic!("expected recovery");
        };
        assert_eq!(bucket, Bucket::Integer);
        assert_eq!(series.null_count(), 1);
    }

    #[test]
    fn test_floats_recovered() {
        let outcome = recover_one(&[Some("0.0"), Some("1.1"), Some("2.2")]);
        assert_eq!(bucket_of(outcome), Some(Bucket::Float));
    }

    #[test]
    fn test_mixed_int_and_float_literals_become_float() {
        let outcome = recover_one(&[Some("1"), Some("2.5")]);
        assert_eq!(bucket_of(outcome), Some(Bucket::Float));
    }

    #[test]
    fn test_single_bad_value_blocks_numeric() {
        let outcome = recover_one(&[Some("1"), Some("2"), Some("three")]);
        assert!(matches!(outcome, ColumnOutcome::Skipped(_)));
    }

    #[test]
    fn test_booleans_recovered() {
        let outcome = recover_one(&[Some("true"), Some(" FALSE "), Some("True")]);
        let ColumnOutcome::Done((bucket, series)) = outcome else {
            panic!("expected recovery");
        };
        assert_eq!(bucket, Bucket::Boolean);
        assert_eq!(series.get(0).unwrap(), AnyValue::Boolean(true));
        assert_eq!(series.get(1).unwrap(), AnyValue::Boolean(false));
    }

    #[test]
    fn test_single_boolean_level_not_recovered() {
        let outcome = recover_one(&[Some("true"), Some("true")]);
        assert!(matches!(outcome, ColumnOutcome::Skipped(_)));
    }

    #[test]
    fn test_boolean_with_missing_not_recovered() {
        let outcome = recover_one(&[Some("true"), Some("false"), None]);
        assert!(matches!(outcome, ColumnOutcome::Skipped(_)));
    }

    #[test]
    fn test_all_missing_not_recovered() {
        let outcome = recover_one(&[None, None]);
        assert!(matches!(outcome, ColumnOutcome::Skipped(_)));
    }

    #[test]
    fn test_recover_updates_frame_and_diagnostics() {
        let mut df = df![
            "nn" => ["1", "2", "3"],
            "ii" => ["true", "false", "true"],
            "c" => ["a", "b", "a"],
        ]
        .unwrap();
        let text = vec!["nn".to_string(), "ii".to_string(), "c".to_string()];
        let mut diagnostics = Vec::new();

        let recovered = HiddenTypeRecoverer::recover(&mut df, &text, &mut diagnostics).unwrap();

        assert_eq!(
            recovered,
            vec![
                RecoveredColumn { column: "nn".to_string(), bucket: Bucket::Integer },
                RecoveredColumn { column: "ii".to_string(), bucket: Bucket::Boolean },
            ]
        );
        assert_eq!(df.column("nn").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("ii").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("c").unwrap().dtype(), &DataType::String);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].column, "c");
        assert_eq!(diagnostics[0].stage, TreatmentStage::HiddenTypeRecovery);
    }
}
