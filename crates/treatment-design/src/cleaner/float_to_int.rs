//! Detection and casting of float columns that only hold whole numbers.

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{Result, ResultExt};
use crate::types::{ColumnOutcome, SkippedColumn, TreatmentStage};
use crate::utils::{is_float_dtype, is_integral};

pub struct FloatToIntCaster;

impl FloatToIntCaster {
    /// Float columns whose every value is finite and integral.
    ///
    /// Expects missing values to have been filled already: a column with any
    /// missing entry is not castable.
    pub fn find_castable(
        df: &DataFrame,
        float_columns: &[String],
        diagnostics: &mut Vec<SkippedColumn>,
    ) -> Result<Vec<String>> {
        let mut castable = Vec::new();

        for name in float_columns {
            let series = df.column(name)?.as_materialized_series();
            if let Some(true) =
                Self::is_castable(series).record(name, TreatmentStage::FloatToInt, diagnostics)
            {
                debug!("Column '{}' holds only whole numbers", name);
                castable.push(name.clone());
            }
        }

        info!("{} float columns can be stored as integers", castable.len());
        Ok(castable)
    }

    /// Check a single series. Non-float dtypes are skipped.
    pub fn is_castable(series: &Series) -> ColumnOutcome<bool> {
        if !is_float_dtype(series.dtype()) {
            return ColumnOutcome::Skipped(format!(
                "expected a float column, found {:?}",
                series.dtype()
            ));
        }

        Self::all_integral(series).into()
    }

    fn all_integral(series: &Series) -> PolarsResult<bool> {
        let values = series.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().all(|v| v.is_some_and(is_integral)))
    }

    /// Cast the named columns of `df` to `Int64`.
    ///
    /// Names missing from `df`, and columns holding a missing, non-finite or
    /// fractional value, are recorded in `diagnostics` and left alone.
    pub fn cast(
        df: &mut DataFrame,
        columns: &[String],
        diagnostics: &mut Vec<SkippedColumn>,
    ) -> Result<()> {
        for name in columns {
            let Ok(column) = df.column(name) else {
                diagnostics.push(SkippedColumn::new(
                    name.as_str(),
                    TreatmentStage::FloatToInt,
                    "column not present",
                ));
                continue;
            };

            let series = column.as_materialized_series();
            match Self::all_integral(series) {
                Ok(true) => {}
                Ok(false) => {
                    diagnostics.push(SkippedColumn::new(
                        name.as_str(),
                        TreatmentStage::FloatToInt,
                        "holds a missing, non-finite or fractional value",
                    ));
                    continue;
                }
                Err(e) => {
                    diagnostics.push(SkippedColumn::new(
                        name.as_str(),
                        TreatmentStage::FloatToInt,
                        e.to_string(),
                    ));
                    continue;
                }
            }

            let cast = series
                .strict_cast(&DataType::Int64)
                .context(format!("Failed to cast '{}' to Int64", name))?;
            df.replace(name, cast)?;
        }

        Ok(())
    }
}
