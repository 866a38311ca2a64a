//! Type conversion functions for applying learned recoveries to new data.
//!
//! Unlike recovery during fit, these conversions are lenient: a value that
//! does not parse becomes missing and is filled afterwards.

use crate::types::Bucket;
use crate::utils::{is_blank, is_integral, normalize_lower, parse_finite_float, parse_integer_literal};
use polars::prelude::*;

/// Convert a column to the bucket it was recovered as during fit.
///
/// Columns that already carry a non-text dtype are cast directly.
pub(crate) fn coerce_to_bucket(series: &Series, bucket: Bucket) -> PolarsResult<Series> {
    match (series.dtype(), bucket) {
        (DataType::String, Bucket::Integer) => string_to_integer(series),
        (DataType::String, Bucket::Float) => string_to_float(series),
        (DataType::String, Bucket::Boolean) => string_to_boolean(series),
        (_, Bucket::Integer) => series.cast(&DataType::Int64),
        (_, Bucket::Float) => series.cast(&DataType::Float64),
        (_, Bucket::Boolean) => series.cast(&DataType::Boolean),
        (_, other) => Err(PolarsError::ComputeError(
            format!("cannot coerce a column to {}", other.display_name()).into(),
        )),
    }
}

/// Convert a String series to Int64. Integral floats ("3.0") are accepted.
pub(crate) fn string_to_integer(series: &Series) -> PolarsResult<Series> {
    let result_vec: Vec<Option<i64>> = series
        .str()?
        .into_iter()
        .map(|opt_val| {
            let val = opt_val.filter(|v| !is_blank(v))?;
            parse_integer_literal(val).or_else(|| {
                parse_finite_float(val)
                    .filter(|f| is_integral(*f))
                    .map(|f| f as i64)
            })
        })
        .collect();

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Convert a String series to Float64.
pub(crate) fn string_to_float(series: &Series) -> PolarsResult<Series> {
    let result_vec: Vec<Option<f64>> = series
        .str()?
        .into_iter()
        .map(|opt_val| opt_val.filter(|v| !is_blank(v)).and_then(parse_finite_float))
        .collect();

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Convert a String series of "true"/"false" text to Boolean.
pub(crate) fn string_to_boolean(series: &Series) -> PolarsResult<Series> {
    let result_vec: Vec<Option<bool>> = series
        .str()?
        .into_iter()
        .map(|opt_val| match opt_val.map(normalize_lower).as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        })
        .collect();

    Ok(Series::new(series.name().clone(), result_vec))
}
