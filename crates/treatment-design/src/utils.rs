//! Shared utilities for treatment design.
//!
//! This module contains helper functions used across multiple modules
//! for reading and rewriting polars columns.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is a float type.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Column names of a DataFrame, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Normalize a text value for variance checks: trimmed and upper-cased.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(normalize_upper(" a "), "A");
/// ```
pub fn normalize_upper(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Normalize a text value for boolean checks: trimmed and lower-cased.
pub fn normalize_lower(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Check if a text value carries no content.
#[inline]
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Parse a trimmed value written as an integer literal ("12", "-3", "+7").
pub fn parse_integer_literal(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

/// Parse a trimmed value as a finite float ("1.5", "2e3", "7").
pub fn parse_finite_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whether a float has no fractional part.
#[inline]
pub fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

// =============================================================================
// Series Access Utilities
// =============================================================================

/// Read any numeric Series as `f64` values (missing entries as `None`).
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let as_float = series.cast(&DataType::Float64)?;
    Ok(as_float.f64()?.into_iter().collect())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series, producing a Float64 Series.
pub fn fill_float_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let result_vec: Vec<Option<f64>> = numeric_values(series)?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Fill null values in an integer Series, producing an Int64 Series.
///
/// Fails when a present value does not fit in `Int64` (large `UInt64`).
pub fn fill_integer_nulls(series: &Series, fill_value: i64) -> PolarsResult<Series> {
    let as_int = series.strict_cast(&DataType::Int64)?;
    let result_vec: Vec<Option<i64>> = as_int
        .i64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Fill null values in a String Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let result_vec: Vec<Option<String>> = series
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value).to_string()))
        .collect();

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Fill null values in a categorical Series, keeping its original dtype.
///
/// Fails if the fill value cannot be represented in the original dtype
/// (e.g. an enum without that category).
pub fn fill_categorical_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let as_string = series.cast(&DataType::String)?;
    let filled = fill_string_nulls(&as_string, fill_value)?.cast(series.dtype())?;

    if filled.null_count() > 0 {
        return Err(PolarsError::ComputeError(
            format!(
                "fill value '{}' is not a valid level of {:?}",
                fill_value,
                series.dtype()
            )
            .into(),
        ));
    }

    Ok(filled)
}

// =============================================================================
// Tests
// =============================================================================
