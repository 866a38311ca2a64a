//! Hand-off to an external numeric scaler.
//!
//! Scaling and normalization are not performed here. A fitted design knows
//! which float columns survived treatment; it packages them together with the
//! caller's [`ScalingOptions`] into a [`ScalingRequest`] that any
//! [`NumericScaler`] implementation can consume.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ConfigValidationError;
use crate::error::Result;

/// Options forwarded to a numeric scaler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingOptions {
    /// Standardize columns.
    pub scale: bool,
    /// Rescale columns into `normalization_range`.
    pub normalize: bool,
    /// Target range for normalization as `(low, high)`.
    pub normalization_range: (f64, f64),
}

impl Default for ScalingOptions {
    fn default() -> Self {
        Self {
            scale: false,
            normalize: false,
            normalization_range: (0.0, 1.0),
        }
    }
}

impl ScalingOptions {
    /// Whether a scaler would do anything with these options.
    pub fn is_noop(&self) -> bool {
        !self.scale && !self.normalize
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        let (low, high) = self.normalization_range;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ConfigValidationError::InvalidNormalizationRange(low, high));
        }
        Ok(())
    }
}

/// Columns and options handed to a [`NumericScaler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingRequest {
    pub columns: Vec<String>,
    pub options: ScalingOptions,
}

/// An external routine that scales the treated float columns of a table.
pub trait NumericScaler {
    /// Scale `request.columns` of `df`, returning the updated table.
    fn scale(&self, df: DataFrame, request: &ScalingRequest) -> Result<DataFrame>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_noop() {
        let options = ScalingOptions::default();
        assert!(options.is_noop());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_range_rejected() {
        let options = ScalingOptions {
            normalize: true,
            normalization_range: (1.0, 1.0),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigValidationError::InvalidNormalizationRange(_, _))
        ));
    }
}
