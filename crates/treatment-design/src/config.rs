//! Configuration types for treatment design.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic setup.

use serde::{Deserialize, Serialize};

use crate::scaling::ScalingOptions;

/// Kind of prediction target the design is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetKind {
    /// Classification target
    #[default]
    Categorical,
    /// Regression target
    Numerical,
}

/// Strategy for filling missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MissingValueStrategy {
    /// Fill with the configured numeric constant.
    #[default]
    Systematic,
    /// Fill float columns with their own mean (learned at fit time).
    Random,
}

/// Configuration for treatment design.
///
/// Use [`TreatmentConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use treatment_design::config::TreatmentConfig;
///
/// let config = TreatmentConfig::builder()
///     .index_feature("id")
///     .target_feature("label")
///     .find_hidden_numerics(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatmentConfig {
    /// Column identifying rows. Excluded from treatment, moved first.
    /// Default: None
    pub index_feature: Option<String>,

    /// Prediction target. Excluded from treatment, moved last.
    /// Default: None
    pub target_feature: Option<String>,

    /// Whether the design is for a classification or regression target.
    /// Default: Categorical
    pub target_kind: TargetKind,

    /// How missing float values are filled.
    /// Default: Systematic
    pub missing_value_strategy: MissingValueStrategy,

    /// Value used for missing numeric entries (truncated for integer columns).
    /// Default: -1.0
    pub numerical_fill_value: f64,

    /// Value used for missing text and categorical entries.
    /// Default: "NA"
    pub categorical_fill_value: String,

    /// Share of rows (0.0 - 1.0) at or below which a level counts as rare.
    /// Default: 0.02
    pub rare_level_threshold: f64,

    /// Share of rows (0.0 - 1.0) that rare levels may occupy before a text
    /// column is considered high-cardinality.
    /// Default: 0.1
    pub max_rare_percentage: f64,

    /// Whether columns with fewer than two distinct values are excluded.
    /// Default: true
    pub exclude_zero_variance: bool,

    /// Whether integral float columns are cast to integers on transform.
    /// Default: false
    pub floats_to_ints: bool,

    /// Whether integer columns should later be treated as categories.
    /// Carried for downstream encoders; not acted on by this crate.
    /// Default: true
    pub ints_as_categories: bool,

    /// Whether text columns holding numeric or boolean text are recovered.
    /// Default: false
    pub find_hidden_numerics: bool,

    /// Options handed to an external numeric scaler.
    pub scaling: ScalingOptions,
}

impl Default for TreatmentConfig {
    fn default() -> Self {
        Self {
            index_feature: None,
            target_feature: None,
            target_kind: TargetKind::default(),
            missing_value_strategy: MissingValueStrategy::default(),
            numerical_fill_value: -1.0,
            categorical_fill_value: "NA".to_string(),
            rare_level_threshold: 0.02,
            max_rare_percentage: 0.1,
            exclude_zero_variance: true,
            floats_to_ints: false,
            ints_as_categories: true,
            find_hidden_numerics: false,
            scaling: ScalingOptions::default(),
        }
    }
}

impl TreatmentConfig {
    /// Create a new configuration builder.
    pub fn builder() -> TreatmentConfigBuilder {
        TreatmentConfigBuilder::default()
    }

    /// Integer fill value derived from `numerical_fill_value` (truncated toward zero).
    pub fn integer_fill_value(&self) -> i64 {
        self.numerical_fill_value.trunc() as i64
    }

    /// Parse and validate a configuration from JSON. Missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Identifier and target column names, in that order, when configured.
    pub fn excluded_columns(&self) -> impl Iterator<Item = &str> {
        self.index_feature
            .as_deref()
            .into_iter()
            .chain(self.target_feature.as_deref())
    }

    /// Whether rare levels are allowed to exceed the pooling budget on their own.
    ///
    /// When `rare_level_threshold > max_rare_percentage`, a single rare level
    /// can push a column over the budget. The split rule is unchanged; this
    /// only lets callers surface the situation.
    pub fn has_inverted_rare_thresholds(&self) -> bool {
        self.rare_level_threshold > self.max_rare_percentage
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.rare_level_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "rare_level_threshold".to_string(),
                value: self.rare_level_threshold,
            });
        }

        if !(0.0..=1.0).contains(&self.max_rare_percentage) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "max_rare_percentage".to_string(),
                value: self.max_rare_percentage,
            });
        }

        if !self.numerical_fill_value.is_finite() {
            return Err(ConfigValidationError::NonFiniteFillValue(
                self.numerical_fill_value,
            ));
        }

        if let (Some(index), Some(target)) = (&self.index_feature, &self.target_feature)
            && index == target
        {
            return Err(ConfigValidationError::IndexIsTarget(index.clone()));
        }

        self.scaling.validate()?;

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid numerical fill value: {0} (must be finite)")]
    NonFiniteFillValue(f64),

    #[error("Column '{0}' cannot be both the index feature and the target feature")]
    IndexIsTarget(String),

    #[error("Invalid normalization range: ({0}, {1}) (low must be below high)")]
    InvalidNormalizationRange(f64, f64),
}

/// Builder for [`TreatmentConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct TreatmentConfigBuilder {
    index_feature: Option<String>,
    target_feature: Option<String>,
    target_kind: Option<TargetKind>,
    missing_value_strategy: Option<MissingValueStrategy>,
    numerical_fill_value: Option<f64>,
    categorical_fill_value: Option<String>,
    rare_level_threshold: Option<f64>,
    max_rare_percentage: Option<f64>,
    exclude_zero_variance: Option<bool>,
    floats_to_ints: Option<bool>,
    ints_as_categories: Option<bool>,
    find_hidden_numerics: Option<bool>,
    scaling: Option<ScalingOptions>,
}

impl TreatmentConfigBuilder {
    /// Set the row identifier column.
    pub fn index_feature(mut self, column: impl Into<String>) -> Self {
        self.index_feature = Some(column.into());
        self
    }

    /// Set the target column.
    pub fn target_feature(mut self, column: impl Into<String>) -> Self {
        self.target_feature = Some(column.into());
        self
    }

    /// Set the kind of target.
    pub fn target_kind(mut self, kind: TargetKind) -> Self {
        self.target_kind = Some(kind);
        self
    }

    /// Set the strategy for filling missing numeric values.
    pub fn missing_value_strategy(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_value_strategy = Some(strategy);
        self
    }

    /// Set the constant used for missing numeric values.
    pub fn numerical_fill_value(mut self, value: f64) -> Self {
        self.numerical_fill_value = Some(value);
        self
    }

    /// Set the constant used for missing text values.
    pub fn categorical_fill_value(mut self, value: impl Into<String>) -> Self {
        self.categorical_fill_value = Some(value.into());
        self
    }

    /// Set the rare level threshold.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.02 = 2% of rows)
    pub fn rare_level_threshold(mut self, threshold: f64) -> Self {
        self.rare_level_threshold = Some(threshold);
        self
    }

    /// Set the share of rows rare levels may occupy.
    ///
    /// # Arguments
    /// * `percentage` - Value between 0.0 and 1.0 (e.g., 0.1 = 10% of rows)
    pub fn max_rare_percentage(mut self, percentage: f64) -> Self {
        self.max_rare_percentage = Some(percentage);
        self
    }

    /// Enable or disable zero-variance exclusion.
    pub fn exclude_zero_variance(mut self, exclude: bool) -> Self {
        self.exclude_zero_variance = Some(exclude);
        self
    }

    /// Enable or disable float to integer casting.
    pub fn floats_to_ints(mut self, enable: bool) -> Self {
        self.floats_to_ints = Some(enable);
        self
    }

    /// Mark integer columns as categorical candidates for downstream encoders.
    pub fn ints_as_categories(mut self, enable: bool) -> Self {
        self.ints_as_categories = Some(enable);
        self
    }

    /// Enable or disable hidden numeric/boolean recovery for text columns.
    pub fn find_hidden_numerics(mut self, enable: bool) -> Self {
        self.find_hidden_numerics = Some(enable);
        self
    }

    /// Set the options forwarded to a numeric scaler.
    pub fn scaling(mut self, scaling: ScalingOptions) -> Self {
        self.scaling = Some(scaling);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `TreatmentConfig` or an error if validation fails.
    pub fn build(self) -> Result<TreatmentConfig, ConfigValidationError> {
        let defaults = TreatmentConfig::default();
        let config = TreatmentConfig {
            index_feature: self.index_feature,
            target_feature: self.target_feature,
            target_kind: self.target_kind.unwrap_or_default(),
            missing_value_strategy: self.missing_value_strategy.unwrap_or_default(),
            numerical_fill_value: self
                .numerical_fill_value
                .unwrap_or(defaults.numerical_fill_value),
            categorical_fill_value: self
                .categorical_fill_value
                .unwrap_or(defaults.categorical_fill_value),
            rare_level_threshold: self
                .rare_level_threshold
                .unwrap_or(defaults.rare_level_threshold),
            max_rare_percentage: self
                .max_rare_percentage
                .unwrap_or(defaults.max_rare_percentage),
            exclude_zero_variance: self.exclude_zero_variance.unwrap_or(true),
            floats_to_ints: self.floats_to_ints.unwrap_or(false),
            ints_as_categories: self.ints_as_categories.unwrap_or(true),
            find_hidden_numerics: self.find_hidden_numerics.unwrap_or(false),
            scaling: self.scaling.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TreatmentConfig::default();
        assert_eq!(config.numerical_fill_value, -1.0);
        assert_eq!(config.categorical_fill_value, "NA");
        assert_eq!(config.rare_level_threshold, 0.02);
        assert_eq!(config.max_rare_percentage, 0.1);
        assert_eq!(config.missing_value_strategy, MissingValueStrategy::Systematic);
        assert_eq!(config.target_kind, TargetKind::Categorical);
        assert!(config.exclude_zero_variance);
        assert!(!config.floats_to_ints);
        assert!(config.ints_as_categories);
        assert!(!config.find_hidden_numerics);
    }

    #[test]
    fn test_excluded_columns() {
        let config = TreatmentConfig::builder()
            .target_feature("label")
            .build()
            .unwrap();
        assert_eq!(config.excluded_columns().collect::<Vec<_>>(), vec!["label"]);

        let config = TreatmentConfig::builder()
            .index_feature("id")
            .target_feature("label")
            .build()
            .unwrap();
        assert_eq!(config.excluded_columns().collect::<Vec<_>>(), vec!["id", "label"]);
        assert_eq!(TreatmentConfig::default().excluded_columns().count(), 0);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = TreatmentConfig::builder().build().unwrap();
        assert_eq!(config, TreatmentConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = TreatmentConfig::builder()
            .index_feature("id")
            .target_feature("label")
            .target_kind(TargetKind::Numerical)
            .missing_value_strategy(MissingValueStrategy::Random)
            .numerical_fill_value(-999.0)
            .categorical_fill_value("missing")
            .rare_level_threshold(0.05)
            .max_rare_percentage(0.2)
            .exclude_zero_variance(false)
            .floats_to_ints(true)
            .find_hidden_numerics(true)
            .build()
            .unwrap();

        assert_eq!(config.index_feature.as_deref(), Some("id"));
        assert_eq!(config.target_feature.as_deref(), Some("label"));
        assert_eq!(config.target_kind, TargetKind::Numerical);
        assert_eq!(config.missing_value_strategy, MissingValueStrategy::Random);
        assert_eq!(config.numerical_fill_value, -999.0);
        assert_eq!(config.categorical_fill_value, "missing");
        assert_eq!(config.rare_level_threshold, 0.05);
        assert_eq!(config.max_rare_percentage, 0.2);
        assert!(!config.exclude_zero_variance);
        assert!(config.floats_to_ints);
        assert!(config.find_hidden_numerics);
    }

    #[test]
    fn test_integer_fill_value_truncates() {
        let config = TreatmentConfig::builder()
            .numerical_fill_value(-1.7)
            .build()
            .unwrap();
        assert_eq!(config.integer_fill_value(), -1);

        let config = TreatmentConfig::builder()
            .numerical_fill_value(2.9)
            .build()
            .unwrap();
        assert_eq!(config.integer_fill_value(), 2);
    }

    #[test]
    fn test_validation_invalid_rare_threshold() {
        let result = TreatmentConfig::builder().rare_level_threshold(1.5).build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_invalid_max_rare_percentage() {
        let result = TreatmentConfig::builder().max_rare_percentage(-0.1).build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_non_finite_fill_value() {
        let result = TreatmentConfig::builder()
            .numerical_fill_value(f64::NAN)
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::NonFiniteFillValue(_)
        ));
    }

    #[test]
    fn test_validation_index_is_target() {
        let result = TreatmentConfig::builder()
            .index_feature("id")
            .target_feature("id")
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::IndexIsTarget(_)
        ));
    }

    #[test]
    fn test_inverted_rare_thresholds_are_allowed() {
        let config = TreatmentConfig::builder()
            .rare_level_threshold(0.3)
            .max_rare_percentage(0.1)
            .build()
            .unwrap();

        assert!(config.has_inverted_rare_thresholds());
        assert!(!TreatmentConfig::default().has_inverted_rare_thresholds());
    }

    #[test]
    fn test_config_serialization() {
        let config = TreatmentConfig::builder()
            .target_feature("label")
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: TreatmentConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "index_feature": "id",
            "target_feature": "target",
            "missing_value_strategy": "Random",
            "rare_level_threshold": 0.2
        }"#;

        let config: TreatmentConfig =
            serde_json::from_str(json).expect("Should deserialize partial JSON");

        assert_eq!(config.index_feature.as_deref(), Some("id"));
        assert_eq!(config.target_feature.as_deref(), Some("target"));
        assert_eq!(config.missing_value_strategy, MissingValueStrategy::Random);
        assert_eq!(config.rare_level_threshold, 0.2);
        // Unspecified fields fall back to defaults
        assert_eq!(config.max_rare_percentage, 0.1);
        assert_eq!(config.categorical_fill_value, "NA");
    }

    #[test]
    fn test_from_json_validates() {
        let config = TreatmentConfig::from_json(r#"{"floats_to_ints": true}"#).unwrap();
        assert!(config.floats_to_ints);

        let err = TreatmentConfig::from_json(r#"{"max_rare_percentage": 1.5}"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let err = TreatmentConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.error_code(), "JSON_ERROR");
    }
}
