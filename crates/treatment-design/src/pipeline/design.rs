//! Treatment design orchestration.
//!
//! [`TreatmentDesign`] runs the fit-time analysis over a table and produces a
//! [`FittedState`]. The fitted state is an immutable value that replays the
//! learned decisions on new tables through [`FittedState::transform`].

use polars::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cleaner::{FloatToIntCaster, HiddenTypeRecoverer, coerce_to_bucket};
use crate::config::{ConfigValidationError, TreatmentConfig};
use crate::error::{Result, ResultExt, TreatmentError};
use crate::imputers::{FillPlan, MissingValueFiller};
use crate::pipeline::ColumnReindexer;
use crate::profiler::{ColumnClassifier, DtypeClassifier};
use crate::quality::{CardinalitySplitter, ZeroVarianceDetector};
use crate::scaling::{NumericScaler, ScalingOptions, ScalingRequest};
use crate::types::{
    Bucket, BucketAssignment, CardinalitySplit, RecoveredColumn, SkippedColumn, TreatmentStage,
    TreatmentSummary,
};
use crate::utils::column_names;

/// Learns how to treat the columns of a table.
///
/// Use [`TreatmentDesign::builder()`] to create one with a custom
/// configuration or classifier.
///
/// # Example
///
/// ```rust,ignore
/// use treatment_design::{TreatmentConfig, TreatmentDesign};
///
/// let config = TreatmentConfig::builder()
///     .index_feature("id")
///     .target_feature("label")
///     .find_hidden_numerics(true)
///     .build()?;
///
/// let mut design = TreatmentDesign::builder().config(config).build()?;
/// let fitted = design.fit(&train)?;
/// println!("treatment columns: {:?}", fitted.treatment_columns());
///
/// let treated = design.transform(&test)?;
/// ```
pub struct TreatmentDesign {
    config: TreatmentConfig,
    classifier: Arc<dyn ColumnClassifier>,
    fitted: Option<FittedState>,
}

static_assertions::assert_impl_all!(TreatmentDesign: Send);

impl TreatmentDesign {
    /// Create a new design builder.
    pub fn builder() -> TreatmentDesignBuilder {
        TreatmentDesignBuilder::default()
    }

    pub fn config(&self) -> &TreatmentConfig {
        &self.config
    }

    /// State learned by the most recent successful [`fit`](Self::fit).
    pub fn fitted(&self) -> Option<&FittedState> {
        self.fitted.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Learn the treatment of `df`.
    ///
    /// The caller's table is never modified. Every call starts from scratch
    /// and replaces the state kept by this design; the returned value is
    /// independent of later fits.
    pub fn fit(&mut self, df: &DataFrame) -> Result<FittedState> {
        let start_time = Instant::now();
        info!(
            "Fitting treatment design on {} rows x {} columns",
            df.height(),
            df.width()
        );

        let state = self.fit_internal(df)?;

        info!(
            "Treatment design fitted in {:.2?}: {} treatment columns, {} diagnostics",
            start_time.elapsed(),
            state.treatment_columns.len(),
            state.diagnostics.len()
        );

        self.fitted = Some(state.clone());
        Ok(state)
    }

    /// Apply the most recently fitted state to `df`.
    ///
    /// Returns [`TreatmentError::NotFitted`] if [`fit`](Self::fit) has not
    /// succeeded yet.
    pub fn transform(&self, df: &DataFrame) -> Result<Transformed> {
        self.fitted
            .as_ref()
            .ok_or(TreatmentError::NotFitted)?
            .transform(df)
    }

    fn validate_table(&self, df: &DataFrame) -> Result<()> {
        self.config.validate()?;

        if df.width() == 0 {
            return Err(TreatmentError::SchemaMismatch(
                "table has no columns".to_string(),
            ));
        }

        for name in self.config.excluded_columns() {
            if df.column(name).is_err() {
                return Err(TreatmentError::ColumnNotFound(name.to_string()));
            }
        }

        if self.config.has_inverted_rare_thresholds() {
            warn!(
                "rare_level_threshold ({}) exceeds max_rare_percentage ({})",
                self.config.rare_level_threshold, self.config.max_rare_percentage
            );
        }

        Ok(())
    }

    fn classify(
        &self,
        df: &DataFrame,
        excluded: &[String],
        diagnostics: &mut Vec<SkippedColumn>,
    ) -> Result<BucketAssignment> {
        let buckets = self.classifier.classify_columns(df, excluded);

        for name in buckets.unclassified() {
            let dtype = df.column(name)?.dtype();
            diagnostics.push(SkippedColumn::new(
                name.as_str(),
                TreatmentStage::DtypeClassification,
                format!("dtype {:?} maps to no bucket", dtype),
            ));
        }

        Ok(buckets)
    }

    fn fit_internal(&self, df: &DataFrame) -> Result<FittedState> {
        let config = &self.config;
        self.validate_table(df)?;

        let mut working = df.clone();
        let mut diagnostics = Vec::new();
        let excluded: Vec<String> = config
            .excluded_columns()
            .map(str::to_string)
            .collect();

        let columns_with_missing: Vec<String> = working
            .get_columns()
            .iter()
            .filter(|column| column.null_count() > 0)
            .map(|column| column.name().to_string())
            .collect();
        debug!("Columns with missing values: {:?}", columns_with_missing);

        // Step 1: Classify by dtype, recovering hidden numerics first if asked
        info!("Step 1: Classifying columns");
        let (buckets, recovered) = if config.find_hidden_numerics {
            let initial = self.classifier.classify_columns(&working, &excluded);
            let text = initial.columns(Bucket::Text).to_vec();
            let recovered = HiddenTypeRecoverer::recover(&mut working, &text, &mut diagnostics)?;
            (self.classify(&working, &excluded, &mut diagnostics)?, recovered)
        } else {
            (self.classify(&working, &excluded, &mut diagnostics)?, Vec::new())
        };

        let names = column_names(&working);
        let removable: Vec<String> = names
            .iter()
            .filter(|name| buckets.bucket_of(name).is_some_and(|b| b.is_removable()))
            .cloned()
            .collect();
        debug!("Removable columns: {:?}", removable);

        // Step 2: Fill missing values
        info!("Step 2: Filling missing values");
        let fill_plan = MissingValueFiller::plan(&working, &buckets, config)?;
        MissingValueFiller::apply(&mut working, &fill_plan, &mut diagnostics)
            .context("Failed to fill missing values")?;

        // Step 3: Zero variance
        info!("Step 3: Detecting zero-variance columns");
        let zero_variance = ZeroVarianceDetector::new(config.exclude_zero_variance).detect(
            &working,
            &buckets,
            &mut diagnostics,
        )?;

        let dropped: HashSet<&str> = excluded
            .iter()
            .chain(&removable)
            .chain(&zero_variance)
            .map(String::as_str)
            .collect();
        let treatment_columns: Vec<String> = names
            .iter()
            .filter(|name| !dropped.contains(name.as_str()))
            .cloned()
            .collect();

        // Step 4: Float columns that only hold whole numbers
        let integer_castable = if config.floats_to_ints {
            info!("Step 4: Finding integer-castable float columns");
            let floats = Self::surviving(buckets.columns(Bucket::Float), &zero_variance);
            FloatToIntCaster::find_castable(&working, &floats, &mut diagnostics)?
        } else {
            info!("Step 4: Skipping float to integer detection (disabled)");
            Vec::new()
        };

        // Step 5: Cardinality split of the remaining text columns
        info!("Step 5: Splitting text columns by cardinality");
        let text = Self::surviving(buckets.columns(Bucket::Text), &zero_variance);
        let cardinality = CardinalitySplitter::new(
            config.rare_level_threshold,
            config.max_rare_percentage,
        )
        .split(&working, &text, &mut diagnostics)?;

        // Step 6: Identifier first, target last
        info!("Step 6: Reordering columns");
        let table = ColumnReindexer::reorder(
            &working,
            config.index_feature.as_deref(),
            config.target_feature.as_deref(),
        )?;

        Ok(FittedState {
            config: config.clone(),
            rows: df.height(),
            columns: column_names(df),
            excluded,
            removable,
            zero_variance,
            treatment_columns,
            buckets,
            recovered,
            fill_plan,
            integer_castable,
            cardinality,
            columns_with_missing,
            diagnostics,
            table,
        })
    }

    fn surviving(columns: &[String], zero_variance: &[String]) -> Vec<String> {
        columns
            .iter()
            .filter(|name| !zero_variance.contains(*name))
            .cloned()
            .collect()
    }
}

/// Builder for [`TreatmentDesign`].
#[derive(Default)]
pub struct TreatmentDesignBuilder {
    config: Option<TreatmentConfig>,
    classifier: Option<Arc<dyn ColumnClassifier>>,
}

static_assertions::assert_impl_all!(TreatmentDesignBuilder: Send);

impl TreatmentDesignBuilder {
    /// Set the design configuration.
    pub fn config(mut self, config: TreatmentConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the dtype classifier.
    ///
    /// Defaults to [`DtypeClassifier`].
    pub fn classifier(mut self, classifier: Arc<dyn ColumnClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Build the design.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<TreatmentDesign, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(TreatmentDesign {
            config,
            classifier: self.classifier.unwrap_or_else(|| Arc::new(DtypeClassifier)),
            fitted: None,
        })
    }
}

// ============================================================================
// Fitted state
// ============================================================================

/// Everything learned by one fit.
#[derive(Debug, Clone)]
pub struct FittedState {
    config: TreatmentConfig,
    rows: usize,
    columns: Vec<String>,
    excluded: Vec<String>,
    removable: Vec<String>,
    zero_variance: Vec<String>,
    treatment_columns: Vec<String>,
    buckets: BucketAssignment,
    recovered: Vec<RecoveredColumn>,
    fill_plan: FillPlan,
    integer_castable: Vec<String>,
    cardinality: CardinalitySplit,
    columns_with_missing: Vec<String>,
    diagnostics: Vec<SkippedColumn>,
    table: DataFrame,
}

static_assertions::assert_impl_all!(FittedState: Send);

/// Output of [`FittedState::transform`].
#[derive(Debug, Clone)]
pub struct Transformed {
    pub df: DataFrame,
    pub diagnostics: Vec<SkippedColumn>,
}

impl FittedState {
    pub fn config(&self) -> &TreatmentConfig {
        &self.config
    }

    /// Identifier and target columns present in the fitted table.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Datetime, time zone and time-delta columns set aside.
    pub fn removable(&self) -> &[String] {
        &self.removable
    }

    pub fn zero_variance(&self) -> &[String] {
        &self.zero_variance
    }

    /// Columns kept for treatment, in table order.
    pub fn treatment_columns(&self) -> &[String] {
        &self.treatment_columns
    }

    pub fn buckets(&self) -> &BucketAssignment {
        &self.buckets
    }

    pub fn recovered(&self) -> &[RecoveredColumn] {
        &self.recovered
    }

    pub fn fill_plan(&self) -> &FillPlan {
        &self.fill_plan
    }

    pub fn integer_castable(&self) -> &[String] {
        &self.integer_castable
    }

    pub fn high_cardinality(&self) -> &[String] {
        &self.cardinality.high_cardinality
    }

    pub fn categorical(&self) -> &[String] {
        &self.cardinality.categorical
    }

    pub fn cardinality(&self) -> &CardinalitySplit {
        &self.cardinality
    }

    /// Columns that had missing values in the fitted table.
    pub fn columns_with_missing(&self) -> &[String] {
        &self.columns_with_missing
    }

    pub fn diagnostics(&self) -> &[SkippedColumn] {
        &self.diagnostics
    }

    /// The fitted table after recovery, filling and reordering.
    ///
    /// Integer-castable floats are still stored as floats here.
    pub fn table(&self) -> &DataFrame {
        &self.table
    }

    /// Serializable overview of the fit.
    pub fn summary(&self) -> TreatmentSummary {
        TreatmentSummary {
            rows: self.rows,
            columns: self.columns.clone(),
            excluded: self.excluded.clone(),
            removable: self.removable.clone(),
            zero_variance: self.zero_variance.clone(),
            treatment_columns: self.treatment_columns.clone(),
            buckets: self.buckets.clone(),
            recovered: self.recovered.clone(),
            fill_values: self.fill_plan.values(),
            integer_castable: self.integer_castable.clone(),
            high_cardinality: self.cardinality.high_cardinality.clone(),
            categorical: self.cardinality.categorical.clone(),
            columns_with_missing: self.columns_with_missing.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    /// Treated float columns a numeric scaler should receive.
    ///
    /// Integer-castable columns are left out since they become integers.
    pub fn scaling_request(&self, options: &ScalingOptions) -> ScalingRequest {
        let columns = self
            .buckets
            .columns(Bucket::Float)
            .iter()
            .filter(|name| self.treatment_columns.contains(*name))
            .filter(|name| !self.integer_castable.contains(*name))
            .cloned()
            .collect();

        ScalingRequest {
            columns,
            options: *options,
        }
    }

    /// Hand the treated float columns of `df` to `scaler`.
    ///
    /// Uses the configured scaling options and returns `df` unchanged when
    /// they ask for nothing.
    pub fn scale(&self, df: DataFrame, scaler: &dyn NumericScaler) -> Result<DataFrame> {
        let request = self.scaling_request(&self.config.scaling);
        if request.options.is_noop() || request.columns.is_empty() {
            debug!("No scaling requested");
            return Ok(df);
        }

        info!("Scaling {} float columns", request.columns.len());
        scaler.scale(df, &request)
    }

    /// Apply the learned decisions to a new table.
    ///
    /// Recovered text columns are coerced leniently (unparseable values
    /// become missing), then the fill plan is replayed with the values learned
    /// during fit, integer-castable columns are cast and the identifier and
    /// target columns are moved to the ends. Columns the fit knew about but
    /// `df` lacks are reported in the diagnostics.
    pub fn transform(&self, df: &DataFrame) -> Result<Transformed> {
        info!("Transforming {} rows x {} columns", df.height(), df.width());

        let mut working = df.clone();
        let mut diagnostics = Vec::new();

        for recovered in &self.recovered {
            self.replay_recovery(&mut working, recovered, &mut diagnostics)?;
        }

        MissingValueFiller::apply(&mut working, &self.fill_plan, &mut diagnostics)
            .context("Failed to fill missing values")?;

        if !self.integer_castable.is_empty() {
            FloatToIntCaster::cast(&mut working, &self.integer_castable, &mut diagnostics)?;
        }

        let df = ColumnReindexer::reorder(
            &working,
            self.config.index_feature.as_deref(),
            self.config.target_feature.as_deref(),
        )?;

        if !diagnostics.is_empty() {
            warn!("Transform skipped {} column operations", diagnostics.len());
        }

        Ok(Transformed { df, diagnostics })
    }

    fn replay_recovery(
        &self,
        df: &mut DataFrame,
        recovered: &RecoveredColumn,
        diagnostics: &mut Vec<SkippedColumn>,
    ) -> Result<()> {
        let name = recovered.column.as_str();
        let Ok(column) = df.column(name) else {
            diagnostics.push(SkippedColumn::new(
                name,
                TreatmentStage::HiddenTypeRecovery,
                "column not present",
            ));
            return Ok(());
        };

        match coerce_to_bucket(column.as_materialized_series(), recovered.bucket) {
            Ok(series) => {
                df.replace(name, series)?;
            }
            Err(e) => diagnostics.push(SkippedColumn::new(
                name,
                TreatmentStage::HiddenTypeRecovery,
                e.to_string(),
            )),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingValueStrategy;
    use crate::types::FillValue;
    use pretty_assertions::assert_eq;

    fn design(config: TreatmentConfig) -> TreatmentDesign {
        TreatmentDesign::builder().config(config).build().unwrap()
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let design = design(TreatmentConfig::default());
        let df = df!["a" => [1, 2]].unwrap();

        let err = design.transform(&df).unwrap_err();
        assert!(err.is_not_fitted());
        assert!(!design.is_fitted());
    }

    #[test]
    fn test_missing_target_is_column_not_found() {
        let mut design = design(TreatmentConfig::builder().target_feature("label").build().unwrap());
        let df = df!["a" => [1, 2]].unwrap();

        let err = design.fit(&df).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
        assert!(design.fitted().is_none());
    }

    #[test]
    fn test_missing_index_is_column_not_found() {
        let mut design = design(TreatmentConfig::builder().index_feature("id").build().unwrap());
        let df = df!["a" => [1, 2]].unwrap();

        let err = design.fit(&df).unwrap_err();
        assert!(matches!(err, TreatmentError::ColumnNotFound(ref name) if name == "id"));
        assert!(design.fitted().is_none());
    }

    #[test]
    fn test_empty_table_is_schema_mismatch() {
        let mut design = design(TreatmentConfig::default());
        let err = design.fit(&DataFrame::empty()).unwrap_err();
        assert!(matches!(err, TreatmentError::SchemaMismatch(_)));
    }

    #[test]
    fn test_fit_does_not_modify_input() {
        let df = df![
            "f" => [Some(1.5), None, Some(2.5)],
            "t" => [Some("a"), None, Some("b")],
        ]
        .unwrap();
        let before = df.clone();

        let mut design = design(TreatmentConfig::default());
        let fitted = design.fit(&df).unwrap();

        assert!(df.equals_missing(&before));
        assert_eq!(fitted.table().column("f").unwrap().null_count(), 0);
        assert_eq!(fitted.columns_with_missing(), ["f".to_string(), "t".to_string()]);
    }

    #[test]
    fn test_unclassified_columns_reported_but_kept() {
        let clock = Series::new("clock".into(), &[0i64, 1, 2])
            .cast(&DataType::Time)
            .unwrap();
        let mut df = df!["n" => [1.0, 2.0, 3.0]].unwrap();
        df.with_column(clock).unwrap();

        let fitted = design(TreatmentConfig::default()).fit(&df).unwrap();

        assert_eq!(fitted.treatment_columns(), ["n".to_string(), "clock".to_string()]);
        assert!(fitted.diagnostics().iter().any(|d| {
            d.column == "clock" && d.stage == TreatmentStage::DtypeClassification
        }));
    }

    #[test]
    fn test_second_fit_is_independent() {
        let mut design = design(TreatmentConfig::default());
        let first = design.fit(&df!["a" => [1.0, 2.0]].unwrap()).unwrap();
        let second = design.fit(&df!["b" => ["x", "y"]].unwrap()).unwrap();

        assert_eq!(first.treatment_columns(), ["a".to_string()]);
        assert_eq!(second.treatment_columns(), ["b".to_string()]);
        assert_eq!(
            design.fitted().unwrap().treatment_columns(),
            ["b".to_string()]
        );
    }

    #[test]
    fn test_random_fill_mean_reused_in_transform() {
        let config = TreatmentConfig::builder()
            .missing_value_strategy(MissingValueStrategy::Random)
            .build()
            .unwrap();
        let mut design = design(config);
        design
            .fit(&df!["f" => [Some(1.0), Some(3.0), None]].unwrap())
            .unwrap();

        let treated = design
            .transform(&df!["f" => [Some(100.0), None]].unwrap())
            .unwrap();

        let values: Vec<Option<f64>> = treated.df.column("f").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(100.0), Some(2.0)]);
        assert_eq!(
            design.fitted().unwrap().fill_plan().value_for("f"),
            Some(&FillValue::Float(2.0))
        );
    }

    #[test]
    fn test_transform_keeps_float_when_new_values_are_not_whole() {
        let config = TreatmentConfig::builder().floats_to_ints(true).build().unwrap();
        let mut design = design(config);
        let fitted = design
            .fit(&df!["f" => [Some(1.0), Some(2.0), None]].unwrap())
            .unwrap();
        assert_eq!(fitted.integer_castable(), ["f".to_string()]);

        let treated = design.transform(&df!["f" => [f64::NAN, 3.0]].unwrap()).unwrap();

        let column = treated.df.column("f").unwrap();
        assert_eq!(column.dtype(), &DataType::Float64);
        assert_eq!(column.null_count(), 0);
        assert_eq!(treated.diagnostics.len(), 1);
        assert_eq!(treated.diagnostics[0].stage, TreatmentStage::FloatToInt);
    }

    #[test]
    fn test_transform_reports_absent_columns() {
        let mut design = design(TreatmentConfig::default());
        design
            .fit(&df!["f" => [Some(1.0), None], "t" => [Some("a"), None]].unwrap())
            .unwrap();

        let treated = design.transform(&df!["f" => [Some(1.0), None]].unwrap()).unwrap();

        assert_eq!(treated.df.width(), 1);
        assert_eq!(treated.diagnostics.len(), 1);
        assert_eq!(treated.diagnostics[0].column, "t");
    }

    #[test]
    fn test_scaling_request_lists_surviving_floats() {
        let config = TreatmentConfig::builder()
            .floats_to_ints(true)
            .build()
            .unwrap();
        let df = df![
            "whole" => [1.0, 2.0, 3.0],
            "frac" => [0.5, 1.5, 2.5],
            "flat" => [1.5, 1.5, 1.5],
        ]
        .unwrap();
        let fitted = design(config).fit(&df).unwrap();

        let options = ScalingOptions {
            scale: true,
            ..Default::default()
        };
        let request = fitted.scaling_request(&options);

        assert_eq!(request.columns, vec!["frac".to_string()]);
        assert!(request.options.scale);
    }

    struct DoublingScaler;

    impl NumericScaler for DoublingScaler {
        fn scale(&self, mut df: DataFrame, request: &ScalingRequest) -> Result<DataFrame> {
            for name in &request.columns {
                let doubled = df.column(name)?.as_materialized_series() * 2.0;
                df.replace(name, doubled)?;
            }
            Ok(df)
        }
    }

    #[test]
    fn test_scale_uses_configured_options() {
        let df = df!["frac" => [0.5, 1.5]].unwrap();

        let noop = design(TreatmentConfig::default()).fit(&df).unwrap();
        let unchanged = noop.scale(df.clone(), &DoublingScaler).unwrap();
        assert!(unchanged.equals(&df));

        let config = TreatmentConfig::builder()
            .scaling(ScalingOptions {
                normalize: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        let fitted = design(config).fit(&df).unwrap();
        let scaled = fitted.scale(df, &DoublingScaler).unwrap();
        assert_eq!(scaled.column("frac").unwrap().f64().unwrap().get(1), Some(3.0));
    }
}
