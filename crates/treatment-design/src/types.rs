//! Shared data model for treatment decisions and diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Buckets
// ============================================================================

/// Semantic type of a column as far as treatment design is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Free text / object values.
    Text,
    /// True/false values.
    Boolean,
    /// Whole numbers.
    Integer,
    /// Floating point numbers.
    Float,
    /// Values already stored as a categorical type.
    Categorical,
    /// Text with too many rare levels to pool.
    HighCardinality,
    /// Dates and naive datetimes.
    Datetime,
    /// Datetimes carrying a time zone.
    DatetimeTz,
    /// Durations.
    TimeDelta,
}

impl Bucket {
    /// Get a human-readable display name for the bucket.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Categorical => "Categorical",
            Self::HighCardinality => "High Cardinality",
            Self::Datetime => "Datetime",
            Self::DatetimeTz => "Datetime (time zone)",
            Self::TimeDelta => "Time Delta",
        }
    }

    /// Buckets not yet supported downstream; their columns are set aside.
    pub fn is_removable(&self) -> bool {
        matches!(self, Self::Datetime | Self::DatetimeTz | Self::TimeDelta)
    }

    /// Buckets whose columns receive a missing-value fill.
    pub fn is_fill_tracked(&self) -> bool {
        matches!(
            self,
            Self::Text | Self::Categorical | Self::Integer | Self::Float
        )
    }
}

/// Mapping from column name to exactly one [`Bucket`].
///
/// Names inside each bucket keep the table's column order. The assignment is
/// rebuilt from scratch whenever column types change rather than patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAssignment {
    buckets: BTreeMap<Bucket, Vec<String>>,
    /// Columns whose dtype maps to no bucket.
    unclassified: Vec<String>,
}

impl BucketAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `column` to `bucket`, removing it from any previous bucket.
    pub fn insert(&mut self, column: impl Into<String>, bucket: Bucket) {
        let column = column.into();
        self.remove(&column);
        self.buckets.entry(bucket).or_default().push(column);
    }

    /// Record a column that belongs to no bucket.
    pub fn insert_unclassified(&mut self, column: impl Into<String>) {
        let column = column.into();
        self.remove(&column);
        self.unclassified.push(column);
    }

    fn remove(&mut self, column: &str) {
        for names in self.buckets.values_mut() {
            names.retain(|name| name != column);
        }
        self.unclassified.retain(|name| name != column);
    }

    /// Columns assigned to `bucket`, in table order.
    pub fn columns(&self, bucket: Bucket) -> &[String] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The bucket `column` belongs to, if any.
    pub fn bucket_of(&self, column: &str) -> Option<Bucket> {
        self.buckets
            .iter()
            .find(|(_, names)| names.iter().any(|name| name == column))
            .map(|(bucket, _)| *bucket)
    }

    pub fn unclassified(&self) -> &[String] {
        &self.unclassified
    }

    /// Iterate over `(column, bucket)` pairs grouped by bucket.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Bucket)> {
        self.buckets
            .iter()
            .flat_map(|(bucket, names)| names.iter().map(move |name| (name.as_str(), *bucket)))
    }

    /// Number of classified columns.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Per-column outcomes
// ============================================================================

/// Pipeline stage that produced a per-column decision or skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStage {
    DtypeClassification,
    HiddenTypeRecovery,
    MissingValueFill,
    ZeroVariance,
    CardinalitySplit,
    FloatToInt,
}

impl TreatmentStage {
    /// Get a human-readable display name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DtypeClassification => "Dtype Classification",
            Self::HiddenTypeRecovery => "Hidden Type Recovery",
            Self::MissingValueFill => "Missing Value Fill",
            Self::ZeroVariance => "Zero Variance",
            Self::CardinalitySplit => "Cardinality Split",
            Self::FloatToInt => "Float To Int",
        }
    }
}

/// A column a stage could not process. The stage carried on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedColumn {
    pub column: String,
    pub stage: TreatmentStage,
    pub reason: String,
}

impl SkippedColumn {
    pub fn new(column: impl Into<String>, stage: TreatmentStage, reason: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            stage,
            reason: reason.into(),
        }
    }
}

/// Result of running a single-column check.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome<T> {
    /// The check ran and produced a value.
    Done(T),
    /// The check could not run for this column.
    Skipped(String),
}

impl<T> ColumnOutcome<T> {
    /// Convert into an `Option`, recording the skip reason under `stage`.
    pub fn record(
        self,
        column: &str,
        stage: TreatmentStage,
        diagnostics: &mut Vec<SkippedColumn>,
    ) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Skipped(reason) => {
                tracing::debug!(
                    "{}: skipping column '{}': {}",
                    stage.display_name(),
                    column,
                    reason
                );
                diagnostics.push(SkippedColumn::new(column, stage, reason));
                None
            }
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for ColumnOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Done(value),
            Err(e) => Self::Skipped(e.to_string()),
        }
    }
}

// ============================================================================
// Learned decisions
// ============================================================================

/// Constant written into the missing entries of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FillValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => write!(f, "'{}'", value),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
        }
    }
}

/// A text column recovered as another type during fit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredColumn {
    pub column: String,
    /// Bucket the column was promoted to: Integer, Float or Boolean.
    pub bucket: Bucket,
}

/// Rare-level statistics for one text column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardinalityProfile {
    pub column: String,
    pub distinct_count: usize,
    /// Share of rows occupied by rare levels (1.0 when every row is unique).
    pub rare_percent: f64,
    /// Rare levels, sorted. Empty when every row is unique.
    pub rare_levels: Vec<String>,
    pub bucket: Bucket,
}

/// Partition of text columns into high-cardinality and categorical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardinalitySplit {
    pub high_cardinality: Vec<String>,
    pub categorical: Vec<String>,
    pub profiles: Vec<CardinalityProfile>,
}

// ============================================================================
// Summary
// ============================================================================

/// Serializable overview of a fitted design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    pub excluded: Vec<String>,
    pub removable: Vec<String>,
    pub zero_variance: Vec<String>,
    pub treatment_columns: Vec<String>,
    pub buckets: BucketAssignment,
    pub recovered: Vec<RecoveredColumn>,
    pub fill_values: BTreeMap<String, FillValue>,
    pub integer_castable: Vec<String>,
    pub high_cardinality: Vec<String>,
    pub categorical: Vec<String>,
    pub columns_with_missing: Vec<String>,
    pub diagnostics: Vec<SkippedColumn>,
}

impl TreatmentSummary {
    /// Pretty-printed JSON form of the summary.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
