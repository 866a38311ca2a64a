//! Dtype-based bucket classification.

use polars::prelude::*;
use tracing::debug;

use crate::types::{Bucket, BucketAssignment};
use crate::utils::{is_float_dtype, is_integer_dtype};

/// Maps a column's declared value kind to a [`Bucket`].
///
/// Implementations only look at the dtype. Returning `None` leaves the
/// column out of every bucket; downstream stages will not see it.
pub trait ColumnClassifier: Send + Sync {
    /// Bucket for a declared dtype, if it is one treatment design understands.
    fn classify(&self, dtype: &DataType) -> Option<Bucket>;

    /// Classify every column of `df` except the names in `excluded`.
    fn classify_columns(&self, df: &DataFrame, excluded: &[String]) -> BucketAssignment {
        let mut assignment = BucketAssignment::new();

        for column in df.get_columns() {
            let name = column.name().as_str();
            if excluded.iter().any(|e| e == name) {
                continue;
            }

            match self.classify(column.dtype()) {
                Some(bucket) => {
                    debug!("Column '{}' ({:?}) -> {}", name, column.dtype(), bucket.display_name());
                    assignment.insert(name, bucket);
                }
                None => {
                    debug!("Column '{}' ({:?}) has no bucket", name, column.dtype());
                    assignment.insert_unclassified(name);
                }
            }
        }

        assignment
    }
}

/// Default classifier over polars dtypes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DtypeClassifier;

impl ColumnClassifier for DtypeClassifier {
    fn classify(&self, dtype: &DataType) -> Option<Bucket> {
        match dtype {
            DataType::String => Some(Bucket::Text),
            DataType::Boolean => Some(Bucket::Boolean),
            dtype if is_integer_dtype(dtype) => Some(Bucket::Integer),
            dtype if is_float_dtype(dtype) => Some(Bucket::Float),
            DataType::Categorical(..) | DataType::Enum(..) => Some(Bucket::Categorical),
            DataType::Date | DataType::Datetime(_, None) => Some(Bucket::Datetime),
            DataType::Datetime(_, Some(_)) => Some(Bucket::DatetimeTz),
            DataType::Duration(_) => Some(Bucket::TimeDelta),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        let day = Series::new("day".into(), &[17331i32, 17332, 17333])
            .cast(&DataType::Date)
            .unwrap();
        let stamp = Series::new("stamp".into(), &[0i64, 1_000, 2_000])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let wait = Series::new("wait".into(), &[10i64, 20, 30])
            .cast(&DataType::Duration(TimeUnit::Milliseconds))
            .unwrap();
        let clock = Series::new("clock".into(), &[0i64, 1, 2])
            .cast(&DataType::Time)
            .unwrap();

        let mut df = df![
            "id" => [1, 2, 3],
            "name" => ["a", "b", "c"],
            "flag" => [true, false, true],
            "count" => [1u8, 2, 3],
            "score" => [0.5, 1.5, 2.5],
            "target" => [0, 1, 0],
        ]
        .unwrap();
        df.with_column(day).unwrap();
        df.with_column(stamp).unwrap();
        df.with_column(wait).unwrap();
        df.with_column(clock).unwrap();
        df
    }

    #[test]
    fn test_classify_dtypes() {
        let classifier = DtypeClassifier;
        assert_eq!(classifier.classify(&DataType::String), Some(Bucket::Text));
        assert_eq!(classifier.classify(&DataType::Boolean), Some(Bucket::Boolean));
        assert_eq!(classifier.classify(&DataType::UInt16), Some(Bucket::Integer));
        assert_eq!(classifier.classify(&DataType::Float32), Some(Bucket::Float));
        assert_eq!(classifier.classify(&DataType::Date), Some(Bucket::Datetime));
        assert_eq!(
            classifier.classify(&DataType::Duration(TimeUnit::Nanoseconds)),
            Some(Bucket::TimeDelta)
        );
        assert_eq!(classifier.classify(&DataType::Time), None);
        assert_eq!(classifier.classify(&DataType::Null), None);
    }

    #[test]
    fn test_classify_columns_excludes_index_and_target() {
        let df = sample_df();
        let excluded = vec!["id".to_string(), "target".to_string()];
        let buckets = DtypeClassifier.classify_columns(&df, &excluded);

        assert_eq!(buckets.bucket_of("id"), None);
        assert_eq!(buckets.bucket_of("target"), None);
        assert!(!buckets.unclassified().contains(&"id".to_string()));

        assert_eq!(buckets.columns(Bucket::Text), ["name".to_string()]);
        assert_eq!(buckets.columns(Bucket::Boolean), ["flag".to_string()]);
        assert_eq!(buckets.columns(Bucket::Integer), ["count".to_string()]);
        assert_eq!(buckets.columns(Bucket::Float), ["score".to_string()]);
        assert_eq!(buckets.columns(Bucket::Datetime), ["day".to_string(), "stamp".to_string()]);
        assert_eq!(buckets.columns(Bucket::TimeDelta), ["wait".to_string()]);
    }

    #[test]
    fn test_unsupported_dtype_is_invisible() {
        let df = sample_df();
        let buckets = DtypeClassifier.classify_columns(&df, &[]);

        assert_eq!(buckets.bucket_of("clock"), None);
        assert_eq!(buckets.unclassified(), ["clock".to_string()]);
    }

    #[test]
    fn test_every_column_in_at_most_one_bucket() {
        let df = sample_df();
        let buckets = DtypeClassifier.classify_columns(&df, &[]);

        let mut seen: Vec<&str> = buckets.iter().map(|(name, _)| name).collect();
        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), total);
        assert_eq!(total + buckets.unclassified().len(), df.width());
    }
}
