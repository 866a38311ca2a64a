//! Column reordering.

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::utils::column_names;

/// Moves single columns to the front or back of a table.
///
/// Every operation keeps the same columns and rows and only changes their
/// order. Naming a column that is not present is a no-op.
pub struct ColumnReindexer;

impl ColumnReindexer {
    /// Move `name` to the first position.
    pub fn move_to_front(df: &DataFrame, name: &str) -> Result<DataFrame> {
        Self::reorder(df, Some(name), None)
    }

    /// Move `name` to the last position.
    pub fn move_to_back(df: &DataFrame, name: &str) -> Result<DataFrame> {
        Self::reorder(df, None, Some(name))
    }

    /// Put `front` first and `back` last, leaving the rest in table order.
    pub fn reorder(df: &DataFrame, front: Option<&str>, back: Option<&str>) -> Result<DataFrame> {
        let order = Self::ordered_names(&column_names(df), front, back);
        debug!("Reordering columns: front={:?} back={:?}", front, back);
        Ok(df.select(order)?)
    }

    /// Column order after moving `front` and `back`. Absent names are ignored.
    pub fn ordered_names(names: &[String], front: Option<&str>, back: Option<&str>) -> Vec<String> {
        let front = front.filter(|f| names.iter().any(|n| n.as_str() == *f));
        let back = back.filter(|b| names.iter().any(|n| n.as_str() == *b) && Some(*b) != front);

        let mut order = Vec::with_capacity(names.len());
        order.extend(front.map(str::to_string));
        order.extend(
            names
                .iter()
                .filter(|n| Some(n.as_str()) != front && Some(n.as_str()) != back)
                .cloned(),
        );
        order.extend(back.map(str::to_string));
        order
    }
}
