//! Positional column pruning.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::DataSet;

/// A set of column positions to remove from a table.
///
/// Non-negative positions count from the start (`0` is the first column); negative positions
/// count from the end (`-1` is the last column). Every position of one pass is resolved against
/// the column count of the table being pruned, so `[0, -1]` on a 12-column table removes
/// columns 0 and 11. Positions outside the table are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropPositions(Vec<i64>);

impl DropPositions {
    pub fn new(positions: Vec<i64>) -> Self {
        Self(positions)
    }

    /// No positions; pruning leaves tables unchanged.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The positions as given, including duplicates and out-of-range entries.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Resolve against `column_count`, dropping anything out of range.
    pub fn resolve(&self, column_count: usize) -> BTreeSet<usize> {
        self.0
            .iter()
            .filter_map(|&pos| resolve_position(pos, column_count))
            .collect()
    }

    /// Indices that survive pruning, in ascending order.
    pub fn kept_indices(&self, column_count: usize) -> Vec<usize> {
        let dropped = self.resolve(column_count);
        (0..column_count).filter(|i| !dropped.contains(i)).collect()
    }
}

impl From<Vec<i64>> for DropPositions {
    fn from(positions: Vec<i64>) -> Self {
        Self(positions)
    }
}

fn resolve_position(pos: i64, column_count: usize) -> Option<usize> {
    let count = i64::try_from(column_count).ok()?;
    let idx = if pos < 0 { count + pos } else { pos };
    if (0..count).contains(&idx) {
        usize::try_from(idx).ok()
    } else {
        None
    }
}

/// Returns a copy of `dataset` without the columns named by `positions`.
///
/// Row order and count are preserved.
pub fn drop_columns(dataset: &DataSet, positions: &DropPositions) -> DataSet {
    if positions.is_empty() {
        return dataset.clone();
    }
    dataset.select_columns(&positions.kept_indices(dataset.column_count()))
}

#[cfg(test)]
mod tests {
    use super::{drop_columns, DropPositions};
    use crate::types::{DataSet, Schema, Value};

    fn wide_dataset(columns: usize) -> DataSet {
        let names: Vec<String> = (0..columns).map(|i| format!("c{i}")).collect();
        let row: Vec<Value> = (0..columns as i64).map(Value::Int64).collect();
        DataSet::new(Schema::from_names(names), vec![row.clone(), row])
    }

    #[test]
    fn negative_positions_count_from_the_end() {
        let positions = DropPositions::new(vec![-1, -2]);
        assert_eq!(positions.resolve(12).into_iter().collect::<Vec<_>>(), vec![10, 11]);
    }

    #[test]
    fn minus_one_removes_last_column_even_with_leading_drops() {
        let ds = wide_dataset(12);
        let out = drop_columns(&ds, &DropPositions::new(vec![0, 2, 3, -1]));
        assert_eq!(out.column_count(), 8);
        assert_eq!(out.schema.fields.last().unwrap().name, "c10");
        assert_eq!(out.schema.fields.first().unwrap().name, "c1");
    }

    #[test]
    fn out_of_range_positions_are_ignored() {
        let ds = wide_dataset(10);
        let out = drop_columns(&ds, &DropPositions::new(vec![999, -11]));
        assert_eq!(out, ds);
    }

    #[test]
    fn duplicate_and_aliased_positions_drop_once() {
        let ds = wide_dataset(5);
        // 4 and -1 both name the last column.
        let out = drop_columns(&ds, &DropPositions::new(vec![4, -1, 4]));
        assert_eq!(
            out.schema.field_names().collect::<Vec<_>>(),
            vec!["c0", "c1", "c2", "c3"]
        );
        assert_eq!(out.rows[0], vec![Value::Int64(0), Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
    }

    #[test]
    fn trailing_preset_on_narrow_table_keeps_what_is_left() {
        let ds = wide_dataset(6);
        let out = drop_columns(&ds, &DropPositions::new(vec![0, 2, 3, -5, -4, -3, -2, -1]));
        assert_eq!(out.column_count(), 0);
        assert_eq!(out.row_count(), 2);
    }
}
