//! Split a dataset into one table per distinct value of a grouping column.

use std::collections::HashMap;

use crate::config::{DEFAULT_BASE_NAME, DEFAULT_EMPTY_GROUP_PLACEHOLDER, DEFAULT_GROUP_COLUMN};
use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, Value};

use super::columns::{drop_columns, DropPositions};

/// Options for [`partition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOptions {
    /// Grouping column header (exact match).
    pub group_column: String,
    /// Columns removed from each partition.
    pub drop_positions: DropPositions,
    /// Prefix of every partition name.
    pub base_name: String,
    /// Used when a group value is empty after [`clean_group_value`].
    pub empty_group_placeholder: String,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            group_column: DEFAULT_GROUP_COLUMN.to_string(),
            drop_positions: DropPositions::none(),
            base_name: DEFAULT_BASE_NAME.to_string(),
            empty_group_placeholder: DEFAULT_EMPTY_GROUP_PLACEHOLDER.to_string(),
        }
    }
}

/// Rows sharing one group value, with configured columns removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// `{base_name}_{cleaned group value}`.
    pub name: String,
    /// The raw group value (text form) the rows were selected by.
    pub group_value: String,
    /// Selected rows.
    pub dataset: DataSet,
    /// Position of each selected row in the input dataset, ascending.
    pub row_indices: Vec<usize>,
}

impl Partition {
    /// Fold `other`'s rows into this partition, keeping input row order.
    ///
    /// Both partitions must come from the same [`partition`] call so their schemas match.
    pub fn merge(&mut self, other: Partition) {
        debug_assert_eq!(self.dataset.schema, other.dataset.schema);
        let mut pairs: Vec<(usize, Vec<Value>)> = self
            .row_indices
            .drain(..)
            .zip(self.dataset.rows.drain(..))
            .chain(other.row_indices.into_iter().zip(other.dataset.rows))
            .collect();
        pairs.sort_by_key(|(idx, _)| *idx);
        let (row_indices, rows) = pairs.into_iter().unzip();
        self.row_indices = row_indices;
        self.dataset.rows = rows;
    }
}

/// Replace embedded line breaks with a single space and trim surrounding whitespace.
pub fn clean_group_value(raw: &str) -> String {
    raw.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Replace path separators and NUL with `-`.
///
/// Applied to every output name when it is built, so collision handling compares the same
/// strings that become file names.
pub fn flatten_separators(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '-',
            other => other,
        })
        .collect()
}

/// Name of the partition for `raw_value`.
pub fn partition_name(base_name: &str, raw_value: &str, empty_placeholder: &str) -> String {
    let cleaned = clean_group_value(raw_value);
    let label = if cleaned.is_empty() {
        empty_placeholder
    } else {
        cleaned.as_str()
    };
    flatten_separators(&format!("{base_name}_{label}"))
}

/// Partition `dataset` by the text form of `options.group_column`.
///
/// - Values are compared exactly after coercion to text (no trimming or case folding), so
///   `"JSS1\n"` and `"JSS1"` select different rows even though both partitions end up named
///   `..._JSS1`. Resolving such name clashes is left to the caller.
/// - Partitions come out in first-occurrence order of their group value.
/// - Every input row lands in exactly one partition.
///
/// # Errors
///
/// - [`ProcessingError::SchemaMismatch`] if the grouping column is absent.
/// - [`ProcessingError::EmptyInput`] if the dataset has no rows.
pub fn partition(dataset: &DataSet, options: &PartitionOptions) -> ProcessingResult<Vec<Partition>> {
    let group_idx = dataset.schema.index_of(&options.group_column).ok_or_else(|| {
        ProcessingError::schema(format!(
            "missing required column '{}'. headers={:?}",
            options.group_column,
            dataset.schema.field_names().collect::<Vec<_>>()
        ))
    })?;

    if dataset.row_count() == 0 {
        return Err(ProcessingError::EmptyInput {
            message: format!(
                "no data rows to group by '{}'",
                options.group_column
            ),
        });
    }

    let mut order: Vec<String> = Vec::new();
    let mut members: HashMap<String, Vec<usize>> = HashMap::new();
    for (row_idx, row) in dataset.rows.iter().enumerate() {
        let key = row[group_idx].to_text();
        members
            .entry(key)
            .or_insert_with_key(|k| {
                order.push(k.clone());
                Vec::new()
            })
            .push(row_idx);
    }

    let out = order
        .into_iter()
        .map(|value| {
            let row_indices = members.remove(&value).unwrap_or_default();
            let rows = row_indices.iter().map(|&i| dataset.rows[i].clone()).collect();
            let selected = DataSet {
                schema: dataset.schema.clone(),
                rows,
            };
            Partition {
                name: partition_name(&options.base_name, &value, &options.empty_group_placeholder),
                dataset: drop_columns(&selected, &options.drop_positions),
                group_value: value,
                row_indices,
            }
        })
        .collect();

    Ok(out)
}
