//! Break a partition into narrow `(key, attribute)` tables.

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::DataSet;

use super::partition::{flatten_separators, Partition};

/// A two-column table: the partition's key column and one other column.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeTable {
    /// `{partition name}_{column header}`, path separators replaced with `-`.
    pub name: String,
    /// Name of the partition this table was cut from.
    pub partition: String,
    /// Header of the non-key column.
    pub column: String,
    /// Exactly two columns, same rows and order as the partition.
    pub dataset: DataSet,
}

/// Decompose `partition` into one [`AttributeTable`] per non-key column.
///
/// Column 0 is the key. For every other column, in ascending position, the result holds a
/// projection `(column 0, column i)` with the partition's rows in their original order. A
/// single-column partition yields no tables.
///
/// # Errors
///
/// [`ProcessingError::SchemaMismatch`] if the partition has no columns at all.
pub fn decompose(partition: &Partition) -> ProcessingResult<Vec<AttributeTable>> {
    let ds = &partition.dataset;
    if ds.column_count() == 0 {
        return Err(ProcessingError::schema(format!(
            "partition '{}' has no columns left to decompose",
            partition.name
        )));
    }

    Ok((1..ds.column_count())
        .map(|i| {
            let column = ds.schema.fields[i].name.clone();
            AttributeTable {
                name: flatten_separators(&format!("{}_{}", partition.name, column)),
                partition: partition.name.clone(),
                column,
                dataset: ds.select_columns(&[0, i]),
            }
        })
        .collect())
}
