//! In-memory table reshaping.
//!
//! Two stages, both pure functions over [`crate::types::DataSet`]:
//!
//! - [`partition()`]: split rows by the value of a grouping column and prune columns by position
//! - [`decompose()`]: turn each partition into `(key, attribute)` tables, one per non-key column
//!
//! ## Example: partition → decompose
//!
//! ```rust
//! use class_data_processor::processing::{decompose, partition, PartitionOptions};
//! use class_data_processor::types::{DataSet, Schema, Value};
//!
//! let ds = DataSet::new(
//!     Schema::from_names(["Name", "Class", "Math"]),
//!     vec![
//!         vec!["Ada".into(), "JSS1".into(), Value::Int64(70)],
//!         vec!["Bo".into(), "JSS2".into(), Value::Int64(55)],
//!     ],
//! );
//!
//! let options = PartitionOptions {
//!     base_name: "term2".to_string(),
//!     ..Default::default()
//! };
//! let parts = partition(&ds, &options).unwrap();
//! assert_eq!(parts[0].name, "term2_JSS1");
//!
//! // Name is the key; Class and Math each get their own table.
//! let tables = decompose(&parts[0]).unwrap();
//! let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
//! assert_eq!(names, ["term2_JSS1_Class", "term2_JSS1_Math"]);
//! ```

pub mod columns;
pub mod decompose;
pub mod partition;

pub use columns::{drop_columns, DropPositions};
pub use decompose::{decompose, AttributeTable};
pub use partition::{clean_group_value, flatten_separators, partition, partition_name, Partition, PartitionOptions};
