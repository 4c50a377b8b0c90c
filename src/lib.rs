//! `class-data-processor` turns a student-records spreadsheet into per-class tables and narrow
//! per-subject tables, optionally bundled into a zip archive.
//!
//! The pipeline has three stages:
//!
//! 1. **Partition** ([`processing::partition`]): group rows by the `Class` column (configurable),
//!    clean each class name (newlines become spaces, surrounding whitespace trimmed) and drop
//!    configured column positions. Negative positions count from the end; out-of-range positions
//!    are ignored.
//! 2. **Decompose** ([`processing::decompose`]): column 0 of each partition is the key; every other
//!    column becomes a two-column `(key, column)` table named `{partition}_{header}`.
//! 3. **Package** ([`output::package`]): serialize outputs (xlsx or csv) and zip them.
//!
//! ## Input
//!
//! - **CSV**: `.csv`
//! - **Excel/workbooks** (requires the Cargo feature `excel`, on by default): `.xlsx`, `.xls`,
//!   `.xlsm`, `.xlsb`, `.ods`
//!
//! The first row is the header row. Empty cells map to [`types::Value::Null`].
//!
//! ## Quick example
//!
//! ```rust
//! use class_data_processor::config::PipelineConfig;
//! use class_data_processor::processing::DropPositions;
//! use class_data_processor::run_pipeline;
//! use class_data_processor::types::{DataSet, Schema, Value};
//!
//! let ds = DataSet::new(
//!     Schema::from_names(["ID", "Name", "Class", "Math", "English"]),
//!     vec![
//!         vec![Value::Int64(1), "A".into(), "JSS1\n".into(), "70".into(), "80".into()],
//!         vec![Value::Int64(2), "B".into(), "JSS1".into(), "60".into(), "90".into()],
//!         vec![Value::Int64(3), "C".into(), "JSS2".into(), "50".into(), "55".into()],
//!     ],
//! );
//!
//! // Drop ID and Class, keep Name as the key.
//! let config = PipelineConfig::default()
//!     .with_base_name("term2")
//!     .with_drop_positions(DropPositions::new(vec![0, 2]));
//! let out = run_pipeline(&ds, &config).unwrap();
//!
//! assert_eq!(out.partition("term2_JSS1").unwrap().dataset.row_count(), 2);
//! let math = out.table("term2_JSS1_Math").unwrap();
//! assert_eq!(math.dataset.rows[1], vec![Value::from("B"), Value::from("60")]);
//! assert_eq!(out.tables().len(), 4);
//! ```
//!
//! Reading from disk and writing results:
//!
//! ```no_run
//! use class_data_processor::config::PipelineConfig;
//! use class_data_processor::ingestion::{ingest_from_path, IngestionOptions};
//! use class_data_processor::pipeline::Pipeline;
//!
//! # fn main() -> Result<(), class_data_processor::ProcessingError> {
//! let ds = ingest_from_path("term2.xlsx", &IngestionOptions::default())?;
//! let pipeline = Pipeline::new(PipelineConfig::default().with_base_name("term2"));
//! let out = pipeline.run(&ds)?;
//! pipeline.write_to_dir(&out, "out", true)?;
//! std::fs::write("out/term2_processed_files.zip", pipeline.package(&out)?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: csv/excel readers and the unified, extension-dispatching entrypoint
//! - [`processing`]: column dropping, partitioning and decomposition
//! - [`pipeline`]: the end-to-end run, name-collision handling, [`OutputCollection`]
//! - [`output`]: serialization, on-disk layout, zip packaging, manifests
//! - [`execution`]: parallel decomposition on a rayon pool, with metrics
//! - [`observability`]: stage observers (stderr, file, `log`)
//! - [`config`]: [`PipelineConfig`] and presets
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use config::PipelineConfig;
pub use error::{ErrorKind, ProcessingError, ProcessingResult};
pub use pipeline::{run_pipeline, OutputCollection, Pipeline};
