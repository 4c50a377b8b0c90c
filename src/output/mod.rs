//! Serialization, on-disk layout and packaging of pipeline outputs.
//!
//! - [`write_dataset`]: one table to xlsx/csv bytes
//! - [`write_collection_to_dir`]: every output of a run under `class_data/` and `final_data/`
//! - [`package`] / [`package_directory`]: zip bundles for one-shot download
//! - [`OutputManifest`]: JSON summary of what was produced

pub mod manifest;
pub mod naming;
pub mod package;
pub mod writer;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProcessingResult;
use crate::pipeline::OutputCollection;

pub use manifest::{ManifestEntry, OutputManifest};
pub use naming::{archive_name, base_name_from_path, file_name, PARTITION_DIR, TABLE_DIR};
pub use package::{package, package_directory, package_entries};
pub use writer::{write_dataset, OutputFormat};

/// Options for [`write_collection_to_dir`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub format: OutputFormat,
    /// Also write one file per partition under [`PARTITION_DIR`].
    pub include_partitions: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_partitions: true,
        }
    }
}

/// Write `collection` under `dir`, returning the written paths in write order.
///
/// Partitions go to `dir/class_data/` (when enabled), attribute tables to `dir/final_data/`.
/// Directories are created as needed; existing files with the same name are replaced.
pub fn write_collection_to_dir(
    collection: &OutputCollection,
    dir: impl AsRef<Path>,
    options: &WriteOptions,
) -> ProcessingResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut written = Vec::new();

    if options.include_partitions {
        let partition_dir = dir.join(PARTITION_DIR);
        fs::create_dir_all(&partition_dir)?;
        for p in collection.partitions() {
            let path = partition_dir.join(file_name(&p.name, options.format));
            fs::write(&path, write_dataset(&p.dataset, options.format)?)?;
            written.push(path);
        }
    }

    let table_dir = dir.join(TABLE_DIR);
    fs::create_dir_all(&table_dir)?;
    for t in collection.tables() {
        let path = table_dir.join(file_name(&t.name, options.format));
        fs::write(&path, write_dataset(&t.dataset, options.format)?)?;
        written.push(path);
    }

    Ok(written)
}
