//! Output file and directory naming.

use std::path::Path;

use crate::config::DEFAULT_BASE_NAME;
use crate::processing::flatten_separators;

use super::writer::OutputFormat;

/// Subdirectory holding one file per partition.
pub const PARTITION_DIR: &str = "class_data";

/// Subdirectory holding one file per attribute table.
pub const TABLE_DIR: &str = "final_data";

/// File name for an output called `name`.
///
/// Names built by [`crate::processing`] are already flat; separators in any other `name` are
/// replaced with `-` so every output stays a single entry inside its directory or archive.
pub fn file_name(name: &str, format: OutputFormat) -> String {
    format!("{}.{}", flatten_separators(name), format.extension())
}

/// Base name derived from an input path: its file stem, or [`DEFAULT_BASE_NAME`] if it has none.
pub fn base_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_NAME.to_string())
}

/// Name of the bundle produced for `base_name`.
pub fn archive_name(base_name: &str) -> String {
    format!("{base_name}_processed_files.zip")
}
