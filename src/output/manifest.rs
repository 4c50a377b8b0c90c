use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::ProcessingResult;
use crate::pipeline::OutputCollection;
use crate::types::DataSet;

use super::naming::{file_name, PARTITION_DIR, TABLE_DIR};
use super::writer::OutputFormat;

/// One written (or packaged) output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    /// Path relative to the output directory.
    pub file: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// JSON-serializable summary of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputManifest {
    pub base_name: String,
    pub group_column: String,
    pub partitions: Vec<ManifestEntry>,
    pub tables: Vec<ManifestEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
}

impl OutputManifest {
    pub fn from_collection(
        collection: &OutputCollection,
        base_name: &str,
        group_column: &str,
        format: OutputFormat,
    ) -> Self {
        Self {
            base_name: base_name.to_string(),
            group_column: group_column.to_string(),
            partitions: collection
                .partitions()
                .iter()
                .map(|p| entry(&p.name, PARTITION_DIR, &p.dataset, format))
                .collect(),
            tables: collection
                .tables()
                .iter()
                .map(|t| entry(&t.name, TABLE_DIR, &t.dataset, format))
                .collect(),
            archive: None,
        }
    }

    /// Record the archive file name.
    pub fn with_archive(mut self, archive: impl Into<String>) -> Self {
        self.archive = Some(archive.into());
        self
    }

    pub fn to_json_pretty(&self) -> ProcessingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> ProcessingResult<()> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

fn entry(name: &str, dir: &str, dataset: &DataSet, format: OutputFormat) -> ManifestEntry {
    ManifestEntry {
        name: name.to_string(),
        file: format!("{dir}/{}", file_name(name, format)),
        rows: dataset.row_count(),
        columns: dataset.schema.field_names().map(str::to_string).collect(),
    }
}
