//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which reads a spreadsheet or CSV file into an
//! in-memory [`crate::types::DataSet`]. Upload-style callers holding raw bytes use
//! [`ingest_from_bytes`].
//!
//! - If [`IngestionOptions::format`] is `None`, the format is inferred from the file extension.
//! - If a [`PipelineObserver`] is provided, success/failure/alerts are reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ProcessingError, ProcessingResult};
use crate::observability::{report, PipelineObserver, Severity, Stage, StageContext, StageStats};
use crate::types::DataSet;

use super::csv;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> ProcessingResult<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ProcessingError::schema(format!(
                    "cannot infer format: path has no extension ({})",
                    path.display()
                ))
            })?;

        Self::from_extension(ext).ok_or_else(|| {
            ProcessingError::schema(format!(
                "cannot infer format from extension '{ext}' for path ({})",
                path.display()
            ))
        })
    }
}

/// How to choose sheet(s) when ingesting an Excel workbook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExcelSheetSelection {
    /// Ingest the first sheet (default).
    #[default]
    First,
    /// Ingest a single named sheet.
    Sheet(String),
    /// Ingest all sheets and concatenate rows. All sheets must share the same headers.
    AllSheets,
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Excel-specific options.
    pub excel_sheet_selection: ExcelSheetSelection,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("excel_sheet_selection", &self.excel_sheet_selection)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            excel_sheet_selection: ExcelSheetSelection::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// When an observer is configured, this function reports `on_success` with the row count,
/// `on_failure` with a computed severity, and `on_alert` when that severity is at or above
/// `options.alert_at_or_above`.
///
/// ```no_run
/// use class_data_processor::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), class_data_processor::ProcessingError> {
/// let ds = ingest_from_path("jss1 second term.xlsx", &IngestionOptions::default())?;
/// println!("rows={} columns={}", ds.row_count(), ds.column_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> ProcessingResult<DataSet> {
    let path = path.as_ref();
    let ctx = StageContext::new(Stage::Ingest, path.display().to_string());

    let result = match options.format {
        Some(f) => Ok(f),
        None => IngestionFormat::from_path(path),
    }
    .and_then(|fmt| match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path),
        IngestionFormat::Excel => ingest_excel_dispatch(ExcelSource::Path(path), &options.excel_sheet_selection),
    });

    report(options.observer.as_ref(), options.alert_at_or_above, &ctx, &result, ingest_stats);
    result
}

/// Ingest a file held in memory. `name` is only used to label observer events.
pub fn ingest_from_bytes(
    name: &str,
    bytes: Vec<u8>,
    format: IngestionFormat,
    options: &IngestionOptions,
) -> ProcessingResult<DataSet> {
    let ctx = StageContext::new(Stage::Ingest, name);

    let result = match format {
        IngestionFormat::Csv => csv::ingest_csv_from_bytes(&bytes),
        IngestionFormat::Excel => ingest_excel_dispatch(ExcelSource::Bytes(bytes), &options.excel_sheet_selection),
    };

    report(options.observer.as_ref(), options.alert_at_or_above, &ctx, &result, ingest_stats);
    result
}

fn ingest_stats(ds: &DataSet) -> StageStats {
    StageStats {
        outputs: 1,
        rows: ds.row_count(),
    }
}

enum ExcelSource<'a> {
    Path(&'a Path),
    Bytes(Vec<u8>),
}

fn ingest_excel_dispatch(source: ExcelSource<'_>, sel: &ExcelSheetSelection) -> ProcessingResult<DataSet> {
    // Avoid unused warnings when the feature is off.
    let _ = (&source, sel);

    #[cfg(feature = "excel")]
    {
        use super::excel;

        match source {
            ExcelSource::Path(path) => excel::ingest_excel_from_path(path, sel),
            ExcelSource::Bytes(bytes) => excel::ingest_excel_from_bytes(bytes, sel),
        }
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(ProcessingError::schema(
            "excel ingestion not enabled (enable cargo feature 'excel')",
        ))
    }
}
