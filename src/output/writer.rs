//! Serialize datasets to spreadsheet bytes.

use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, Value};

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Office Open XML workbook, one sheet named `Sheet1` (feature-gated behind `excel`).
    Xlsx,
    /// Comma-separated values.
    Csv,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }
}

impl Default for OutputFormat {
    #[cfg(feature = "excel")]
    fn default() -> Self {
        OutputFormat::Xlsx
    }

    #[cfg(not(feature = "excel"))]
    fn default() -> Self {
        OutputFormat::Csv
    }
}

/// Serialize `dataset` (header row first) in `format`.
pub fn write_dataset(dataset: &DataSet, format: OutputFormat) -> ProcessingResult<Vec<u8>> {
    match format {
        OutputFormat::Csv => write_csv(dataset),
        OutputFormat::Xlsx => write_xlsx(dataset),
    }
}

fn write_csv(dataset: &DataSet) -> ProcessingResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(Value::to_text))?;
    }
    wtr.into_inner()
        .map_err(|e| ProcessingError::Io(e.into_error()))
}

#[cfg(feature = "excel")]
fn write_xlsx(dataset: &DataSet) -> ProcessingResult<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (c, field) in dataset.schema.fields.iter().enumerate() {
        sheet.write_string_with_format(0, col_num(c)?, field.name.as_str(), &header_format)?;
    }

    for (r, row) in dataset.rows.iter().enumerate() {
        let row_num = row_num(r + 1)?;
        for (c, value) in row.iter().enumerate() {
            let col = col_num(c)?;
            match value {
                Value::Null => {}
                Value::Int64(v) => {
                    sheet.write_number(row_num, col, *v as f64)?;
                }
                Value::Float64(v) => {
                    sheet.write_number(row_num, col, *v)?;
                }
                Value::Bool(v) => {
                    sheet.write_boolean(row_num, col, *v)?;
                }
                Value::Utf8(s) => {
                    sheet.write_string(row_num, col, s.as_str())?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(not(feature = "excel"))]
fn write_xlsx(_dataset: &DataSet) -> ProcessingResult<Vec<u8>> {
    Err(ProcessingError::InvalidConfig {
        message: "xlsx output not enabled (enable cargo feature 'excel')".to_string(),
    })
}

#[cfg(feature = "excel")]
fn row_num(idx: usize) -> ProcessingResult<u32> {
    u32::try_from(idx).map_err(|_| ProcessingError::schema(format!("row {idx} exceeds worksheet limits")))
}

#[cfg(feature = "excel")]
fn col_num(idx: usize) -> ProcessingResult<u16> {
    u16::try_from(idx)
        .map_err(|_| ProcessingError::schema(format!("column {idx} exceeds worksheet limits")))
}

#[cfg(test)]
mod tests {
    use super::{write_dataset, OutputFormat};
    use crate::types::{DataSet, Schema, Value};

    fn table() -> DataSet {
        DataSet::new(
            Schema::from_names(["ID", "Math"]),
            vec![
                vec![Value::Int64(1), Value::Float64(70.0)],
                vec![Value::Int64(2), Value::Null],
                vec![Value::from("3, late"), Value::from("multi\nline")],
            ],
        )
    }

    #[test]
    fn csv_output_has_header_and_quoted_fields() {
        let bytes = write_dataset(&table(), OutputFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "ID,Math\n1,70\n2,\n\"3, late\",\"multi\nline\"\n");
    }

    #[test]
    fn csv_output_is_deterministic() {
        let a = write_dataset(&table(), OutputFormat::Csv).unwrap();
        let b = write_dataset(&table(), OutputFormat::Csv).unwrap();
        assert_eq!(a, b);
    }

    #[cfg(feature = "excel")]
    #[test]
    fn xlsx_output_is_a_zip_container() {
        let bytes = write_dataset(&table(), OutputFormat::Xlsx).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn extensions() {
        assert_eq!(OutputFormat::Xlsx.extension(), "xlsx");
        assert_eq!(OutputFormat::Csv.extension(), "csv");
    }
}
