#![cfg(feature = "excel")]

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, Schema, Value};

use super::unified::ExcelSheetSelection;

/// Ingest an Excel document (`.xlsx`, `.xls`, `.ods`, etc.) into an in-memory `DataSet`.
///
/// Behavior:
/// - Picks sheet(s) according to `selection`
/// - Detects the first non-empty row as the header row; blank header cells are named
///   `Unnamed: {position}`
/// - Skips rows where every cell is empty
/// - Pads or truncates rows to the header width
pub fn ingest_excel_from_path(
    path: impl AsRef<Path>,
    selection: &ExcelSheetSelection,
) -> ProcessingResult<DataSet> {
    let mut workbook = open_workbook_auto(path)?;
    ingest_workbook(&mut workbook, selection)
}

/// Same as [`ingest_excel_from_path`] for a workbook already held in memory, e.g. an upload.
pub fn ingest_excel_from_bytes(
    bytes: Vec<u8>,
    selection: &ExcelSheetSelection,
) -> ProcessingResult<DataSet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    ingest_workbook(&mut workbook, selection)
}

fn ingest_workbook<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    selection: &ExcelSheetSelection,
) -> ProcessingResult<DataSet> {
    let sheets: Vec<String> = match selection {
        ExcelSheetSelection::First => workbook.sheet_names().into_iter().take(1).collect(),
        ExcelSheetSelection::Sheet(name) => vec![name.clone()],
        ExcelSheetSelection::AllSheets => workbook.sheet_names().to_vec(),
    };
    if sheets.is_empty() {
        return Err(ProcessingError::schema("workbook has no sheets"));
    }

    let mut schema: Option<Schema> = None;
    let mut all_rows: Vec<Vec<Value>> = Vec::new();
    for sheet in sheets {
        let range = workbook.worksheet_range(&sheet)?;
        let (sheet_schema, mut rows) = ingest_sheet_range(&range)
            .map_err(|e| wrap_schema_err_with_sheet(&sheet, e))?;

        match &schema {
            None => schema = Some(sheet_schema),
            Some(first) if *first != sheet_schema => {
                return Err(ProcessingError::schema(format!(
                    "sheet '{sheet}': headers {:?} differ from first sheet {:?}",
                    sheet_schema.field_names().collect::<Vec<_>>(),
                    first.field_names().collect::<Vec<_>>()
                )));
            }
            Some(_) => {}
        }
        all_rows.append(&mut rows);
    }

    Ok(DataSet::new(schema.unwrap_or_default(), all_rows))
}

fn ingest_sheet_range(range: &Range<Data>) -> ProcessingResult<(Schema, Vec<Vec<Value>>)> {
    let mut rows_iter = range.rows();
    let header_cells = rows_iter
        .by_ref()
        .find(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .ok_or_else(|| ProcessingError::schema("sheet has no non-empty rows (no header row found)"))?;

    let schema = Schema::from_names(
        header_cells
            .iter()
            .enumerate()
            .map(|(idx, c)| header_name(idx, c)),
    );
    let width = schema.len();

    let rows = rows_iter
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| {
            (0..width)
                .map(|i| row.get(i).map(convert_cell).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok((schema, rows))
}

fn wrap_schema_err_with_sheet(sheet: &str, err: ProcessingError) -> ProcessingError {
    match err {
        ProcessingError::SchemaMismatch { message } => ProcessingError::SchemaMismatch {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    }
}

fn header_name(idx: usize, c: &Data) -> String {
    let name = cell_to_header_string(c);
    if name.trim().is_empty() {
        format!("Unnamed: {idx}")
    } else {
        name
    }
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        _ => c.to_string(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Utf8(s.clone()),
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        _ => Value::Utf8(c.to_string()),
    }
}
