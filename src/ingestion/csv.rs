//! CSV ingestion implementation.

use std::path::Path;

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, Schema, Value};

/// Ingest a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - The first record is the header row.
/// - Values are kept as text exactly as written (quoted newlines included); empty fields become
///   [`Value::Null`].
/// - Short records are padded with nulls, long records truncated to the header width.
pub fn ingest_csv_from_path(path: impl AsRef<Path>) -> ProcessingResult<DataSet> {
    let mut rdr = reader_builder().from_path(path)?;
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest CSV held in memory, e.g. an upload.
pub fn ingest_csv_from_bytes(bytes: &[u8]) -> ProcessingResult<DataSet> {
    let mut rdr = reader_builder().from_reader(bytes);
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> ProcessingResult<DataSet> {
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(ProcessingError::schema("csv has no header row"));
    }
    let schema = Schema::from_names(headers.iter());
    let width = schema.len();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row = (0..width)
            .map(|i| match record.get(i) {
                None | Some("") => Value::Null,
                Some(raw) => Value::Utf8(raw.to_owned()),
            })
            .collect();
        rows.push(row);
    }

    Ok(DataSet::new(schema, rows))
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}
