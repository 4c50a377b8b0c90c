//! Zip packaging of outputs.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ProcessingResult;
use crate::pipeline::OutputCollection;

use super::naming::file_name;
use super::writer::{write_dataset, OutputFormat};

/// Bundle every attribute table of `collection` into one zip archive.
///
/// Entries sit at the archive root, named `{table name}.{ext}`, in collection order.
pub fn package(collection: &OutputCollection, format: OutputFormat) -> ProcessingResult<Vec<u8>> {
    let entries = collection
        .tables()
        .iter()
        .map(|t| Ok((file_name(&t.name, format), write_dataset(&t.dataset, format)?)))
        .collect::<ProcessingResult<Vec<_>>>()?;
    package_entries(entries)
}

/// Bundle every file under `dir` (recursively) with paths relative to `dir`.
///
/// Entries are ordered by path and use `/` as separator regardless of platform.
pub fn package_directory(dir: impl AsRef<Path>) -> ProcessingResult<Vec<u8>> {
    let dir = dir.as_ref();
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        entries.push((relative, fs::read(entry.path())?));
    }
    package_entries(entries)
}

/// Build a deflate-compressed zip from `(path, bytes)` pairs.
pub fn package_entries<I>(entries: I) -> ProcessingResult<Vec<u8>>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, data) in entries {
        writer.start_file(path, options)?;
        writer.write_all(&data)?;
    }

    Ok(writer.finish()?.into_inner())
}
