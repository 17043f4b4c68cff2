//! Reading raw records from JSON and CSV import files.

use crate::error::{ClaimsError, ClaimsResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// One record as read from a source file, before coercion
pub type RawRecord = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    /// Detect the format from the file extension, ignoring case
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(FileFormat::Json),
            "csv" => Some(FileFormat::Csv),
            _ => None,
        }
    }

    /// Use the declared format, falling back to detection
    pub fn resolve(declared: Option<Self>, path: &Path) -> ClaimsResult<Self> {
        declared
            .or_else(|| Self::detect(path))
            .ok_or_else(|| ClaimsError::UnknownFormat(path.to_path_buf()))
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Json => f.write_str("json"),
            FileFormat::Csv => f.write_str("csv"),
        }
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(FileFormat::Json),
            "csv" => Ok(FileFormat::Csv),
            other => Err(format!("unsupported file format: {}", other)),
        }
    }
}

/// Read every record of `path`.
///
/// JSON input is either a bare array or an object holding the array under
/// `envelope_key`. Elements are returned as-is so that non-object entries can be
/// reported per record by the caller.
///
/// # Errors
///
/// Fails when the file is missing or unreadable, or when its contents do not have
/// one of the accepted shapes.
pub fn read_records(path: &Path, format: FileFormat, envelope_key: &str) -> ClaimsResult<Vec<Value>> {
    let file = File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => ClaimsError::FileNotFound(path.to_path_buf()),
        _ => ClaimsError::Io(err),
    })?;
    let reader = BufReader::new(file);

    match format {
        FileFormat::Json => parse_json_records(reader, envelope_key),
        FileFormat::Csv => parse_csv_records(reader),
    }
}

pub fn parse_json_records<R: Read>(reader: R, envelope_key: &str) -> ClaimsResult<Vec<Value>> {
    let document: Value = serde_json::from_reader(reader)?;
    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut object) => match object.remove(envelope_key) {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(ClaimsError::InvalidShape(envelope_key.to_string())),
        },
        _ => Err(ClaimsError::InvalidShape(envelope_key.to_string())),
    }
}

/// Parse CSV with a header row. Every cell becomes a string value keyed by its
/// header; short rows simply lack the trailing fields.
pub fn parse_csv_records<R: Read>(reader: R) -> ClaimsResult<Vec<Value>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
            .collect();
        records.push(Value::Object(record));
    }

    Ok(records)
}
