// Raw tabular input: CSV (stdin, file, any reader) or JSON records

use crate::error::CatalogError;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Untyped table exactly as read from the source
#[derive(Debug, Clone, PartialEq)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Case-insensitive header lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Build a table from a JSON array of objects.
    /// Headers come from the first object; missing keys become empty cells.
    pub fn from_json(value: &Value) -> Result<Self, CatalogError> {
        let array = value
            .as_array()
            .ok_or_else(|| CatalogError::Json("top-level value is not an array".to_string()))?;

        if array.is_empty() {
            return Err(CatalogError::Empty);
        }

        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| CatalogError::Json("items in array must be objects".to_string()))?;

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| CatalogError::Json("items in array must be objects".to_string()))?;

            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let val_str = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => String::new(),
                    _ => {
                        return Err(CatalogError::Json(format!(
                            "unsupported value type for field '{}'",
                            header
                        )))
                    }
                };
                row.push(val_str);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }
}

/// Read CSV data from any reader. The first record is the header row.
pub fn read_csv<R: Read>(reader: R) -> Result<CsvData> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", idx + 1))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    log::debug!("read {} CSV rows with {} columns", rows.len(), headers.len());
    Ok(CsvData { headers, rows })
}

pub fn read_csv_from_stdin() -> Result<CsvData> {
    read_csv(io::stdin().lock())
}

pub fn read_csv_from_path(path: &Path) -> Result<CsvData> {
    let file = File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
    read_csv(file)
}

/// Dispatch on extension: `.json` is parsed as records, everything else as CSV
pub fn read_table_from_path(path: &Path) -> Result<CsvData> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if ext == "json" {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let value: Value = serde_json::from_str(&text).context("Failed to parse JSON")?;
        Ok(CsvData::from_json(&value)?)
    } else {
        read_csv_from_path(path)
    }
}
