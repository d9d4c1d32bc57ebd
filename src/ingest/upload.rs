use std::io::Read;
use std::path::Path;

use super::mapper::{map_meta, map_row, RawRecord};
use crate::errors::AppError;
use crate::models::CsvRow;

/// Parse an uploaded CSV (header row required) into numbered rows.
///
/// All-or-nothing: any malformed record rejects the whole file.
pub fn parse_rows<R: Read>(input: R) -> Result<Vec<CsvRow>, AppError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::CsvParse(e.to_string()))?
        .clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::CsvParse("missing header row".into()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| AppError::CsvParse(e.to_string()))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let raw: RawRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();

        rows.push(CsvRow {
            id: rows.len() + 1,
            payload: map_row(&raw),
            meta: map_meta(&raw),
        });
    }

    tracing::info!(rows = rows.len(), "parsed CSV upload");
    Ok(rows)
}

pub fn load_rows(path: &Path) -> Result<Vec<CsvRow>, AppError> {
    let file = std::fs::File::open(path)?;
    parse_rows(file)
}

/// Pretty JSON of one row's payload, ready for hand editing.
pub fn select_payload(rows: &[CsvRow], id: usize) -> Result<String, AppError> {
    let row = rows
        .iter()
        .find(|r| r.id == id)
        .ok_or(AppError::RowNotFound {
            row: id,
            total: rows.len(),
        })?;
    serde_json::to_string_pretty(&row.payload).map_err(|e| AppError::Internal(e.into()))
}
