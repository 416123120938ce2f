//! Q&A record I/O.
//!
//! A JSON array of [`QaRecord`]s is the canonical exchange format between
//! offline extraction and vector-index loading. Reading validates each
//! record and skips invalid ones with a warning instead of failing the
//! whole file.

use crate::models::QaRecord;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Outcome of reading a record file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records that passed validation.
    pub imported: usize,
    /// Records dropped for an empty question or answer.
    pub skipped: usize,
}

/// Reads and validates a JSON array of Q&A records.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array of
/// records. Individual invalid records are skipped, not fatal.
pub fn read_qa_records(path: &Path) -> Result<(Vec<QaRecord>, ImportReport)> {
    let raw = fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_qa_records".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;

    let records: Vec<QaRecord> =
        serde_json::from_str(&raw).map_err(|e| Error::OperationFailed {
            operation: "read_qa_records".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

    let mut report = ImportReport::default();
    let valid: Vec<QaRecord> = records
        .into_iter()
        .filter(|record| {
            if record.is_valid() {
                report.imported += 1;
                true
            } else {
                report.skipped += 1;
                tracing::warn!(
                    source = %record.source,
                    "skipping record with empty question or answer"
                );
                false
            }
        })
        .collect();

    Ok((valid, report))
}

/// Writes records as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_qa_records(path: &Path, records: &[QaRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).map_err(|e| Error::OperationFailed {
        operation: "write_qa_records".to_string(),
        cause: e.to_string(),
    })?;

    fs::write(path, json).map_err(|e| Error::OperationFailed {
        operation: "write_qa_records".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}
