//! Vector-index loading.
//!
//! Final ingestion stage: read the canonical record file, make sure the
//! serverless index exists, and upsert every record. Embedding and
//! batching live in the index adapter; this stage is orchestration only.

use crate::retrieval::PineconeIndex;
use crate::{Error, Result};
use std::path::Path;

/// Loads a record file into the vector index, returning the count written.
///
/// # Errors
///
/// Returns an error if the file is unreadable, the index cannot be
/// created, or an upsert batch fails.
pub fn load_qa_file(index: &PineconeIndex, path: &Path) -> Result<usize> {
    let (records, report) = crate::io::read_qa_records(path)?;
    if records.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} holds no valid records",
            path.display()
        )));
    }
    if report.skipped > 0 {
        tracing::warn!(skipped = report.skipped, "invalid records not indexed");
    }

    index.ensure_index()?;
    let written = index.upsert(&records)?;
    tracing::info!(written, source = %path.display(), "index load complete");
    Ok(written)
}
