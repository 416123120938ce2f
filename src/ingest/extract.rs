//! Q&A extraction from cleaned transcripts.
//!
//! One model call per transcript distills 10-15 coaching question/answer
//! pairs as a JSON array. Model JSON is recovered tolerantly (fenced or
//! prose-wrapped output both parse); per-file failures are logged and
//! skipped so one bad transcript cannot sink a batch run.

use super::clean::list_txt_files;
use crate::llm::{ChatMessage, LlmProvider, extract_json_from_response};
use crate::models::QaRecord;
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Extraction rubric sent with every transcript.
const EXTRACT_PROMPT: &str = "\
You are a leadership coach. From the transcript below, derive 10 to 15 \
natural, transcript-specific questions about leadership, management, or \
personal growth, and answer each one in an inspiring, structured, \
coaching-style voice grounded in what the transcript actually says. Keep \
the tone warm but professional; motivate the reader and include one \
practical suggestion per answer. Follow these steps:
1. Read the transcript carefully.
2. Identify its leadership themes (motivation, team management, risk \
taking, transparency, and so on).
3. For each theme, write 3 to 5 questions specific to this transcript.
4. Answer every question from the transcript's own material, in a \
coaching style.
5. Respond with only a JSON array in this shape:
[
  {
    \"question\": \"question text\",
    \"answer\": \"answer text\",
    \"speaker\": \"speaker name, or 'Unknown Guest' when unknown\",
    \"time\": <approximate offset in seconds, 0 when unknown>
  }
]";

/// Model-driven Q&A extractor.
pub struct QaExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl QaExtractor {
    /// Creates an extractor over the given provider.
    #[must_use]
    pub const fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Extracts records from one transcript's text.
    ///
    /// The `source` field of every record is set to `filename`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails or its output holds no
    /// parseable record array.
    pub fn extract_text(&self, transcript: &str, filename: &str) -> Result<Vec<QaRecord>> {
        let messages = [ChatMessage::user(format!(
            "{EXTRACT_PROMPT}\n\nTranscript:\n{transcript}"
        ))];
        let output = self.llm.complete(&messages)?;

        let json = extract_json_from_response(&output);
        let mut records: Vec<QaRecord> =
            serde_json::from_str(json).map_err(|e| Error::InvalidInput(format!(
                "extraction output for '{filename}' is not a record array: {e}"
            )))?;

        for record in &mut records {
            record.source = filename.to_string();
        }
        records.retain(QaRecord::is_valid);
        Ok(records)
    }

    /// Extracts records from every `.txt` file in a directory and writes
    /// the aggregate to `output` as the canonical JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or the output
    /// cannot be written. Per-file extraction failures are logged and
    /// skipped.
    pub fn extract_dir(&self, input_dir: &Path, output: &Path) -> Result<usize> {
        let mut all_records = Vec::new();

        for path in list_txt_files(input_dir)? {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            tracing::info!(file = %filename, "extracting Q&A pairs");

            let transcript = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(file = %path.display(), "read failed: {err}");
                    continue;
                }
            };

            match self.extract_text(&transcript, &filename) {
                Ok(records) => {
                    tracing::info!(file = %filename, count = records.len(), "records extracted");
                    all_records.extend(records);
                }
                Err(err) => {
                    tracing::error!(file = %filename, "extraction failed: {err}");
                }
            }
        }

        crate::io::write_qa_records(output, &all_records)?;
        tracing::info!(
            total = all_records.len(),
            output = %output.display(),
            "record file written"
        );
        Ok(all_records.len())
    }
}
