//! Transcript cleaning and speaker attribution.
//!
//! Raw speech-to-text output is noisy: misspellings, filler words, broken
//! sentences, and no speaker labels. Each transcript is split into
//! overlapping chunks, each chunk goes through one model call with a fixed
//! cleanup rubric, and the returned lines are parsed into
//! speaker-attributed [`CleanedLine`]s.

use crate::llm::{ChatMessage, LlmProvider};
use crate::models::{CleanedLine, Speaker};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Cleanup rubric sent with every chunk.
const CLEAN_PROMPT: &str = "\
The transcript below comes from a recorded program with one Host and one \
Guest. The Host mostly asks questions; the Guest answers. Follow these \
steps:
1. Clean the text: fix misspellings, remove filler words and repetitions, \
repair broken sentences, and drop content unrelated to the program (such \
as subscription reminders).
2. Attribute speakers: return each utterance on its own line as \
'Time: <seconds> Host: ...' or 'Time: <seconds> Guest: ...', deciding \
from context who is speaking.
3. Make the text natural and fluent.
4. Timing: when the transcript carries timestamps, carry them over; \
otherwise estimate one per line assuming a roughly 22-minute recording.";

/// Matches `Time: <seconds> Host|Guest: <text>`, with the time optional.
static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    // The pattern is a compile-time constant; construction cannot fail.
    #[allow(clippy::unwrap_used)]
    let re = Regex::new(r"^(?:Time:\s*([0-9]+(?:\.[0-9]+)?)s?\s*)?(Host|Guest):\s*(.+)$").unwrap();
    re
});

/// Model-assisted transcript cleaner.
pub struct TranscriptCleaner {
    llm: Arc<dyn LlmProvider>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TranscriptCleaner {
    /// Creates a cleaner with default chunking.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    /// Sets chunk size and overlap.
    #[must_use]
    pub const fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Cleans one transcript's text into attributed lines.
    ///
    /// # Errors
    ///
    /// Returns an error if a cleanup model call fails.
    pub fn clean_text(&self, transcript: &str) -> Result<Vec<CleanedLine>> {
        let chunks = chunk_text(transcript, self.chunk_size, self.chunk_overlap);
        let mut lines = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            tracing::info!(chunk = i + 1, total = chunks.len(), "cleaning chunk");
            let messages = [ChatMessage::user(format!(
                "{CLEAN_PROMPT}\n\nTranscript: {chunk}\n\nCleaned and attributed version:"
            ))];
            let output = self.llm.complete(&messages)?;
            lines.extend(parse_cleaned_lines(&output));
        }

        Ok(lines)
    }

    /// Cleans one transcript file and writes the attributed lines.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or a failed model call.
    pub fn clean_file(&self, input: &Path, output: &Path) -> Result<usize> {
        let transcript = fs::read_to_string(input).map_err(|e| Error::OperationFailed {
            operation: "clean_file".to_string(),
            cause: format!("{}: {e}", input.display()),
        })?;

        let lines = self.clean_text(&transcript)?;
        if lines.is_empty() {
            tracing::warn!(input = %input.display(), "no cleaned content, writing empty file");
        }

        let rendered: String = lines
            .iter()
            .map(|line| {
                format!(
                    "Time: {:.1} {}: {}\n",
                    line.time,
                    line.speaker.as_str(),
                    line.text
                )
            })
            .collect();

        fs::write(output, rendered).map_err(|e| Error::OperationFailed {
            operation: "clean_file".to_string(),
            cause: format!("{}: {e}", output.display()),
        })?;

        tracing::info!(output = %output.display(), lines = lines.len(), "cleaned file saved");
        Ok(lines.len())
    }

    /// Cleans every `.txt` file in a directory.
    ///
    /// Per-file failures are logged and skipped; the pipeline keeps going.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be read or created.
    pub fn clean_dir(&self, input_dir: &Path, output_dir: &Path) -> Result<usize> {
        fs::create_dir_all(output_dir).map_err(|e| Error::OperationFailed {
            operation: "clean_dir".to_string(),
            cause: format!("{}: {e}", output_dir.display()),
        })?;

        let mut processed = 0;
        for entry in list_txt_files(input_dir)? {
            let output = output_dir.join(entry.file_name().unwrap_or(entry.as_os_str()));
            match self.clean_file(&entry, &output) {
                Ok(_) => processed += 1,
                Err(err) => {
                    tracing::error!(file = %entry.display(), "cleaning failed: {err}");
                }
            }
        }

        if processed == 0 {
            tracing::warn!(dir = %input_dir.display(), "no transcript files processed");
        }
        Ok(processed)
    }
}

/// Lists `.txt` files in a directory, sorted for deterministic order.
pub(crate) fn list_txt_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::OperationFailed {
        operation: "list_txt_files".to_string(),
        cause: format!("{}: {e}", dir.display()),
    })?;

    let mut files: Vec<_> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

/// Splits text into chunks of at most `size` characters with `overlap`
/// characters carried between consecutive chunks.
///
/// Splitting prefers whitespace near the boundary so words stay intact.
#[must_use]
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    if size == 0 || text.is_empty() {
        return Vec::new();
    }
    if text.len() <= size {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + size).min(chars.len());
        // Back up to the nearest whitespace unless that would cost more
        // than a tenth of the chunk.
        if end < chars.len() {
            let floor = end.saturating_sub(size / 10).max(start + 1);
            if let Some(pos) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = pos + 1;
            }
        }

        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        // Carry the overlap into the next chunk; always make progress.
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Parses model output into attributed lines.
///
/// Lines that do not match the `Host:`/`Guest:` shape are dropped; a
/// missing time stamp parses as `0.0`.
#[must_use]
pub fn parse_cleaned_lines(output: &str) -> Vec<CleanedLine> {
    output
        .lines()
        .filter_map(|line| {
            let captures = LINE_RE.captures(line.trim())?;
            let time = captures
                .get(1)
                .and_then(|m| m.as_str().parse::<f32>().ok())
                .unwrap_or(0.0);
            let speaker = Speaker::parse(captures.get(2)?.as_str())?;
            let text = captures.get(3)?.as_str().trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(CleanedLine {
                speaker,
                text,
                time,
            })
        })
        .collect()
}
