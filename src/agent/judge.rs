//! Retrieval sufficiency judge.
//!
//! Similarity scores alone are an unreliable proxy for "does this actually
//! answer the question", so retrieved matches pass through a second model
//! call with a fixed rubric before they are trusted as evidence. The
//! verdict is tri-state: the ambiguous case is explicit, and both
//! non-affirmative states take the web-fallback path.

use super::evidence::format_rag_evidence;
use super::prompts::JUDGE_SYSTEM;
use crate::llm::{ChatMessage, LlmProvider};
use crate::models::RetrievedMatch;

/// Verdict on a set of retrieved matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sufficiency {
    /// The judge emitted exactly `True`.
    Sufficient,
    /// The judge emitted exactly `False`.
    Insufficient,
    /// Anything else: case variants, stray whitespace, prose.
    Unparseable,
}

impl Sufficiency {
    /// Parses the judge's raw output.
    ///
    /// The comparison is strict equality against the literal tokens. No
    /// trimming, no case folding: `"True "` and `"true"` are both
    /// [`Sufficiency::Unparseable`].
    #[must_use]
    pub fn parse(output: &str) -> Self {
        match output {
            "True" => Self::Sufficient,
            "False" => Self::Insufficient,
            _ => Self::Unparseable,
        }
    }

    /// Returns true only for the affirmative verdict.
    #[must_use]
    pub const fn is_sufficient(self) -> bool {
        matches!(self, Self::Sufficient)
    }
}

/// Judges whether retrieved matches are adequate for the question.
///
/// A failed judge call degrades to [`Sufficiency::Unparseable`] rather
/// than erroring: the conservative default is to distrust retrieval and
/// fall back.
pub(crate) fn judge_sufficiency(
    llm: &dyn LlmProvider,
    question: &str,
    matches: &[RetrievedMatch],
) -> Sufficiency {
    let messages = [
        ChatMessage::system(JUDGE_SYSTEM),
        ChatMessage::user(format!(
            "User question: {question}\nRetrieved pairs:\n{}",
            format_rag_evidence(matches)
        )),
    ];

    match llm.complete(&messages) {
        Ok(output) => {
            let verdict = Sufficiency::parse(&output);
            tracing::debug!(?verdict, raw = %output, "sufficiency verdict");
            verdict
        }
        Err(err) => {
            tracing::warn!("sufficiency judge call failed: {err}");
            Sufficiency::Unparseable
        }
    }
}
