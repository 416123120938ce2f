//! Data models for mentor.
//!
//! Plain data types shared across the ingestion pipeline, the retrieval
//! and web-search adapters, and the conversational agent.

use serde::{Deserialize, Serialize};

/// A question/answer pair distilled from a talk transcript.
///
/// Created once during offline ingestion and retrieved read-only at query
/// time. A JSON array of these records is the canonical exchange format
/// between Q&A extraction and vector-index loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    /// The question text.
    pub question: String,
    /// The coached answer text.
    pub answer: String,
    /// Source transcript filename.
    #[serde(default)]
    pub source: String,
    /// Speaker the answer is attributed to.
    #[serde(default = "default_speaker")]
    pub speaker: String,
    /// Offset into the talk, in seconds.
    #[serde(default)]
    pub time: f32,
}

fn default_speaker() -> String {
    "Unknown Guest".to_string()
}

impl QaRecord {
    /// Returns the text that is embedded for this record.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.question, self.answer)
    }

    /// Returns true when both question and answer are non-empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// A single retrieval hit: the stored Q&A pair plus its similarity score.
///
/// Ephemeral, produced per query, never persisted and never written into
/// session memory.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedMatch {
    /// The stored question.
    pub question: String,
    /// The stored answer.
    pub answer: String,
    /// Cosine similarity score in `[0, 1]`.
    pub score: f32,
}

/// One ranked web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    /// Page title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// Content snippet.
    pub snippet: String,
}

/// Response from a web search provider.
#[derive(Debug, Clone, Default)]
pub struct WebSearchResponse {
    /// Ranked results, provider order preserved.
    pub results: Vec<WebResult>,
    /// Synthesized answer, when the provider produced one.
    pub answer: Option<String>,
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message from the user.
    User,
    /// A message from the coach.
    Assistant,
}

impl Role {
    /// Returns the role as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in a session's ordered history.
///
/// Turns are append-only: they are created on each exchange and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced the turn.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Turn {
    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Speaker attribution in a cleaned transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// The program host, who mostly asks questions.
    Host,
    /// The invited guest, who mostly answers.
    Guest,
}

impl Speaker {
    /// Returns the speaker label used in cleaned transcript files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::Guest => "Guest",
        }
    }

    /// Parses a speaker label.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Host" => Some(Self::Host),
            "Guest" => Some(Self::Guest),
            _ => None,
        }
    }
}

/// One cleaned, speaker-attributed transcript line.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedLine {
    /// Who spoke the line.
    pub speaker: Speaker,
    /// The cleaned line text.
    pub text: String,
    /// Offset into the talk, in seconds.
    pub time: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qa_record_validity() {
        let record = QaRecord {
            question: "How do leaders build trust?".to_string(),
            answer: "By being transparent about decisions.".to_string(),
            source: "episode_01.txt".to_string(),
            speaker: "Guest".to_string(),
            time: 42.0,
        };
        assert!(record.is_valid());

        let empty = QaRecord {
            question: "  ".to_string(),
            answer: "x".to_string(),
            source: String::new(),
            speaker: String::new(),
            time: 0.0,
        };
        assert!(!empty.is_valid());
    }

    #[test]
    fn test_qa_record_deserialize_defaults() {
        let json = r#"{"question": "Q", "answer": "A"}"#;
        let record: QaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.speaker, "Unknown Guest");
        assert_eq!(record.source, "");
        assert!((record.time - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_embedding_text_joins_question_and_answer() {
        let record = QaRecord {
            question: "Q?".to_string(),
            answer: "A.".to_string(),
            source: String::new(),
            speaker: String::new(),
            time: 0.0,
        };
        assert_eq!(record.embedding_text(), "Q? A.");
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_speaker_parse_roundtrip() {
        assert_eq!(Speaker::parse("Host"), Some(Speaker::Host));
        assert_eq!(Speaker::parse("Guest"), Some(Speaker::Guest));
        assert_eq!(Speaker::parse("Narrator"), None);
        assert_eq!(Speaker::parse(Speaker::Host.as_str()), Some(Speaker::Host));
    }
}
