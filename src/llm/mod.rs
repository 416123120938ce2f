//! LLM client abstraction.
//!
//! Provides a unified chat-completion interface. Routing, sufficiency
//! judging, response refinement, and the ingestion pipeline all issue the
//! same call shape (an ordered message list in, text out) with different
//! prompt content.

mod openai;

pub use openai::OpenAiClient;

use crate::Result;
use crate::models::{Role, Turn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Role of a chat-completion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instruction.
    System,
    /// User message.
    User,
    /// Assistant message.
    Assistant,
}

/// A message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The message role.
    pub role: ChatRole,
    /// The message content.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        match turn.role {
            Role::User => Self::user(turn.content.clone()),
            Role::Assistant => Self::assistant(turn.content.clone()),
        }
    }
}

/// Trait for chat-completion providers.
pub trait LlmProvider: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Generates a completion for the given message list.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// HTTP client configuration for LLM providers.
#[derive(Debug, Clone, Copy)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmHttpConfig {
    /// Loads HTTP configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("MENTOR_LLM_TIMEOUT_MS") {
            if let Ok(timeout_ms) = v.parse::<u64>() {
                self.timeout_ms = timeout_ms;
            }
        }
        if let Ok(v) = std::env::var("MENTOR_LLM_CONNECT_TIMEOUT_MS") {
            if let Ok(connect_timeout_ms) = v.parse::<u64>() {
                self.connect_timeout_ms = connect_timeout_ms;
            }
        }
        self
    }
}

/// Builds a blocking HTTP client with configured timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build LLM HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

/// Extracts JSON from an LLM response, handling markdown code fences.
///
/// Model output is not reliably bare JSON: replies arrive fenced, prefixed
/// with prose, or both. The extraction is tolerant: it returns the widest
/// object or array slice found, or the trimmed input when no JSON marker
/// is present.
pub(crate) fn extract_json_from_response(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle ``` ... ``` blocks (without json marker)
    if let Some(start) = trimmed.find("```") {
        let content_start = start + 3;
        let after_marker = &trimmed[content_start..];
        let json_start = after_marker
            .find(['{', '['])
            .map_or(content_start, |pos| content_start + pos);
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle raw JSON object (first { to last })
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                return &trimmed[start..=end];
            }
        }
    }

    // Handle JSON array (for extraction responses)
    if let Some(start) = trimmed.find('[') {
        if let Some(end) = trimmed.rfind(']') {
            if end > start {
                return &trimmed[start..=end];
            }
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        assert_eq!(ChatMessage::system("s").role, ChatRole::System);
        assert_eq!(ChatMessage::user("u").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("a").role, ChatRole::Assistant);
    }

    #[test]
    fn test_chat_message_from_turn() {
        let turn = Turn::user("hello");
        let message = ChatMessage::from(&turn);
        assert_eq!(message.role, ChatRole::User);
        assert_eq!(message.content, "hello");

        let turn = Turn::assistant("hi");
        let message = ChatMessage::from(&turn);
        assert_eq!(message.role, ChatRole::Assistant);
    }

    #[test]
    fn test_http_config_default() {
        let config = LlmHttpConfig::default();
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.connect_timeout_ms, 3_000);
    }

    #[test]
    fn test_extract_json_raw() {
        let response = r#"{"action": "answer"}"#;
        let json = extract_json_from_response(response);
        assert_eq!(json, r#"{"action": "answer"}"#);
    }

    #[test]
    fn test_extract_json_markdown() {
        let response = "```json\n{\"action\": \"retrieve\"}\n```";
        let json = extract_json_from_response(response);
        assert!(json.contains("\"action\""));
        assert!(!json.contains("```"));
    }

    #[test]
    fn test_extract_json_with_prefix() {
        let response = "Here is the routing decision: {\"action\": \"answer\"} hope this helps";
        let json = extract_json_from_response(response);
        assert_eq!(json, r#"{"action": "answer"}"#);
    }

    #[test]
    fn test_extract_json_array() {
        let response = r#"[{"question": "Q", "answer": "A"}]"#;
        let json = extract_json_from_response(response);
        assert_eq!(json, r#"[{"question": "Q", "answer": "A"}]"#);
    }

    #[test]
    fn test_extract_json_plain_text_passthrough() {
        let response = "  True  ";
        assert_eq!(extract_json_from_response(response), "True");
    }
}
