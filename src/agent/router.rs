//! Per-turn routing decision.
//!
//! A routing model call decides whether a user turn is answered directly
//! from persona and history, or goes through the retrieval tool. The
//! decision is a closed enum, matched exhaustively by the orchestrator;
//! there is no name-to-callable dispatch.

use super::prompts::{COACH_PERSONA, ROUTER_PROTOCOL};
use crate::Result;
use crate::llm::{ChatMessage, LlmProvider, extract_json_from_response};
use crate::models::Turn;
use serde::Deserialize;

/// Outcome of the routing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Answer the turn with this text, no evidence gathering.
    Direct(String),
    /// Invoke the retrieval tool for this question.
    Retrieve {
        /// The question to retrieve evidence for.
        question: String,
        /// Whether the model considered the question leadership-related.
        leadership: bool,
    },
}

/// Wire shape of the routing reply.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum RawRoute {
    Retrieve {
        question: String,
        #[serde(default)]
        leadership: bool,
    },
    Answer {
        response: String,
    },
}

/// Runs the routing call for one user turn.
///
/// `prior` is the session history up to, but not including, the current
/// user message; the message itself is passed as the final user turn.
///
/// Unparseable routing output is not an error: the raw model text is
/// treated as a direct answer, which is what a model that ignored the
/// JSON protocol was trying to say anyway.
///
/// # Errors
///
/// Returns an error only if the routing model call itself fails.
pub(crate) fn route(
    llm: &dyn LlmProvider,
    prior: &[Turn],
    user_text: &str,
) -> Result<RouteDecision> {
    let mut messages = Vec::with_capacity(prior.len() + 2);
    messages.push(ChatMessage::system(format!(
        "{COACH_PERSONA}\n\n{ROUTER_PROTOCOL}"
    )));
    messages.extend(prior.iter().map(ChatMessage::from));
    messages.push(ChatMessage::user(user_text));

    let output = llm.complete(&messages)?;
    Ok(parse_route(&output))
}

/// Parses the routing reply into a decision.
fn parse_route(output: &str) -> RouteDecision {
    let json = extract_json_from_response(output);
    match serde_json::from_str::<RawRoute>(json) {
        Ok(RawRoute::Retrieve {
            question,
            leadership,
        }) => RouteDecision::Retrieve {
            question,
            leadership,
        },
        Ok(RawRoute::Answer { response }) => RouteDecision::Direct(response),
        Err(err) => {
            tracing::warn!("routing reply did not follow the protocol: {err}");
            RouteDecision::Direct(output.trim().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;
    use std::sync::Mutex;

    struct RecordingLlm {
        reply: String,
        last_messages: Mutex<Vec<ChatMessage>>,
    }

    impl RecordingLlm {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                last_messages: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for RecordingLlm {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            *self.last_messages.lock().unwrap() = messages.to_vec();
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_parse_retrieve_action() {
        let decision = parse_route(
            r#"{"action": "retrieve", "question": "How do I motivate my team?", "leadership": true}"#,
        );
        assert_eq!(
            decision,
            RouteDecision::Retrieve {
                question: "How do I motivate my team?".to_string(),
                leadership: true,
            }
        );
    }

    #[test]
    fn test_parse_answer_action() {
        let decision = parse_route(r#"{"action": "answer", "response": "Happy to help."}"#);
        assert_eq!(decision, RouteDecision::Direct("Happy to help.".to_string()));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let decision = parse_route(
            "```json\n{\"action\": \"retrieve\", \"question\": \"Q\", \"leadership\": false}\n```",
        );
        assert_eq!(
            decision,
            RouteDecision::Retrieve {
                question: "Q".to_string(),
                leadership: false,
            }
        );
    }

    #[test]
    fn test_unparseable_reply_becomes_direct_answer() {
        let decision = parse_route("Let me think about that with you.\n");
        assert_eq!(
            decision,
            RouteDecision::Direct("Let me think about that with you.".to_string())
        );
    }

    #[test]
    fn test_missing_leadership_flag_defaults_false() {
        let decision = parse_route(r#"{"action": "retrieve", "question": "Q"}"#);
        assert_eq!(
            decision,
            RouteDecision::Retrieve {
                question: "Q".to_string(),
                leadership: false,
            }
        );
    }

    #[test]
    fn test_route_message_layout() {
        let llm = RecordingLlm::new(r#"{"action": "answer", "response": "ok"}"#);
        let prior = vec![Turn::assistant("Hello!"), Turn::user("Hi")];

        let decision = route(&llm, &prior, "How do I delegate?").unwrap();
        assert_eq!(decision, RouteDecision::Direct("ok".to_string()));

        let messages = llm.last_messages.lock().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("leadership-question retrieval tool"));
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert_eq!(messages[2].role, ChatRole::User);
        assert_eq!(messages[3].content, "How do I delegate?");
    }
}
