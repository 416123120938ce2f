//! The conversational routing core.
//!
//! `CoachAgent` processes one user turn at a time: it records the turn,
//! asks a routing model whether to answer directly or invoke retrieval,
//! gathers evidence (retrieval, sufficiency judge, web fallback), refines
//! the final reply against the conversation history, and records the
//! result. The public contract never fails: any internal error maps to a
//! fixed apology string.
//!
//! Collaborators are injected as trait objects; nothing in this module
//! talks to the network directly.

mod evidence;
mod judge;
mod prompts;
mod refiner;
mod router;
mod session;

pub use evidence::{WEB_SEARCH_UNAVAILABLE, format_rag_evidence, format_web_evidence};
pub use judge::Sufficiency;
pub use prompts::COACH_PERSONA;
pub use router::RouteDecision;
pub use session::{ChatSession, DEFAULT_GREETING, SessionStore};

use crate::llm::LlmProvider;
use crate::models::Turn;
use crate::retrieval::QaRetriever;
use crate::websearch::WebSearchProvider;
use std::sync::{Arc, PoisonError};

/// Reply returned when a turn fails internally.
pub const FALLBACK_REPLY: &str = "I can't help right now, please try again";

/// Tunables for the agent.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Retrieval depth per routed question.
    pub top_k: usize,
    /// Result cap for the web-search fallback.
    pub max_web_results: usize,
    /// Greeting seeded into every fresh session.
    pub greeting: String,
    /// Keep-last bound on session turns; `0` disables truncation.
    pub max_turns: usize,
    /// Whether a failed turn removes the recorded user turn.
    ///
    /// Off by default: the dangling user turn is kept as an audit trail
    /// of what went unanswered.
    pub rollback_on_failure: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_web_results: 3,
            greeting: DEFAULT_GREETING.to_string(),
            max_turns: 0,
            rollback_on_failure: false,
        }
    }
}

/// The leadership coaching agent.
pub struct CoachAgent {
    llm: Arc<dyn LlmProvider>,
    retriever: Arc<dyn QaRetriever>,
    search: Arc<dyn WebSearchProvider>,
    sessions: SessionStore,
    options: AgentOptions,
}

impl CoachAgent {
    /// Creates an agent over the given collaborators.
    #[must_use]
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        retriever: Arc<dyn QaRetriever>,
        search: Arc<dyn WebSearchProvider>,
        options: AgentOptions,
    ) -> Self {
        let sessions = SessionStore::new(options.greeting.clone(), options.max_turns);
        Self {
            llm,
            retriever,
            search,
            sessions,
            options,
        }
    }

    /// Processes one user turn and returns the assistant reply.
    ///
    /// Never fails: internal errors are logged and mapped to
    /// [`FALLBACK_REPLY`]. The user turn is recorded before any model
    /// call; on failure it stays recorded unless rollback is configured.
    ///
    /// The session is locked for the whole turn, so turns within one
    /// session are strictly sequential while other sessions proceed.
    pub fn respond(&self, session_id: &str, message: &str) -> String {
        let handle = self.sessions.handle(session_id);
        let mut session = handle.lock().unwrap_or_else(PoisonError::into_inner);

        session.add_user(message);
        // Snapshot excludes the turn just recorded: the routing and
        // refinement calls carry the message explicitly and must not see
        // it twice.
        let prior: Vec<Turn> = {
            let history = session.history();
            history[..history.len() - 1].to_vec()
        };

        match self.answer_turn(message, &prior) {
            Ok(reply) => {
                session.add_assistant(reply.clone());
                reply
            }
            Err(err) => {
                tracing::error!(session_id, "turn failed: {err}");
                if self.options.rollback_on_failure {
                    session.pop_dangling_user();
                }
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Clears a session back to its greeting seed; idempotent, and
    /// auto-creates unknown ids.
    pub fn reset_session(&self, session_id: &str) {
        self.sessions.reset(session_id);
    }

    /// Returns a snapshot of a session's history.
    #[must_use]
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        let handle = self.sessions.handle(session_id);
        let session = handle.lock().unwrap_or_else(PoisonError::into_inner);
        session.history().to_vec()
    }

    /// Returns the session store.
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Runs routing, evidence gathering, and refinement for one turn.
    fn answer_turn(&self, message: &str, prior: &[Turn]) -> crate::Result<String> {
        match router::route(self.llm.as_ref(), prior, message)? {
            RouteDecision::Direct(text) => {
                tracing::info!("routed to direct answer");
                Ok(text)
            }
            RouteDecision::Retrieve {
                question,
                leadership,
            } => {
                tracing::info!(leadership, "routed to retrieval");
                let evidence = evidence::gather(
                    self.llm.as_ref(),
                    self.retriever.as_ref(),
                    self.search.as_ref(),
                    &question,
                    self.options.top_k,
                    self.options.max_web_results,
                );
                refiner::refine(self.llm.as_ref(), &evidence, prior)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;
    use crate::models::{RetrievedMatch, Role, WebSearchResponse};
    use crate::{Error, Result};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// LLM stub that replays scripted replies; `None` entries fail.
    struct ScriptedLlm {
        replies: Mutex<VecDeque<Option<String>>>,
    }

    impl ScriptedLlm {
        fn new(replies: &[Option<&str>]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .iter()
                        .map(|r| r.map(ToString::to_string))
                        .collect(),
                ),
            })
        }
    }

    impl LlmProvider for ScriptedLlm {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            match self.replies.lock().unwrap().pop_front() {
                Some(Some(reply)) => Ok(reply),
                _ => Err(Error::OperationFailed {
                    operation: "complete".to_string(),
                    cause: "scripted failure".to_string(),
                }),
            }
        }
    }

    struct FixedRetriever(Vec<RetrievedMatch>);

    impl QaRetriever for FixedRetriever {
        fn query(&self, _question: &str, _top_k: usize) -> Result<Vec<RetrievedMatch>> {
            Ok(self.0.clone())
        }
    }

    struct EmptySearch;

    impl WebSearchProvider for EmptySearch {
        fn search(&self, _query: &str, _max_results: usize) -> Result<WebSearchResponse> {
            Ok(WebSearchResponse::default())
        }
    }

    fn matches() -> Vec<RetrievedMatch> {
        vec![RetrievedMatch {
            question: "How do I motivate my team?".to_string(),
            answer: "Tie the work to purpose.".to_string(),
            score: 0.9,
        }]
    }

    fn agent(llm: Arc<ScriptedLlm>) -> CoachAgent {
        CoachAgent::new(
            llm,
            Arc::new(FixedRetriever(matches())),
            Arc::new(EmptySearch),
            AgentOptions::default(),
        )
    }

    #[test]
    fn test_direct_route_records_both_turns() {
        let llm = ScriptedLlm::new(&[Some(r#"{"action": "answer", "response": "Glad to chat."}"#)]);
        let agent = agent(llm);

        let reply = agent.respond("s1", "hello");
        assert_eq!(reply, "Glad to chat.");

        let history = agent.history("s1");
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].role, Role::User);
        assert_eq!(history[2].content, "Glad to chat.");
    }

    #[test]
    fn test_retrieval_route_refines_evidence() {
        let llm = ScriptedLlm::new(&[
            Some(r#"{"action": "retrieve", "question": "How do I motivate my team?", "leadership": true}"#),
            Some("True"),
            Some("Connect daily work to a purpose your team believes in."),
        ]);
        let agent = agent(llm);

        let reply = agent.respond("s1", "How do I motivate my team?");
        assert_eq!(
            reply,
            "Connect daily work to a purpose your team believes in."
        );
        assert_eq!(agent.history("s1").len(), 3);
    }

    #[test]
    fn test_refinement_failure_returns_fallback_and_keeps_user_turn() {
        let llm = ScriptedLlm::new(&[
            Some(r#"{"action": "retrieve", "question": "Q", "leadership": true}"#),
            Some("True"),
            None, // refinement call fails
        ]);
        let agent = agent(llm);

        let reply = agent.respond("s1", "my question");
        assert_eq!(reply, FALLBACK_REPLY);

        let history = agent.history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::User);
        assert_eq!(history[1].content, "my question");
    }

    #[test]
    fn test_rollback_policy_removes_dangling_user_turn() {
        let llm = ScriptedLlm::new(&[None]); // routing call fails outright
        let agent = CoachAgent::new(
            llm,
            Arc::new(FixedRetriever(Vec::new())),
            Arc::new(EmptySearch),
            AgentOptions {
                rollback_on_failure: true,
                ..AgentOptions::default()
            },
        );

        let reply = agent.respond("s1", "my question");
        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(agent.history("s1").len(), 1);
    }

    #[test]
    fn test_reset_session_is_idempotent() {
        let llm = ScriptedLlm::new(&[Some(r#"{"action": "answer", "response": "ok"}"#)]);
        let agent = agent(llm);
        agent.respond("s1", "hello");

        agent.reset_session("s1");
        let once = agent.history("s1");
        agent.reset_session("s1");
        let twice = agent.history("s1");

        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
        assert_eq!(once[0].content, DEFAULT_GREETING);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let llm = ScriptedLlm::new(&[
            Some(r#"{"action": "answer", "response": "one"}"#),
            Some(r#"{"action": "answer", "response": "two"}"#),
        ]);
        let agent = agent(llm);

        agent.respond("a", "first");
        agent.respond("b", "second");

        assert_eq!(agent.history("a").len(), 3);
        assert_eq!(agent.history("b").len(), 3);
        assert_eq!(agent.history("a")[2].content, "one");
        assert_eq!(agent.history("b")[2].content, "two");
    }
}
