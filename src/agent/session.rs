//! Conversation memory.
//!
//! One `ChatSession` per conversation, holding an ordered, append-only
//! turn log seeded with a greeting. The store keys sessions by caller-
//! supplied id and hands out per-session mutexes: a turn locks its
//! session for its full duration (routing through memory append), so
//! turns within one session are strictly sequential while distinct
//! sessions proceed in parallel.

use crate::models::Turn;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Greeting seeded into every fresh session.
pub const DEFAULT_GREETING: &str =
    "Hello! I'm your leadership coach. How can I help you on your leadership journey?";

/// One conversation's ordered turn history.
#[derive(Debug)]
pub struct ChatSession {
    /// Ordered turns, oldest first. Index 0 is always the greeting seed.
    turns: Vec<Turn>,
    /// Greeting used to reseed on `clear`.
    greeting: String,
    /// Keep-last bound on total turns; `0` disables truncation.
    max_turns: usize,
    /// When the session was created.
    created_at: DateTime<Utc>,
}

impl ChatSession {
    /// Creates a session seeded with the greeting turn.
    #[must_use]
    pub fn new(greeting: impl Into<String>, max_turns: usize) -> Self {
        let greeting = greeting.into();
        Self {
            turns: vec![Turn::assistant(greeting.clone())],
            greeting,
            max_turns,
            created_at: Utc::now(),
        }
    }

    /// Appends a user turn.
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
        self.truncate();
    }

    /// Appends an assistant turn.
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
        self.truncate();
    }

    /// Returns the full history in chronological order.
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    /// Atomically resets the session to the single greeting seed turn.
    pub fn clear(&mut self) {
        self.turns = vec![Turn::assistant(self.greeting.clone())];
    }

    /// Removes a trailing user turn left without an assistant reply.
    ///
    /// Used by the rollback-on-failure policy; a no-op when the last turn
    /// is not a user turn.
    pub(crate) fn pop_dangling_user(&mut self) -> bool {
        if self
            .turns
            .last()
            .is_some_and(|turn| turn.role == crate::models::Role::User)
        {
            self.turns.pop();
            return true;
        }
        false
    }

    /// Returns when the session was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Drops the oldest non-seed turns once the bound is exceeded.
    fn truncate(&mut self) {
        if self.max_turns == 0 {
            return;
        }
        while self.turns.len() > self.max_turns && self.turns.len() > 1 {
            self.turns.remove(1);
        }
    }
}

/// Session storage keyed by session id.
///
/// The map itself is behind a short-lived `RwLock`; each session is an
/// `Arc<Mutex<..>>` handle so one session's turn never blocks another
/// session. Unknown ids are auto-created rather than erroring.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<ChatSession>>>>,
    greeting: String,
    max_turns: usize,
}

impl SessionStore {
    /// Creates a store producing sessions with the given greeting and bound.
    #[must_use]
    pub fn new(greeting: impl Into<String>, max_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            greeting: greeting.into(),
            max_turns,
        }
    }

    /// Returns the session handle for an id, creating it when absent.
    #[must_use]
    pub fn handle(&self, session_id: &str) -> Arc<Mutex<ChatSession>> {
        if let Some(handle) = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
        {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(sessions.entry(session_id.to_string()).or_insert_with(|| {
            tracing::debug!(session_id, "creating session");
            Arc::new(Mutex::new(ChatSession::new(
                self.greeting.clone(),
                self.max_turns,
            )))
        }))
    }

    /// Resets a session to its greeting seed, creating it when absent.
    pub fn reset(&self, session_id: &str) {
        let handle = self.handle(session_id);
        handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!(session_id, "session reset");
    }

    /// Returns the number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_new_session_is_seeded() {
        let session = ChatSession::new(DEFAULT_GREETING, 0);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role, Role::Assistant);
        assert_eq!(session.history()[0].content, DEFAULT_GREETING);
    }

    #[test]
    fn test_append_preserves_chronological_order() {
        let mut session = ChatSession::new("hi", 0);
        session.add_user("first");
        session.add_assistant("second");
        session.add_user("third");

        let roles: Vec<Role> = session.history().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::Assistant, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(session.history()[3].content, "third");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut session = ChatSession::new("hi", 0);
        session.add_user("question");
        session.add_assistant("answer");

        session.clear();
        let first: Vec<Turn> = session.history().to_vec();
        session.clear();
        assert_eq!(session.history(), &first[..]);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].content, "hi");
    }

    #[test]
    fn test_truncation_keeps_seed_and_recent_turns() {
        let mut session = ChatSession::new("seed", 5);
        for i in 0..10 {
            session.add_user(format!("u{i}"));
            session.add_assistant(format!("a{i}"));
        }

        assert_eq!(session.history().len(), 5);
        assert_eq!(session.history()[0].content, "seed");
        assert_eq!(session.history()[4].content, "a9");
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut session = ChatSession::new("seed", 0);
        for i in 0..100 {
            session.add_user(format!("u{i}"));
        }
        assert_eq!(session.history().len(), 101);
    }

    #[test]
    fn test_pop_dangling_user() {
        let mut session = ChatSession::new("seed", 0);
        session.add_user("orphaned");
        assert!(session.pop_dangling_user());
        assert_eq!(session.history().len(), 1);
        // Not a user turn on top: no-op.
        assert!(!session.pop_dangling_user());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_store_auto_creates_and_isolates_sessions() {
        let store = SessionStore::new("hello", 0);
        let a = store.handle("a");
        a.lock().unwrap().add_user("from a");

        let b = store.handle("b");
        assert_eq!(b.lock().unwrap().history().len(), 1);
        assert_eq!(a.lock().unwrap().history().len(), 2);
        assert_eq!(store.session_count(), 2);
    }

    #[test]
    fn test_store_handle_returns_same_session() {
        let store = SessionStore::new("hello", 0);
        store.handle("a").lock().unwrap().add_user("turn");
        assert_eq!(store.handle("a").lock().unwrap().history().len(), 2);
    }

    #[test]
    fn test_store_reset_unknown_id_creates_seeded_session() {
        let store = SessionStore::new("hello", 0);
        store.reset("never-seen");
        let handle = store.handle("never-seen");
        assert_eq!(handle.lock().unwrap().history().len(), 1);
    }
}
