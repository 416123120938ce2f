//! Property-based tests for the agent's pure pieces.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Evidence formatters preserve input order and never re-sort
//! - The sufficiency parse accepts exactly one affirmative literal
//! - Session history length tracks appends exactly
//! - The truncation bound holds while the seed turn survives

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use mentor::agent::{ChatSession, Sufficiency, format_rag_evidence, format_web_evidence};
use mentor::models::{RetrievedMatch, WebResult};
use proptest::prelude::*;

/// Single-line text that cannot collide with the formatter's own labels.
fn line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.?!']{1,40}"
}

proptest! {
    /// Property: RAG formatting lists matches in input order, two lines
    /// per match, regardless of score.
    #[test]
    fn prop_rag_evidence_preserves_order(
        entries in prop::collection::vec((line(), line(), 0.0f32..=1.0), 0..8)
    ) {
        let matches: Vec<RetrievedMatch> = entries
            .iter()
            .map(|(q, a, score)| RetrievedMatch {
                question: q.clone(),
                answer: a.clone(),
                score: *score,
            })
            .collect();

        let text = format_rag_evidence(&matches);
        if matches.is_empty() {
            prop_assert_eq!(text, "");
        } else {
            let lines: Vec<&str> = text.split('\n').collect();
            prop_assert_eq!(lines.len(), matches.len() * 2);
            for (i, m) in matches.iter().enumerate() {
                prop_assert_eq!(lines[2 * i], format!("Question: {}", m.question));
                prop_assert_eq!(lines[2 * i + 1], format!("Answer: {}", m.answer));
            }
        }
    }

    /// Property: web formatting lists results in input order, three lines
    /// per result.
    #[test]
    fn prop_web_evidence_preserves_order(
        entries in prop::collection::vec((line(), line(), line()), 0..8)
    ) {
        let results: Vec<WebResult> = entries
            .iter()
            .map(|(title, url, snippet)| WebResult {
                title: title.clone(),
                url: url.clone(),
                snippet: snippet.clone(),
            })
            .collect();

        let text = format_web_evidence(&results);
        if results.is_empty() {
            prop_assert_eq!(text, "");
        } else {
            let lines: Vec<&str> = text.split('\n').collect();
            prop_assert_eq!(lines.len(), results.len() * 3);
            for (i, r) in results.iter().enumerate() {
                prop_assert_eq!(lines[3 * i], format!("Title: {}", r.title));
                prop_assert_eq!(lines[3 * i + 1], format!("URL: {}", r.url));
                prop_assert_eq!(lines[3 * i + 2], format!("Snippet: {}", r.snippet));
            }
        }
    }

    /// Property: only the exact literal `True` is sufficient.
    #[test]
    fn prop_only_exact_affirmative_is_sufficient(s in ".{0,20}") {
        let verdict = Sufficiency::parse(&s);
        prop_assert_eq!(verdict == Sufficiency::Sufficient, s == "True");
        prop_assert_eq!(verdict == Sufficiency::Insufficient, s == "False");
    }

    /// Property: an unbounded session holds exactly `1 + appends` turns,
    /// in append order.
    #[test]
    fn prop_unbounded_history_length(contents in prop::collection::vec(line(), 0..20)) {
        let mut session = ChatSession::new("greeting", 0);
        for (i, content) in contents.iter().enumerate() {
            if i % 2 == 0 {
                session.add_user(content.clone());
            } else {
                session.add_assistant(content.clone());
            }
        }

        prop_assert_eq!(session.history().len(), contents.len() + 1);
        for (i, content) in contents.iter().enumerate() {
            prop_assert_eq!(&session.history()[i + 1].content, content);
        }
    }

    /// Property: a bounded session never exceeds its bound and always
    /// keeps the greeting seed at index 0.
    #[test]
    fn prop_truncation_bound_holds(
        bound in 1usize..10,
        appends in 0usize..30
    ) {
        let mut session = ChatSession::new("greeting", bound);
        for i in 0..appends {
            session.add_user(format!("turn {i}"));
        }

        prop_assert!(session.history().len() <= bound.max(1));
        prop_assert_eq!(&session.history()[0].content, "greeting");
    }
}
