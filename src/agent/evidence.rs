//! Evidence gathering and formatting.
//!
//! One pass per tool-routed turn: retrieve, judge, and fall back to web
//! search when retrieval comes back empty or untrusted. Every failure in
//! here cascades to the next source; the final degradation is a fixed
//! placeholder string that itself becomes the evidence, so the turn is
//! never aborted by this layer.

use super::judge::{Sufficiency, judge_sufficiency};
use crate::llm::LlmProvider;
use crate::models::{RetrievedMatch, WebResult};
use crate::retrieval::QaRetriever;
use crate::websearch::WebSearchProvider;

/// Evidence text used when the web-search fallback itself fails.
pub const WEB_SEARCH_UNAVAILABLE: &str = "Web search could not be performed.";

/// Formats retrieved matches into an evidence block.
///
/// One `Question:`/`Answer:` pair per match, joined with newlines, in the
/// retriever's own ranking order. An empty slice yields an empty string.
#[must_use]
pub fn format_rag_evidence(matches: &[RetrievedMatch]) -> String {
    matches
        .iter()
        .map(|m| format!("Question: {}\nAnswer: {}", m.question, m.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats web results into an evidence block, provider order preserved.
#[must_use]
pub fn format_web_evidence(results: &[WebResult]) -> String {
    results
        .iter()
        .map(|r| format!("Title: {}\nURL: {}\nSnippet: {}", r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Gathers evidence for one routed question.
///
/// Retrieval failure is treated as zero matches; zero matches skip the
/// judge entirely and go straight to web search. A non-affirmative or
/// unparseable judge verdict also falls back. The returned string is
/// always usable as refiner input.
pub(crate) fn gather(
    llm: &dyn LlmProvider,
    retriever: &dyn QaRetriever,
    search: &dyn WebSearchProvider,
    question: &str,
    top_k: usize,
    max_web_results: usize,
) -> String {
    let matches = match retriever.query(question, top_k) {
        Ok(matches) => matches,
        Err(err) => {
            tracing::warn!("retrieval failed, cascading to web search: {err}");
            Vec::new()
        }
    };

    if matches.is_empty() {
        tracing::info!("no retrieval matches, falling back to web search");
        return web_fallback(search, question, max_web_results);
    }

    match judge_sufficiency(llm, question, &matches) {
        Sufficiency::Sufficient => {
            tracing::info!(matches = matches.len(), "retrieved evidence accepted");
            format_rag_evidence(&matches)
        }
        verdict => {
            tracing::info!(?verdict, "retrieved evidence rejected, falling back");
            web_fallback(search, question, max_web_results)
        }
    }
}

/// Runs the web-search fallback, degrading to the placeholder on failure.
fn web_fallback(search: &dyn WebSearchProvider, question: &str, max_results: usize) -> String {
    match search.search(question, max_results) {
        Ok(response) => format_web_evidence(&response.results),
        Err(err) => {
            tracing::warn!("web search failed: {err}");
            WEB_SEARCH_UNAVAILABLE.to_string()
        }
    }
}
