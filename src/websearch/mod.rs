//! Web search fallback source.
//!
//! When retrieval comes back empty or the sufficiency judge rejects it,
//! the agent gathers evidence from live web search instead. Failures at
//! this boundary surface as `Err` and are degraded to placeholder
//! evidence by the caller; a turn is never aborted because the fallback
//! source was unreachable.

mod tavily;

pub use tavily::{TavilyClient, TavilyConfig};

use crate::Result;
use crate::models::WebSearchResponse;

/// Trait for web search providers.
pub trait WebSearchProvider: Send + Sync {
    /// Searches the web, returning ranked snippets in provider order.
    ///
    /// # Errors
    ///
    /// Returns an error if the search call fails; callers treat this as
    /// degraded evidence, not a fatal condition.
    fn search(&self, query: &str, max_results: usize) -> Result<WebSearchResponse>;
}
