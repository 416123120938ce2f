//! # Mentor
//!
//! A retrieval-augmented leadership coaching agent.
//!
//! Mentor ingests talk transcripts, distills them into question/answer
//! pairs, embeds those pairs into a vector index, and serves a
//! conversational coach that answers leadership questions from retrieved
//! transcript knowledge, falling back to live web search when retrieval
//! is insufficient.
//!
//! ## Architecture
//!
//! - **Collaborator seams** (`llm`, `embedding`, `retrieval`, `websearch`):
//!   trait-based adapters over external HTTP services, injected into the
//!   agent so tests can substitute stubs.
//! - **Agent core** (`agent`): per-turn routing, sufficiency judging,
//!   evidence formatting, response refinement, and session memory.
//! - **Ingestion** (`ingest`, `io`): offline transcript cleaning, Q&A
//!   extraction, and vector-index loading.
//! - **Surfaces** (`server`, `commands`): an axum chat API and a CLI.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mentor::agent::{AgentOptions, CoachAgent};
//!
//! let agent = CoachAgent::new(llm, retriever, search, AgentOptions::default());
//! let reply = agent.respond("session-1", "How do I motivate my team?");
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod agent;
pub mod commands;
pub mod config;
pub mod embedding;
pub mod ingest;
pub mod io;
pub mod llm;
pub mod models;
pub mod observability;
pub mod retrieval;
pub mod server;
pub mod websearch;

// Re-exports for convenience
pub use agent::{AgentOptions, CoachAgent, SessionStore};
pub use config::MentorConfig;
pub use embedding::Embedder;
pub use llm::{ChatMessage, ChatRole, LlmProvider};
pub use models::{QaRecord, RetrievedMatch, Role, Turn, WebResult, WebSearchResponse};
pub use retrieval::QaRetriever;
pub use websearch::WebSearchProvider;

/// Error type for mentor operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty queries, malformed records, unparseable model output |
/// | `OperationFailed` | HTTP calls fail, responses cannot be decoded, I/O errors |
/// | `MissingCredential` | A required API key is absent from config and environment |
///
/// Evidence-gathering failures are deliberately *not* errors at the agent
/// boundary: retrieval failure cascades to web search, web-search failure
/// degrades to placeholder evidence, and only refinement failure surfaces,
/// as a fixed apology string rather than an `Error`.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A search or chat query is empty
    /// - A Q&A record fails validation during import
    /// - Model output cannot be parsed where a structured reply is required
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - An outbound HTTP call fails or times out
    /// - A response body cannot be decoded
    /// - Filesystem I/O errors occur during ingestion
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A required credential is missing.
    ///
    /// Raised when:
    /// - An API key is neither configured nor present in the environment
    #[error("missing credential: {0} is not set")]
    MissingCredential(String),
}

/// Result type alias for mentor operations.
pub type Result<T> = std::result::Result<T, Error>;
