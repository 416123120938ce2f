//! Vector retrieval over stored Q&A records.
//!
//! The agent consumes retrieval through the [`QaRetriever`] seam; the
//! shipped implementation embeds the query text and searches a Pinecone
//! serverless index, returning matches in the index's own ranking order.

mod pinecone;

pub use pinecone::{PineconeConfig, PineconeIndex};

use crate::Result;
use crate::models::RetrievedMatch;

/// Trait for Q&A retrieval backends.
pub trait QaRetriever: Send + Sync {
    /// Returns the top-k records semantically nearest to `question`.
    ///
    /// Matches are returned in the backend's ranking order, most similar
    /// first. An empty vector means the index holds nothing relevant.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the index query fails.
    fn query(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedMatch>>;
}
