//! GroundingRetriever trait — the abstraction over the encyclopedia lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalFailure;

/// A retrieved reference document: the text injected into the grounded
/// engine call. Ephemeral — consumed within the turn, never retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingDoc {
    /// Canonical title of the retrieved page
    pub title: String,

    /// Plain-text body (intro extract, bounded by sentence count)
    pub body: String,
}

/// The grounding retriever contract.
///
/// Top-1 policy: implementations resolve ambiguity to their first
/// candidate and only surface [`RetrievalFailure::Ambiguous`] when that
/// secondary resolution also fails. The router never re-ranks or retries
/// across candidates.
#[async_trait]
pub trait GroundingRetriever: Send + Sync {
    /// Look up a topic; returns the top result or a tagged failure.
    async fn search(&self, topic: &str) -> std::result::Result<GroundingDoc, RetrievalFailure>;
}
