//! The search index contract.
//!
//! The index is a derived read model maintained by the projector. Documents
//! are keyed by the decimal review id, which makes projection idempotent:
//! re-indexing a replayed event is last-write-wins and deleting an absent
//! document is a no-op.

use crate::query::SearchQuery;
use crate::review::Review;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the search index adapter.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request never reached the engine or the transport failed.
    #[error("search transport error: {0}")]
    Transport(String),

    /// The engine answered with a non-success status.
    #[error("search engine returned {status}: {reason}")]
    Status {
        /// HTTP status code from the engine.
        status: u16,
        /// Engine-provided failure detail.
        reason: String,
    },

    /// The engine's response body did not parse.
    #[error("search decode error: {0}")]
    Decode(String),
}

/// The indexed form of a review: the entity fields plus the publish time of
/// the event that produced this version of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDocument {
    /// The review snapshot.
    #[serde(flatten)]
    pub review: Review,
    /// Event publish time, epoch seconds.
    pub ts: i64,
}

impl ReviewDocument {
    /// The document id, the decimal review id.
    #[must_use]
    pub fn doc_id(&self) -> String {
        self.review.id.to_string()
    }
}

/// One page of search results with the exact total for the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Matching reviews in requested order.
    pub reviews: Vec<Review>,
    /// Exact number of matches across all pages.
    pub total: u64,
}

/// Index mutations and structured queries over review documents.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create or replace the document for `doc.review.id`.
    async fn index(&self, doc: &ReviewDocument) -> Result<(), SearchError>;

    /// Remove a document; removing an absent one succeeds.
    async fn delete(&self, id: u64) -> Result<(), SearchError>;

    /// Execute a structured query. Totals are exact, never estimated.
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_flattens_review_fields() {
        let doc = ReviewDocument {
            review: Review {
                id: 3,
                rating: 4,
                subject: "ok".to_string(),
                ..Review::default()
            },
            ts: 99,
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["rating"], 4);
        assert_eq!(value["ts"], 99);
        assert!(value.get("review").is_none());
        assert_eq!(doc.doc_id(), "3");
    }
}
