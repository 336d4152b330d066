//! The record store contract, the authoritative home of reviews and replies.

use crate::review::{Review, ReviewReply};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the record store adapter.
///
/// The adapter distinguishes a missing row from a driver fault; callers map
/// [`StoreError::NotFound`] to the domain 404 and everything else to
/// unavailability.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("row not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// The driver or the database itself failed.
    #[error("database error: {0}")]
    Database(String),
}

/// CRUD over the `reviews` and `review_replies` tables.
///
/// Writes are autocommit single statements; no multi-row transaction is ever
/// required. All listing reads order by `id` descending so that fallback
/// pages are stable for a stable dataset.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert a new review and return the row as stored, with its assigned
    /// id and `created_at`. The caller's values for both are ignored.
    async fn insert(&self, review: &Review) -> Result<Review, StoreError>;

    /// Overwrite the mutable fields of `review.id`: subject, content,
    /// rating, status and the audit columns.
    async fn update(&self, review: &Review) -> Result<(), StoreError>;

    /// Remove a review row.
    async fn delete(&self, id: u64) -> Result<(), StoreError>;

    /// Fetch one review, [`StoreError::NotFound`] when the row is missing.
    async fn get(&self, id: u64) -> Result<Review, StoreError>;

    /// Total number of review rows, unfiltered.
    async fn count(&self) -> Result<u64, StoreError>;

    /// A page of reviews ordered by `id` descending.
    async fn list_offset(&self, limit: u64, offset: u64) -> Result<Vec<Review>, StoreError>;

    /// A page of pending reviews ordered by `id` descending, with the exact
    /// pending total.
    async fn list_pending(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Review>, u64), StoreError>;

    /// Insert a reply; a duplicate `(review_id, merchant_id)` pair is a
    /// [`StoreError::Conflict`].
    async fn insert_reply(&self, reply: &ReviewReply) -> Result<u64, StoreError>;

    /// Whether a reply already exists for this review and merchant.
    async fn reply_exists(&self, review_id: u64, merchant_id: u64) -> Result<bool, StoreError>;

    /// All replies for a review, oldest first.
    async fn list_replies(&self, review_id: u64) -> Result<Vec<ReviewReply>, StoreError>;
}
