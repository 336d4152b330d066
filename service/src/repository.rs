//! The review repository: composes the record store, cache, event log and
//! search index into the service's write and read paths.
//!
//! # Write discipline
//!
//! Every write commits to the record store first and only then touches the
//! derived substrates, in a fixed order: invalidate the point cache, then
//! publish the change event. Both side effects are best-effort; a failure is
//! logged and swallowed because the committed row is already authoritative
//! and the derived stores self-heal on the next successful write for the
//! same review.
//!
//! # Read discipline
//!
//! Point reads consult the cache and fall through to the store on a miss, a
//! backend error or an undecodable payload, re-filling the cache with a
//! 5-minute TTL. Lists prefer the search index when one is configured and
//! fall back to a paged store scan (ordered by id descending, total
//! unfiltered) when the index misbehaves.

use chrono::Utc;
use review_core::{
    review_key, ChangeEvent, ChangeOp, Error, EventLog, Review, ReviewCache, ReviewReply,
    ReviewStore, SearchIndex, SearchPage, SearchQuery, POINT_READ_TTL,
};
use std::sync::Arc;

/// Composes the four adapters behind one interface for the service layer.
///
/// Only the record store is mandatory. A missing cache, event log or search
/// index degrades the corresponding concern without affecting correctness.
#[derive(Clone)]
pub struct ReviewRepository {
    store: Arc<dyn ReviewStore>,
    cache: Option<Arc<dyn ReviewCache>>,
    events: Option<Arc<dyn EventLog>>,
    search: Option<Arc<dyn SearchIndex>>,
}

impl ReviewRepository {
    /// A repository backed only by the record store.
    #[must_use]
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self {
            store,
            cache: None,
            events: None,
            search: None,
        }
    }

    /// Attach a point-read cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ReviewCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach a change-event log.
    #[must_use]
    pub fn with_event_log(mut self, events: Arc<dyn EventLog>) -> Self {
        self.events = Some(events);
        self
    }

    /// Attach a search index for list queries.
    #[must_use]
    pub fn with_search_index(mut self, search: Arc<dyn SearchIndex>) -> Self {
        self.search = Some(search);
        self
    }

    /// Insert a review and return its assigned id.
    ///
    /// # Errors
    ///
    /// Only the store insert can fail the call; the cache invalidation and
    /// event publish that follow are best-effort.
    pub async fn create(&self, review: Review) -> Result<u64, Error> {
        let stored = self.store.insert(&review).await?;
        // Defensive even for a fresh id: a stale entry could survive an
        // earlier delete whose invalidation failed.
        self.invalidate(stored.id).await;
        let id = stored.id;
        self.publish(ChangeOp::Create, stored).await;
        Ok(id)
    }

    /// Persist the full current state of `review`.
    ///
    /// # Errors
    ///
    /// Fails when the row is missing or the store is unavailable.
    pub async fn update(&self, review: Review) -> Result<(), Error> {
        self.store.update(&review).await?;
        self.invalidate(review.id).await;
        self.publish(ChangeOp::Update, review).await;
        Ok(())
    }

    /// Remove a review, purging the cache and tombstoning the index via an
    /// id-only delete event.
    ///
    /// # Errors
    ///
    /// Fails when the row is missing or the store is unavailable.
    pub async fn delete(&self, id: u64) -> Result<(), Error> {
        self.store.delete(id).await?;
        self.invalidate(id).await;
        if let Some(events) = &self.events {
            let event = ChangeEvent::deletion(id, Utc::now().timestamp());
            if let Err(error) = events.publish(&event).await {
                tracing::warn!(review_id = id, %error, "failed to publish delete event");
            }
        }
        Ok(())
    }

    /// Fetch one review, cache-first.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the row does not exist; cache trouble is
    /// never surfaced.
    pub async fn get(&self, id: u64) -> Result<Review, Error> {
        let key = review_key(id);

        if let Some(cache) = &self.cache {
            match cache.get(&key).await {
                Ok(Some(bytes)) => match serde_json::from_slice::<Review>(&bytes) {
                    Ok(review) => return Ok(review),
                    Err(error) => {
                        // Fall through; the re-fill below overwrites the bad
                        // entry.
                        tracing::warn!(review_id = id, %error, "corrupt cache entry");
                    }
                },
                Ok(None) => {}
                Err(error) => {
                    tracing::debug!(review_id = id, %error, "cache read failed");
                }
            }
        }

        let review = self.store.get(id).await?;

        if let Some(cache) = &self.cache {
            match serde_json::to_vec(&review) {
                Ok(bytes) => {
                    if let Err(error) = cache.set(&key, &bytes, POINT_READ_TTL).await {
                        tracing::warn!(review_id = id, %error, "cache fill failed");
                    }
                }
                Err(error) => {
                    tracing::warn!(review_id = id, %error, "failed to encode review for cache");
                }
            }
        }

        Ok(review)
    }

    /// Execute a list query, search-preferred.
    ///
    /// # Errors
    ///
    /// Fails only when the fallback store scan fails; a search index error
    /// is logged and absorbed by the fallback.
    pub async fn list(&self, query: &SearchQuery) -> Result<SearchPage, Error> {
        if let Some(search) = &self.search {
            match search.search(query).await {
                Ok(page) => return Ok(page),
                Err(error) => {
                    tracing::warn!(%error, "search index query failed, falling back to store");
                }
            }
        }

        // Functional fallback, not faithful to ranking: id-descending pages
        // and an unfiltered total.
        let total = self.store.count().await?;
        let reviews = self.store.list_offset(query.size, query.from).await?;
        Ok(SearchPage { reviews, total })
    }

    /// A page of pending reviews with the exact pending total.
    ///
    /// # Errors
    ///
    /// Fails when the store is unavailable.
    pub async fn list_pending(&self, limit: u64, offset: u64) -> Result<(Vec<Review>, u64), Error> {
        Ok(self.store.list_pending(limit, offset).await?)
    }

    /// Insert a reply.
    ///
    /// # Errors
    ///
    /// [`Error::Conflict`] for a duplicate `(review_id, merchant_id)` pair.
    pub async fn add_reply(&self, reply: ReviewReply) -> Result<u64, Error> {
        Ok(self.store.insert_reply(&reply).await?)
    }

    /// Whether a merchant already replied to a review.
    ///
    /// # Errors
    ///
    /// Fails when the store is unavailable.
    pub async fn reply_exists(&self, review_id: u64, merchant_id: u64) -> Result<bool, Error> {
        Ok(self.store.reply_exists(review_id, merchant_id).await?)
    }

    /// All replies for a review.
    ///
    /// # Errors
    ///
    /// Fails when the store is unavailable.
    pub async fn list_replies(&self, review_id: u64) -> Result<Vec<ReviewReply>, Error> {
        Ok(self.store.list_replies(review_id).await?)
    }

    async fn invalidate(&self, id: u64) {
        if let Some(cache) = &self.cache {
            if let Err(error) = cache.del(&review_key(id)).await {
                tracing::warn!(review_id = id, %error, "cache invalidation failed");
            }
        }
    }

    async fn publish(&self, op: ChangeOp, payload: Review) {
        if let Some(events) = &self.events {
            let event = ChangeEvent::new(op, payload, Utc::now().timestamp());
            if let Err(error) = events.publish(&event).await {
                tracing::warn!(
                    review_id = event.payload.id,
                    op = %event.op,
                    %error,
                    "failed to publish change event"
                );
            }
        }
    }
}
