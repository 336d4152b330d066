//! The fake adapter implementations.

use async_trait::async_trait;
use review_core::{
    CacheError, ChangeEvent, EventLog, EventLogError, Review, ReviewCache, ReviewReply,
    ReviewStatus, ReviewStore, SearchError, SearchIndex, SearchPage, SearchQuery, SortBy,
    SortOrder, StoreError, ReviewDocument,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[derive(Default)]
struct StoreState {
    reviews: BTreeMap<u64, Review>,
    replies: Vec<ReviewReply>,
    next_review: u64,
    next_reply: u64,
}

/// In-memory record store with the same observable behavior as the Postgres
/// adapter: assigned ids, server-side `created_at`, not-found distinction
/// and the `(review_id, merchant_id)` uniqueness rule.
#[derive(Default)]
pub struct MemoryReviewStore {
    state: Mutex<StoreState>,
}

impl MemoryReviewStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reviews.
    pub fn len(&self) -> usize {
        self.state.lock().expect("lock poisoned").reviews.len()
    }

    /// True when no review is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn insert(&self, review: &Review) -> Result<Review, StoreError> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.next_review += 1;
        let mut stored = review.clone();
        stored.id = state.next_review;
        stored.created_at = now_epoch();
        state.reviews.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, review: &Review) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("lock poisoned");
        let row = state
            .reviews
            .get_mut(&review.id)
            .ok_or(StoreError::NotFound)?;
        row.subject = review.subject.clone();
        row.content = review.content.clone();
        row.rating = review.rating;
        row.status = review.status;
        row.audit_reason = review.audit_reason.clone();
        row.audit_by = review.audit_by;
        row.audit_at = review.audit_at;
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.reviews.remove(&id).ok_or(StoreError::NotFound)?;
        state.replies.retain(|reply| reply.review_id != id);
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Review, StoreError> {
        let state = self.state.lock().expect("lock poisoned");
        state.reviews.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(state.reviews.len() as u64)
    }

    async fn list_offset(&self, limit: u64, offset: u64) -> Result<Vec<Review>, StoreError> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(state
            .reviews
            .values()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_pending(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Review>, u64), StoreError> {
        let state = self.state.lock().expect("lock poisoned");
        let pending: Vec<&Review> = state
            .reviews
            .values()
            .rev()
            .filter(|review| review.status == ReviewStatus::Pending)
            .collect();
        let total = pending.len() as u64;
        let page = pending
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn insert_reply(&self, reply: &ReviewReply) -> Result<u64, StoreError> {
        let mut state = self.state.lock().expect("lock poisoned");
        let duplicate = state
            .replies
            .iter()
            .any(|r| r.review_id == reply.review_id && r.merchant_id == reply.merchant_id);
        if duplicate {
            return Err(StoreError::Conflict(
                "reply already exists for this merchant".to_string(),
            ));
        }
        state.next_reply += 1;
        let mut stored = reply.clone();
        stored.id = state.next_reply;
        stored.created_at = now_epoch();
        let id = stored.id;
        state.replies.push(stored);
        Ok(id)
    }

    async fn reply_exists(&self, review_id: u64, merchant_id: u64) -> Result<bool, StoreError> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(state
            .replies
            .iter()
            .any(|r| r.review_id == review_id && r.merchant_id == merchant_id))
    }

    async fn list_replies(&self, review_id: u64) -> Result<Vec<ReviewReply>, StoreError> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(state
            .replies
            .iter()
            .filter(|r| r.review_id == review_id)
            .cloned()
            .collect())
    }
}

/// In-memory cache. TTLs are recorded but never expire; tests assert on
/// presence and payload, not on clocks.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `key` currently holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .expect("lock poisoned")
            .contains_key(key)
    }

    /// The raw payload under `key`, if any.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().expect("lock poisoned").get(key).cloned()
    }

    /// Plant a payload directly, bypassing the contract. Used to simulate
    /// corrupt entries.
    pub fn plant(&self, key: &str, value: &[u8]) {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert(key.to_string(), value.to_vec());
    }
}

#[async_trait]
impl ReviewCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.lock().expect("lock poisoned").get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().expect("lock poisoned").remove(key);
        Ok(())
    }
}

/// A cache whose every operation fails, for asserting that cache trouble
/// never fails a write or a read.
#[derive(Default)]
pub struct FailingCache;

#[async_trait]
impl ReviewCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Backend("cache is down".to_string()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("cache is down".to_string()))
    }

    async fn del(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Backend("cache is down".to_string()))
    }
}

/// In-memory event log capturing everything published, in order.
#[derive(Default)]
pub struct MemoryEventLog {
    published: Mutex<Vec<ChangeEvent>>,
}

impl MemoryEventLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.published.lock().expect("lock poisoned").clone()
    }

    /// The most recent event, if any.
    pub fn last(&self) -> Option<ChangeEvent> {
        self.published.lock().expect("lock poisoned").last().cloned()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), EventLogError> {
        self.published
            .lock()
            .expect("lock poisoned")
            .push(event.clone());
        Ok(())
    }
}

/// In-memory search index with the list contract's filter, sort and paging
/// semantics. Relevance order is approximated as newest-id first, which is
/// deterministic and good enough for scenario assertions.
#[derive(Default)]
pub struct MemorySearchIndex {
    docs: Mutex<BTreeMap<u64, ReviewDocument>>,
}

impl MemorySearchIndex {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently indexed.
    pub fn len(&self) -> usize {
        self.docs.lock().expect("lock poisoned").len()
    }

    /// True when the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current document for a review, if indexed.
    pub fn document(&self, id: u64) -> Option<ReviewDocument> {
        self.docs.lock().expect("lock poisoned").get(&id).cloned()
    }

    fn matches(doc: &ReviewDocument, query: &SearchQuery) -> bool {
        if let Some(text) = &query.text {
            let subject = doc.review.subject.to_lowercase();
            let content = doc.review.content.to_lowercase();
            let all_terms = text
                .to_lowercase()
                .split_whitespace()
                .all(|term| subject.contains(term) || content.contains(term));
            if !all_terms {
                return false;
            }
        }
        if let Some(user_id) = query.user_id {
            if doc.review.user_id != user_id {
                return false;
            }
        }
        if let Some(min) = query.rating_min {
            if doc.review.rating < min {
                return false;
            }
        }
        if let Some(max) = query.rating_max {
            if doc.review.rating > max {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn index(&self, doc: &ReviewDocument) -> Result<(), SearchError> {
        self.docs
            .lock()
            .expect("lock poisoned")
            .insert(doc.review.id, doc.clone());
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<(), SearchError> {
        // Deleting an absent document is a no-op, as in the real engine.
        self.docs.lock().expect("lock poisoned").remove(&id);
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
        let docs = self.docs.lock().expect("lock poisoned");
        let mut hits: Vec<&ReviewDocument> = docs
            .values()
            .filter(|doc| Self::matches(doc, query))
            .collect();

        match query.sort {
            SortBy::Relevance => hits.sort_by(|a, b| b.review.id.cmp(&a.review.id)),
            SortBy::Ts => hits.sort_by(|a, b| match query.order {
                SortOrder::Asc => a.ts.cmp(&b.ts).then(b.review.id.cmp(&a.review.id)),
                SortOrder::Desc => b.ts.cmp(&a.ts).then(b.review.id.cmp(&a.review.id)),
            }),
            SortBy::Rating => hits.sort_by(|a, b| match query.order {
                SortOrder::Asc => a
                    .review
                    .rating
                    .cmp(&b.review.rating)
                    .then(b.review.id.cmp(&a.review.id)),
                SortOrder::Desc => b
                    .review
                    .rating
                    .cmp(&a.review.rating)
                    .then(b.review.id.cmp(&a.review.id)),
            }),
        }

        let total = hits.len() as u64;
        let reviews = hits
            .into_iter()
            .skip(query.from as usize)
            .take(query.size as usize)
            .map(|doc| doc.review.clone())
            .collect();

        Ok(SearchPage { reviews, total })
    }
}

/// A search index whose every operation fails, for driving the list
/// endpoint onto its record store fallback.
#[derive(Default)]
pub struct FailingSearchIndex;

#[async_trait]
impl SearchIndex for FailingSearchIndex {
    async fn index(&self, _doc: &ReviewDocument) -> Result<(), SearchError> {
        Err(SearchError::Transport("search index is down".to_string()))
    }

    async fn delete(&self, _id: u64) -> Result<(), SearchError> {
        Err(SearchError::Transport("search index is down".to_string()))
    }

    async fn search(&self, _query: &SearchQuery) -> Result<SearchPage, SearchError> {
        Err(SearchError::Transport("search index is down".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, user_id: u64, rating: i32, subject: &str, ts: i64) -> ReviewDocument {
        ReviewDocument {
            review: Review {
                id,
                user_id,
                rating,
                subject: subject.to_string(),
                content: "body".to_string(),
                ..Review::default()
            },
            ts,
        }
    }

    #[tokio::test]
    async fn store_assigns_monotone_ids() {
        let store = MemoryReviewStore::new();
        let first = store.insert(&Review::default()).await.unwrap();
        let second = store.insert(&Review::default()).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(first.created_at > 0);
    }

    #[tokio::test]
    async fn store_distinguishes_not_found() {
        let store = MemoryReviewStore::new();
        assert!(matches!(store.get(99).await, Err(StoreError::NotFound)));
        assert!(matches!(store.delete(99).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn duplicate_reply_is_a_conflict() {
        let store = MemoryReviewStore::new();
        let reply = ReviewReply {
            review_id: 1,
            merchant_id: 77,
            content: "thanks".to_string(),
            ..ReviewReply::default()
        };
        store.insert_reply(&reply).await.unwrap();
        assert!(matches!(
            store.insert_reply(&reply).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn index_filters_and_sorts() {
        let index = MemorySearchIndex::new();
        index.index(&doc(1, 9, 5, "great", 10)).await.unwrap();
        index.index(&doc(2, 9, 3, "fine", 11)).await.unwrap();
        index.index(&doc(3, 8, 1, "bad", 12)).await.unwrap();

        let query = SearchQuery {
            user_id: Some(9),
            rating_min: Some(3),
            rating_max: Some(5),
            sort: SortBy::Rating,
            order: SortOrder::Asc,
            from: 0,
            size: 20,
            ..SearchQuery::default()
        };
        let page = index.search(&query).await.unwrap();
        assert_eq!(page.total, 2);
        let ratings: Vec<i32> = page.reviews.iter().map(|r| r.rating).collect();
        assert_eq!(ratings, vec![3, 5]);
    }

    #[tokio::test]
    async fn index_requires_every_text_term() {
        let index = MemorySearchIndex::new();
        index.index(&doc(1, 1, 5, "great coffee", 1)).await.unwrap();
        index.index(&doc(2, 1, 5, "great tea", 2)).await.unwrap();

        let query = SearchQuery {
            text: Some("great coffee".to_string()),
            from: 0,
            size: 20,
            ..SearchQuery::default()
        };
        let page = index.search(&query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.reviews[0].id, 1);
    }

    #[tokio::test]
    async fn reindex_is_last_write_wins() {
        let index = MemorySearchIndex::new();
        index.index(&doc(1, 1, 2, "first", 1)).await.unwrap();
        index.index(&doc(1, 1, 4, "second", 2)).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.document(1).unwrap().review.rating, 4);

        index.delete(1).await.unwrap();
        index.delete(1).await.unwrap();
        assert!(index.is_empty());
    }
}
