//! Repository scenarios: cache discipline, event publication and the
//! search-preferred list with its record store fallback.

use review_core::{
    review_key, ChangeOp, Error, Review, ReviewStore, SearchQuery, SortBy, SortOrder,
};
use review_service::projector::apply_event;
use review_service::ReviewRepository;
use review_testing::{
    FailingCache, FailingSearchIndex, MemoryCache, MemoryEventLog, MemoryReviewStore,
    MemorySearchIndex,
};
use std::sync::Arc;

fn review(user_id: u64, subject: &str, content: &str, rating: i32) -> Review {
    Review {
        user_id,
        subject: subject.to_string(),
        content: content.to_string(),
        rating,
        ..Review::default()
    }
}

fn page_query(size: u64, from: u64) -> SearchQuery {
    SearchQuery {
        size,
        from,
        ..SearchQuery::default()
    }
}

#[tokio::test]
async fn point_reads_fill_the_cache_with_the_store_payload() {
    let store = Arc::new(MemoryReviewStore::new());
    let cache = Arc::new(MemoryCache::new());
    let repo = ReviewRepository::new(store.clone()).with_cache(cache.clone());

    let id = repo.create(review(7, "Great", "loved it", 5)).await.unwrap();
    assert!(!cache.contains(&review_key(id)), "writes only invalidate");

    let from_store = store.get(id).await.unwrap();
    let first_read = repo.get(id).await.unwrap();
    assert_eq!(first_read, from_store);

    // The cached payload is bytewise the JSON of the stored row, so a
    // cache hit answers exactly like the store path.
    let cached = cache.raw(&review_key(id)).unwrap();
    assert_eq!(cached, serde_json::to_vec(&from_store).unwrap());

    let second_read = repo.get(id).await.unwrap();
    assert_eq!(second_read, from_store);
}

#[tokio::test]
async fn delete_purges_the_cache_and_tombstones_the_log() {
    let store = Arc::new(MemoryReviewStore::new());
    let cache = Arc::new(MemoryCache::new());
    let log = Arc::new(MemoryEventLog::new());
    let repo = ReviewRepository::new(store)
        .with_cache(cache.clone())
        .with_event_log(log.clone());

    let id = repo.create(review(7, "Great", "loved it", 5)).await.unwrap();
    repo.get(id).await.unwrap();
    assert!(cache.contains(&review_key(id)));

    repo.delete(id).await.unwrap();

    assert!(!cache.contains(&review_key(id)));
    assert!(matches!(repo.get(id).await, Err(Error::NotFound)));

    let last = log.last().unwrap();
    assert_eq!(last.op, ChangeOp::Delete);
    assert_eq!(last.payload.id, id);
    assert!(last.payload.subject.is_empty(), "id-only payload");
}

#[tokio::test]
async fn every_successful_write_appends_exactly_one_event() {
    let store = Arc::new(MemoryReviewStore::new());
    let log = Arc::new(MemoryEventLog::new());
    let repo = ReviewRepository::new(store.clone()).with_event_log(log.clone());

    let id = repo.create(review(7, "Great", "loved it", 5)).await.unwrap();

    let mut updated = store.get(id).await.unwrap();
    updated.rating = 3;
    repo.update(updated.clone()).await.unwrap();

    repo.delete(id).await.unwrap();

    let events = log.events();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events.iter().map(|e| e.op).collect::<Vec<_>>(),
        vec![ChangeOp::Create, ChangeOp::Update, ChangeOp::Delete]
    );
    // Each payload is the record as committed at that point.
    assert_eq!(events[0].payload.rating, 5);
    assert_eq!(events[0].payload.created_at, updated.created_at);
    assert_eq!(events[1].payload, updated);
    // Publish times never go backwards for a single id.
    assert!(events.windows(2).all(|w| w[0].ts <= w[1].ts));
}

#[tokio::test]
async fn a_failed_write_appends_nothing() {
    let store = Arc::new(MemoryReviewStore::new());
    let log = Arc::new(MemoryEventLog::new());
    let repo = ReviewRepository::new(store).with_event_log(log.clone());

    assert!(matches!(repo.delete(99).await, Err(Error::NotFound)));
    assert!(log.events().is_empty());
}

#[tokio::test]
async fn corrupt_cache_entries_fall_through_and_are_overwritten() {
    let store = Arc::new(MemoryReviewStore::new());
    let cache = Arc::new(MemoryCache::new());
    let repo = ReviewRepository::new(store.clone()).with_cache(cache.clone());

    let id = repo.create(review(7, "Great", "loved it", 5)).await.unwrap();
    let key = review_key(id);
    cache.plant(&key, b"{ not json");

    let read = repo.get(id).await.unwrap();
    assert_eq!(read, store.get(id).await.unwrap());

    let healed = cache.raw(&key).unwrap();
    assert_eq!(healed, serde_json::to_vec(&read).unwrap());
}

#[tokio::test]
async fn cache_trouble_never_fails_a_request() {
    let store = Arc::new(MemoryReviewStore::new());
    let repo = ReviewRepository::new(store).with_cache(Arc::new(FailingCache));

    let id = repo.create(review(7, "Great", "loved it", 5)).await.unwrap();
    let read = repo.get(id).await.unwrap();
    assert_eq!(read.rating, 5);
    repo.delete(id).await.unwrap();
}

#[tokio::test]
async fn list_falls_back_to_the_store_when_the_index_is_down() {
    let store = Arc::new(MemoryReviewStore::new());
    let repo = ReviewRepository::new(store.clone()).with_search_index(Arc::new(FailingSearchIndex));

    for rating in [5, 3, 1] {
        repo.create(review(9, "anything", "text", rating)).await.unwrap();
    }

    // Filters are ignored on the fallback path: rows come back id
    // descending and the total is the unfiltered count.
    let query = SearchQuery {
        text: Some("anything".to_string()),
        user_id: Some(12345),
        ..page_query(20, 0)
    };
    let page = repo.list(&query).await.unwrap();
    assert_eq!(page.total, store.count().await.unwrap());
    let ids: Vec<u64> = page.reviews.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[tokio::test]
async fn fallback_pages_are_contiguous() {
    let store = Arc::new(MemoryReviewStore::new());
    let repo = ReviewRepository::new(store);

    for i in 0..5 {
        repo.create(review(9, "subject", "content", (i % 5) + 1))
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    for page_index in 0..3 {
        let page = repo.list(&page_query(2, page_index * 2)).await.unwrap();
        assert!(page.reviews.len() <= 2);
        assert_eq!(page.total, 5);
        seen.extend(page.reviews.iter().map(|r| r.id));
    }
    assert_eq!(seen, vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn projected_index_serves_filtered_sorted_lists() {
    let store = Arc::new(MemoryReviewStore::new());
    let log = Arc::new(MemoryEventLog::new());
    let index = Arc::new(MemorySearchIndex::new());
    let repo = ReviewRepository::new(store)
        .with_event_log(log.clone())
        .with_search_index(index.clone());

    for rating in [5, 3, 1] {
        repo.create(review(9, "coffee", "good", rating)).await.unwrap();
    }
    repo.create(review(8, "tea", "fine", 4)).await.unwrap();

    // Drain the log through the projector's apply step, as the standalone
    // consumer would.
    for event in log.events() {
        apply_event(index.as_ref(), &event).await.unwrap();
    }

    let query = SearchQuery {
        user_id: Some(9),
        rating_min: Some(3),
        rating_max: Some(5),
        sort: SortBy::Rating,
        order: SortOrder::Asc,
        ..page_query(20, 0)
    };
    let page = repo.list(&query).await.unwrap();
    assert_eq!(page.total, 2);
    let ratings: Vec<i32> = page.reviews.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![3, 5]);
    assert!(page.reviews.iter().all(|r| r.user_id == 9));
}

#[tokio::test]
async fn deleted_reviews_leave_the_index_after_projection() {
    let store = Arc::new(MemoryReviewStore::new());
    let log = Arc::new(MemoryEventLog::new());
    let index = Arc::new(MemorySearchIndex::new());
    let repo = ReviewRepository::new(store)
        .with_event_log(log.clone())
        .with_search_index(index.clone());

    let id = repo.create(review(7, "Great", "loved it", 5)).await.unwrap();
    repo.delete(id).await.unwrap();

    for event in log.events() {
        apply_event(index.as_ref(), &event).await.unwrap();
    }

    assert!(index.is_empty());
    let page = repo
        .list(&SearchQuery {
            text: Some("loved".to_string()),
            ..page_query(20, 0)
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(page.reviews.is_empty());
}
