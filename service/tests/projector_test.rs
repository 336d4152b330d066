//! Projection semantics: idempotent, last-write-wins application of change
//! events to the search index.

use review_core::{ChangeEvent, ChangeOp, Review, ReviewStatus, SearchIndex, SearchQuery};
use review_service::projector::apply_event;
use review_testing::MemorySearchIndex;

fn snapshot(id: u64, rating: i32, status: ReviewStatus) -> Review {
    Review {
        id,
        user_id: 7,
        subject: "Great".to_string(),
        content: "loved it".to_string(),
        rating,
        status,
        ..Review::default()
    }
}

#[tokio::test]
async fn create_then_update_converges_to_the_last_snapshot() {
    let index = MemorySearchIndex::new();

    let create = ChangeEvent::new(ChangeOp::Create, snapshot(1, 5, ReviewStatus::Pending), 10);
    let update = ChangeEvent::new(ChangeOp::Update, snapshot(1, 3, ReviewStatus::Approved), 11);

    apply_event(&index, &create).await.unwrap();
    apply_event(&index, &update).await.unwrap();

    assert_eq!(index.len(), 1);
    let doc = index.document(1).unwrap();
    assert_eq!(doc.review.rating, 3);
    assert_eq!(doc.review.status, ReviewStatus::Approved);
    assert_eq!(doc.ts, 11);
}

#[tokio::test]
async fn replaying_an_event_changes_nothing() {
    let index = MemorySearchIndex::new();
    let create = ChangeEvent::new(ChangeOp::Create, snapshot(1, 5, ReviewStatus::Pending), 10);

    apply_event(&index, &create).await.unwrap();
    let first = index.document(1).unwrap();

    // At-least-once delivery: the duplicate must be harmless.
    apply_event(&index, &create).await.unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.document(1).unwrap(), first);
}

#[tokio::test]
async fn an_update_without_a_prior_create_still_indexes() {
    // The log guarantees order only within a review's partition; a consumer
    // group rebalance can surface an update first. Indexing is an upsert,
    // so the document still converges.
    let index = MemorySearchIndex::new();
    let update = ChangeEvent::new(ChangeOp::Update, snapshot(4, 2, ReviewStatus::Rejected), 20);

    apply_event(&index, &update).await.unwrap();
    assert_eq!(index.document(4).unwrap().review.rating, 2);
}

#[tokio::test]
async fn delete_removes_the_document_and_tolerates_absence() {
    let index = MemorySearchIndex::new();
    let create = ChangeEvent::new(ChangeOp::Create, snapshot(1, 5, ReviewStatus::Pending), 10);
    let delete = ChangeEvent::deletion(1, 11);

    apply_event(&index, &create).await.unwrap();
    apply_event(&index, &delete).await.unwrap();
    assert!(index.is_empty());

    // Replayed delete of an already-absent document is a no-op.
    apply_event(&index, &delete).await.unwrap();
    assert!(index.is_empty());
}

#[tokio::test]
async fn audited_status_becomes_searchable() {
    let index = MemorySearchIndex::new();
    apply_event(
        &index,
        &ChangeEvent::new(ChangeOp::Create, snapshot(1, 5, ReviewStatus::Pending), 10),
    )
    .await
    .unwrap();
    apply_event(
        &index,
        &ChangeEvent::new(ChangeOp::Update, snapshot(1, 5, ReviewStatus::Approved), 11),
    )
    .await
    .unwrap();

    let page = index
        .search(&SearchQuery {
            text: Some("loved".to_string()),
            size: 20,
            ..SearchQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.reviews[0].status, ReviewStatus::Approved);
}
