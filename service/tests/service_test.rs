//! Use-case scenarios: validation, the moderation state machine and the
//! reply aggregate, driven through the service layer against in-memory
//! adapters.

use review_core::{ChangeOp, Error, ListQuery, ReviewStatus};
use review_service::{ReviewRepository, ReviewService};
use review_testing::{MemoryEventLog, MemoryReviewStore};
use std::sync::Arc;

fn service() -> (ReviewService, Arc<MemoryReviewStore>, Arc<MemoryEventLog>) {
    let store = Arc::new(MemoryReviewStore::new());
    let log = Arc::new(MemoryEventLog::new());
    let repo = ReviewRepository::new(store.clone()).with_event_log(log.clone());
    (ReviewService::new(repo), store, log)
}

async fn create_review(svc: &ReviewService, user_id: u64, rating: i32) -> u64 {
    svc.create(
        user_id,
        "Great".to_string(),
        "loved it".to_string(),
        rating,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn create_then_get_reflects_the_write() {
    let (svc, _, log) = service();

    let id = create_review(&svc, 7, 5).await;
    assert_eq!(id, 1);

    let review = svc.get(id).await.unwrap();
    assert_eq!(review.user_id, 7);
    assert_eq!(review.rating, 5);
    assert_eq!(review.status, ReviewStatus::Pending);
    assert!(review.created_at > 0);

    let head = &log.events()[0];
    assert_eq!(head.op, ChangeOp::Create);
    assert_eq!(head.payload.id, id);
    assert_eq!(head.payload.rating, 5);
}

#[tokio::test]
async fn creation_rejects_bad_fields() {
    let (svc, store, _) = service();

    let cases: [(u64, &str, &str, i32); 5] = [
        (7, "s", "c", 0),
        (7, "s", "c", 6),
        (7, "s", "c", -1),
        (7, "", "c", 3),
        (7, "s", "", 3),
    ];
    for (user, subject, content, rating) in cases {
        let result = svc
            .create(user, subject.to_string(), content.to_string(), rating)
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn approval_with_empty_reason_is_allowed() {
    let (svc, _, log) = service();
    let id = create_review(&svc, 7, 5).await;

    svc.audit(id, "approved", "", 42).await.unwrap();

    let review = svc.get(id).await.unwrap();
    assert_eq!(review.status, ReviewStatus::Approved);
    assert_eq!(review.audit_by, 42);
    assert!(review.audit_at > 0);

    // The audit runs the regular update publish path.
    let last = log.last().unwrap();
    assert_eq!(last.op, ChangeOp::Update);
    assert_eq!(last.payload.status, ReviewStatus::Approved);
}

#[tokio::test]
async fn a_second_audit_is_a_conflict() {
    let (svc, _, _) = service();
    let id = create_review(&svc, 7, 5).await;

    svc.audit(id, "approved", "", 42).await.unwrap();
    let result = svc.audit(id, "rejected", "spam", 42).await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    // The first decision stands.
    assert_eq!(
        svc.get(id).await.unwrap().status,
        ReviewStatus::Approved
    );
}

#[tokio::test]
async fn rejection_requires_a_reason() {
    let (svc, _, _) = service();
    let id = create_review(&svc, 7, 2).await;

    let result = svc.audit(id, "rejected", "   ", 42).await;
    assert!(matches!(result, Err(Error::Validation(_))));

    svc.audit(id, "rejected", "spam", 42).await.unwrap();
    let review = svc.get(id).await.unwrap();
    assert_eq!(review.status, ReviewStatus::Rejected);
    assert_eq!(review.audit_reason, "spam");
}

#[tokio::test]
async fn unknown_decisions_are_rejected() {
    let (svc, _, _) = service();
    let id = create_review(&svc, 7, 3).await;

    assert!(matches!(
        svc.audit(id, "maybe", "", 42).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        svc.audit(999, "approved", "", 42).await,
        Err(Error::NotFound)
    ));
}

#[tokio::test]
async fn replies_follow_the_aggregate_rules() {
    let (svc, _, _) = service();

    let approved = create_review(&svc, 7, 5).await;
    svc.audit(approved, "approved", "", 42).await.unwrap();
    let pending = create_review(&svc, 7, 4).await;

    svc.add_reply(approved, 77, "thanks".to_string())
        .await
        .unwrap();

    // Same merchant again: unique (review, merchant).
    let result = svc.add_reply(approved, 77, "thanks again".to_string()).await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    // A different merchant may still reply.
    svc.add_reply(approved, 78, "ours too".to_string())
        .await
        .unwrap();

    // Replies only exist for approved reviews.
    let result = svc.add_reply(pending, 77, "hello".to_string()).await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    let replies = svc.list_replies(approved).await.unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].merchant_id, 77);
    assert_eq!(replies[0].content, "thanks");
}

#[tokio::test]
async fn empty_reply_content_is_invalid() {
    let (svc, _, _) = service();
    let id = create_review(&svc, 7, 5).await;
    svc.audit(id, "approved", "", 42).await.unwrap();

    let result = svc.add_reply(id, 77, "  ".to_string()).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn update_republishes_the_full_snapshot() {
    let (svc, _, log) = service();
    let id = create_review(&svc, 7, 5).await;
    svc.audit(id, "approved", "", 42).await.unwrap();

    svc.update(id, "Still great".to_string(), "even better".to_string(), 4)
        .await
        .unwrap();

    let review = svc.get(id).await.unwrap();
    assert_eq!(review.subject, "Still great");
    assert_eq!(review.rating, 4);
    // Moderation state survives an author edit.
    assert_eq!(review.status, ReviewStatus::Approved);
    assert_eq!(review.audit_by, 42);

    let last = log.last().unwrap();
    assert_eq!(last.op, ChangeOp::Update);
    assert_eq!(last.payload.subject, "Still great");
    assert_eq!(last.payload.status, ReviewStatus::Approved);
}

#[tokio::test]
async fn pending_queue_shrinks_as_reviews_are_audited() {
    let (svc, _, _) = service();
    for _ in 0..3 {
        create_review(&svc, 7, 4).await;
    }
    svc.audit(1, "approved", "", 42).await.unwrap();

    let (reviews, total) = svc.list_pending(0, 0).await.unwrap();
    assert_eq!(total, 2);
    let ids: Vec<u64> = reviews.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 2]);
}

#[tokio::test]
async fn list_rejects_unknown_sorts() {
    let (svc, _, _) = service();
    let query = ListQuery {
        sort: "stars".to_string(),
        ..ListQuery::default()
    };
    assert!(matches!(
        svc.list(&query).await,
        Err(Error::Validation(_))
    ));
}
