//! The use-case layer: validation, list normalization, the moderation state
//! machine and the reply aggregate rules.
//!
//! # Moderation
//!
//! ```text
//! pending --audit(approved, reason may be empty)--> approved
//! pending --audit(rejected, reason required)-----> rejected
//! approved --add_reply(merchant)--> reply appended, once per merchant
//! rejected: terminal, add_reply is a conflict
//! any audited state: a second audit is a conflict
//! ```
//!
//! Role enforcement happens at the HTTP edge; this layer re-validates the
//! decision itself so the state machine stands on its own regardless of how
//! the role was derived.

use crate::repository::ReviewRepository;
use chrono::Utc;
use review_core::{
    Error, ListQuery, Review, ReviewReply, ReviewStatus, SearchQuery, SortBy, SortOrder,
    DEFAULT_PAGE_SIZE, MAX_CONTENT_BYTES, MAX_PAGE_SIZE, MAX_SUBJECT_BYTES,
};

/// An operator's moderation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditDecision {
    /// Publish the review.
    Approved,
    /// Refuse the review; requires a reason.
    Rejected,
}

impl AuditDecision {
    fn parse(decision: &str) -> Result<Self, Error> {
        match decision {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(Error::validation(format!("unknown decision: {other}"))),
        }
    }
}

/// The review use cases, layered over the repository.
#[derive(Clone)]
pub struct ReviewService {
    repo: ReviewRepository,
}

impl ReviewService {
    /// Wrap a repository.
    #[must_use]
    pub fn new(repo: ReviewRepository) -> Self {
        Self { repo }
    }

    /// Create a review in the pending state and return its id.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an out-of-range rating or empty or
    /// oversized text fields; store failures surface as
    /// [`Error::Unavailable`].
    pub async fn create(
        &self,
        user_id: u64,
        subject: String,
        content: String,
        rating: i32,
    ) -> Result<u64, Error> {
        validate_fields(&subject, &content, rating)?;
        tracing::info!(user_id, "creating review");
        self.repo
            .create(Review {
                user_id,
                subject,
                content,
                rating,
                status: ReviewStatus::Pending,
                ..Review::default()
            })
            .await
    }

    /// Fetch one review.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when it does not exist.
    pub async fn get(&self, id: u64) -> Result<Review, Error> {
        self.repo.get(id).await
    }

    /// Update the author-editable fields of a review.
    ///
    /// The stored record is loaded first so the published snapshot carries
    /// the full current state, moderation fields included.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] on bad fields, [`Error::NotFound`] for a
    /// missing review.
    pub async fn update(
        &self,
        id: u64,
        subject: String,
        content: String,
        rating: i32,
    ) -> Result<(), Error> {
        validate_fields(&subject, &content, rating)?;
        let mut review = self.repo.get(id).await?;
        review.subject = subject;
        review.content = content;
        review.rating = rating;
        tracing::info!(review_id = id, "updating review");
        self.repo.update(review).await
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for a missing review.
    pub async fn delete(&self, id: u64) -> Result<(), Error> {
        tracing::info!(review_id = id, "deleting review");
        self.repo.delete(id).await
    }

    /// List reviews with filtering, sorting and paging.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for unknown sort or order values; otherwise
    /// store failures only, since search trouble falls back internally.
    pub async fn list(&self, query: &ListQuery) -> Result<(Vec<Review>, u64), Error> {
        let normalized = normalize(query)?;
        let page = self.repo.list(&normalized).await?;
        Ok((page.reviews, page.total))
    }

    /// List pending reviews for the moderation queue.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn list_pending(&self, page: u64, page_size: u64) -> Result<(Vec<Review>, u64), Error> {
        let (page, size) = clamp_paging(page, page_size);
        self.repo.list_pending(size, (page - 1) * size).await
    }

    /// Apply an operator decision to a pending review.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an unknown decision or a rejection without
    /// a reason; [`Error::Conflict`] when the review is no longer pending.
    pub async fn audit(
        &self,
        id: u64,
        decision: &str,
        reason: &str,
        operator_id: u64,
    ) -> Result<(), Error> {
        let decision = AuditDecision::parse(decision)?;
        if decision == AuditDecision::Rejected && reason.trim().is_empty() {
            return Err(Error::validation("a rejection requires a reason"));
        }

        let mut review = self.repo.get(id).await?;
        if review.status != ReviewStatus::Pending {
            return Err(Error::conflict("review already audited"));
        }

        review.status = match decision {
            AuditDecision::Approved => ReviewStatus::Approved,
            AuditDecision::Rejected => ReviewStatus::Rejected,
        };
        review.audit_reason = reason.to_string();
        review.audit_by = operator_id;
        review.audit_at = Utc::now().timestamp();

        tracing::info!(review_id = id, status = %review.status, operator_id, "auditing review");
        // Same publish path as any update, so the projector re-indexes the
        // new status.
        self.repo.update(review).await
    }

    /// Append a merchant reply to an approved review.
    ///
    /// # Errors
    ///
    /// [`Error::Conflict`] when the review is not approved or the merchant
    /// already replied; [`Error::Validation`] for empty content.
    pub async fn add_reply(
        &self,
        review_id: u64,
        merchant_id: u64,
        content: String,
    ) -> Result<(), Error> {
        if content.trim().is_empty() {
            return Err(Error::validation("reply content must not be empty"));
        }

        let review = self.repo.get(review_id).await?;
        if review.status != ReviewStatus::Approved {
            return Err(Error::conflict("review is not approved"));
        }
        if self.repo.reply_exists(review_id, merchant_id).await? {
            return Err(Error::conflict("reply already exists for this merchant"));
        }

        tracing::info!(review_id, merchant_id, "adding reply");
        self.repo
            .add_reply(ReviewReply {
                review_id,
                merchant_id,
                content,
                ..ReviewReply::default()
            })
            .await?;
        Ok(())
    }

    /// All replies for a review.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn list_replies(&self, review_id: u64) -> Result<Vec<ReviewReply>, Error> {
        self.repo.list_replies(review_id).await
    }
}

fn validate_fields(subject: &str, content: &str, rating: i32) -> Result<(), Error> {
    if !(1..=5).contains(&rating) {
        return Err(Error::validation("rating must be between 1 and 5"));
    }
    if subject.is_empty() {
        return Err(Error::validation("subject must not be empty"));
    }
    if subject.len() > MAX_SUBJECT_BYTES {
        return Err(Error::validation(format!(
            "subject must not exceed {MAX_SUBJECT_BYTES} bytes"
        )));
    }
    if content.is_empty() {
        return Err(Error::validation("content must not be empty"));
    }
    if content.len() > MAX_CONTENT_BYTES {
        return Err(Error::validation(format!(
            "content must not exceed {MAX_CONTENT_BYTES} bytes"
        )));
    }
    Ok(())
}

const fn clamp_paging(page: u64, page_size: u64) -> (u64, u64) {
    let page = if page < 1 { 1 } else { page };
    let size = if page_size == 0 || page_size > MAX_PAGE_SIZE {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    (page, size)
}

fn normalize(query: &ListQuery) -> Result<SearchQuery, Error> {
    let (page, size) = clamp_paging(query.page, query.page_size);
    let sort: SortBy = query.sort.parse().map_err(Error::Validation)?;
    let order: SortOrder = query.order.parse().map_err(Error::Validation)?;

    Ok(SearchQuery {
        text: (!query.q.is_empty()).then(|| query.q.clone()),
        user_id: (query.user_id != 0).then_some(query.user_id),
        rating_min: (query.rating_min != 0).then_some(query.rating_min),
        rating_max: (query.rating_max != 0).then_some(query.rating_max),
        sort,
        order,
        from: (page - 1) * size,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_clamps() {
        assert_eq!(clamp_paging(0, 0), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(clamp_paging(3, 50), (3, 50));
        assert_eq!(clamp_paging(1, 101), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(clamp_paging(1, 100), (1, 100));
    }

    #[test]
    fn normalize_resolves_zero_sentinels() {
        let query = ListQuery {
            page: 2,
            page_size: 10,
            q: String::new(),
            user_id: 0,
            rating_min: 0,
            rating_max: 4,
            sort: String::new(),
            order: String::new(),
        };
        let normalized = normalize(&query).unwrap();
        assert_eq!(normalized.text, None);
        assert_eq!(normalized.user_id, None);
        assert_eq!(normalized.rating_min, None);
        assert_eq!(normalized.rating_max, Some(4));
        assert_eq!(normalized.sort, SortBy::Relevance);
        assert_eq!(normalized.order, SortOrder::Desc);
        assert_eq!(normalized.from, 10);
        assert_eq!(normalized.size, 10);
    }

    #[test]
    fn normalize_rejects_unknown_sort_and_order() {
        let mut query = ListQuery {
            sort: "stars".to_string(),
            ..ListQuery::default()
        };
        assert!(matches!(normalize(&query), Err(Error::Validation(_))));

        query.sort = String::new();
        query.order = "sideways".to_string();
        assert!(matches!(normalize(&query), Err(Error::Validation(_))));
    }

    #[test]
    fn rating_zero_is_rejected_on_writes() {
        // Zero is the query sentinel for "unbounded" and must never be a
        // stored rating.
        assert!(validate_fields("s", "c", 0).is_err());
        assert!(validate_fields("s", "c", 6).is_err());
        assert!(validate_fields("s", "c", 1).is_ok());
        assert!(validate_fields("s", "c", 5).is_ok());
    }

    #[test]
    fn text_fields_are_bounded() {
        assert!(validate_fields("", "c", 3).is_err());
        assert!(validate_fields("s", "", 3).is_err());
        assert!(validate_fields(&"x".repeat(MAX_SUBJECT_BYTES + 1), "c", 3).is_err());
        assert!(validate_fields("s", &"x".repeat(MAX_CONTENT_BYTES + 1), 3).is_err());
        assert!(validate_fields(&"x".repeat(MAX_SUBJECT_BYTES), "c", 3).is_ok());
    }

    #[test]
    fn decision_parsing() {
        assert_eq!(
            AuditDecision::parse("approved").unwrap(),
            AuditDecision::Approved
        );
        assert_eq!(
            AuditDecision::parse("rejected").unwrap(),
            AuditDecision::Rejected
        );
        assert!(AuditDecision::parse("maybe").is_err());
    }
}
