//! Review endpoints.
//!
//! - `POST   /v1/reviews` - create
//! - `GET    /v1/reviews` - list (search-preferred, store fallback)
//! - `GET    /v1/reviews/pending` - moderation queue
//! - `GET    /v1/reviews/:id` - point read
//! - `PUT    /v1/reviews/:id` - update
//! - `DELETE /v1/reviews/:id` - delete
//! - `POST   /v1/reviews/:id/audit` - operator decision (`X-Role: O`)
//! - `POST   /v1/reviews/:id/reply` - merchant reply (`X-Role: B`)
//! - `GET    /v1/reviews/:id/replies` - replies as a JSON array

use crate::api::role::{Role, ROLE_MERCHANT, ROLE_OPERATOR};
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use review_core::{ListQuery, Review, ReviewReply};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /v1/reviews`.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    /// Author of the review.
    pub user_id: u64,
    /// Review title.
    pub subject: String,
    /// Review body.
    pub content: String,
    /// Star rating in `[1, 5]`.
    pub rating: i32,
}

/// Response of `POST /v1/reviews`.
#[derive(Debug, Serialize)]
pub struct CreateReviewResponse {
    /// Assigned review id.
    pub id: u64,
}

/// Body of `PUT /v1/reviews/:id`.
#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    /// New title.
    pub subject: String,
    /// New body.
    pub content: String,
    /// New rating.
    pub rating: i32,
}

/// Response of `GET /v1/reviews/:id`.
#[derive(Debug, Serialize)]
pub struct GetReviewResponse {
    /// The review.
    pub review: Review,
}

/// Response of the list endpoints.
#[derive(Debug, Serialize)]
pub struct ListReviewResponse {
    /// Exact total for the filter (unfiltered on the store fallback path).
    pub total: u64,
    /// One page of reviews.
    pub reviews: Vec<Review>,
}

/// Query of `GET /v1/reviews/pending`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PendingQuery {
    /// 1-indexed page.
    pub page: u64,
    /// Items per page.
    pub page_size: u64,
}

/// Body of `POST /v1/reviews/:id/audit`.
#[derive(Debug, Deserialize)]
pub struct AuditReviewRequest {
    /// `approved` or `rejected`.
    pub decision: String,
    /// Decision reason; required for rejections.
    #[serde(default)]
    pub reason: String,
    /// Deciding operator.
    pub operator_id: u64,
}

/// Body of `POST /v1/reviews/:id/reply`.
#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    /// Replying merchant.
    pub merchant_id: u64,
    /// Reply body.
    pub content: String,
}

/// Positive acknowledgment body, `{"ok": true}`.
#[derive(Debug, Serialize)]
pub struct Ack {
    /// Always true on success.
    pub ok: bool,
}

/// Empty success body, `{}`.
#[derive(Debug, Serialize)]
pub struct Empty {}

// ============================================================================
// Handlers
// ============================================================================

/// Create a review in the pending state.
pub async fn create_review(
    State(state): State<AppState>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<CreateReviewResponse>, AppError> {
    let id = state
        .service
        .create(
            request.user_id,
            request.subject,
            request.content,
            request.rating,
        )
        .await?;
    Ok(Json(CreateReviewResponse { id }))
}

/// Fetch one review, cache-first.
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<GetReviewResponse>, AppError> {
    let review = state.service.get(id).await?;
    Ok(Json(GetReviewResponse { review }))
}

/// Update the author-editable fields.
pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateReviewRequest>,
) -> Result<Json<Empty>, AppError> {
    state
        .service
        .update(id, request.subject, request.content, request.rating)
        .await?;
    Ok(Json(Empty {}))
}

/// Delete a review.
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Empty>, AppError> {
    state.service.delete(id).await?;
    Ok(Json(Empty {}))
}

/// List reviews with filters, sorting and paging.
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListReviewResponse>, AppError> {
    let (reviews, total) = state.service.list(&query).await?;
    Ok(Json(ListReviewResponse { total, reviews }))
}

/// List pending reviews for moderation.
pub async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<ListReviewResponse>, AppError> {
    let (reviews, total) = state
        .service
        .list_pending(query.page, query.page_size)
        .await?;
    Ok(Json(ListReviewResponse { total, reviews }))
}

/// Apply an operator decision. Requires `X-Role: O`.
pub async fn audit_review(
    role: Role,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<AuditReviewRequest>,
) -> Result<Json<Ack>, AppError> {
    role.require(ROLE_OPERATOR)?;
    state
        .service
        .audit(id, &request.decision, &request.reason, request.operator_id)
        .await?;
    Ok(Json(Ack { ok: true }))
}

/// Append a merchant reply. Requires `X-Role: B`.
pub async fn create_reply(
    role: Role,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<CreateReplyRequest>,
) -> Result<Json<Ack>, AppError> {
    role.require(ROLE_MERCHANT)?;
    state
        .service
        .add_reply(id, request.merchant_id, request.content)
        .await?;
    Ok(Json(Ack { ok: true }))
}

/// All replies for a review, as a plain JSON array.
pub async fn list_replies(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<ReviewReply>>, AppError> {
    let replies = state.service.list_replies(id).await?;
    Ok(Json(replies))
}
