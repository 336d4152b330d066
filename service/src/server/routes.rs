//! Router configuration.
//!
//! One axum router serves the whole surface under `/v1`, plus an
//! unauthenticated health check. The per-request deadline is enforced here
//! with a timeout layer so every handler and adapter call underneath is
//! bounded; an elapsed deadline maps to 408.

use super::state::AppState;
use crate::api::reviews;
use crate::error::AppError;
use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    BoxError, Json, Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};

/// Build the complete router.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let v1 = Router::new()
        .route(
            "/reviews",
            post(reviews::create_review).get(reviews::list_reviews),
        )
        .route("/reviews/pending", get(reviews::list_pending))
        .route(
            "/reviews/:id",
            get(reviews::get_review)
                .put(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route("/reviews/:id/audit", post(reviews::audit_review))
        .route("/reviews/:id/reply", post(reviews::create_reply))
        .route("/reviews/:id/replies", get(reviews::list_replies));

    Router::new()
        .route("/health", get(health))
        .nest("/v1", v1)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

async fn handle_middleware_error(error: BoxError) -> AppError {
    if error.is::<tower::timeout::error::Elapsed>() {
        AppError::timeout()
    } else {
        AppError::internal(error.to_string())
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
