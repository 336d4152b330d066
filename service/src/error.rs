//! HTTP error type bridging domain errors and responses.
//!
//! Wraps [`review_core::Error`] kinds into status codes and a JSON body
//! `{"code", "message"}`, implementing axum's `IntoResponse`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use review_core::Error;
use serde::Serialize;
use std::fmt;

/// Application error returned by every handler.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl AppError {
    /// Create an error with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    /// 400 Bad Request, for malformed inputs caught at the transport edge.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// 403 Forbidden, for role gate failures.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    /// 408 Request Timeout, produced by the transport deadline layer.
    #[must_use]
    pub fn timeout() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, "request timed out", "TIMEOUT")
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "INTERNAL_ERROR",
        )
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string(), "NOT_FOUND"),
            Error::Validation(message) => {
                Self::new(StatusCode::BAD_REQUEST, message, "VALIDATION")
            }
            Error::Forbidden(message) => Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN"),
            Error::Conflict(message) => Self::new(StatusCode::CONFLICT, message, "CONFLICT"),
            Error::Unavailable(message) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, message, "UNAVAILABLE")
            }
            Error::Cancelled => {
                Self::new(StatusCode::REQUEST_TIMEOUT, err.to_string(), "CANCELLED")
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, message = %self.message, "request failed");
        }
        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
