//! The domain error surfaced by the repository and service layers.

use crate::log::EventLogError;
use crate::search::SearchError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors a caller of the review service can observe.
///
/// Adapter-level failures are folded into these kinds at the repository
/// boundary. Cache and event-log failures never appear here at all; they are
/// logged and swallowed because the store of record has already committed.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested review (or reply parent) does not exist.
    #[error("review not found")]
    NotFound,

    /// The request payload violates a domain rule.
    #[error("{0}")]
    Validation(String),

    /// The caller's role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The operation conflicts with current state, such as a second audit or
    /// a duplicate reply.
    #[error("{0}")]
    Conflict(String),

    /// A required substrate failed; the request did not take effect.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The request was cancelled before completion.
    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for a validation failure.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a state conflict.
    #[must_use]
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<SearchError> for Error {
    fn from(err: SearchError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<EventLogError> for Error {
    fn from(err: EventLogError) -> Self {
        Self::Unavailable(err.to_string())
    }
}
