//! Role extraction from the `X-Role` header.
//!
//! The header is a capability token standing in for a real authorization
//! decision: `O` marks an operator (may audit), `B` a merchant (may reply).
//! The extractor never rejects by itself; handlers demand the role they
//! need, and the service layer re-validates the decision content
//! independently of how the role was derived.

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

/// Header carrying the caller's role.
pub const ROLE_HEADER: &str = "X-Role";

/// Role token required to audit reviews.
pub const ROLE_OPERATOR: &str = "O";

/// Role token required to reply to reviews.
pub const ROLE_MERCHANT: &str = "B";

/// The caller's role, if any was presented.
#[derive(Debug, Clone)]
pub struct Role(pub Option<String>);

impl Role {
    /// Demand a specific role token.
    ///
    /// # Errors
    ///
    /// Returns a 403 [`AppError`] when the header is absent or carries a
    /// different token.
    pub fn require(&self, required: &str) -> Result<(), AppError> {
        match self.0.as_deref() {
            Some(role) if role == required => Ok(()),
            _ => Err(AppError::forbidden("forbidden")),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Role
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let role = parts
            .headers
            .get(ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok(Self(role))
    }
}
