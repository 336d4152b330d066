//! Shared state for the HTTP handlers.

use crate::service::ReviewService;
use std::sync::Arc;

/// Application state cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The use-case layer.
    pub service: Arc<ReviewService>,
}

impl AppState {
    /// Wrap a service for sharing across handlers.
    #[must_use]
    pub fn new(service: ReviewService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
