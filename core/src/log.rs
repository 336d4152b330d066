//! The event log contract, write side.
//!
//! The log is append-only with at-least-once delivery. Publication happens
//! after the record store has committed, so a lost event never loses data;
//! it only delays the search index until the next write for the same review
//! or an offline replay reconciles it.

use crate::event::ChangeEvent;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the event log.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// The record could not be appended.
    #[error("publish failed: {0}")]
    Publish(String),

    /// The broker connection failed while producing or consuming.
    #[error("transport error: {0}")]
    Transport(String),

    /// A consumed message is not a valid change event. Unreclaimable; the
    /// consumer logs it and advances past it.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Appends change events onto the configured topic, keyed by review id.
///
/// Publish must be bounded in time; the repository treats it as best-effort
/// and never blocks a committed write on the broker.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append one event.
    async fn publish(&self, event: &ChangeEvent) -> Result<(), EventLogError>;
}
