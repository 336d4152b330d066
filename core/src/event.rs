//! Change events appended to the durable log on every successful write.
//!
//! Events are encoded as compact JSON objects `{"op", "payload", "ts"}` and
//! partitioned by review id, so replays and duplicates for the same review
//! arrive in order. Delivery is at-least-once; consumers must be idempotent.

use crate::review::Review;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of write a [`ChangeEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    /// A new review was inserted.
    Create,
    /// An existing review was updated (including audit decisions).
    Update,
    /// A review was removed; the payload carries only the id.
    Delete,
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// One record on the change-event topic.
///
/// The payload is the full review snapshot as committed to the store of
/// record, except for deletes where only `payload.id` is meaningful. `ts` is
/// the publish time in epoch seconds and becomes the `ts` field of the
/// search document, so index writes are last-write-wins per review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened.
    pub op: ChangeOp,
    /// Review snapshot at commit time.
    pub payload: Review,
    /// Publish time, epoch seconds.
    pub ts: i64,
}

impl ChangeEvent {
    /// Build an event carrying a full review snapshot.
    #[must_use]
    pub fn new(op: ChangeOp, payload: Review, ts: i64) -> Self {
        Self { op, payload, ts }
    }

    /// Build a delete event with an id-only payload.
    #[must_use]
    pub fn deletion(id: u64, ts: i64) -> Self {
        Self {
            op: ChangeOp::Delete,
            payload: Review::tombstone(id),
            ts,
        }
    }

    /// The log partition key for this event, the decimal review id.
    #[must_use]
    pub fn key(&self) -> String {
        self.payload.id.to_string()
    }
}
