//! The review aggregate and its reply children.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum size of a review subject, in bytes.
pub const MAX_SUBJECT_BYTES: usize = 255;

/// Maximum size of a review body, in bytes (8 KiB).
pub const MAX_CONTENT_BYTES: usize = 8192;

/// Moderation state of a review.
///
/// The only legal transitions are `Pending -> Approved` and
/// `Pending -> Rejected`; both audited states are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Freshly created, awaiting an operator decision.
    #[default]
    Pending,
    /// Accepted by an operator; replies become possible.
    Approved,
    /// Refused by an operator; terminal for replies as well.
    Rejected,
}

impl ReviewStatus {
    /// The wire and storage representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown review status: {other}")),
        }
    }
}

/// A user review, the aggregate root of this service.
///
/// `id` is assigned by the record store on insert and is stable across every
/// substrate: the cache key embeds it and the search index uses its decimal
/// form as the document id.
///
/// The audit fields (`audit_reason`, `audit_by`, `audit_at`) are zero-valued
/// until the review leaves [`ReviewStatus::Pending`]. `audit_reason` may stay
/// empty on approval; a rejection always carries one.
///
/// All fields default when absent so that id-only payloads (delete events)
/// deserialize cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Review {
    /// Store-assigned identifier, monotone per insert.
    pub id: u64,
    /// Author of the review; immutable after create.
    pub user_id: u64,
    /// Short title, at most [`MAX_SUBJECT_BYTES`] bytes.
    pub subject: String,
    /// Review body, at most [`MAX_CONTENT_BYTES`] bytes.
    pub content: String,
    /// Star rating in `[1, 5]`. Zero is reserved as the query sentinel for
    /// "unbounded" and is rejected on writes.
    pub rating: i32,
    /// Moderation state.
    pub status: ReviewStatus,
    /// Operator-provided decision reason.
    pub audit_reason: String,
    /// Operator who decided, zero while pending.
    pub audit_by: u64,
    /// Decision time, epoch seconds, zero while pending.
    pub audit_at: i64,
    /// Insert time, epoch seconds, set by the record store.
    pub created_at: i64,
}

impl Review {
    /// An id-only review, used as the payload of delete events where no
    /// other field is meaningful.
    #[must_use]
    pub fn tombstone(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// A merchant reply to an approved review.
///
/// At most one reply exists per `(review_id, merchant_id)` pair, enforced
/// both in the use-case layer and by a unique constraint in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewReply {
    /// Store-assigned identifier.
    pub id: u64,
    /// The review this reply belongs to.
    pub review_id: u64,
    /// Merchant who wrote the reply.
    pub merchant_id: u64,
    /// Reply body.
    pub content: String,
    /// Insert time, epoch seconds.
    pub created_at: i64,
}
