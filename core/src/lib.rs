//! Core domain types and adapter contracts for the review service.
//!
//! This crate defines the vocabulary shared by every other crate in the
//! workspace:
//!
//! - The [`Review`] aggregate and its [`ReviewReply`] children
//! - [`ChangeEvent`], the record appended to the event log on every write
//! - The query model used by the list endpoint ([`ListQuery`], [`SearchQuery`])
//! - The domain [`Error`] kinds surfaced to callers
//! - The four adapter contracts the application composes:
//!   [`ReviewStore`], [`ReviewCache`], [`EventLog`] and [`SearchIndex`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐      write       ┌──────────────┐
//! │   Service   │ ───────────────► │ ReviewStore  │ ◄── source of truth
//! └──────┬──────┘                  └──────────────┘
//!        │            after commit ┌──────────────┐
//!        ├────────────────────────►│ ReviewCache  │ (invalidate)
//!        │                         └──────────────┘
//!        │            after commit ┌──────────────┐      ┌─────────────┐
//!        └────────────────────────►│  EventLog    │ ───► │ SearchIndex │
//!                                  └──────────────┘      └─────────────┘
//!                                      (async, via the projector)
//! ```
//!
//! The store of record is authoritative. Cache and search index are derived
//! and self-heal on the next successful write for the same review.
//!
//! This crate performs no I/O. Concrete adapters live in `review-postgres`,
//! `review-redis`, `review-redpanda` and `review-elasticsearch`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod event;
pub mod log;
pub mod query;
pub mod review;
pub mod search;
pub mod store;

pub use cache::{review_key, CacheError, ReviewCache, POINT_READ_TTL};
pub use error::Error;
pub use event::{ChangeEvent, ChangeOp};
pub use log::{EventLog, EventLogError};
pub use query::{ListQuery, SearchQuery, SortBy, SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use review::{Review, ReviewReply, ReviewStatus, MAX_CONTENT_BYTES, MAX_SUBJECT_BYTES};
pub use search::{ReviewDocument, SearchError, SearchIndex, SearchPage};
pub use store::{ReviewStore, StoreError};
