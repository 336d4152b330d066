//! In-memory fakes of the review service adapter contracts.
//!
//! Everything here lives behind plain mutexes and is deliberately simple:
//! fast, deterministic and inspectable. The fakes honor the same observable
//! contracts as the real adapters (not-found distinction, duplicate-reply
//! conflicts, filter and sort semantics, idempotent document writes) so
//! scenario tests can exercise the repository, service and projector without
//! Postgres, Redis, a broker or a search cluster.

#![forbid(unsafe_code)]

pub mod mocks;

pub use mocks::{
    FailingCache, FailingSearchIndex, MemoryCache, MemoryEventLog, MemoryReviewStore,
    MemorySearchIndex,
};
