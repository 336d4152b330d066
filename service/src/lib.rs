//! The review management service application.
//!
//! Wires the adapter crates into the three moving parts of the system:
//!
//! - [`repository::ReviewRepository`]: the read/write split over record
//!   store, cache, event log and search index
//! - [`service::ReviewService`]: validation, moderation state machine and
//!   the reply aggregate
//! - [`projector::Projector`]: the event consumer keeping the search index
//!   eventually consistent with the store of record
//!
//! Two binaries share this library and one configuration file:
//! `review-server` hosts the HTTP surface, `review-projector` runs the
//! consumer loop.

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod projector;
pub mod repository;
pub mod server;
pub mod service;

pub use config::Config;
pub use error::AppError;
pub use projector::Projector;
pub use repository::ReviewRepository;
pub use service::ReviewService;
