//! Query types for the list endpoint.
//!
//! [`ListQuery`] is the raw request shape; the service normalizes it into a
//! [`SearchQuery`] with defaults applied and the zero sentinels resolved.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default page size when the caller sends none (or an invalid one).
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Hard upper bound on page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Raw list parameters as they arrive on the wire.
///
/// Zero values mean "unset": `page`/`page_size` fall back to defaults,
/// `user_id = 0` means no author filter, and a zero rating bound leaves that
/// side of the range open.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// 1-indexed page number.
    pub page: u64,
    /// Items per page, clamped to `(0, 100]`.
    pub page_size: u64,
    /// Full-text query over subject and content.
    pub q: String,
    /// Filter to a single author.
    pub user_id: u64,
    /// Lower rating bound, inclusive; 0 = unbounded below.
    pub rating_min: i32,
    /// Upper rating bound, inclusive; 0 = unbounded above.
    pub rating_max: i32,
    /// One of `relevance`, `ts`, `rating`; defaults to `relevance`.
    pub sort: String,
    /// One of `asc`, `desc`; defaults to `desc`.
    pub order: String,
}

/// Sort key for list results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Engine score order; no explicit sort key is sent.
    #[default]
    Relevance,
    /// Last index time.
    Ts,
    /// Star rating.
    Rating,
}

impl SortBy {
    /// The search index field this sort targets, if any.
    #[must_use]
    pub const fn field(self) -> Option<&'static str> {
        match self {
            Self::Relevance => None,
            Self::Ts => Some("ts"),
            Self::Rating => Some("rating"),
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "relevance" => Ok(Self::Relevance),
            "ts" => Ok(Self::Ts),
            "rating" => Ok(Self::Rating),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending, the default.
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "" | "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// A normalized search request, ready for the index adapter.
///
/// Filters (`user_id`, the rating range) never contribute to relevance
/// scoring; `text` terms are all required and match subject at twice the
/// weight of content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Full-text terms; `None` matches everything.
    pub text: Option<String>,
    /// Author filter.
    pub user_id: Option<u64>,
    /// Inclusive lower rating bound.
    pub rating_min: Option<i32>,
    /// Inclusive upper rating bound.
    pub rating_max: Option<i32>,
    /// Sort key.
    pub sort: SortBy,
    /// Sort direction.
    pub order: SortOrder,
    /// Offset of the first hit, `(page - 1) * size`.
    pub from: u64,
    /// Number of hits to return, in `(0, 100]`.
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parses_with_relevance_default() {
        assert_eq!("".parse::<SortBy>(), Ok(SortBy::Relevance));
        assert_eq!("rating".parse::<SortBy>(), Ok(SortBy::Rating));
        assert_eq!("ts".parse::<SortBy>(), Ok(SortBy::Ts));
        assert!("stars".parse::<SortBy>().is_err());
    }

    #[test]
    fn order_parses_with_desc_default() {
        assert_eq!("".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert!("down".parse::<SortOrder>().is_err());
    }

    #[test]
    fn relevance_has_no_sort_field() {
        assert_eq!(SortBy::Relevance.field(), None);
        assert_eq!(SortBy::Rating.field(), Some("rating"));
    }
}
