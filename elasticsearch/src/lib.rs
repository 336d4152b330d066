//! Elasticsearch adapter for the review search index.
//!
//! Talks to the REST API directly: `PUT {index}/_doc/{id}` to index,
//! `DELETE {index}/_doc/{id}` to remove (a 404 is success, deletes are
//! idempotent) and `POST {index}/_search` for structured queries.
//!
//! The query body mirrors the list contract:
//!
//! ```text
//! {
//!   "track_total_hits": true,
//!   "from": ..., "size": ...,
//!   "query": { "bool": {
//!     "must":   [ multi_match over subject^2, content, operator=and ],
//!     "filter": [ term user_id, range rating ]
//!   }},
//!   "sort": [ { "ts" | "rating": { "order": ... } } ]   // omitted for relevance
//! }
//! ```
//!
//! Body construction and response parsing are pure functions so the query
//! contract is testable without a cluster.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use review_core::{Review, ReviewDocument, SearchError, SearchIndex, SearchPage, SearchQuery};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Default index name when the configuration leaves it empty.
pub const DEFAULT_INDEX: &str = "reviews";

/// Elasticsearch implementation of the review search index.
#[derive(Clone)]
pub struct ElasticsearchIndex {
    client: reqwest::Client,
    base_url: String,
    index: String,
}

impl ElasticsearchIndex {
    /// Create a client for `base_url` (for example `http://localhost:9200`)
    /// targeting `index`. An empty index name falls back to
    /// [`DEFAULT_INDEX`].
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: &str, index: &str) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SearchError::Transport(format!("http client: {e}")))?;

        let adapter = Self::with_client(base_url, index, client);
        tracing::info!(url = %adapter.base_url, index = %adapter.index, "search index client created");
        Ok(adapter)
    }

    /// Create with an injected HTTP client.
    #[must_use]
    pub fn with_client(base_url: &str, index: &str, client: reqwest::Client) -> Self {
        let index = if index.is_empty() {
            DEFAULT_INDEX
        } else {
            index
        };
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        }
    }

    /// The index this adapter reads and writes.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/_doc/{id}", self.base_url, self.index)
    }

    async fn check(response: reqwest::Response) -> Result<(), SearchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let reason = response.text().await.unwrap_or_default();
        Err(SearchError::Status {
            status: status.as_u16(),
            reason,
        })
    }
}

/// Build the `_search` request body for a normalized query.
#[must_use]
pub fn build_search_body(query: &SearchQuery) -> Value {
    let mut must = Vec::new();
    if let Some(text) = &query.text {
        must.push(json!({
            "multi_match": {
                "query": text,
                "fields": ["subject^2", "content"],
                "operator": "and",
            }
        }));
    }

    let mut filter = Vec::new();
    if let Some(user_id) = query.user_id {
        filter.push(json!({ "term": { "user_id": user_id } }));
    }
    if query.rating_min.is_some() || query.rating_max.is_some() {
        let mut range = serde_json::Map::new();
        if let Some(min) = query.rating_min {
            range.insert("gte".to_string(), json!(min));
        }
        if let Some(max) = query.rating_max {
            range.insert("lte".to_string(), json!(max));
        }
        filter.push(json!({ "range": { "rating": Value::Object(range) } }));
    }

    let mut body = json!({
        "track_total_hits": true,
        "from": query.from,
        "size": query.size,
        "query": { "bool": { "must": must, "filter": filter } },
    });

    // Relevance keeps the engine's score order; anything else bypasses
    // scoring with an explicit sort key.
    if let Some(field) = query.sort.field() {
        body["sort"] = json!([{ field: { "order": query.order.to_string() } }]);
    }

    body
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    total: TotalHits,
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct TotalHits {
    value: u64,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: Value,
}

/// Parse a `_search` response body into a result page.
///
/// The review id is taken from `_id` when it parses as a decimal integer,
/// which it always does for documents written by the projector.
///
/// # Errors
///
/// Returns [`SearchError::Decode`] when the body is not a search response
/// or a hit's source does not look like a review document.
pub fn parse_search_response(body: &[u8]) -> Result<SearchPage, SearchError> {
    let response: SearchResponse =
        serde_json::from_slice(body).map_err(|e| SearchError::Decode(e.to_string()))?;

    let mut reviews = Vec::with_capacity(response.hits.hits.len());
    for hit in response.hits.hits {
        let doc: ReviewDocument = serde_json::from_value(hit.source)
            .map_err(|e| SearchError::Decode(format!("hit {}: {e}", hit.id)))?;
        let mut review: Review = doc.review;
        if let Ok(id) = hit.id.parse::<u64>() {
            review.id = id;
        }
        reviews.push(review);
    }

    Ok(SearchPage {
        reviews,
        total: response.hits.total.value,
    })
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn index(&self, doc: &ReviewDocument) -> Result<(), SearchError> {
        let response = self
            .client
            .put(self.doc_url(&doc.doc_id()))
            .json(doc)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        Self::check(response).await
    }

    async fn delete(&self, id: u64) -> Result<(), SearchError> {
        let response = self
            .client
            .delete(self.doc_url(&id.to_string()))
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        // The document may never have been indexed, or a replayed delete
        // already removed it.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let response = self
            .client
            .post(&url)
            .json(&build_search_body(query))
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                reason,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        parse_search_response(&body)
    }
}
