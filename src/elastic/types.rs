//! Shared types used by the Elasticsearch client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Name under which the terms aggregation is requested and read back.
pub const TERMS_AGGREGATION_NAME: &str = "department_count";

/// Errors returned while interacting with Elasticsearch.
#[derive(Debug, Error)]
pub enum ElasticError {
    /// Base URL failed to parse or cannot carry path segments.
    #[error("Invalid Elasticsearch URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response (connection refused, DNS, reset).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Elasticsearch responded with a non-success status code.
    #[error("Unexpected Elasticsearch response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the engine.
        status: StatusCode,
        /// Raw body of the failing response.
        body: String,
    },
    /// A name resolves to `.` or `..`, which URL normalization would collapse into a parent path.
    #[error("Invalid path segment '{0}': '.' and '..' cannot be used as a name")]
    DotSegment(String),
    /// A success response did not have the expected shape.
    #[error("Failed to decode Elasticsearch response: {0}")]
    Decode(String),
}

/// One `(key, doc_count)` pair produced by a terms aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsBucket {
    /// Exact keyword value shared by the grouped documents.
    pub key: Value,
    /// Number of documents carrying `key`.
    pub doc_count: u64,
}

#[derive(Deserialize)]
pub(crate) struct IndexDocumentResponse {
    #[serde(rename = "_id")]
    pub(crate) id: String,
}

#[derive(Deserialize)]
pub(crate) struct SearchResponse {
    pub(crate) hits: SearchHits,
}

#[derive(Deserialize)]
pub(crate) struct SearchHits {
    #[serde(default)]
    pub(crate) hits: Vec<Value>,
}

#[derive(Deserialize)]
pub(crate) struct CountResponse {
    pub(crate) count: u64,
}

#[derive(Deserialize)]
pub(crate) struct AggregationResponse {
    pub(crate) aggregations: Aggregations,
}

#[derive(Deserialize)]
pub(crate) struct Aggregations {
    pub(crate) department_count: TermsAggregation,
}

#[derive(Deserialize)]
pub(crate) struct TermsAggregation {
    #[serde(default)]
    pub(crate) buckets: Vec<TermsBucket>,
}
