//! Elasticsearch REST integration.

pub mod client;
pub mod types;

pub use client::ElasticService;
pub use types::{ElasticError, TERMS_AGGREGATION_NAME, TermsBucket};
