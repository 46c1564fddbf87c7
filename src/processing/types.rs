//! Core data types and error definitions for the ingestion pipeline.

use crate::elastic::ElasticError;
use indexmap::IndexMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reading the CSV source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file could not be opened or its header row could not be read.
    #[error("failed to read CSV file '{}': {source}", .path.display())]
    FileUnreadable {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying reader error.
        #[source]
        source: csv::Error,
    },
    /// A data row could not be decoded.
    #[error("malformed CSV row{}: {source}", .line.map(|line| format!(" at line {line}")).unwrap_or_default())]
    MalformedRow {
        /// One-based line number of the offending row, when known.
        line: Option<u64>,
        /// Underlying reader error.
        #[source]
        source: csv::Error,
    },
}

/// Errors emitted by the employee service.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// A single Elasticsearch call failed.
    #[error("Elasticsearch request failed: {0}")]
    Elastic(#[from] ElasticError),
    /// The CSV source could not be read.
    #[error("CSV ingestion failed: {0}")]
    Ingest(#[from] IngestError),
    /// Bulk ingestion stopped at the first failing row. Earlier rows stay indexed.
    #[error("Indexing aborted after {indexed} documents: {source}")]
    IndexingAborted {
        /// Documents persisted before the failure.
        indexed: usize,
        /// Failure returned for the aborted row.
        #[source]
        source: ElasticError,
    },
    /// The blocking CSV reader task panicked or was cancelled.
    #[error("CSV reader task failed: {0}")]
    ReaderTask(#[from] tokio::task::JoinError),
}

/// Summary of a completed bulk ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Number of documents written to the index.
    pub documents_indexed: usize,
}

/// One CSV row as an ordered field-name to value mapping.
///
/// Keys are unique; inserting an existing key replaces its value in place. Serializes as a flat
/// JSON object in column order.
pub type Record = IndexMap<String, String>;
