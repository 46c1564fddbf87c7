use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_indexed: AtomicU64,
    ingest_runs: AtomicU64,
    failed_runs: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed ingestion run and the documents it wrote.
    pub fn record_run(&self, documents: u64) {
        self.ingest_runs.fetch_add(1, Ordering::Relaxed);
        self.documents_indexed
            .fetch_add(documents, Ordering::Relaxed);
    }

    /// Record an aborted ingestion run. Documents written before the failure still count.
    pub fn record_failed_run(&self, documents: u64) {
        self.ingest_runs.fetch_add(1, Ordering::Relaxed);
        self.failed_runs.fetch_add(1, Ordering::Relaxed);
        self.documents_indexed
            .fetch_add(documents, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            ingest_runs: self.ingest_runs.load(Ordering::Relaxed),
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents written by bulk ingestion since startup.
    pub documents_indexed: u64,
    /// Bulk ingestion runs started since startup, successful or not.
    pub ingest_runs: u64,
    /// Runs that stopped early because of a read or index failure.
    pub failed_runs: u64,
}
