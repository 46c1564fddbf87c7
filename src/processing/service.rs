//! Employee service coordinating CSV ingestion and Elasticsearch operations.

use crate::{
    config::Config,
    elastic::{ElasticError, ElasticService, TermsBucket},
    metrics::{IngestMetrics, MetricsSnapshot},
    processing::{
        projector::project,
        reader::read_all,
        types::{IngestOutcome, ProcessingError, Record},
    },
};
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Owns the Elasticsearch client and the ingestion settings shared by every request.
///
/// Construct it once at process start and share it through an `Arc`; handlers never build their
/// own client.
pub struct EmployeeService {
    elastic: ElasticService,
    csv_path: PathBuf,
    facet_field: String,
    ingest_concurrency: usize,
    metrics: Arc<IngestMetrics>,
}

/// Operations exposed to the HTTP surface.
#[async_trait]
pub trait EmployeeApi: Send + Sync {
    /// Create an empty collection (index).
    async fn create_collection(&self, collection_name: &str) -> Result<(), ProcessingError>;

    /// Index every CSV row into `collection_name`, dropping `exclude_column` from each row.
    async fn ingest_csv(
        &self,
        collection_name: &str,
        exclude_column: &str,
    ) -> Result<IngestOutcome, ProcessingError>;

    /// Match `column_value` against `column_name` and return the engine's raw hits.
    async fn search_by_column(
        &self,
        collection_name: &str,
        column_name: &str,
        column_value: &str,
    ) -> Result<Vec<Value>, ProcessingError>;

    /// Count documents stored in the collection.
    async fn employee_count(&self, collection_name: &str) -> Result<u64, ProcessingError>;

    /// Delete one document by its engine-assigned id.
    async fn delete_employee(
        &self,
        collection_name: &str,
        employee_id: &str,
    ) -> Result<(), ProcessingError>;

    /// Group documents by the configured facet field.
    async fn department_facets(
        &self,
        collection_name: &str,
    ) -> Result<Vec<TermsBucket>, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl EmployeeService {
    /// Build the service and its Elasticsearch client from configuration.
    pub fn new(config: &Config) -> Result<Self, ProcessingError> {
        let elastic = ElasticService::new(config)?;
        Ok(Self {
            elastic,
            csv_path: config.csv_path.clone(),
            facet_field: config.facet_field.clone(),
            ingest_concurrency: config.ingest_concurrency.max(1),
            metrics: Arc::new(IngestMetrics::new()),
        })
    }

    /// Check that the engine answers on its root endpoint.
    pub async fn ping(&self) -> Result<(), ProcessingError> {
        Ok(self.elastic.ping().await?)
    }

    /// Create an empty index named `collection_name`.
    pub async fn create_collection(&self, collection_name: &str) -> Result<(), ProcessingError> {
        self.elastic.create_index(collection_name).await?;
        tracing::info!(collection = collection_name, "Collection created");
        Ok(())
    }

    /// Read the configured CSV file and index each row with `exclude_column` removed.
    ///
    /// Rows are written in file order with at most `ingest_concurrency` writes in flight (one
    /// by default). The first failing write aborts the run; documents written before it stay
    /// in the index.
    pub async fn ingest_csv(
        &self,
        collection_name: &str,
        exclude_column: &str,
    ) -> Result<IngestOutcome, ProcessingError> {
        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            collection = collection_name,
            exclude_column,
            path = %self.csv_path.display(),
            "Starting CSV ingestion"
        );

        let path = self.csv_path.clone();
        let records = match tokio::task::spawn_blocking(move || read_all(path)).await {
            Ok(Ok(records)) => records,
            Ok(Err(error)) => {
                self.metrics.record_failed_run(0);
                return Err(error.into());
            }
            Err(error) => {
                self.metrics.record_failed_run(0);
                return Err(error.into());
            }
        };

        match self
            .index_records(collection_name, exclude_column, records)
            .await
        {
            Ok(indexed) => {
                self.metrics.record_run(indexed as u64);
                tracing::info!(
                    %run_id,
                    collection = collection_name,
                    documents = indexed,
                    "CSV ingestion completed"
                );
                Ok(IngestOutcome {
                    documents_indexed: indexed,
                })
            }
            Err((indexed, source)) => {
                self.metrics.record_failed_run(indexed as u64);
                tracing::error!(
                    %run_id,
                    collection = collection_name,
                    indexed,
                    error = %source,
                    "CSV ingestion aborted"
                );
                Err(ProcessingError::IndexingAborted { indexed, source })
            }
        }
    }

    async fn index_records(
        &self,
        collection_name: &str,
        exclude_column: &str,
        records: Vec<Record>,
    ) -> Result<usize, (usize, ElasticError)> {
        let mut writes = stream::iter(records)
            .map(|record| project(record, exclude_column))
            .map(|document| async move {
                self.elastic
                    .index_document(collection_name, &document)
                    .await
            })
            .buffered(self.ingest_concurrency);

        let mut indexed = 0;
        while let Some(result) = writes.next().await {
            match result {
                Ok(_) => indexed += 1,
                Err(error) => return Err((indexed, error)),
            }
        }
        Ok(indexed)
    }

    /// Run a match query for `column_value` on `column_name`.
    pub async fn search_by_column(
        &self,
        collection_name: &str,
        column_name: &str,
        column_value: &str,
    ) -> Result<Vec<Value>, ProcessingError> {
        let hits = self
            .elastic
            .search_match(collection_name, column_name, column_value)
            .await?;
        tracing::info!(
            collection = collection_name,
            column = column_name,
            hits = hits.len(),
            "Search completed"
        );
        Ok(hits)
    }

    /// Count the documents in `collection_name`.
    pub async fn employee_count(&self, collection_name: &str) -> Result<u64, ProcessingError> {
        Ok(self.elastic.count(collection_name).await?)
    }

    /// Delete the document `employee_id` from `collection_name`.
    pub async fn delete_employee(
        &self,
        collection_name: &str,
        employee_id: &str,
    ) -> Result<(), ProcessingError> {
        self.elastic
            .delete_document(collection_name, employee_id)
            .await?;
        tracing::info!(
            collection = collection_name,
            employee_id,
            "Employee deleted"
        );
        Ok(())
    }

    /// Aggregate `collection_name` by the keyword form of the facet field.
    pub async fn department_facets(
        &self,
        collection_name: &str,
    ) -> Result<Vec<TermsBucket>, ProcessingError> {
        Ok(self
            .elastic
            .terms_aggregation(collection_name, &self.facet_field)
            .await?)
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl EmployeeApi for EmployeeService {
    async fn create_collection(&self, collection_name: &str) -> Result<(), ProcessingError> {
        EmployeeService::create_collection(self, collection_name).await
    }

    async fn ingest_csv(
        &self,
        collection_name: &str,
        exclude_column: &str,
    ) -> Result<IngestOutcome, ProcessingError> {
        EmployeeService::ingest_csv(self, collection_name, exclude_column).await
    }

    async fn search_by_column(
        &self,
        collection_name: &str,
        column_name: &str,
        column_value: &str,
    ) -> Result<Vec<Value>, ProcessingError> {
        EmployeeService::search_by_column(self, collection_name, column_name, column_value).await
    }

    async fn employee_count(&self, collection_name: &str) -> Result<u64, ProcessingError> {
        EmployeeService::employee_count(self, collection_name).await
    }

    async fn delete_employee(
        &self,
        collection_name: &str,
        employee_id: &str,
    ) -> Result<(), ProcessingError> {
        EmployeeService::delete_employee(self, collection_name, employee_id).await
    }

    async fn department_facets(
        &self,
        collection_name: &str,
    ) -> Result<Vec<TermsBucket>, ProcessingError> {
        EmployeeService::department_facets(self, collection_name).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        EmployeeService::metrics_snapshot(self)
    }
}
