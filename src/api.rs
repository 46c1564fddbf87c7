//! HTTP surface for the employee search service.
//!
//! Each route takes its arguments from the path, runs one [`EmployeeApi`] operation, and maps
//! the result to JSON:
//!
//! - `POST /0000/:collectionName` – Create an empty collection. `201 { message }`.
//! - `POST /index-data/:collectionName/:excludeColumn` – Index every row of the configured CSV
//!   file without `excludeColumn`. `201 { message }`.
//! - `GET /search-by-column/:collectionName/:columnName/:columnValue` – Match query. `200 [hit]`.
//! - `GET /employee-count/:collectionName` – Document count. `200 { count }`.
//! - `DELETE /delete-employee/:collectionName/:employeeId` – Delete by id. `200 { message }`.
//! - `GET /department-facets/:collectionName` – Terms aggregation on the facet field.
//!   `200 [{ key, doc_count }]`.
//! - `GET /metrics` – Ingestion counters.
//! - `GET /commands` – Machine-readable route catalog.
//!
//! Any failure is logged and answered with `500` carrying the engine's raw error body. Path
//! parameters are passed through without validation.

use crate::elastic::{ElasticError, TermsBucket};
use crate::metrics::MetricsSnapshot;
use crate::processing::{EmployeeApi, IngestError, ProcessingError};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the HTTP router exposing the employee API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: EmployeeApi + 'static,
{
    Router::new()
        .route("/0000/:collection_name", post(create_collection::<S>))
        .route(
            "/index-data/:collection_name/:exclude_column",
            post(index_data::<S>),
        )
        .route(
            "/search-by-column/:collection_name/:column_name/:column_value",
            get(search_by_column::<S>),
        )
        .route("/employee-count/:collection_name", get(employee_count::<S>))
        .route(
            "/delete-employee/:collection_name/:employee_id",
            delete(delete_employee::<S>),
        )
        .route(
            "/department-facets/:collection_name",
            get(department_facets::<S>),
        )
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Body returned by routes that only acknowledge an action.
#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

/// Create an empty collection.
async fn create_collection<S>(
    State(service): State<Arc<S>>,
    Path(collection_name): Path<String>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError>
where
    S: EmployeeApi,
{
    service.create_collection(&collection_name).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Collection {collection_name} created successfully"),
        }),
    ))
}

/// Index the CSV source into a collection, excluding one column.
async fn index_data<S>(
    State(service): State<Arc<S>>,
    Path((collection_name, exclude_column)): Path<(String, String)>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError>
where
    S: EmployeeApi,
{
    let outcome = service
        .ingest_csv(&collection_name, &exclude_column)
        .await?;
    tracing::info!(
        collection = collection_name,
        exclude_column,
        documents = outcome.documents_indexed,
        "Index request completed"
    );
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Data indexed into {collection_name} excluding {exclude_column}"),
        }),
    ))
}

/// Return the raw hits matching a column value.
async fn search_by_column<S>(
    State(service): State<Arc<S>>,
    Path((collection_name, column_name, column_value)): Path<(String, String, String)>,
) -> Result<Json<Vec<Value>>, AppError>
where
    S: EmployeeApi,
{
    let hits = service
        .search_by_column(&collection_name, &column_name, &column_value)
        .await?;
    Ok(Json(hits))
}

/// Response body for `GET /employee-count/:collectionName`.
#[derive(Serialize)]
struct CountResponse {
    count: u64,
}

async fn employee_count<S>(
    State(service): State<Arc<S>>,
    Path(collection_name): Path<String>,
) -> Result<Json<CountResponse>, AppError>
where
    S: EmployeeApi,
{
    let count = service.employee_count(&collection_name).await?;
    Ok(Json(CountResponse { count }))
}

async fn delete_employee<S>(
    State(service): State<Arc<S>>,
    Path((collection_name, employee_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError>
where
    S: EmployeeApi,
{
    service
        .delete_employee(&collection_name, &employee_id)
        .await?;
    Ok(Json(MessageResponse {
        message: format!("Employee {employee_id} deleted from {collection_name}"),
    }))
}

async fn department_facets<S>(
    State(service): State<Arc<S>>,
    Path(collection_name): Path<String>,
) -> Result<Json<Vec<TermsBucket>>, AppError>
where
    S: EmployeeApi,
{
    let buckets = service.department_facets(&collection_name).await?;
    Ok(Json(buckets))
}

/// Return the ingestion counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: EmployeeApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "create_collection",
                method: "POST",
                path: "/0000/:collectionName",
                description: "Create an empty collection (Elasticsearch index).",
            },
            CommandDescriptor {
                name: "index_data",
                method: "POST",
                path: "/index-data/:collectionName/:excludeColumn",
                description: "Index every row of the configured CSV file, dropping one column from each document.",
            },
            CommandDescriptor {
                name: "search_by_column",
                method: "GET",
                path: "/search-by-column/:collectionName/:columnName/:columnValue",
                description: "Run a match query on one column and return the raw hits.",
            },
            CommandDescriptor {
                name: "employee_count",
                method: "GET",
                path: "/employee-count/:collectionName",
                description: "Return { \"count\": number } for the collection.",
            },
            CommandDescriptor {
                name: "delete_employee",
                method: "DELETE",
                path: "/delete-employee/:collectionName/:employeeId",
                description: "Delete one document by id. Unknown ids are reported as errors.",
            },
            CommandDescriptor {
                name: "department_facets",
                method: "GET",
                path: "/department-facets/:collectionName",
                description: "Group documents by department and return { key, doc_count } buckets.",
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return ingestion counters.",
            },
        ],
    })
}

struct AppError(ProcessingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body(&self.0))).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self(inner)
    }
}

/// JSON returned with a 500. The engine's own error document is forwarded untouched when it
/// sent one; local failures use the same `{ error: { type, reason } }` shape.
fn error_body(error: &ProcessingError) -> Value {
    match error {
        ProcessingError::Elastic(source) | ProcessingError::IndexingAborted { source, .. } => {
            engine_error_body(source)
        }
        ProcessingError::Ingest(source @ IngestError::FileUnreadable { .. }) => {
            local_error("file_unreadable", source)
        }
        ProcessingError::Ingest(source @ IngestError::MalformedRow { .. }) => {
            local_error("malformed_row", source)
        }
        ProcessingError::ReaderTask(source) => local_error("internal_error", source),
    }
}

fn engine_error_body(error: &ElasticError) -> Value {
    match error {
        ElasticError::UnexpectedStatus { status, body } => serde_json::from_str(body)
            .unwrap_or_else(|_| {
                json!({
                    "error": { "type": "engine_error", "reason": body },
                    "status": status.as_u16(),
                })
            }),
        ElasticError::Http(_) => local_error("connection_error", error),
        ElasticError::Decode(_) => local_error("decode_error", error),
        ElasticError::InvalidUrl(_) => local_error("invalid_url", error),
        ElasticError::DotSegment(_) => local_error("invalid_path_segment", error),
    }
}

fn local_error(kind: &str, error: &dyn std::fmt::Display) -> Value {
    json!({ "error": { "type": kind, "reason": error.to_string() } })
}
