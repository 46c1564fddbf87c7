#![deny(missing_docs)]

//! Core library for the employee search service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Elasticsearch REST integration.
pub mod elastic;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// CSV ingestion pipeline and engine orchestration.
pub mod processing;
