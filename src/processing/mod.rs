//! Ingestion pipeline: CSV reading, field projection, and Elasticsearch orchestration.

pub mod projector;
pub mod reader;
mod service;
pub mod types;

pub use projector::project;
pub use reader::{RecordReader, read_all};
pub use service::{EmployeeApi, EmployeeService};
pub use types::{IngestError, IngestOutcome, ProcessingError, Record};
