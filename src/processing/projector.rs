//! Field exclusion applied to each record before it is indexed.

use crate::processing::types::Record;

/// Return `record` without the field named `exclude_column`.
///
/// An empty or unknown column name leaves the record untouched.
pub fn project(mut record: Record, exclude_column: &str) -> Record {
    if record.shift_remove(exclude_column).is_some() {
        tracing::trace!(column = exclude_column, "Excluded column from record");
    }
    record
}
