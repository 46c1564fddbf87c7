//! CSV record source.
//!
//! The first row is the header. Every following row becomes a [`Record`] keyed by those headers.
//! Rows are parsed flexibly: a short row yields a record without its missing trailing columns and
//! cells beyond the header width are dropped. Blank lines are skipped.

use crate::processing::types::{IngestError, Record};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Lazy, finite sequence of records read from one CSV file.
///
/// The iterator is not restartable; open the file again to read it from the top.
pub struct RecordReader {
    path: PathBuf,
    headers: Vec<String>,
    rows: StringRecordsIntoIter<File>,
}

impl RecordReader {
    /// Open `path` and read its header row.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let unreadable = |source| IngestError::FileUnreadable {
            path: path.clone(),
            source,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(unreadable)?;
        let headers = reader
            .headers()
            .map_err(unreadable)?
            .iter()
            .map(str::to_string)
            .collect();

        tracing::debug!(path = %path.display(), "Opened CSV source");
        Ok(Self {
            path,
            headers,
            rows: reader.into_records(),
        })
    }

    /// Column headers in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Path the reader was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_record(&self, row: &StringRecord) -> Record {
        self.headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect()
    }
}

impl Iterator for RecordReader {
    type Item = Result<Record, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(source) => {
                let line = source.position().map(|position| position.line());
                return Some(Err(IngestError::MalformedRow { line, source }));
            }
        };
        Some(Ok(self.to_record(&row)))
    }
}

/// Read every record in `path` into memory, stopping at the first unreadable row.
pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Record>, IngestError> {
    let reader = RecordReader::open(path)?;
    let path = reader.path().to_path_buf();
    let columns = reader.headers().len();
    let records = reader.collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(
        path = %path.display(),
        columns,
        rows = records.len(),
        "Read CSV source"
    );
    Ok(records)
}
