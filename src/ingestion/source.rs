//! Streaming CSV access to source files and decade artifacts.

use crate::error::{LoaderError, LoaderResult};
use crate::ingestion::cleaner::FieldCleaner;
use crate::logging::Diagnostics;
use crate::schema::{MovieRecord, RawRow, RecordValidator, SchemaViolation};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Reads a headed CSV file one [`RawRow`] at a time.
///
/// Rows may be shorter or longer than the header; missing trailing columns are simply
/// absent from the row.
pub struct SourceReader {
    path: PathBuf,
    header: Vec<String>,
    records: csv::StringRecordsIntoIter<File>,
    next_ordinal: usize,
}

impl SourceReader {
    pub fn open(path: &Path) -> LoaderResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| LoaderError::transient_io(format!("opening {}", path.display()), e))?;

        let header = reader
            .headers()
            .map_err(|e| {
                LoaderError::transient_io(format!("reading header of {}", path.display()), e)
            })?
            .iter()
            .map(|name| name.trim().to_string())
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            header,
            records: reader.into_records(),
            next_ordinal: 1,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for SourceReader {
    type Item = LoaderResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.records.next()?;
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;

        Some(match result {
            Ok(record) => Ok(RawRow::from_header(
                ordinal,
                self.header.iter().map(String::as_str),
                record.iter(),
            )),
            Err(e) if e.is_io_error() => Err(LoaderError::transient_io(
                format!("reading row {} of {}", ordinal, self.path.display()),
                e,
            )),
            Err(e) => Err(SchemaViolation::malformed(ordinal, e.to_string()).into()),
        })
    }
}

/// Count the data rows of a CSV file without decoding them
pub fn count_rows(path: &Path) -> LoaderResult<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| LoaderError::transient_io(format!("opening {}", path.display()), e))?;
    let mut count = 0;
    for record in reader.byte_records() {
        if let Err(e) = record {
            if e.is_io_error() {
                return Err(LoaderError::transient_io(
                    format!("counting rows of {}", path.display()),
                    e,
                ));
            }
        }
        count += 1;
    }
    Ok(count)
}

/// Cleaned and validated records, in source order.
///
/// Each item is either a [`MovieRecord`] or the failure for that row; the stream keeps
/// going after a failure so callers can decide whether to stop.
pub struct RecordStream<'d> {
    rows: SourceReader,
    cleaner: FieldCleaner,
    validator: RecordValidator,
    diagnostics: &'d Diagnostics,
}

impl<'d> RecordStream<'d> {
    pub fn open(path: &Path, diagnostics: &'d Diagnostics) -> LoaderResult<Self> {
        Self::with_cleaner(path, FieldCleaner::new(), diagnostics)
    }

    /// Stream a decade artifact. Cleaning warnings were recorded when the artifact was
    /// written, so only row failures surface here.
    pub fn open_artifact(path: &Path, diagnostics: &'d Diagnostics) -> LoaderResult<Self> {
        Self::with_cleaner(path, FieldCleaner::for_artifacts(), diagnostics)
    }

    fn with_cleaner(
        path: &Path,
        cleaner: FieldCleaner,
        diagnostics: &'d Diagnostics,
    ) -> LoaderResult<Self> {
        Ok(Self {
            rows: SourceReader::open(path)?,
            cleaner,
            validator: RecordValidator::new(),
            diagnostics,
        })
    }

    pub fn header(&self) -> &[String] {
        self.rows.header()
    }
}

impl Iterator for RecordStream<'_> {
    type Item = LoaderResult<MovieRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        let cleaned = self.cleaner.clean(row, self.diagnostics);
        Some(self.validator.validate(&cleaned).map_err(LoaderError::from))
    }
}
