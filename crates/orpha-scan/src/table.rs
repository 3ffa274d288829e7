//! Generic tab-separated table parser.
//!
//! Provides a streaming parser for header-validated TSV files such as the
//! ORDO term table.

use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::types::{ScanError, ScanResult};

/// Trait for types that can be parsed from table rows.
pub trait TableRecord: Sized {
    /// Expected leading column names for this record type.
    const EXPECTED_COLUMNS: &'static [&'static str];

    /// Parse a record from a CSV StringRecord.
    fn from_record(record: &StringRecord) -> ScanResult<Self>;

    /// Returns false for records that parse but should not be kept.
    fn is_usable(&self) -> bool {
        true
    }
}

/// A streaming parser for tab-separated tables.
///
/// Rows are read one at a time; nothing beyond the current row is buffered.
pub struct TableParser<R: Read, T: TableRecord> {
    reader: Reader<R>,
    rows_read: usize,
    rows_skipped: usize,
    _marker: PhantomData<T>,
}

impl<T: TableRecord> TableParser<BufReader<File>, T> {
    /// Creates a new parser from a file path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or has invalid headers.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ScanResult<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ScanError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read, T: TableRecord> TableParser<R, T> {
    /// Creates a new parser from a reader.
    pub fn from_reader(reader: R) -> ScanResult<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::None)
            .from_reader(reader);

        Self::validate_headers(&mut csv_reader)?;

        Ok(Self {
            reader: csv_reader,
            rows_read: 0,
            rows_skipped: 0,
            _marker: PhantomData,
        })
    }

    /// Validates that the table starts with the expected column headers.
    fn validate_headers(reader: &mut Reader<R>) -> ScanResult<()> {
        let headers = reader.headers()?;
        let expected = T::EXPECTED_COLUMNS;

        if headers.len() < expected.len() {
            return Err(ScanError::InvalidHeader {
                expected: expected.len(),
                found: headers.len(),
            });
        }

        for (i, expected_col) in expected.iter().enumerate() {
            let found = headers.get(i).unwrap_or("");
            // Handle UTF-8 BOM at start of file
            let found = found.trim_start_matches('\u{feff}');
            if found != *expected_col {
                return Err(ScanError::UnexpectedColumn {
                    position: i,
                    expected: expected_col.to_string(),
                    found: found.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Returns the number of data rows read so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Returns the number of rows dropped as unusable.
    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }

    /// Parses all rows into a Vec, stopping at the first bad row.
    pub fn parse_all(mut self) -> ScanResult<Vec<T>> {
        let mut results = Vec::new();
        for record in self.by_ref() {
            results.push(record?);
        }
        Ok(results)
    }
}

impl<R: Read, T: TableRecord> Iterator for TableParser<R, T> {
    type Item = ScanResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut record = StringRecord::new();
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    self.rows_read += 1;

                    // Skip empty records
                    if record.is_empty() || record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }

                    let line = record.position().map(|p| p.line()).unwrap_or(0);
                    match T::from_record(&record) {
                        Ok(parsed) if parsed.is_usable() => return Some(Ok(parsed)),
                        Ok(_) => {
                            self.rows_skipped += 1;
                            continue;
                        }
                        Err(e) => {
                            return Some(Err(ScanError::InvalidRow {
                                line,
                                reason: e.to_string(),
                            }))
                        }
                    }
                }
                Ok(false) => return None, // End of file
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Helper functions for parsing table field values.
pub mod parse {
    use super::{ScanError, ScanResult};

    /// Parses a boolean from "0" or "1".
    pub fn boolean(value: &str) -> ScanResult<bool> {
        match value.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(ScanError::InvalidBoolean {
                value: value.to_string(),
            }),
        }
    }

    /// Returns the trimmed field, or an error naming the column if it is blank.
    pub fn required<'a>(value: Option<&'a str>, column: &str) -> ScanResult<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ScanError::MissingColumn {
                column: column.to_string(),
            }),
        }
    }
}
