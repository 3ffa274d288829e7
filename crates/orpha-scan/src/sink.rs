//! Candidate CSV output.
//!
//! The output file has a fixed `subreddit,orpha_ids` header. Rows are
//! appended in batches; each batch is serialized in memory first and written
//! with a single call so a flush never leaves half a row behind.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use orpha_types::CandidateRow;

use crate::types::{ScanError, ScanResult};

/// Destination for flushed candidate rows.
pub trait RowSink {
    /// Appends whole rows. An empty slice is a no-op.
    fn write_rows(&mut self, rows: &[CandidateRow]) -> ScanResult<()>;
}

/// Append-only CSV file of candidate rows.
#[derive(Debug)]
pub struct OutputSink {
    path: PathBuf,
    file: File,
    rows_written: u64,
    flushes: usize,
}

impl OutputSink {
    /// Creates (or truncates) the output file and writes the header.
    pub fn create<P: AsRef<Path>>(path: P) -> ScanResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        file.write_all(&encode_rows(None)?)?;
        file.flush()?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            rows_written: 0,
            flushes: 0,
        })
    }

    /// Opens an existing output file for appending after checking its header.
    ///
    /// A trailing line without a newline is a row cut short by a killed run;
    /// it is truncated away so appended rows start on a clean line. Falls
    /// back to [`create`](Self::create) if the file does not exist or is
    /// empty.
    pub fn append_existing<P: AsRef<Path>>(path: P) -> ScanResult<Self> {
        let path = path.as_ref();
        if !path.is_file() || fs::metadata(path)?.len() == 0 {
            return Self::create(path);
        }

        let mut first = String::new();
        BufReader::new(File::open(path)?).read_line(&mut first)?;
        let header = first.trim_start_matches('\u{feff}').trim_end_matches(['\n', '\r']);
        if header != CandidateRow::HEADER.join(",") {
            return Err(ScanError::OutputHeader {
                path: path.display().to_string(),
                found: header.to_string(),
            });
        }

        let mut repair = OpenOptions::new().read(true).write(true).open(path)?;
        let len = repair.seek(SeekFrom::End(0))?;
        let keep = terminated_len(&mut repair, len)?;
        if keep < first.len() as u64 {
            // Header only, without its newline
            repair.seek(SeekFrom::End(0))?;
            repair.write_all(b"\n")?;
        } else if keep < len {
            tracing::warn!(
                "Dropping {} bytes of unterminated row at the end of {}",
                len - keep,
                path.display()
            );
            repair.set_len(keep)?;
        }
        repair.flush()?;
        drop(repair);

        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            rows_written: 0,
            flushes: 0,
        })
    }

    /// Rows written through this handle.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Non-empty batches written through this handle.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl RowSink for OutputSink {
    fn write_rows(&mut self, rows: &[CandidateRow]) -> ScanResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let bytes = encode_rows(Some(rows))?;
        self.file.write_all(&bytes)?;
        self.file.flush()?;
        self.rows_written += rows.len() as u64;
        self.flushes += 1;
        tracing::debug!("Flushed {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}

/// Serializes the header (when `rows` is `None`) or the given rows.
fn encode_rows(rows: Option<&[CandidateRow]>) -> ScanResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    match rows {
        None => writer.write_record(CandidateRow::HEADER)?,
        Some(rows) => {
            for row in rows {
                writer.write_record(row.to_csv_fields())?;
            }
        }
    }
    writer.into_inner().map_err(|e| ScanError::Io(e.into_error()))
}

/// Length of `file` up to and including its last newline.
fn terminated_len(file: &mut File, len: u64) -> ScanResult<u64> {
    let mut block = [0u8; 4096];
    let mut end = len;
    while end > 0 {
        let start = end.saturating_sub(block.len() as u64);
        let chunk = &mut block[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
            return Ok(start + pos as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}

/// Reads every row of a candidate output file.
pub fn read_rows<P: AsRef<Path>>(path: P) -> ScanResult<Vec<CandidateRow>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ScanError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers: csv::StringRecord = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}'))
        .collect();
    if headers.iter().ne(CandidateRow::HEADER) {
        return Err(ScanError::OutputHeader {
            path: path.display().to_string(),
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        if record.len() < CandidateRow::HEADER.len() {
            tracing::warn!(
                "Skipping incomplete row on line {} of {}",
                record.position().map(|p| p.line()).unwrap_or(0),
                path.display()
            );
            skipped += 1;
            continue;
        }
        rows.push(record.deserialize::<CandidateRow>(Some(&headers))?);
    }
    if skipped > 0 {
        tracing::warn!("Skipped {} incomplete rows in {}", skipped, path.display());
    }
    Ok(rows)
}

/// Sink that keeps rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Rows in write order.
    pub rows: Vec<CandidateRow>,
    /// Size of each non-empty batch.
    pub batches: Vec<usize>,
}

impl RowSink for MemorySink {
    fn write_rows(&mut self, rows: &[CandidateRow]) -> ScanResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.rows.extend_from_slice(rows);
        self.batches.push(rows.len());
        Ok(())
    }
}
