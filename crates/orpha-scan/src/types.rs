//! Scanner-specific types: errors, configuration and run statistics.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading inputs or scanning archives.
#[derive(Error, Debug)]
pub enum ScanError {
    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV/TSV parsing or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Directory not found.
    #[error("Directory not found: {path}")]
    DirectoryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// The archive directory holds no matching files.
    #[error("No .{extension} archives found under {directory}")]
    NoArchives {
        /// The directory that was searched.
        directory: String,
        /// The archive extension searched for.
        extension: String,
    },

    /// Invalid header - column count mismatch.
    #[error("Invalid header: expected {expected} columns, found {found}")]
    InvalidHeader {
        /// Expected column count.
        expected: usize,
        /// Found column count.
        found: usize,
    },

    /// Unexpected column name.
    #[error("Unexpected column '{found}' at position {position}, expected '{expected}'")]
    UnexpectedColumn {
        /// The column position.
        position: usize,
        /// Expected column name.
        expected: String,
        /// Found column name.
        found: String,
    },

    /// Required column value is blank.
    #[error("Missing value in column: {column}")]
    MissingColumn {
        /// The name of the column.
        column: String,
    },

    /// Invalid boolean value.
    #[error("Invalid boolean value: {value} (expected 0 or 1)")]
    InvalidBoolean {
        /// The invalid boolean value.
        value: String,
    },

    /// A table row could not be turned into a record.
    #[error("Invalid row at line {line}: {reason}")]
    InvalidRow {
        /// 1-based line number in the source table.
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },

    /// The term catalog loaded without a single usable term.
    #[error("Term catalog is empty: {path}")]
    EmptyCatalog {
        /// Catalog path.
        path: String,
    },

    /// Entity-matching model directory or patterns file missing.
    #[error("Entity-matching model not found: {path}")]
    ModelNotFound {
        /// The missing path.
        path: String,
    },

    /// Entity-matching model present but unreadable.
    #[error("Invalid entity-matching model {path} at line {line}: {reason}")]
    InvalidModel {
        /// The offending file.
        path: String,
        /// 1-based line number (0 when not line-specific).
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// An archive could not be opened.
    #[error("Cannot open archive {path}: {source}")]
    ArchiveOpen {
        /// The archive path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An archive is corrupt or truncated mid-stream.
    #[error("Decode error in archive {path}: {source}")]
    Decode {
        /// The archive path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The output file exists but does not look like candidate output.
    #[error("Output file {path} has an unexpected header: {found}")]
    OutputHeader {
        /// The output path.
        path: String,
        /// The header that was found.
        found: String,
    },

    /// The downstream verification process failed.
    #[error("Verification command '{program}' failed: {reason}")]
    Verification {
        /// The program that was launched.
        program: String,
        /// Spawn error or exit status.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for scanner operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Largest window log the zstd decoder accepts.
pub const MAX_WINDOW_LOG: u32 = 31;

/// Tunables for a scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Largest zstd window the decoder may allocate, in bytes.
    pub max_window_size: u64,
    /// Number of processed records between buffer flushes.
    pub flush_chunk_size: usize,
    /// Minimum stripped-name length (in chars) before the fuzzy fallback runs.
    pub min_fuzzy_name_len: usize,
    /// Fuzzy acceptance threshold on a 0-100 scale.
    pub fuzzy_threshold: f64,
    /// Prefix removed from raw names to form the fuzzy candidate.
    pub name_prefix: String,
    /// File-name marker identifying metadata-only dumps.
    pub meta_marker: String,
    /// Extension of archive files (without the dot).
    pub archive_extension: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_window_size: 1 << 31,
            flush_chunk_size: 1_000_000,
            min_fuzzy_name_len: 5,
            fuzzy_threshold: 85.0,
            name_prefix: "r/".to_string(),
            meta_marker: "meta_only".to_string(),
            archive_extension: "zst".to_string(),
        }
    }
}

impl ScanConfig {
    /// Checks value ranges.
    pub fn validate(&self) -> ScanResult<()> {
        if self.flush_chunk_size == 0 {
            return Err(ScanError::Config(
                "flush chunk size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.fuzzy_threshold) {
            return Err(ScanError::Config(format!(
                "fuzzy threshold {} is outside 0-100",
                self.fuzzy_threshold
            )));
        }
        if self.max_window_size < 1024 {
            return Err(ScanError::Config(format!(
                "max window size {} is below the zstd minimum of 1 KB",
                self.max_window_size
            )));
        }
        if self.window_log_max() > MAX_WINDOW_LOG {
            return Err(ScanError::Config(format!(
                "max window size {} exceeds the zstd limit of 2^{} bytes",
                self.max_window_size, MAX_WINDOW_LOG
            )));
        }
        Ok(())
    }

    /// Returns the decoder window limit as a base-2 logarithm.
    ///
    /// Sizes that are not a power of two round down.
    pub fn window_log_max(&self) -> u32 {
        self.max_window_size.max(1).ilog2()
    }
}

/// Options applied when loading the entity-matching model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherOptions {
    /// Pipeline stages to skip.
    pub disable: Vec<String>,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            disable: vec![
                "tagger".to_string(),
                "parser".to_string(),
                "lemmatizer".to_string(),
            ],
        }
    }
}

impl MatcherOptions {
    /// Returns true if the named stage is disabled.
    pub fn is_disabled(&self, stage: &str) -> bool {
        self.disable.iter().any(|s| s == stage)
    }
}

/// Counters collected over a scan run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Archives attempted.
    pub archives_seen: usize,
    /// Archives that failed to open or decode.
    pub archives_failed: usize,
    /// Non-blank lines read.
    pub lines_read: u64,
    /// Records decoded and run through the matchers.
    pub records_processed: u64,
    /// Lines skipped because they were not valid JSON records.
    pub malformed_lines: u64,
    /// Records skipped because they had no name.
    pub missing_name: u64,
    /// Records with at least one exact identifier.
    pub exact_matches: u64,
    /// Records for which the fuzzy fallback ran.
    pub fuzzy_attempts: u64,
    /// Records accepted by the fuzzy fallback.
    pub fuzzy_matches: u64,
    /// Matching records dropped as already emitted.
    pub duplicates: u64,
    /// Rows appended to the output.
    pub rows_written: u64,
    /// Non-empty flushes.
    pub flushes: usize,
    /// Wall-clock scan time in milliseconds.
    pub elapsed_ms: u64,
}

impl ScanStats {
    /// Returns the percentage of processed records that matched.
    pub fn match_rate(&self) -> f64 {
        if self.records_processed == 0 {
            0.0
        } else {
            ((self.exact_matches + self.fuzzy_matches) as f64 / self.records_processed as f64)
                * 100.0
        }
    }

    /// Total record-level skips.
    pub fn skipped_records(&self) -> u64 {
        self.malformed_lines + self.missing_name
    }
}

/// Locations of the scan inputs and output.
#[derive(Debug, Clone)]
pub struct ScanPaths {
    /// Term catalog TSV.
    pub catalog: PathBuf,
    /// Entity-matching model directory.
    pub model: PathBuf,
    /// Root of the archive tree.
    pub dump_dir: PathBuf,
    /// Candidate CSV output.
    pub output: PathBuf,
}

impl Default for ScanPaths {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("data/ordo_terms.tsv"),
            model: PathBuf::from("models/model_rare_disease"),
            dump_dir: PathBuf::from("data/raw_subreddits"),
            output: PathBuf::from("data/candidate_subreddits.csv"),
        }
    }
}
