//! Scan controller.
//!
//! Drives archives through the matchers and into a [`RowSink`]:
//!
//! 1. archives are processed one at a time, in the order given;
//! 2. each line is decoded, matched exactly, then fuzzily if the exact
//!    matcher found nothing and the stripped name is long enough;
//! 3. matching names are deduplicated run-wide and buffered;
//! 4. the buffer is flushed every `flush_chunk_size` lines and once at the end.
//!
//! Archive and record failures are logged, counted and skipped. Only sink
//! failures abort a run.
//!
//! ```ignore
//! let catalog = TermCatalog::load("data/ordo_terms.tsv")?;
//! let matcher = EntityMatcher::load("models/model_rare_disease", &MatcherOptions::default())?;
//! let archives = discover_archives("data/raw_subreddits", &config)?;
//! let mut sink = OutputSink::create("data/candidate_subreddits.csv")?;
//!
//! let outcome = Scanner::new(&catalog, &matcher, config)?.run(&archives, &mut sink)?;
//! if outcome.has_candidates() { /* hand off to verification */ }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use orpha_types::{CandidateRow, MatchSet, SubredditRecord};

use crate::archive::{format_bytes, parse_record, ArchiveLines};
use crate::catalog::TermCatalog;
use crate::fuzzy::FuzzyMatcher;
use crate::ledger::DedupLedger;
use crate::matcher::EntityMatcher;
use crate::normalize::{normalize, strip_name_prefix};
use crate::sink::RowSink;
use crate::types::{ScanConfig, ScanResult, ScanStats};

/// Malformed lines logged at warn level per archive before dropping to debug.
const MAX_LINE_WARNINGS: usize = 5;

/// How a single record matched.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordMatch {
    /// The entity matcher found at least one identifier.
    Exact(MatchSet),
    /// The fuzzy fallback accepted a catalog term.
    Fuzzy {
        /// The best catalog term.
        term: String,
        /// Its similarity score.
        score: f64,
    },
    /// Nothing matched.
    NoMatch {
        /// Whether the fuzzy fallback was tried.
        fuzzy_attempted: bool,
    },
}

impl RecordMatch {
    /// Returns the identifiers to write; empty for [`RecordMatch::NoMatch`].
    pub fn ids(&self) -> MatchSet {
        match self {
            Self::Exact(ids) => ids.clone(),
            Self::Fuzzy { .. } => MatchSet::fuzzy(),
            Self::NoMatch { .. } => MatchSet::new(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Counters for the run.
    pub stats: ScanStats,
    /// Distinct names in the ledger at the end of the run.
    pub ledger_size: usize,
}

impl ScanOutcome {
    /// Returns true if at least one row was written during the run.
    pub fn has_candidates(&self) -> bool {
        self.stats.rows_written > 0
    }
}

/// Sequential archive scanner.
pub struct Scanner<'a> {
    matcher: &'a EntityMatcher,
    fuzzy: FuzzyMatcher<'a>,
    config: ScanConfig,
    ledger: DedupLedger,
    buffer: Vec<CandidateRow>,
    since_flush: usize,
    stats: ScanStats,
}

impl std::fmt::Debug for Scanner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("matcher", &self.matcher)
            .field("config", &self.config)
            .field("ledger", &self.ledger.len())
            .field("buffer", &self.buffer.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<'a> Scanner<'a> {
    /// Creates a scanner with an empty ledger.
    ///
    /// # Errors
    /// Returns a configuration error for out-of-range tunables.
    pub fn new(
        catalog: &'a TermCatalog,
        matcher: &'a EntityMatcher,
        config: ScanConfig,
    ) -> ScanResult<Self> {
        config.validate()?;
        let fuzzy = FuzzyMatcher::new(catalog, config.fuzzy_threshold, config.min_fuzzy_name_len);
        Ok(Self {
            matcher,
            fuzzy,
            buffer: Vec::with_capacity(config.flush_chunk_size.min(65_536)),
            config,
            ledger: DedupLedger::new(),
            since_flush: 0,
            stats: ScanStats::default(),
        })
    }

    /// Replaces the ledger, e.g. with one seeded from earlier output.
    pub fn with_ledger(mut self, ledger: DedupLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Counters so far.
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Rows waiting for the next flush.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Matches one record: exact first, fuzzy on a miss.
    pub fn match_record(&self, record: &SubredditRecord) -> RecordMatch {
        let (Some(name), Some(text)) = (record.name.as_deref(), record.composite_text()) else {
            return RecordMatch::NoMatch {
                fuzzy_attempted: false,
            };
        };

        let exact = self.matcher.match_normalized(&normalize(&text));
        if !exact.is_empty() {
            return RecordMatch::Exact(exact);
        }

        let candidate = strip_name_prefix(name.trim(), &self.config.name_prefix);
        if !self.fuzzy.qualifies(candidate) {
            return RecordMatch::NoMatch {
                fuzzy_attempted: false,
            };
        }

        match self.fuzzy.fuzzy_match(candidate) {
            Some(hit) => RecordMatch::Fuzzy {
                term: hit.term.term.clone(),
                score: hit.score,
            },
            None => RecordMatch::NoMatch {
                fuzzy_attempted: true,
            },
        }
    }

    /// Runs every archive, then performs the final flush.
    ///
    /// # Errors
    /// Only sink write failures are returned; archive and record problems are
    /// counted in the stats.
    pub fn run<S: RowSink>(mut self, archives: &[PathBuf], sink: &mut S) -> ScanResult<ScanOutcome> {
        let start = Instant::now();

        for path in archives {
            self.scan_archive(path, sink)?;
        }
        self.flush(sink)?;

        self.stats.elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Scan complete: {} archives ({} failed), {} records, {} exact + {} fuzzy matches, {} duplicates, {} rows written in {} ms",
            self.stats.archives_seen,
            self.stats.archives_failed,
            self.stats.records_processed,
            self.stats.exact_matches,
            self.stats.fuzzy_matches,
            self.stats.duplicates,
            self.stats.rows_written,
            self.stats.elapsed_ms
        );
        tracing::debug!(
            "Dedup ledger holds {} names (~{})",
            self.ledger.len(),
            format_bytes(self.ledger.estimated_memory_bytes() as u64)
        );
        if self.stats.skipped_records() > 0 {
            tracing::warn!(
                "Skipped {} malformed lines and {} records without a name",
                self.stats.malformed_lines,
                self.stats.missing_name
            );
        }

        Ok(ScanOutcome {
            ledger_size: self.ledger.len(),
            stats: self.stats,
        })
    }

    /// Streams one archive. Open and decode failures are logged and counted.
    pub fn scan_archive<S: RowSink>(&mut self, path: &Path, sink: &mut S) -> ScanResult<()> {
        self.stats.archives_seen += 1;

        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        tracing::info!("Scanning {} ({})", path.display(), format_bytes(size));

        let mut lines = match ArchiveLines::open(path, self.config.window_log_max()) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!("Skipping archive: {}", e);
                self.stats.archives_failed += 1;
                return Ok(());
            }
        };

        let rows_before = self.stats.rows_written + self.buffer.len() as u64;
        let mut warnings = 0usize;
        for line in lines.by_ref() {
            match line {
                Ok(line) => self.process_line(&line, &mut warnings, sink)?,
                Err(e) => {
                    tracing::warn!("{}; moving on to the next archive", e);
                    self.stats.archives_failed += 1;
                    break;
                }
            }
        }

        tracing::info!(
            "Finished {}: {} lines, {} new candidates",
            path.display(),
            lines.lines_read(),
            self.stats.rows_written + self.buffer.len() as u64 - rows_before
        );
        Ok(())
    }

    fn process_line<S: RowSink>(
        &mut self,
        line: &str,
        warnings: &mut usize,
        sink: &mut S,
    ) -> ScanResult<()> {
        self.stats.lines_read += 1;

        match parse_record(line) {
            Ok(record) => self.process_record(&record),
            Err(e) => {
                self.stats.malformed_lines += 1;
                if *warnings < MAX_LINE_WARNINGS {
                    tracing::warn!("Skipping malformed line: {}", e);
                } else {
                    tracing::debug!("Skipping malformed line: {}", e);
                }
                *warnings += 1;
            }
        }

        self.since_flush += 1;
        if self.since_flush >= self.config.flush_chunk_size {
            self.flush(sink)?;
        }
        Ok(())
    }

    /// Matches, deduplicates and buffers one decoded record.
    pub fn process_record(&mut self, record: &SubredditRecord) {
        let Some(name) = record.name.as_deref().filter(|n| !n.trim().is_empty()) else {
            self.stats.missing_name += 1;
            return;
        };
        self.stats.records_processed += 1;

        let result = self.match_record(record);
        match &result {
            RecordMatch::Exact(_) => self.stats.exact_matches += 1,
            RecordMatch::Fuzzy { term, score } => {
                self.stats.fuzzy_attempts += 1;
                self.stats.fuzzy_matches += 1;
                tracing::debug!("Fuzzy match {} ~ '{}' ({:.1})", name, term, score);
            }
            RecordMatch::NoMatch { fuzzy_attempted } => {
                if *fuzzy_attempted {
                    self.stats.fuzzy_attempts += 1;
                }
                return;
            }
        }

        if !self.ledger.check_and_record(name) {
            self.stats.duplicates += 1;
            return;
        }
        self.buffer.push(CandidateRow::new(name, result.ids()));
    }

    /// Writes buffered rows to the sink and clears the buffer.
    pub fn flush<S: RowSink>(&mut self, sink: &mut S) -> ScanResult<()> {
        self.since_flush = 0;
        if self.buffer.is_empty() {
            return Ok(());
        }

        sink.write_rows(&self.buffer)?;
        self.stats.rows_written += self.buffer.len() as u64;
        self.stats.flushes += 1;
        tracing::info!(
            "Flushed {} rows ({} total)",
            self.buffer.len(),
            self.stats.rows_written
        );
        self.buffer.clear();
        Ok(())
    }
}
