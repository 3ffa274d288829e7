//! # orpha-scan
//!
//! Streaming scanner that finds subreddits discussing rare diseases.
//!
//! Subreddit metadata dumps (zstd-compressed JSON Lines) are matched against an
//! Orphanet (ORDO) term catalog:
//!
//! - [`TermCatalog`] loads `orpha_id \t term \t is_preferred` rows
//! - [`EntityMatcher`] finds catalog phrases at token boundaries
//! - [`FuzzyMatcher`] scores the bare subreddit name when nothing matched exactly
//! - [`Scanner`] streams archives, deduplicates names and flushes rows to a [`RowSink`]
//!
//! ## Example
//!
//! ```no_run
//! use orpha_scan::{
//!     discover_archives, EntityMatcher, MatcherOptions, OutputSink, ScanConfig, Scanner,
//!     TermCatalog,
//! };
//!
//! # fn main() -> Result<(), orpha_scan::ScanError> {
//! let config = ScanConfig::default();
//! let catalog = TermCatalog::load("data/ordo_terms.tsv")?;
//! let matcher = EntityMatcher::load("models/model_rare_disease", &MatcherOptions::default())?;
//! let archives = discover_archives("data/raw_subreddits", &config)?;
//!
//! let mut sink = OutputSink::create("data/candidate_subreddits.csv")?;
//! let outcome = Scanner::new(&catalog, &matcher, config)?.run(&archives, &mut sink)?;
//! println!("{} candidates", outcome.stats.rows_written);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod catalog;
pub mod fuzzy;
pub mod ledger;
pub mod matcher;
pub mod normalize;
pub mod scanner;
pub mod sink;
pub mod table;
pub mod types;
pub mod verify;

pub use archive::{discover_archives, format_bytes, parse_record, ArchiveLines};
pub use catalog::TermCatalog;
pub use fuzzy::{partial_ratio, FuzzyHit, FuzzyMatcher};
pub use ledger::{fingerprint, DedupLedger, Fingerprint};
pub use matcher::{EntityMatcher, ENTITY_RULER, RARE_DISEASE_LABEL};
pub use normalize::{normalize, strip_name_prefix, tokenize};
pub use scanner::{RecordMatch, ScanOutcome, Scanner};
pub use sink::{read_rows, MemorySink, OutputSink, RowSink};
pub use table::{TableParser, TableRecord};
pub use types::{
    MatcherOptions, ScanConfig, ScanError, ScanPaths, ScanResult, ScanStats, MAX_WINDOW_LOG,
};
pub use verify::VerifyCommand;

// Re-export orpha-types for convenience
pub use orpha_types;
