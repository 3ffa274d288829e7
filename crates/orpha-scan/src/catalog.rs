//! ORDO term catalog.
//!
//! Loads `ordo_terms.tsv` (`orpha_id`, `term`, `is_preferred`) into memory.
//! The catalog is built once at startup and only read afterwards.

use std::collections::HashSet;
use std::path::Path;

use csv::StringRecord;
use orpha_types::TermEntry;

use crate::normalize::normalize;
use crate::table::{parse, TableParser, TableRecord};
use crate::types::{ScanError, ScanResult};

/// Expected columns in the term table.
const TERM_COLUMNS: &[&str] = &["orpha_id", "term", "is_preferred"];

impl TableRecord for TermEntry {
    const EXPECTED_COLUMNS: &'static [&'static str] = TERM_COLUMNS;

    fn from_record(record: &StringRecord) -> ScanResult<Self> {
        Ok(TermEntry {
            orpha_id: parse::required(record.get(0), "orpha_id")?.to_string(),
            term: normalize(record.get(1).unwrap_or("").trim()),
            is_preferred: parse::boolean(record.get(2).unwrap_or(""))?,
        })
    }

    fn is_usable(&self) -> bool {
        !self.term.trim().is_empty()
    }
}

/// In-memory list of normalized disease-name terms.
#[derive(Debug, Clone, Default)]
pub struct TermCatalog {
    entries: Vec<TermEntry>,
}

impl TermCatalog {
    /// Loads the catalog from a term table.
    ///
    /// # Errors
    /// Fails if the file is missing, has the wrong header, contains a bad row,
    /// or yields no usable terms.
    pub fn load<P: AsRef<Path>>(path: P) -> ScanResult<Self> {
        let path = path.as_ref();
        let parser = TableParser::<_, TermEntry>::from_path(path)?;
        let entries = parser.parse_all()?;

        if entries.is_empty() {
            return Err(ScanError::EmptyCatalog {
                path: path.display().to_string(),
            });
        }

        tracing::info!(
            "Loaded {} terms for {} identifiers from {}",
            entries.len(),
            entries.iter().map(|e| e.orpha_id.as_str()).collect::<HashSet<_>>().len(),
            path.display()
        );

        Ok(Self { entries })
    }

    /// Builds a catalog from entries, normalizing each term.
    pub fn from_entries(entries: impl IntoIterator<Item = TermEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut e| {
                e.term = normalize(e.term.trim());
                e
            })
            .filter(|e| !e.term.is_empty())
            .collect();
        Self { entries }
    }

    /// Returns all entries in file order.
    pub fn entries(&self) -> &[TermEntry] {
        &self.entries
    }

    /// Iterates over entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = &TermEntry> {
        self.entries.iter()
    }

    /// Number of (identifier, term) rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog holds no terms.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
