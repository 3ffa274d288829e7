//! Run-wide deduplication of emitted subreddit names.
//!
//! Fingerprints are 64-bit SipHash digests with fixed keys, stable within one
//! build. Resume re-hashes names read back from the output file, so digests
//! never need to match across builds. A collision drops a distinct record;
//! at subreddit-corpus sizes that risk is accepted for the memory saving
//! over storing names.
//!
//! The ledger only grows. Its size is the one unbounded resource of a scan:
//! one `u64` (plus set overhead) per distinct matched name.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use orpha_types::CandidateRow;

/// Fixed-size digest of a record's unique name.
pub type Fingerprint = u64;

/// Returns the fingerprint of a raw subreddit name.
pub fn fingerprint(name: &str) -> Fingerprint {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

/// Set of fingerprints already emitted during this run.
#[derive(Debug, Clone, Default)]
pub struct DedupLedger {
    seen: HashSet<Fingerprint>,
}

impl DedupLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `key` was already recorded.
    pub fn seen(&self, key: &str) -> bool {
        self.seen.contains(&fingerprint(key))
    }

    /// Records `key`.
    pub fn record(&mut self, key: &str) {
        self.seen.insert(fingerprint(key));
    }

    /// Records `key`, returning true if it had not been seen before.
    pub fn check_and_record(&mut self, key: &str) -> bool {
        self.seen.insert(fingerprint(key))
    }

    /// Records every subreddit from previously written rows.
    pub fn seed_from_rows<'a>(&mut self, rows: impl IntoIterator<Item = &'a CandidateRow>) -> usize {
        let before = self.seen.len();
        for row in rows {
            self.record(&row.subreddit);
        }
        self.seen.len() - before
    }

    /// Number of distinct fingerprints.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Rough heap footprint in bytes.
    pub fn estimated_memory_bytes(&self) -> usize {
        self.seen.capacity() * (std::mem::size_of::<Fingerprint>() + 1)
    }
}
