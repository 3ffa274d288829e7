//! # orpha-types
//!
//! Type definitions for matching subreddit metadata against the Orphanet
//! rare-disease vocabulary (ORDO).
//!
//! This crate provides the plain data types shared by the scanner and the
//! command-line tool: vocabulary terms, decoded subreddit records, match
//! results and output rows.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!   Disable this feature for zero-dependency usage.
//!
//! ## Usage
//!
//! ```rust
//! use orpha_types::{orpha_code, CandidateRow, MatchId, MatchSet, TermEntry};
//!
//! let term = TermEntry {
//!     orpha_id: orpha_code("558"),
//!     term: "marfan syndrome".to_string(),
//!     is_preferred: true,
//! };
//!
//! let mut ids = MatchSet::new();
//! ids.insert(MatchId::Orpha(term.orpha_id.clone()));
//!
//! let row = CandidateRow::new("r/marfansyndrome", ids);
//! assert_eq!(row.orpha_ids.joined(), "ORPHA558");
//! ```

#![warn(missing_docs)]

mod matching;
mod orpha_id;
mod record;
mod row;
mod term;

// Re-export all public types at crate root
pub use matching::{MatchId, MatchSet};
pub use orpha_id::{orpha_code, OrphaId, ORPHA_PREFIX};
pub use record::SubredditRecord;
pub use row::CandidateRow;
pub use term::TermEntry;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        // Verify all types are accessible from crate root
        let _id: OrphaId = orpha_code("1");
        let _m = MatchId::Fuzzy;
        let _s = MatchSet::new();
        let _r = SubredditRecord::default();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let term = TermEntry {
            orpha_id: "ORPHA586".to_string(),
            term: "cystic fibrosis".to_string(),
            is_preferred: true,
        };

        let json = serde_json::to_string(&term).unwrap();
        let parsed: TermEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(term, parsed);
    }
}
