//! Output row type.

use crate::MatchSet;

/// One line of the candidate output file.
///
/// Column order and names (`subreddit`, `orpha_ids`) are part of the output
/// file contract.
///
/// # Examples
///
/// ```
/// use orpha_types::{CandidateRow, MatchSet};
///
/// let row = CandidateRow::new("r/marfansyndrome", MatchSet::parse("ORPHA1"));
/// assert_eq!(row.to_csv_fields(), ["r/marfansyndrome".to_string(), "ORPHA1".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateRow {
    /// Raw subreddit name as found in the source record.
    pub subreddit: String,
    /// Matched identifiers, written semicolon-joined and sorted.
    pub orpha_ids: MatchSet,
}

impl CandidateRow {
    /// Header written at the top of every output file.
    pub const HEADER: [&'static str; 2] = ["subreddit", "orpha_ids"];

    /// Creates a row.
    pub fn new(subreddit: impl Into<String>, orpha_ids: MatchSet) -> Self {
        Self {
            subreddit: subreddit.into(),
            orpha_ids,
        }
    }

    /// Returns the two output columns in header order.
    pub fn to_csv_fields(&self) -> [String; 2] {
        [self.subreddit.clone(), self.orpha_ids.joined()]
    }

    /// Returns true if the row came from the fuzzy fallback.
    pub fn is_fuzzy(&self) -> bool {
        self.orpha_ids.is_fuzzy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_row() {
        let row = CandidateRow::new("r/rarething", MatchSet::fuzzy());
        assert!(row.is_fuzzy());
        assert_eq!(row.to_csv_fields()[1], "FUZZY");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_joined_ids() {
        let row = CandidateRow::new("r/cf", MatchSet::parse("ORPHA586;ORPHA1"));
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"subreddit":"r/cf","orpha_ids":"ORPHA1;ORPHA586"}"#);
        let parsed: CandidateRow = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, row);
    }
}
