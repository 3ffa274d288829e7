//! Match result types.
//!
//! A record's match result is a set of [`MatchId`] values. Real ontology
//! identifiers and the fuzzy sentinel live in the same set so that output
//! rows have a single identifier column.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::OrphaId;

/// One entry of a match result.
///
/// # Examples
///
/// ```
/// use orpha_types::MatchId;
///
/// let exact = MatchId::from("ORPHA558".to_string());
/// let fuzzy = MatchId::from(MatchId::FUZZY_SENTINEL.to_string());
///
/// assert_eq!(exact, MatchId::Orpha("ORPHA558".to_string()));
/// assert!(fuzzy.is_fuzzy());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum MatchId {
    /// A resolved ontology identifier from an exact pattern match.
    Orpha(OrphaId),
    /// Approximate name match; the ontology identifier is unresolved and the
    /// row should be treated as lower confidence.
    Fuzzy,
}

impl MatchId {
    /// Text written in place of an identifier for fuzzy matches.
    pub const FUZZY_SENTINEL: &'static str = "FUZZY";

    /// Returns the identifier as written in output files.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Orpha(id) => id,
            Self::Fuzzy => Self::FUZZY_SENTINEL,
        }
    }

    /// Returns true for the fuzzy sentinel.
    pub fn is_fuzzy(&self) -> bool {
        matches!(self, Self::Fuzzy)
    }
}

impl Ord for MatchId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for MatchId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<String> for MatchId {
    fn from(value: String) -> Self {
        if value == Self::FUZZY_SENTINEL {
            Self::Fuzzy
        } else {
            Self::Orpha(value)
        }
    }
}

impl From<MatchId> for String {
    fn from(value: MatchId) -> Self {
        match value {
            MatchId::Orpha(id) => id,
            MatchId::Fuzzy => MatchId::FUZZY_SENTINEL.to_string(),
        }
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of identifiers matched for one record.
///
/// Iteration and the joined form are in lexicographic order of the written
/// identifiers. An empty set means the record did not match.
///
/// # Examples
///
/// ```
/// use orpha_types::MatchSet;
///
/// let set: MatchSet = ["ORPHA90", "ORPHA558"].into_iter().map(String::from).collect();
/// assert_eq!(set.joined(), "ORPHA558;ORPHA90");
/// assert_eq!(MatchSet::parse("ORPHA558;ORPHA90"), set);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct MatchSet {
    ids: BTreeSet<MatchId>,
}

impl MatchSet {
    /// Separator used in the joined form.
    pub const SEPARATOR: char = ';';

    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the set holding only the fuzzy sentinel.
    pub fn fuzzy() -> Self {
        let mut set = Self::new();
        set.insert(MatchId::Fuzzy);
        set
    }

    /// Adds an identifier. Returns true if it was not already present.
    pub fn insert(&mut self, id: MatchId) -> bool {
        self.ids.insert(id)
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the set contains the given written identifier.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|m| m.as_str() == id)
    }

    /// Returns true if the set came from the fuzzy fallback.
    pub fn is_fuzzy(&self) -> bool {
        self.ids.contains(&MatchId::Fuzzy)
    }

    /// Iterates identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &MatchId> {
        self.ids.iter()
    }

    /// Returns the semicolon-joined, sorted form written to output files.
    pub fn joined(&self) -> String {
        let mut out = String::new();
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                out.push(Self::SEPARATOR);
            }
            out.push_str(id.as_str());
        }
        out
    }

    /// Parses the joined form. Empty segments are ignored.
    pub fn parse(joined: &str) -> Self {
        joined
            .split(Self::SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

impl FromIterator<MatchId> for MatchSet {
    fn from_iter<I: IntoIterator<Item = MatchId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<String> for MatchSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        iter.into_iter().map(MatchId::from).collect()
    }
}

impl From<String> for MatchSet {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<MatchSet> for String {
    fn from(value: MatchSet) -> Self {
        value.joined()
    }
}

impl fmt::Display for MatchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}
