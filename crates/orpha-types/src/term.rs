//! Vocabulary term type.
//!
//! This module provides the `TermEntry` struct representing one row of the
//! precomputed ORDO term table.

use crate::OrphaId;

/// One (identifier, text-variant) pair from the term catalog.
///
/// Several entries may share an identifier (a preferred label plus its
/// synonyms) and several identifiers may share a text.
///
/// # Examples
///
/// ```
/// use orpha_types::TermEntry;
///
/// let term = TermEntry {
///     orpha_id: "ORPHA558".to_string(),
///     term: "marfan syndrome".to_string(),
///     is_preferred: true,
/// };
///
/// assert!(term.is_preferred);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TermEntry {
    /// Ontology identifier, as written in the catalog.
    pub orpha_id: OrphaId,
    /// Normalized term text.
    pub term: String,
    /// True for the preferred label, false for synonyms.
    pub is_preferred: bool,
}
