//! Orphanet identifier type.
//!
//! ORDO identifiers appear in two spellings: the bare Orphanet number found in
//! the ontology IRIs (`558`) and the prefixed code used in match output
//! (`ORPHA558`). This module provides the canonical prefixed form.

/// An Orphanet disease identifier in prefixed form (e.g. `ORPHA558`).
///
/// Identifiers are opaque strings; the crate never interprets the number.
///
/// # Examples
///
/// ```
/// use orpha_types::{orpha_code, OrphaId};
///
/// let id: OrphaId = orpha_code("558");
/// assert_eq!(id, "ORPHA558");
/// assert_eq!(orpha_code("ORPHA558"), "ORPHA558");
/// ```
pub type OrphaId = String;

/// Prefix carried by every Orphanet code emitted by the matcher.
pub const ORPHA_PREFIX: &str = "ORPHA";

/// Returns the prefixed Orphanet code for a raw catalog identifier.
///
/// Identifiers that already carry the prefix are returned unchanged.
pub fn orpha_code(raw: &str) -> OrphaId {
    let raw = raw.trim();
    if raw.starts_with(ORPHA_PREFIX) {
        raw.to_string()
    } else {
        format!("{ORPHA_PREFIX}{raw}")
    }
}
