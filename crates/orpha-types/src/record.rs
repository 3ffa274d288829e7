//! Subreddit metadata record type.
//!
//! This module provides the `SubredditRecord` struct representing one decoded
//! line of a subreddit metadata dump.

/// One subreddit metadata object from a dump archive.
///
/// Only the fields used for matching are kept; everything else in the source
/// object is ignored on decode. `name` is optional at the type level so that a
/// record without it can be reported as a missing-field skip rather than a
/// malformed line.
///
/// # Examples
///
/// ```
/// use orpha_types::SubredditRecord;
///
/// let record = SubredditRecord {
///     name: Some("r/marfansyndrome".to_string()),
///     title: Some("Marfan Syndrome support".to_string()),
///     public_description: Some(String::new()),
///     description: None,
/// };
///
/// assert_eq!(
///     record.composite_text().as_deref(),
///     Some("r/marfansyndrome Marfan Syndrome support ")
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubredditRecord {
    /// Unique subreddit name, possibly prefixed (`r/...`).
    pub name: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Short public description shown in listings.
    pub public_description: Option<String>,
    /// Long-form sidebar description.
    pub description: Option<String>,
}

impl SubredditRecord {
    /// Returns the free-text description used for matching.
    ///
    /// The public description wins; the long description is used only when
    /// the public one is absent or blank.
    pub fn description_text(&self) -> &str {
        match self.public_description.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => self.description.as_deref().unwrap_or(""),
        }
    }

    /// Builds `name + " " + title + " " + description` without normalization.
    ///
    /// Returns `None` if the record has no name.
    pub fn composite_text(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        let title = self.title.as_deref().unwrap_or("");
        Some(format!("{name} {title} {}", self.description_text()))
    }
}
