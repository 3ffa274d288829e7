//! Fuzzy fallback matching of subreddit names against catalog terms.
//!
//! Subreddit names are usually squashed phrases (`cysticfibrosis`,
//! `gastroparesispals`) that never line up with pattern tokens. The fallback
//! scores the stripped name against every catalog term with a
//! substring-tolerant similarity and accepts the best term at or above the
//! threshold.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use orpha_types::TermEntry;

use crate::catalog::TermCatalog;
use crate::normalize::normalize;

/// Best-scoring catalog term for a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyHit<'c> {
    /// The catalog entry that scored best.
    pub term: &'c TermEntry,
    /// Similarity on a 0-100 scale.
    pub score: f64,
}

/// Partial similarity of two strings on a 0-100 scale.
///
/// The shorter string is compared against every same-length character window
/// of the longer one using normalized Levenshtein similarity; the best window
/// is the score. Either string empty scores 0.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let (short, short_len, long) = if a_len <= b_len { (a, a_len, b) } else { (b, b_len, a) };

    if short_len == 0 {
        return 0.0;
    }

    let bounds: Vec<usize> = long
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(long.len()))
        .collect();
    let long_len = bounds.len() - 1;

    let mut best = 0.0_f64;
    for start in 0..=(long_len - short_len) {
        let window = &long[bounds[start]..bounds[start + short_len]];
        let score = strsim::normalized_levenshtein(short, window);
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }

    best * 100.0
}

/// Keeps the higher score; ties go to the earlier catalog index.
fn better(a: (usize, f64), b: (usize, f64)) -> (usize, f64) {
    if b.1 > a.1 || (b.1 == a.1 && b.0 < a.0) {
        b
    } else {
        a
    }
}

/// Approximate matcher over a borrowed term catalog.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher<'c> {
    catalog: &'c TermCatalog,
    threshold: f64,
    min_name_len: usize,
}

impl<'c> FuzzyMatcher<'c> {
    /// Creates a matcher accepting scores `>= threshold` for candidates of at
    /// least `min_name_len` characters.
    pub fn new(catalog: &'c TermCatalog, threshold: f64, min_name_len: usize) -> Self {
        Self {
            catalog,
            threshold,
            min_name_len,
        }
    }

    /// Returns true if the candidate is long enough to try.
    pub fn qualifies(&self, candidate: &str) -> bool {
        candidate.trim().chars().count() >= self.min_name_len
    }

    /// Returns the best-scoring term regardless of the threshold.
    pub fn best_match(&self, candidate: &str) -> Option<FuzzyHit<'c>> {
        let candidate = normalize(candidate.trim());
        let entries = self.catalog.entries();
        if candidate.is_empty() || entries.is_empty() {
            return None;
        }

        #[cfg(feature = "parallel")]
        let (index, score) = entries
            .par_iter()
            .enumerate()
            .map(|(i, e)| (i, partial_ratio(&candidate, &e.term)))
            .reduce(|| (usize::MAX, f64::NEG_INFINITY), better);

        #[cfg(not(feature = "parallel"))]
        let (index, score) = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, partial_ratio(&candidate, &e.term)))
            .fold((usize::MAX, f64::NEG_INFINITY), better);

        entries.get(index).map(|term| FuzzyHit { term, score })
    }

    /// Returns the best term if it clears the threshold.
    pub fn fuzzy_match(&self, candidate: &str) -> Option<FuzzyHit<'c>> {
        self.best_match(candidate)
            .filter(|hit| hit.score >= self.threshold)
    }
}
