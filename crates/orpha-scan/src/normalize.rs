//! Text normalization and tokenization.
//!
//! Catalog terms, model patterns, match text and fuzzy candidates all go
//! through [`normalize`]. A pattern built under one normalization and
//! matched under another silently stops matching, so there is exactly one
//! implementation.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Returns true for the dash variants folded to ASCII `-`.
fn is_dash(c: char) -> bool {
    matches!(
        c,
        '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}'
    )
}

/// NFKD-decomposes, folds dashes to `-`, and lower-cases.
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .nfkd()
        .map(|c| if is_dash(c) { '-' } else { c })
        .collect();
    folded.to_lowercase()
}

/// Splits already-normalized text into match tokens.
///
/// Runs of alphanumerics (with any combining marks) form one token; every
/// other non-whitespace character is a token on its own.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        let in_word = c.is_alphanumeric() || (word_start.is_some() && is_combining_mark(c));
        if in_word {
            if word_start.is_none() {
                word_start = Some(i);
            }
            continue;
        }
        if let Some(start) = word_start.take() {
            tokens.push(&text[start..i]);
        }
        if !c.is_whitespace() {
            tokens.push(&text[i..i + c.len_utf8()]);
        }
    }
    if let Some(start) = word_start {
        tokens.push(&text[start..]);
    }

    tokens
}

/// Strips `prefix` from the start of `name`, ignoring ASCII case.
pub fn strip_name_prefix<'a>(name: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return name;
    }
    match name.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &name[prefix.len()..],
        _ => name,
    }
}
