// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Text normalization and tokenization.
//!
//! Everything downstream — dictionary terms, postings positions, phrase
//! adjacency, query parsing — assumes this module is deterministic: identical
//! input bytes produce identical output bytes on every platform. That is why
//! normalization is NFKD + an explicit combining-mark range + `char`-level
//! lowercasing, with no locale anywhere.
//!
//! Tokens are maximal runs of `[a-z0-9]` in the normalized text. A small
//! fixed English stopword set is dropped, and positions are 0-based indices
//! in the surviving token stream (stopwords do not advance the counter).

use unicode_normalization::UnicodeNormalization;

/// Fixed stopword set, sorted for binary search.
///
/// Deliberately tiny: bibliographic titles lose almost nothing to these, and
/// a larger list would silently change phrase adjacency.
const STOPWORDS: [&str; 16] = [
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "of", "on", "or", "the", "to", "via",
    "with",
];

#[inline]
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.binary_search(&token).is_ok()
}

/// Combining marks stripped after NFKD decomposition (U+0300–U+036F).
#[inline]
fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

/// Normalize a string for indexing and matching.
///
/// NFKD decomposition, drop combining diacritical marks, lowercase. ASCII
/// letters fold exactly; other letters fold best-effort via Unicode simple
/// lowercasing. "Café" → "cafe", "ZERO-Knowledge" → "zero-knowledge".
pub fn normalize(value: &str) -> String {
    value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Tokenize arbitrary text: normalize, then split on runs outside `[a-z0-9]`,
/// dropping empties and stopwords. The index of each token in the returned
/// vector is its position.
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_normalized(&normalize(text))
}

/// Tokenize text that is already normalized (query parsing works on spans of
/// one normalized string and must not re-normalize them).
pub(crate) fn tokenize_normalized(norm: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in norm.chars() {
        if ch.is_ascii_alphanumeric() {
            current.push(ch);
        } else if !current.is_empty() {
            let token = std::mem::take(&mut current);
            if !is_stopword(&token) {
                tokens.push(token);
            }
        }
    }
    if !current.is_empty() && !is_stopword(&current) {
        tokens.push(current);
    }

    tokens
}

/// A token with the byte range of its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    /// Normalized token text.
    pub text: String,
    /// Byte offset of the first contributing char in the *original* string.
    pub start: usize,
    /// Byte offset one past the last contributing char in the original string.
    pub end: usize,
}

/// Tokenize while tracking byte spans in the original (un-normalized) string.
///
/// Used for highlight spans: each source char is normalized independently and
/// every `[a-z0-9]` char it decomposes to extends the current token's span to
/// cover that source char. Stopwords are dropped, same as [`tokenize`], so
/// span indices line up with postings positions.
pub fn tokenize_spans(text: &str) -> Vec<SpannedToken> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    let mut end = 0usize;

    let flush = |current: &mut String, start: usize, end: usize, out: &mut Vec<SpannedToken>| {
        if !current.is_empty() {
            let token = std::mem::take(current);
            if !is_stopword(&token) {
                out.push(SpannedToken {
                    text: token,
                    start,
                    end,
                });
            }
        }
    };

    let mut byte = 0usize;
    for ch in text.chars() {
        let ch_end = byte + ch.len_utf8();
        for decomposed in std::iter::once(ch).nfkd() {
            if is_combining_mark(decomposed) {
                continue;
            }
            for lowered in decomposed.to_lowercase() {
                if lowered.is_ascii_alphanumeric() {
                    if current.is_empty() {
                        start = byte;
                    }
                    current.push(lowered);
                    end = ch_end;
                } else {
                    flush(&mut current, start, end, &mut tokens);
                }
            }
        }
        byte = ch_end;
    }
    flush(&mut current, start, end, &mut tokens);

    tokens
}
