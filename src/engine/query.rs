// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query parsing: one free-text string → phrases + bag tokens.
//!
//! Double-quoted spans become phrases (matched by positional adjacency);
//! everything else tokenizes into the conjunctive bag. A trailing unquoted
//! token is treated as a prefix, which is what makes search-as-you-type
//! behave: "bell" should find "bellare" before the user finishes typing.
//!
//! An unbalanced trailing quote is NOT an error: its content falls back to
//! bag tokens. This is a contract — a user mid-typing `"zero knowl` must see
//! bag-token results, not nothing.

use crate::text::{normalize, tokenize_normalized};

/// A parsed query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedQuery {
    /// Phrases in appearance order, each ≥1 normalized non-stopword token.
    pub phrases: Vec<Vec<String>>,
    /// Bag tokens in appearance order.
    pub tokens: Vec<String>,
    /// The last bag token may match any dictionary term it prefixes.
    pub last_is_prefix: bool,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty() && self.tokens.is_empty()
    }
}

/// Parse a raw query string.
pub fn parse_query(raw: &str) -> ParsedQuery {
    let norm = normalize(raw);

    // Split on quotes: parts alternate outside/inside. An even quote count
    // means every inside part is a closed phrase; with an odd count the last
    // part trails an unbalanced open quote and is demoted to bag text.
    let parts: Vec<&str> = norm.split('"').collect();
    let balanced = parts.len() % 2 == 1;

    let mut phrases = Vec::new();
    let mut bag_text = String::new();
    for (i, part) in parts.iter().enumerate() {
        let inside = i % 2 == 1;
        if inside && (balanced || i + 1 < parts.len()) {
            let tokens = tokenize_normalized(part);
            if !tokens.is_empty() {
                phrases.push(tokens);
            }
        } else {
            bag_text.push(' ');
            bag_text.push_str(part);
        }
    }

    let tokens = tokenize_normalized(&bag_text);
    let last_is_prefix = !tokens.is_empty() && !raw.trim_end().ends_with('"');

    ParsedQuery {
        phrases,
        tokens,
        last_is_prefix,
    }
}
