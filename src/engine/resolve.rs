// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Term resolution: bag tokens → dictionary term ids.
//!
//! Exact lookup is one binary search. Prefix expansion is two — the range
//! `[lower_bound(token), lower_bound(token ++ 0xFF))` — bounded first by the
//! loader's prefix map where a key is available. The expansion is capped at
//! 128 term ids so a one-letter prefix over a 100k-term dictionary cannot
//! turn one query into thousands of posting decodes; the cap keeps the first
//! 128 in dictionary order, which is deterministic because the dictionary is
//! sorted.
//!
//! Phrase tokens resolve by exact lookup only.

use crate::engine::loader::{LoadedTier, PREFIX_KEY_LEN};

/// Hard cap on prefix expansion per token per tier.
pub const PREFIX_EXPANSION_CAP: usize = 128;

/// Term ids one bag token resolves to in one tier.
#[derive(Debug, Clone, Default)]
pub struct ResolvedToken {
    /// Matching term ids in dictionary order. With expansion this includes
    /// the exact term (when present) without duplication.
    pub term_ids: Vec<u32>,
    /// The exact-match term id, when the token itself is a dictionary term.
    pub exact: Option<u32>,
}

/// Resolve one bag token. `expand` is true only for the terminal token of a
/// prefix query.
pub fn resolve_token(tier: &LoadedTier, token: &str, expand: bool) -> ResolvedToken {
    let needle = token.as_bytes();
    let exact = tier.dict.lookup(needle);

    if !expand {
        return ResolvedToken {
            term_ids: exact.into_iter().collect(),
            exact,
        };
    }

    // Bound the binary search with the prefix map when the token is at least
    // as long as a map key; shorter prefixes scan the whole id space, which
    // is still two O(log n) searches.
    let (bound_lo, bound_hi) = if needle.len() >= PREFIX_KEY_LEN {
        match tier.prefix_bounds(&needle[..PREFIX_KEY_LEN]) {
            Some(bounds) => bounds,
            None => return ResolvedToken::default(),
        }
    } else {
        (0, tier.dict.len() as u32)
    };

    let (lo, hi) = tier.dict.prefix_range_in(needle, bound_lo, bound_hi);
    let capped_hi = hi.min(lo + PREFIX_EXPANSION_CAP as u32);

    ResolvedToken {
        term_ids: (lo..capped_hi).collect(),
        exact,
    }
}

/// Resolve one phrase token: exact only. A miss kills the whole phrase, which
/// the caller handles by returning zero matches.
pub fn resolve_phrase_token(tier: &LoadedTier, token: &str) -> Option<u32> {
    tier.dict.lookup(token.as_bytes())
}
