// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-(tier, field) posting accumulation.
//!
//! Accumulators are keyed by provisional term ids and hold plain vectors of
//! `(doc, …)` entries. Documents arrive in increasing id order, so the
//! vectors are born sorted; the defensive sort before encoding is a no-op in
//! practice and an invariant repair if a caller ever misbehaves.
//!
//! `emit` walks the *sorted* term-id space (after the dictionary permutation)
//! and appends each list to the shared postings buffer, recording `(start,
//! len)` into the field's pointer arrays. Terms absent from a field get
//! `(0, 0)`.

use std::collections::HashMap;

use crate::binary::{encode_frequency, encode_positional, FieldPointers};

/// Positional accumulation: `(doc, positions)` per term.
#[derive(Debug, Default)]
pub struct PositionalAccumulator {
    by_term: HashMap<u32, Vec<(u32, Vec<u32>)>>,
}

impl PositionalAccumulator {
    /// Record one document's positions for a term. Positions must be strictly
    /// increasing (they are token indices from a single pass).
    pub fn push(&mut self, term_id: u32, doc: u32, positions: Vec<u32>) {
        debug_assert!(!positions.is_empty());
        self.by_term.entry(term_id).or_default().push((doc, positions));
    }

    /// Encode lists in sorted term order into `postings`, producing the
    /// field's pointer arrays. `remap` maps provisional → sorted term ids.
    pub fn emit(mut self, remap: &[u32], postings: &mut Vec<u8>) -> FieldPointers {
        let n = remap.len();
        let mut by_sorted: Vec<Option<Vec<(u32, Vec<u32>)>>> = (0..n).map(|_| None).collect();
        for (provisional, entries) in self.by_term.drain() {
            by_sorted[remap[provisional as usize] as usize] = Some(entries);
        }

        let mut start = vec![0u32; n];
        let mut len = vec![0u32; n];
        for (term_id, slot) in by_sorted.into_iter().enumerate() {
            if let Some(mut entries) = slot {
                entries.sort_unstable_by_key(|(doc, _)| *doc);
                let at = postings.len();
                encode_positional(&entries, postings);
                start[term_id] = at as u32;
                len[term_id] = (postings.len() - at) as u32;
            }
        }
        FieldPointers { start, len }
    }
}

/// Frequency-only accumulation: `(doc, tf)` per term.
#[derive(Debug, Default)]
pub struct FrequencyAccumulator {
    by_term: HashMap<u32, Vec<(u32, u32)>>,
}

impl FrequencyAccumulator {
    pub fn push(&mut self, term_id: u32, doc: u32, tf: u32) {
        debug_assert!(tf > 0);
        self.by_term.entry(term_id).or_default().push((doc, tf));
    }

    pub fn emit(mut self, remap: &[u32], postings: &mut Vec<u8>) -> FieldPointers {
        let n = remap.len();
        let mut by_sorted: Vec<Option<Vec<(u32, u32)>>> = (0..n).map(|_| None).collect();
        for (provisional, entries) in self.by_term.drain() {
            by_sorted[remap[provisional as usize] as usize] = Some(entries);
        }

        let mut start = vec![0u32; n];
        let mut len = vec![0u32; n];
        for (term_id, slot) in by_sorted.into_iter().enumerate() {
            if let Some(mut entries) = slot {
                entries.sort_unstable_by_key(|(doc, _)| *doc);
                let at = postings.len();
                encode_frequency(&entries, postings);
                start[term_id] = at as u32;
                len[term_id] = (postings.len() - at) as u32;
            }
        }
        FieldPointers { start, len }
    }
}
