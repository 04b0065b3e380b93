// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Term accumulation and renumbering.
//!
//! During the build pass terms are interned in first-seen order — cheap, and
//! the order is deterministic because records are consumed in id order. At
//! finalization the terms are sorted byte-wise and every provisional id is
//! renumbered through a permutation so that term-id order equals sorted
//! order. The posting accumulators apply the same permutation before
//! encoding.

use std::collections::HashMap;

/// Interns terms during the build pass; finalizes into a sorted table.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    ids: HashMap<String, u32>,
    terms: Vec<String>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provisional id for `term`, allocating one in insertion order if new.
    pub fn intern(&mut self, term: &str) -> u32 {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.terms.len() as u32;
        self.ids.insert(term.to_string(), id);
        self.terms.push(term.to_string());
        id
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Sort terms byte-wise and produce `(sorted_terms, remap)` where
    /// `remap[provisional_id] == sorted_id`.
    pub fn finalize(self) -> (Vec<String>, Vec<u32>) {
        let n = self.terms.len();
        let mut order: Vec<u32> = (0..n as u32).collect();
        order.sort_unstable_by(|&a, &b| {
            self.terms[a as usize]
                .as_bytes()
                .cmp(self.terms[b as usize].as_bytes())
        });

        let mut remap = vec![0u32; n];
        let mut sorted = Vec::with_capacity(n);
        for (sorted_id, &provisional) in order.iter().enumerate() {
            remap[provisional as usize] = sorted_id as u32;
            sorted.push(self.terms[provisional as usize].clone());
        }
        (sorted, remap)
    }
}
