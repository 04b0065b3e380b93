// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Packed term dictionary: blob + offset array, binary searched.
//!
//! A sorted packed blob beats a hash map here because prefix ranges fall out
//! of the same `lower_bound` machinery as exact lookup: all terms sharing a
//! prefix are contiguous, so a range query is two binary searches. The
//! byte-wise upper bound for a prefix is `prefix ++ 0xFF` — 0xFF never occurs
//! in UTF-8, so nothing sorts between the last `prefix`-prefixed term and
//! that sentinel.
//!
//! On-disk layout (`dict.bin`, little-endian):
//!
//! ```text
//! u32 num_terms
//! u32 term_bytes_len
//! u32[num_terms + 1] offsets      (offsets[i]..offsets[i+1] delimits term i)
//! u8[term_bytes_len] blob         (UTF-8 term bytes, concatenated)
//! ```

use std::io;

/// An immutable, sorted term dictionary.
///
/// Invariants, enforced by [`TermDict::from_bytes`]:
/// - offsets are strictly increasing (no term is empty), `offsets[0] == 0`,
///   `offsets[n] == blob.len()`
/// - terms are strictly increasing under byte-wise comparison
/// - the blob is valid UTF-8 at every term boundary
#[derive(Debug, Clone)]
pub struct TermDict {
    offsets: Vec<u32>,
    blob: Vec<u8>,
}

impl TermDict {
    /// Build from sorted, deduplicated terms. The builder's finalize step
    /// guarantees ordering; this constructor re-checks it in debug builds.
    pub fn from_sorted_terms(terms: &[String]) -> Self {
        debug_assert!(terms.windows(2).all(|w| w[0].as_bytes() < w[1].as_bytes()));

        let mut offsets = Vec::with_capacity(terms.len() + 1);
        let mut blob = Vec::new();
        offsets.push(0u32);
        for term in terms {
            blob.extend_from_slice(term.as_bytes());
            offsets.push(blob.len() as u32);
        }
        Self { offsets, blob }
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total term bytes (the `term_bytes_len` header field).
    pub fn blob_len(&self) -> usize {
        self.blob.len()
    }

    /// Term bytes by id. Panics on out-of-range ids; callers index with ids
    /// produced by this dictionary's own searches.
    #[inline]
    pub fn term(&self, id: u32) -> &[u8] {
        let start = self.offsets[id as usize] as usize;
        let end = self.offsets[id as usize + 1] as usize;
        &self.blob[start..end]
    }

    /// Term as str. Valid by the UTF-8 load invariant.
    pub fn term_str(&self, id: u32) -> &str {
        std::str::from_utf8(self.term(id)).unwrap_or("")
    }

    /// First term id whose bytes are >= `needle`, within `[lo, hi)`.
    pub fn lower_bound_in(&self, needle: &[u8], lo: u32, hi: u32) -> u32 {
        let mut lo = lo;
        let mut hi = hi;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.term(mid) < needle {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// First term id whose bytes are >= `needle`.
    pub fn lower_bound(&self, needle: &[u8]) -> u32 {
        self.lower_bound_in(needle, 0, self.len() as u32)
    }

    /// Exact lookup.
    pub fn lookup(&self, needle: &[u8]) -> Option<u32> {
        let id = self.lower_bound(needle);
        if (id as usize) < self.len() && self.term(id) == needle {
            Some(id)
        } else {
            None
        }
    }

    /// `[lo, hi)` of term ids having `prefix` as a byte prefix, searched
    /// within `[bound_lo, bound_hi)` (pass the prefix-map range when one is
    /// available to shrink the search window).
    pub fn prefix_range_in(&self, prefix: &[u8], bound_lo: u32, bound_hi: u32) -> (u32, u32) {
        let lo = self.lower_bound_in(prefix, bound_lo, bound_hi);
        let mut upper = prefix.to_vec();
        upper.push(0xFF);
        let hi = self.lower_bound_in(&upper, lo, bound_hi);
        (lo, hi)
    }

    pub fn prefix_range(&self, prefix: &[u8]) -> (u32, u32) {
        self.prefix_range_in(prefix, 0, self.len() as u32)
    }

    /// Serialize to the `dict.bin` layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(8 + self.offsets.len() * 4 + self.blob.len());
        buf.extend_from_slice(&(self.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(self.blob.len() as u32).to_le_bytes());
        for off in &self.offsets {
            buf.extend_from_slice(&off.to_le_bytes());
        }
        buf.extend_from_slice(&self.blob);
        buf
    }

    /// Parse and validate a `dict.bin` image.
    pub fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() < 8 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "dictionary too small for header",
            ));
        }
        let num_terms = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let term_bytes_len =
            u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

        let offsets_bytes = (num_terms + 1)
            .checked_mul(4)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "term count overflow"))?;
        let expected = 8 + offsets_bytes + term_bytes_len;
        if bytes.len() != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "dictionary size mismatch: header implies {} bytes, file has {}",
                    expected,
                    bytes.len()
                ),
            ));
        }

        let mut offsets = Vec::with_capacity(num_terms + 1);
        for i in 0..=num_terms {
            let at = 8 + i * 4;
            offsets.push(u32::from_le_bytes([
                bytes[at],
                bytes[at + 1],
                bytes[at + 2],
                bytes[at + 3],
            ]));
        }
        let blob = bytes[8 + offsets_bytes..].to_vec();

        if offsets[0] != 0 || offsets[num_terms] as usize != term_bytes_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "dictionary offsets do not span the term blob",
            ));
        }
        for i in 0..num_terms {
            // Strict: no term is empty.
            if offsets[i] >= offsets[i + 1] {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("dictionary offset {} not strictly increasing", i),
                ));
            }
        }

        let dict = Self { offsets, blob };

        for id in 0..num_terms as u32 {
            if std::str::from_utf8(dict.term(id)).is_err() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("term {} is not valid UTF-8", id),
                ));
            }
            if id > 0 && dict.term(id - 1) >= dict.term(id) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("terms {} and {} out of order", id - 1, id),
                ));
            }
        }

        Ok(dict)
    }
}
