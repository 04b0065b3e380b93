// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Posting list codecs and per-field pointer tables.
//!
//! Postings are the heart of the index: for each (term, field), which
//! documents contain it? Doc ids cluster, so we store deltas — if documents
//! 100, 102, 105 contain "rogaway" we write [100, 2, 3] — and the same trick
//! applies to token positions within a document.
//!
//! Two list shapes:
//!
//! - **Positional** (`title`, `authors`): `(docΔ, n_pos, posΔ₁…posΔₙ)` per
//!   document. Needed for phrase adjacency.
//! - **Frequency-only** (everything else): `(docΔ, tf)` per document.
//!
//! Neither carries a count prefix: a list occupies exactly the byte range its
//! pointer-table entry names, and the decoder must consume exactly that range.
//! Doc ids are strictly increasing per list; positions strictly increasing per
//! document. Decoders reject anything else — a zero delta after the first
//! entry, a zero term frequency, a truncated tail — as corruption.
//!
//! # References
//!
//! - **Delta encoding for postings**: Zobel & Moffat (2006), "Inverted Files
//!   for Text Search Engines", ACM Computing Surveys.

use std::io;

use super::varint::{decode_varint, encode_varint};

/// Upper bound on entries per posting list. Far above anything a real corpus
/// produces; exists so corrupt headers cannot drive allocations.
pub const MAX_POSTING_SIZE: usize = 10_000_000;

// ============================================================================
// POSITIONAL LISTS
// ============================================================================

/// Decoded positional posting list: parallel arrays, `positions[i]` belongs
/// to `docs[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionalList {
    pub docs: Vec<u32>,
    pub positions: Vec<Vec<u32>>,
}

/// Encode a positional posting list. Entries must be sorted by doc id with
/// strictly increasing positions per doc; the builder guarantees this and the
/// debug assertion catches regressions.
pub fn encode_positional(entries: &[(u32, Vec<u32>)], buf: &mut Vec<u8>) {
    let mut prev_doc = 0u32;
    for (i, (doc, positions)) in entries.iter().enumerate() {
        debug_assert!(!positions.is_empty());
        debug_assert!(i == 0 || *doc > prev_doc);
        debug_assert!(positions.windows(2).all(|w| w[0] < w[1]));

        encode_varint((*doc - prev_doc) as u64, buf);
        prev_doc = *doc;

        encode_varint(positions.len() as u64, buf);
        let mut prev_pos = 0u32;
        for pos in positions {
            encode_varint((*pos - prev_pos) as u64, buf);
            prev_pos = *pos;
        }
    }
}

/// Decode a positional posting list, consuming exactly `bytes`.
pub fn decode_positional(bytes: &[u8]) -> io::Result<PositionalList> {
    let mut list = PositionalList::default();
    let mut pos = 0usize;
    let mut prev_doc = 0u64;
    let mut first = true;

    while pos < bytes.len() {
        let (delta, consumed) = decode_varint(&bytes[pos..])?;
        pos += consumed;
        if !first && delta == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "doc ids not strictly increasing",
            ));
        }
        let doc = prev_doc + delta;
        if doc > u32::MAX as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "doc id out of range",
            ));
        }
        prev_doc = doc;
        first = false;

        let (n_pos, consumed) = decode_varint(&bytes[pos..])?;
        pos += consumed;
        if n_pos == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "positional entry with zero positions",
            ));
        }
        if n_pos as usize > MAX_POSTING_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("position count too large: {}", n_pos),
            ));
        }

        let mut positions = Vec::with_capacity(n_pos as usize);
        let mut prev_pos = 0u64;
        for i in 0..n_pos {
            let (delta, consumed) = decode_varint(&bytes[pos..])?;
            pos += consumed;
            if i > 0 && delta == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "positions not strictly increasing",
                ));
            }
            let position = prev_pos + delta;
            if position > u32::MAX as u64 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "position out of range",
                ));
            }
            prev_pos = position;
            positions.push(position as u32);
        }

        if list.docs.len() >= MAX_POSTING_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "posting list too large",
            ));
        }
        list.docs.push(doc as u32);
        list.positions.push(positions);
    }

    Ok(list)
}

// ============================================================================
// FREQUENCY-ONLY LISTS
// ============================================================================

/// Decoded frequency-only posting list: `tfs[i]` belongs to `docs[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyList {
    pub docs: Vec<u32>,
    pub tfs: Vec<u32>,
}

/// Encode a frequency-only posting list. Entries must be sorted by doc id
/// with nonzero term frequencies.
pub fn encode_frequency(entries: &[(u32, u32)], buf: &mut Vec<u8>) {
    let mut prev_doc = 0u32;
    for (i, (doc, tf)) in entries.iter().enumerate() {
        debug_assert!(*tf > 0);
        debug_assert!(i == 0 || *doc > prev_doc);

        encode_varint((*doc - prev_doc) as u64, buf);
        encode_varint(*tf as u64, buf);
        prev_doc = *doc;
    }
}

/// Decode a frequency-only posting list, consuming exactly `bytes`.
pub fn decode_frequency(bytes: &[u8]) -> io::Result<FrequencyList> {
    let mut list = FrequencyList::default();
    let mut pos = 0usize;
    let mut prev_doc = 0u64;
    let mut first = true;

    while pos < bytes.len() {
        let (delta, consumed) = decode_varint(&bytes[pos..])?;
        pos += consumed;
        if !first && delta == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "doc ids not strictly increasing",
            ));
        }
        let doc = prev_doc + delta;
        if doc > u32::MAX as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "doc id out of range",
            ));
        }
        prev_doc = doc;
        first = false;

        let (tf, consumed) = decode_varint(&bytes[pos..])?;
        pos += consumed;
        if tf == 0 || tf > u32::MAX as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "term frequency out of range",
            ));
        }

        if list.docs.len() >= MAX_POSTING_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "posting list too large",
            ));
        }
        list.docs.push(doc as u32);
        list.tfs.push(tf as u32);
    }

    Ok(list)
}

// ============================================================================
// POINTER TABLES
// ============================================================================

/// `(start, len)` arrays for one field, indexed by term id. `len == 0` means
/// the term does not occur in this field.
#[derive(Debug, Clone, Default)]
pub struct FieldPointers {
    pub start: Vec<u32>,
    pub len: Vec<u32>,
}

/// Struct-of-arrays pointer table for one tier.
///
/// On-disk layout (`ptrs.bin`): for each field in tier order, the full
/// `start` array then the full `len` array, each `u32[num_terms]`
/// little-endian. Field order is part of the format contract.
#[derive(Debug, Clone)]
pub struct PointerTable {
    pub fields: Vec<FieldPointers>,
}

impl PointerTable {
    /// Byte range of (field, term), or `None` when the term is absent from
    /// the field.
    #[inline]
    pub fn slice_of(&self, field_idx: usize, term_id: u32) -> Option<(u32, u32)> {
        let field = &self.fields[field_idx];
        let len = field.len[term_id as usize];
        if len == 0 {
            None
        } else {
            Some((field.start[term_id as usize], len))
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let num_terms = self.fields.first().map_or(0, |f| f.start.len());
        let mut buf = Vec::with_capacity(self.fields.len() * num_terms * 8);
        for field in &self.fields {
            for v in &field.start {
                buf.extend_from_slice(&v.to_le_bytes());
            }
            for v in &field.len {
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        buf
    }

    /// Parse a `ptrs.bin` image. `postings_len` bounds every `(start, len)`
    /// range; a pointer outside the postings blob is fatal.
    pub fn from_bytes(
        bytes: &[u8],
        num_terms: usize,
        num_fields: usize,
        postings_len: usize,
    ) -> io::Result<Self> {
        let expected = num_fields
            .checked_mul(num_terms)
            .and_then(|n| n.checked_mul(8))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "pointer table overflow"))?;
        if bytes.len() != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "pointer table size mismatch: expected {} bytes for {} terms, got {}",
                    expected,
                    num_terms,
                    bytes.len()
                ),
            ));
        }

        let read_u32s = |at: usize| -> Vec<u32> {
            (0..num_terms)
                .map(|i| {
                    let o = at + i * 4;
                    u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]])
                })
                .collect()
        };

        let mut fields = Vec::with_capacity(num_fields);
        for f in 0..num_fields {
            let base = f * num_terms * 8;
            let start = read_u32s(base);
            let len = read_u32s(base + num_terms * 4);

            for t in 0..num_terms {
                let end = start[t] as u64 + len[t] as u64;
                if end > postings_len as u64 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "posting range for field {} term {} exceeds blob ({} > {})",
                            f, t, end, postings_len
                        ),
                    ));
                }
            }
            fields.push(FieldPointers { start, len });
        }

        Ok(Self { fields })
    }
}
