// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Docstore: per-document retrieval records.
//!
//! Two files: `doc.index.bin` is a `u32[num_docs + 1]` little-endian offset
//! array, `doc.blob.bin` is the byte blob it indexes. Each slice is one JSON
//! line (serde-encoded [`DocRecord`] + `\n`). JSON lines keep decode
//! deterministic and self-delimiting, and make the blob greppable when an
//! index needs a post-mortem.

use std::io;

use crate::types::DocRecord;

/// Encode records into `(index_bytes, blob_bytes)`.
///
/// Records must already carry their final ids in order; the offset array
/// position IS the doc id.
pub fn encode_docstore(records: &[DocRecord]) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let mut blob = Vec::new();
    let mut offsets = Vec::with_capacity(records.len() + 1);
    offsets.push(0u32);

    for (i, record) in records.iter().enumerate() {
        debug_assert_eq!(record.id as usize, i);
        serde_json::to_writer(&mut blob, record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        blob.push(b'\n');
        if blob.len() > u32::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "docstore blob exceeds u32 addressing",
            ));
        }
        offsets.push(blob.len() as u32);
    }

    let mut index = Vec::with_capacity(offsets.len() * 4);
    for off in &offsets {
        index.extend_from_slice(&off.to_le_bytes());
    }
    Ok((index, blob))
}

/// Loaded docstore, read-only after construction.
#[derive(Debug)]
pub struct Docstore {
    offsets: Vec<u32>,
    blob: Vec<u8>,
}

impl Docstore {
    /// Parse and validate the two docstore files. `num_docs` comes from the
    /// core tier's metadata and must agree with the offset array length.
    pub fn from_bytes(index: &[u8], blob: Vec<u8>, num_docs: usize) -> io::Result<Self> {
        if index.len() != (num_docs + 1) * 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "docstore index size mismatch: expected {} offsets, file has {} bytes",
                    num_docs + 1,
                    index.len()
                ),
            ));
        }

        let offsets: Vec<u32> = (0..=num_docs)
            .map(|i| {
                let o = i * 4;
                u32::from_le_bytes([index[o], index[o + 1], index[o + 2], index[o + 3]])
            })
            .collect();

        if offsets[0] != 0 || offsets[num_docs] as usize != blob.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "docstore offsets do not span the blob",
            ));
        }
        if offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "docstore offsets decreasing",
            ));
        }

        Ok(Self { offsets, blob })
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode the record for `id`. Out-of-range ids and malformed slices are
    /// both corruption: the pointer tables never emit an id the docstore
    /// doesn't hold.
    pub fn get(&self, id: u32) -> io::Result<DocRecord> {
        let idx = id as usize;
        if idx >= self.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("doc id {} out of range ({} docs)", id, self.len()),
            ));
        }
        let slice = &self.blob[self.offsets[idx] as usize..self.offsets[idx + 1] as usize];
        serde_json::from_slice(slice)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("doc {}: {}", id, e)))
    }
}
