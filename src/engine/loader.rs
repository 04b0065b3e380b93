// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Artifact acquisition and validation.
//!
//! Loading is the trust boundary: after `LoadedTier::load` returns, every
//! other component indexes into these structures without re-checking them.
//! The validation ladder runs cheapest-first:
//!
//! 1. read `meta.json`, record the version for diagnostics
//! 2. CRC32 every binary artifact against the recorded checksums
//! 3. structural parse: dictionary header consistency, sorted terms,
//!    pointer-table ranges inside the postings blob
//! 4. cross-checks: meta counts vs parsed counts
//!
//! Any failure refuses the tier. Nothing is decoded eagerly beyond the
//! dictionary offsets and pointer arrays — postings stay as raw bytes until
//! a query touches them.
//!
//! After the dictionary parses, the loader builds the in-memory prefix map:
//! first `min(4, |term|)` bytes → contiguous `[lo, hi)` term-id range. Terms
//! are `[a-z0-9]+`, so byte prefixes and char prefixes coincide. The map
//! bounds prefix expansion without persisting an extra artifact.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::binary::{
    decode_idmap, Docstore, PointerTable, TermDict, TierMeta, DOC_BLOB_FILE, DOC_INDEX_FILE,
    IDMAP_FILE,
};
use crate::types::Tier;

/// Prefix-map key length: the first `min(4, |term|)` bytes of a term.
pub const PREFIX_KEY_LEN: usize = 4;

/// One loaded tier, immutable after construction.
#[derive(Debug)]
pub struct LoadedTier {
    pub tier: Tier,
    pub version: String,
    pub dict: TermDict,
    pub ptrs: PointerTable,
    pub postings: Vec<u8>,
    prefix_map: HashMap<Box<[u8]>, (u32, u32)>,
}

fn read_artifact(root: &Path, name: &str) -> io::Result<Vec<u8>> {
    fs::read(root.join(name)).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("{}: {}", root.join(name).display(), e),
        )
    })
}

impl LoadedTier {
    /// Load and validate one tier from `root`. Returns the tier and its
    /// parsed metadata (the caller needs `num_docs` from the core meta).
    pub fn load(root: &Path, tier: Tier) -> io::Result<(Self, TierMeta)> {
        let meta_bytes = read_artifact(root, &tier.meta_file())?;
        let meta: TierMeta = serde_json::from_slice(&meta_bytes).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: {}", tier.meta_file(), e),
            )
        })?;

        let dict_bytes = read_artifact(root, &tier.dict_file())?;
        let ptrs_bytes = read_artifact(root, &tier.ptrs_file())?;
        let postings = read_artifact(root, &tier.postings_file())?;

        meta.verify_checksum(&tier.dict_file(), &dict_bytes)?;
        meta.verify_checksum(&tier.ptrs_file(), &ptrs_bytes)?;
        meta.verify_checksum(&tier.postings_file(), &postings)?;

        let dict = TermDict::from_bytes(&dict_bytes)
            .map_err(|e| annotate(e, &tier.dict_file(), &meta.version))?;
        if dict.len() != meta.num_terms as usize || dict.blob_len() != meta.term_bytes_len as usize
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} ({}): metadata declares {} terms / {} blob bytes, dictionary has {} / {}",
                    tier.dict_file(),
                    meta.version,
                    meta.num_terms,
                    meta.term_bytes_len,
                    dict.len(),
                    dict.blob_len()
                ),
            ));
        }

        let ptrs =
            PointerTable::from_bytes(&ptrs_bytes, dict.len(), tier.fields().len(), postings.len())
                .map_err(|e| annotate(e, &tier.ptrs_file(), &meta.version))?;

        let prefix_map = build_prefix_map(&dict);

        Ok((
            Self {
                tier,
                version: meta.version.clone(),
                dict,
                ptrs,
                postings,
                prefix_map,
            },
            meta,
        ))
    }

    /// Raw posting bytes for (field index, term id), or `None` when absent.
    #[inline]
    pub fn postings_slice(&self, field_idx: usize, term_id: u32) -> Option<&[u8]> {
        let (start, len) = self.ptrs.slice_of(field_idx, term_id)?;
        // Ranges were bounds-checked at load.
        Some(&self.postings[start as usize..(start + len) as usize])
    }

    /// `[lo, hi)` term-id range for a prefix-map key, when present.
    pub fn prefix_bounds(&self, key: &[u8]) -> Option<(u32, u32)> {
        self.prefix_map.get(key).copied()
    }
}

fn annotate(e: io::Error, file: &str, version: &str) -> io::Error {
    io::Error::new(e.kind(), format!("{} ({}): {}", file, version, e))
}

fn build_prefix_map(dict: &TermDict) -> HashMap<Box<[u8]>, (u32, u32)> {
    let key_of = |term: &[u8]| -> Box<[u8]> {
        term[..term.len().min(PREFIX_KEY_LEN)].to_vec().into_boxed_slice()
    };

    let mut map: HashMap<Box<[u8]>, (u32, u32)> = HashMap::new();
    if dict.is_empty() {
        return map;
    }

    let mut key = key_of(dict.term(0));
    let mut lo = 0u32;
    for id in 1..dict.len() as u32 {
        let next = key_of(dict.term(id));
        if next != key {
            map.insert(std::mem::replace(&mut key, next), (lo, id));
            lo = id;
        }
    }
    map.insert(key, (lo, dict.len() as u32));
    map
}

/// Load the shared docstore + idmap, validated against the core tier's
/// declared document count.
pub fn load_docstore(
    root: &Path,
    core_meta: &TierMeta,
) -> io::Result<(Docstore, HashMap<String, u32>)> {
    let num_docs = core_meta.num_docs.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "core metadata ({}) is missing num_docs",
                core_meta.version
            ),
        )
    })? as usize;

    let index_bytes = read_artifact(root, DOC_INDEX_FILE)?;
    let blob_bytes = read_artifact(root, DOC_BLOB_FILE)?;
    core_meta.verify_checksum(DOC_INDEX_FILE, &index_bytes)?;
    core_meta.verify_checksum(DOC_BLOB_FILE, &blob_bytes)?;
    let docstore = Docstore::from_bytes(&index_bytes, blob_bytes, num_docs)?;

    let idmap_bytes = read_artifact(root, IDMAP_FILE)?;
    let idmap = decode_idmap(&idmap_bytes, num_docs)?;

    Ok((docstore, idmap.into_iter().collect()))
}
