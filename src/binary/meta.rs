// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Tier metadata and the key → id map.
//!
//! The binary artifact layouts are fixed and carry no headers beyond their
//! own count fields, so integrity lives here: `meta.json` declares the counts
//! the loader cross-checks and a CRC32 per binary artifact. A checksum
//! mismatch means the artifact set is torn or corrupt, and the loader refuses
//! it before attempting structural parsing.

use std::collections::BTreeMap;
use std::io;

use serde::{Deserialize, Serialize};

/// Format version written into every `meta.json`. Opaque to the engine;
/// recorded and echoed in load diagnostics so mismatched-build errors name
/// the version they came from.
pub const FORMAT_VERSION: &str = "refdex-1";

pub const DOC_INDEX_FILE: &str = "doc.index.bin";
pub const DOC_BLOB_FILE: &str = "doc.blob.bin";
pub const IDMAP_FILE: &str = "idmap.json";

/// `meta.json` for one tier.
///
/// `checksums` is a BTreeMap so serialization order is deterministic:
/// identical builds write identical bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierMeta {
    pub version: String,
    /// Present on the core tier only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_docs: Option<u32>,
    pub num_terms: u32,
    pub term_bytes_len: u32,
    /// CRC32 per artifact file name.
    pub checksums: BTreeMap<String, u32>,
}

/// CRC32 of an artifact image.
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

impl TierMeta {
    /// Verify the recorded checksum for `file` against `bytes`.
    pub fn verify_checksum(&self, file: &str, bytes: &[u8]) -> io::Result<()> {
        let expected = self.checksums.get(file).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} ({}): no checksum recorded", file, self.version),
            )
        })?;
        let actual = checksum(bytes);
        if actual != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} ({}): checksum mismatch, expected {:#010x} got {:#010x}",
                    file, self.version, expected, actual
                ),
            ));
        }
        Ok(())
    }
}

/// Serialize the key → id map. BTreeMap, so the JSON is byte-stable across
/// builds.
pub fn encode_idmap(idmap: &BTreeMap<String, u32>) -> io::Result<Vec<u8>> {
    serde_json::to_vec(idmap).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Parse `idmap.json` and check it is a bijection onto `0..num_docs`.
pub fn decode_idmap(bytes: &[u8], num_docs: usize) -> io::Result<BTreeMap<String, u32>> {
    let idmap: BTreeMap<String, u32> =
        serde_json::from_slice(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if idmap.len() != num_docs {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "idmap has {} keys for {} documents",
                idmap.len(),
                num_docs
            ),
        ));
    }
    let mut seen = vec![false; num_docs];
    for (key, &id) in &idmap {
        let idx = id as usize;
        if idx >= num_docs || seen[idx] {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("idmap entry {:?} → {} is not a bijection", key, id),
            ));
        }
        seen[idx] = true;
    }
    Ok(idmap)
}
