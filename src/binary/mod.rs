// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Binary artifact formats.
//!
//! An index is a directory of small, fixed-layout files rather than one
//! container: the core tier must be loadable without touching the extended
//! tier, and a host that fetches artifacts over a network wants to pull them
//! independently. All multi-byte integers are little-endian.
//!
//! Per tier `T` (`index.core` / `index.ext`):
//!
//! ```text
//! T.dict.bin       u32 num_terms ‖ u32 term_bytes_len
//!                  ‖ u32[num_terms+1] offsets ‖ u8[term_bytes_len] blob
//! T.ptrs.bin       per field, in tier order: u32[N] start ‖ u32[N] len
//! T.postings.bin   raw byte vector addressed by (start, len) from ptrs
//! T.meta.json      version, counts, CRC32 per artifact
//! ```
//!
//! Shared across tiers:
//!
//! ```text
//! doc.index.bin    u32[num_docs+1] offsets into doc.blob.bin
//! doc.blob.bin     JSON-lines retrieval records
//! idmap.json       key → doc id (bijection onto 0..num_docs)
//! ```
//!
//! The binary files carry no checksums of their own — their layouts are
//! bit-exact contracts — so `meta.json` holds a CRC32 per file and the loader
//! verifies before parsing. Decoders treat any structural surprise (overlong
//! varint, non-increasing ids, range past a blob) as fatal corruption.

mod dict;
mod docstore;
mod meta;
mod postings;
mod varint;

pub use dict::TermDict;
pub use docstore::{encode_docstore, Docstore};
pub use meta::{
    checksum, decode_idmap, encode_idmap, TierMeta, DOC_BLOB_FILE, DOC_INDEX_FILE, FORMAT_VERSION,
    IDMAP_FILE,
};
pub use postings::{
    decode_frequency, decode_positional, encode_frequency, encode_positional, FieldPointers,
    FrequencyList, PointerTable, PositionalList, MAX_POSTING_SIZE,
};
pub use varint::{decode_varint, encode_varint, MAX_VARINT_BYTES};
