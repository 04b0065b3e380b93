// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Core types: tiers, fields, records, and query options.
//!
//! A corpus is a flat stream of bibliographic records. The builder assigns
//! each record a dense `id` in consumption order and splits its text across
//! two tiers of fields:
//!
//! - **Core tier**: `title`, `authors`, `key` — always loaded, answers most
//!   queries. Title and authors carry positional postings so phrase queries
//!   work; the key field is frequency-only.
//! - **Extended tier**: `venue`, `year`, `doi` — loaded lazily on the first
//!   query that looks like it needs them. All frequency-only.
//!
//! Field identity is a compile-time enum, not a string key. The per-field
//! arrays in `ptrs.bin` are written in `Tier::fields()` order, so that order
//! is part of the on-disk format contract: reordering the enum is a format
//! break, not a refactor.

use serde::{Deserialize, Serialize};

/// Separator used when flattening the ordered author list into `authors_str`.
pub const AUTHOR_SEPARATOR: &str = "; ";

// =============================================================================
// TIERS AND FIELDS
// =============================================================================

/// A self-contained set of fields + dictionary + postings, loaded as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Core,
    Extended,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Core, Tier::Extended];

    /// Artifact filename prefix for this tier (`<prefix>.dict.bin` etc).
    pub fn file_prefix(self) -> &'static str {
        match self {
            Tier::Core => "index.core",
            Tier::Extended => "index.ext",
        }
    }

    /// Fields of this tier, in on-disk pointer-table order.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Tier::Core => &[Field::Title, Field::Authors, Field::Key],
            Tier::Extended => &[Field::Venue, Field::Year, Field::Doi],
        }
    }

    pub fn dict_file(self) -> String {
        format!("{}.dict.bin", self.file_prefix())
    }

    pub fn ptrs_file(self) -> String {
        format!("{}.ptrs.bin", self.file_prefix())
    }

    pub fn postings_file(self) -> String {
        format!("{}.postings.bin", self.file_prefix())
    }

    pub fn meta_file(self) -> String {
        format!("{}.meta.json", self.file_prefix())
    }
}

/// An indexed field. The discriminant doubles as the bit position in the
/// per-doc matched-field mask used during scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Field {
    Title = 0,
    Authors = 1,
    Key = 2,
    Venue = 3,
    Year = 4,
    Doi = 5,
}

impl Field {
    pub fn tier(self) -> Tier {
        match self {
            Field::Title | Field::Authors | Field::Key => Tier::Core,
            Field::Venue | Field::Year | Field::Doi => Tier::Extended,
        }
    }

    /// Positional fields carry token positions; frequency-only fields carry
    /// term frequencies. Phrase adjacency is only meaningful where positions
    /// exist.
    pub fn is_positional(self) -> bool {
        matches!(self, Field::Title | Field::Authors)
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Authors => "authors",
            Field::Key => "key",
            Field::Venue => "venue",
            Field::Year => "year",
            Field::Doi => "doi",
        }
    }

    /// Bit for this field in a matched-field mask.
    #[inline]
    pub fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A bibliographic record as produced by the upstream conversion pipeline.
///
/// One JSON object per line in the builder's input file. The builder assigns
/// ids; the source only guarantees `key` uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub key: String,
    pub title: String,
    /// Ordered person names; flattened to `authors_str` with `"; "`.
    pub authors: Vec<String>,
    /// Venue title chained from the parent record (may be absent or empty).
    #[serde(default)]
    pub venue: Option<String>,
    /// Publication year, 1000..=9999 when present.
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub page_range: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
}

impl SourceRecord {
    pub fn authors_str(&self) -> String {
        self.authors.join(AUTHOR_SEPARATOR)
    }
}

/// The per-document retrieval record stored in the docstore.
///
/// Serialized as one JSON line per document in `doc.blob.bin`, sliced by the
/// offsets in `doc.index.bin`. Optional fields are omitted entirely when
/// absent so two builds of the same corpus produce identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRecord {
    pub id: u32,
    pub key: String,
    pub title: String,
    pub authors_str: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

// =============================================================================
// QUERY OPTIONS AND RESULTS
// =============================================================================

/// Default number of results returned by `search`.
pub const DEFAULT_LIMIT: usize = 50;

/// Hard ceiling on `limit`; larger requests are clamped, not rejected.
pub const MAX_LIMIT: usize = 1000;

/// Options accepted by `Engine::search`.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Maximum results, clamped to `1..=MAX_LIMIT`.
    pub limit: usize,
    /// Force the extended tier even if the classifier wouldn't require it.
    pub use_extended: bool,
    /// Reserved. Parsed and ignored.
    pub fuzzy: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            use_extended: false,
            fuzzy: false,
        }
    }
}

impl SearchOptions {
    /// Effective limit after clamping.
    pub fn clamped_limit(&self) -> usize {
        self.limit.clamp(1, MAX_LIMIT)
    }
}

/// A half-open byte range into a stored field string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Byte-offset spans of matched tokens, per highlighted field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlight {
    pub title: Vec<Span>,
    pub authors: Vec<Span>,
}

/// One ranked search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub record: DocRecord,
    pub score: f64,
    pub highlight: Option<Highlight>,
}
