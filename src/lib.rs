//! Full-text search over a static bibliographic corpus.
//!
//! refdex builds and queries a prebuilt, two-tier inverted index for corpora
//! of roughly 50k–150k cryptography references. The index is a directory of
//! small binary artifacts — packed term dictionaries, varint-delta posting
//! lists, a JSON-lines docstore — and the engine executes conjunctive,
//! phrase, and prefix queries with field-weighted ranking, entirely in
//! process.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌─────────────┐
//! │ build::  │───▶│ artifact  │───▶│ engine::    │
//! │ (JSONL → │    │ directory │    │ Engine      │
//! │  index)  │    │ (11 files)│    │ (init/search│
//! └──────────┘    └───────────┘    │  /get_entry)│
//!       │               ▲          └─────────────┘
//!       ▼               │                 │
//! ┌──────────┐    ┌───────────┐    ┌─────────────┐
//! │ text::   │    │ binary::  │    │ ranked hits │
//! │ (tokens) │    │ (codecs)  │    │ + highlights│
//! └──────────┘    └───────────┘    └─────────────┘
//! ```
//!
//! The core tier (title / authors / key) loads at `init`; the extended tier
//! (venue / year / doi) loads lazily on the first query that needs it.
//!
//! # Usage
//!
//! ```no_run
//! use refdex::{Engine, SearchOptions};
//!
//! let engine = Engine::open("./artifacts")?;
//! let hits = engine.search("\"authenticated encryption\" rogaway", &SearchOptions::default())?;
//! for hit in hits {
//!     println!("{}  {}", hit.record.key, hit.record.title);
//! }
//! # Ok::<(), refdex::EngineError>(())
//! ```

pub mod binary;
pub mod build;
mod engine;
mod error;
pub mod text;
mod types;

pub use build::{build_index, read_records, run_build, BuildSummary, BuiltIndex};
pub use engine::{
    parse_query, Engine, LoadedTier, ParsedQuery, PREFIX_EXPANSION_CAP,
};
pub use error::EngineError;
pub use text::{normalize, tokenize};
pub use types::{
    DocRecord, Field, Highlight, SearchHit, SearchOptions, SourceRecord, Span, Tier,
    AUTHOR_SEPARATOR, DEFAULT_LIMIT, MAX_LIMIT,
};
