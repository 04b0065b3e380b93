// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Build pipeline: record stream → artifact directory.
//!
//! Reads a JSONL file of source records, assigns dense ids in consumption
//! order, tokenizes every field (in parallel with rayon when the `parallel`
//! feature is on), accumulates per-tier dictionaries and postings, and emits
//! the artifact files. Emission is staged: everything is written into a
//! sibling temp directory and renamed over the target, so a crashed build
//! never leaves a half-written artifact set where a loader can find it.
//!
//! Determinism is a hard requirement here: two builds over the same record
//! stream must produce byte-identical artifacts. That is why terms are
//! interned in token order, maps that reach the output are BTreeMaps, and
//! the parallel map phase only tokenizes (the reduce into accumulators runs
//! sequentially in id order).

mod dictionary;
mod postings;

pub use dictionary::DictionaryBuilder;
pub use postings::{FrequencyAccumulator, PositionalAccumulator};

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[cfg(feature = "parallel")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::binary::{
    checksum, encode_docstore, encode_idmap, PointerTable, TermDict, TierMeta, DOC_BLOB_FILE,
    DOC_INDEX_FILE, FORMAT_VERSION, IDMAP_FILE,
};
use crate::text::tokenize;
use crate::types::{DocRecord, SourceRecord, Tier};

/// Sizes and counts reported after a successful build.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub num_docs: usize,
    pub core_terms: usize,
    pub ext_terms: usize,
    pub total_bytes: usize,
    /// (file name, byte size) per emitted artifact, in emission order.
    pub files: Vec<(String, usize)>,
}

/// Read a JSONL record stream. Every malformed line is fatal, with its line
/// number; the builder never emits artifacts from a partially understood
/// corpus.
pub fn read_records(path: &Path) -> Result<Vec<SourceRecord>, String> {
    let file =
        fs::File::open(path).map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("read error at line {}: {}", lineno + 1, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: SourceRecord = serde_json::from_str(&line)
            .map_err(|e| format!("invalid record at line {}: {}", lineno + 1, e))?;
        if let Some(year) = record.year {
            if !(1000..=9999).contains(&year) {
                return Err(format!(
                    "invalid record at line {}: year {} outside 1000..=9999",
                    lineno + 1,
                    year
                ));
            }
        }
        records.push(record);
    }
    Ok(records)
}

/// Tokenized fields of one record — the output of the (parallel) map phase.
struct RecordTokens {
    title: Vec<String>,
    authors: Vec<String>,
    key: Vec<String>,
    venue: Vec<String>,
    year: Option<String>,
    doi: Vec<String>,
}

fn tokenize_record(record: &SourceRecord) -> RecordTokens {
    RecordTokens {
        title: tokenize(&record.title),
        authors: tokenize(&record.authors_str()),
        key: tokenize(&record.key),
        venue: record.venue.as_deref().map(tokenize).unwrap_or_default(),
        year: record.year.map(|y| format!("{y:04}")),
        doi: record.doi.as_deref().map(tokenize).unwrap_or_default(),
    }
}

/// Intern tokens and push one positional entry per distinct term. Positions
/// are indices in the stopword-filtered token stream.
fn add_positional(
    dict: &mut DictionaryBuilder,
    acc: &mut PositionalAccumulator,
    doc: u32,
    tokens: &[String],
) {
    let mut grouped: Vec<(u32, Vec<u32>)> = Vec::new();
    let mut slot_of: HashMap<u32, usize> = HashMap::new();
    for (position, token) in tokens.iter().enumerate() {
        let term = dict.intern(token);
        match slot_of.get(&term) {
            Some(&slot) => grouped[slot].1.push(position as u32),
            None => {
                slot_of.insert(term, grouped.len());
                grouped.push((term, vec![position as u32]));
            }
        }
    }
    for (term, positions) in grouped {
        acc.push(term, doc, positions);
    }
}

/// Intern tokens and push one frequency entry per distinct term.
fn add_frequency(
    dict: &mut DictionaryBuilder,
    acc: &mut FrequencyAccumulator,
    doc: u32,
    tokens: &[String],
) {
    let mut counts: Vec<(u32, u32)> = Vec::new();
    let mut slot_of: HashMap<u32, usize> = HashMap::new();
    for token in tokens {
        let term = dict.intern(token);
        match slot_of.get(&term) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slot_of.insert(term, counts.len());
                counts.push((term, 1));
            }
        }
    }
    for (term, tf) in counts {
        acc.push(term, doc, tf);
    }
}

/// Finished artifact images for one tier.
struct TierImage {
    dict: Vec<u8>,
    ptrs: Vec<u8>,
    postings: Vec<u8>,
    num_terms: usize,
    term_bytes_len: usize,
}

/// One complete, in-memory artifact set. Separated from the I/O so tests can
/// build and load without touching disk.
#[derive(Debug)]
pub struct BuiltIndex {
    files: Vec<(String, Vec<u8>)>,
    pub num_docs: usize,
    pub core_terms: usize,
    pub ext_terms: usize,
}

impl BuiltIndex {
    /// Artifact images in emission order.
    pub fn files(&self) -> &[(String, Vec<u8>)] {
        &self.files
    }

    /// Write every artifact into `dir` (which must exist).
    pub fn write_to(&self, dir: &Path) -> Result<(), String> {
        for (name, bytes) in &self.files {
            let path = dir.join(name);
            fs::write(&path, bytes)
                .map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
        }
        Ok(())
    }

    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            num_docs: self.num_docs,
            core_terms: self.core_terms,
            ext_terms: self.ext_terms,
            total_bytes: self.files.iter().map(|(_, b)| b.len()).sum(),
            files: self
                .files
                .iter()
                .map(|(name, bytes)| (name.clone(), bytes.len()))
                .collect(),
        }
    }
}

fn tier_meta(tier: Tier, image: &TierImage, num_docs: Option<u32>) -> TierMeta {
    let mut checksums = BTreeMap::new();
    checksums.insert(tier.dict_file(), checksum(&image.dict));
    checksums.insert(tier.ptrs_file(), checksum(&image.ptrs));
    checksums.insert(tier.postings_file(), checksum(&image.postings));
    TierMeta {
        version: FORMAT_VERSION.to_string(),
        num_docs,
        num_terms: image.num_terms as u32,
        term_bytes_len: image.term_bytes_len as u32,
        checksums,
    }
}

/// Build the full artifact set from an already-read record stream.
pub fn build_index(records: &[SourceRecord]) -> Result<BuiltIndex, String> {
    if records.len() > u32::MAX as usize {
        return Err(format!("corpus too large: {} records", records.len()));
    }

    // Key uniqueness up front; the idmap must be a bijection.
    {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            if let Some(first) = seen.insert(record.key.as_str(), i) {
                return Err(format!(
                    "duplicate key {:?} (records {} and {})",
                    record.key, first, i
                ));
            }
        }
    }

    #[cfg(feature = "parallel")]
    let progress = {
        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {prefix:<10} {bar:36.green/dim} {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=> "),
        );
        pb.set_prefix("tokenize");
        pb
    };

    // MAP: tokenize every record (order-preserving).
    #[cfg(feature = "parallel")]
    let token_streams: Vec<RecordTokens> = records
        .par_iter()
        .map(|record| {
            let tokens = tokenize_record(record);
            progress.inc(1);
            tokens
        })
        .collect();
    #[cfg(not(feature = "parallel"))]
    let token_streams: Vec<RecordTokens> = records.iter().map(tokenize_record).collect();

    #[cfg(feature = "parallel")]
    progress.finish_with_message("done");

    // REDUCE: sequential, in id order, so provisional term ids and posting
    // order are deterministic.
    let mut core_dict = DictionaryBuilder::new();
    let mut title_acc = PositionalAccumulator::default();
    let mut authors_acc = PositionalAccumulator::default();
    let mut key_acc = FrequencyAccumulator::default();

    let mut ext_dict = DictionaryBuilder::new();
    let mut venue_acc = FrequencyAccumulator::default();
    let mut year_acc = FrequencyAccumulator::default();
    let mut doi_acc = FrequencyAccumulator::default();

    for (doc, tokens) in token_streams.iter().enumerate() {
        let doc = doc as u32;
        add_positional(&mut core_dict, &mut title_acc, doc, &tokens.title);
        add_positional(&mut core_dict, &mut authors_acc, doc, &tokens.authors);
        add_frequency(&mut core_dict, &mut key_acc, doc, &tokens.key);

        add_frequency(&mut ext_dict, &mut venue_acc, doc, &tokens.venue);
        if let Some(year) = &tokens.year {
            add_frequency(&mut ext_dict, &mut year_acc, doc, std::slice::from_ref(year));
        }
        add_frequency(&mut ext_dict, &mut doi_acc, doc, &tokens.doi);
    }

    // Finalize: sort dictionaries, renumber, encode term-major postings.
    let core = {
        let (terms, remap) = core_dict.finalize();
        let dict = TermDict::from_sorted_terms(&terms);
        let mut postings = Vec::new();
        let table = PointerTable {
            fields: vec![
                title_acc.emit(&remap, &mut postings),
                authors_acc.emit(&remap, &mut postings),
                key_acc.emit(&remap, &mut postings),
            ],
        };
        TierImage {
            num_terms: dict.len(),
            term_bytes_len: dict.blob_len(),
            dict: dict.to_bytes(),
            ptrs: table.to_bytes(),
            postings,
        }
    };

    let ext = {
        let (terms, remap) = ext_dict.finalize();
        let dict = TermDict::from_sorted_terms(&terms);
        let mut postings = Vec::new();
        let table = PointerTable {
            fields: vec![
                venue_acc.emit(&remap, &mut postings),
                year_acc.emit(&remap, &mut postings),
                doi_acc.emit(&remap, &mut postings),
            ],
        };
        TierImage {
            num_terms: dict.len(),
            term_bytes_len: dict.blob_len(),
            dict: dict.to_bytes(),
            ptrs: table.to_bytes(),
            postings,
        }
    };

    // Docstore + idmap.
    let doc_records: Vec<DocRecord> = records
        .iter()
        .enumerate()
        .map(|(id, record)| DocRecord {
            id: id as u32,
            key: record.key.clone(),
            title: record.title.clone(),
            authors_str: record.authors_str(),
            venue: record.venue.clone().filter(|v| !v.is_empty()),
            year: record.year,
            page_range: record.page_range.clone(),
            doi: record.doi.clone(),
        })
        .collect();
    let (doc_index, doc_blob) =
        encode_docstore(&doc_records).map_err(|e| format!("docstore encoding failed: {}", e))?;

    let idmap: BTreeMap<String, u32> = doc_records
        .iter()
        .map(|r| (r.key.clone(), r.id))
        .collect();
    let idmap_bytes = encode_idmap(&idmap).map_err(|e| format!("idmap encoding failed: {}", e))?;

    // Metadata. The core tier also vouches for the shared docstore files.
    let mut core_meta = tier_meta(Tier::Core, &core, Some(records.len() as u32));
    core_meta
        .checksums
        .insert(DOC_INDEX_FILE.to_string(), checksum(&doc_index));
    core_meta
        .checksums
        .insert(DOC_BLOB_FILE.to_string(), checksum(&doc_blob));
    let ext_meta = tier_meta(Tier::Extended, &ext, None);

    let core_meta_bytes =
        serde_json::to_vec_pretty(&core_meta).map_err(|e| format!("meta encoding failed: {}", e))?;
    let ext_meta_bytes =
        serde_json::to_vec_pretty(&ext_meta).map_err(|e| format!("meta encoding failed: {}", e))?;

    let core_terms = core.num_terms;
    let ext_terms = ext.num_terms;
    let files = vec![
        (Tier::Core.meta_file(), core_meta_bytes),
        (Tier::Core.dict_file(), core.dict),
        (Tier::Core.ptrs_file(), core.ptrs),
        (Tier::Core.postings_file(), core.postings),
        (Tier::Extended.meta_file(), ext_meta_bytes),
        (Tier::Extended.dict_file(), ext.dict),
        (Tier::Extended.ptrs_file(), ext.ptrs),
        (Tier::Extended.postings_file(), ext.postings),
        (DOC_INDEX_FILE.to_string(), doc_index),
        (DOC_BLOB_FILE.to_string(), doc_blob),
        (IDMAP_FILE.to_string(), idmap_bytes),
    ];

    Ok(BuiltIndex {
        files,
        num_docs: records.len(),
        core_terms,
        ext_terms,
    })
}

/// Build from a JSONL file and emit atomically into `output_dir`.
pub fn run_build(input: &Path, output_dir: &Path) -> Result<BuildSummary, String> {
    let records = read_records(input)?;
    if records.is_empty() {
        return Err(format!("no records in {}", input.display()));
    }

    let built = build_index(&records)?;

    // Stage into a sibling directory, then swap. Directory rename is the
    // atomicity boundary; a reader either sees the old set or the new one.
    let dir_name = output_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("invalid output directory {}", output_dir.display()))?;
    let staging = output_dir.with_file_name(format!(".{dir_name}.tmp-build"));

    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| format!("failed to clear staging dir: {}", e))?;
    }
    fs::create_dir_all(&staging).map_err(|e| format!("failed to create staging dir: {}", e))?;
    built.write_to(&staging)?;

    if output_dir.exists() {
        fs::remove_dir_all(output_dir)
            .map_err(|e| format!("failed to replace {}: {}", output_dir.display(), e))?;
    }
    fs::rename(&staging, output_dir).map_err(|e| {
        format!(
            "failed to move staged artifacts to {}: {}",
            output_dir.display(),
            e
        )
    })?;

    Ok(built.summary())
}
