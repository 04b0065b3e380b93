// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The query engine: lifecycle, matching, and ranking.
//!
//! An [`Engine`] moves through `Uninitialized → Ready → ReadyExtended` and,
//! on artifact corruption, into a terminal failed state that refuses further
//! queries. The core tier loads in `init`; the extended tier loads at most
//! once, on the first query the classifier decides needs it (year-shaped
//! tokens, DOI markers, citation-key-shaped tokens) or on explicit request.
//! A failed extended load leaves the engine serving core-tier queries and is
//! retried by the next query that wants it.
//!
//! Query execution is synchronous and allocation-light:
//!
//! 1. parse → phrases + bag tokens (+ trailing-prefix flag)
//! 2. per bag token: resolve term ids in every loaded tier, union doc lists
//!    across the fields each term touches, remembering per doc which fields
//!    matched and whether any match was exact
//! 3. intersect token doc sets, smallest first, bailing on empty
//! 4. per phrase: positional adjacency over title and authors, reducing the
//!    candidate set to docs containing every phrase
//! 5. score (field weights + phrase bonuses + prefix multiplier), order by
//!    the total (score, year, title, key) comparison, truncate, materialize
//!
//! Loaded tiers are immutable and shared by `Arc`; queries run on a snapshot
//! taken at entry, so a concurrent extended-tier load never changes the tier
//! set mid-query.

mod loader;
mod query;
mod resolve;
mod score;

pub use loader::{LoadedTier, PREFIX_KEY_LEN};
pub use query::{parse_query, ParsedQuery};
pub use resolve::{resolve_phrase_token, resolve_token, PREFIX_EXPANSION_CAP};
pub use score::{
    best_weight, compare_scored, ScoredDoc, AUTHORS_WEIGHT, DOI_WEIGHT, KEY_WEIGHT,
    PHRASE_AUTHORS_BONUS, PHRASE_TITLE_BONUS, PREFIX_ONLY_MULTIPLIER, TITLE_WEIGHT, VENUE_WEIGHT,
    YEAR_WEIGHT,
};

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::binary::{decode_frequency, decode_positional, Docstore, PositionalList};
use crate::error::EngineError;
use crate::text::{normalize, tokenize_spans};
use crate::types::{DocRecord, Highlight, SearchHit, SearchOptions, Span, Tier};

// =============================================================================
// LIFECYCLE
// =============================================================================

#[derive(Debug)]
enum State {
    Uninitialized,
    Ready(Ready),
    Failed(String),
}

#[derive(Debug)]
struct Ready {
    core: Arc<LoadedTier>,
    docstore: Arc<Docstore>,
    idmap: Arc<HashMap<String, u32>>,
    ext: Option<Arc<LoadedTier>>,
}

/// Read-only view of the loaded tier set, taken at query entry.
struct Snapshot {
    core: Arc<LoadedTier>,
    docstore: Arc<Docstore>,
    idmap: Arc<HashMap<String, u32>>,
    ext: Option<Arc<LoadedTier>>,
}

/// A search engine over one artifact directory.
#[derive(Debug)]
pub struct Engine {
    root: PathBuf,
    state: RwLock<State>,
}

impl Engine {
    /// Create an engine pointed at an artifact directory. No I/O happens
    /// until [`Engine::init`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: RwLock::new(State::Uninitialized),
        }
    }

    /// Convenience: `new` + `init`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let engine = Self::new(root);
        engine.init()?;
        Ok(engine)
    }

    /// Acquire and validate the core artifacts. Idempotent once ready.
    pub fn init(&self) -> Result<(), EngineError> {
        let mut state = self.state.write();
        match &*state {
            State::Ready(_) => return Ok(()),
            State::Failed(detail) => return Err(EngineError::Load(detail.clone())),
            State::Uninitialized => {}
        }

        let (core, core_meta) = LoadedTier::load(&self.root, Tier::Core)
            .map_err(|e| EngineError::load("core tier", e))?;
        let (docstore, idmap) = loader::load_docstore(&self.root, &core_meta)
            .map_err(|e| EngineError::load("docstore", e))?;

        *state = State::Ready(Ready {
            core: Arc::new(core),
            docstore: Arc::new(docstore),
            idmap: Arc::new(idmap),
            ext: None,
        });
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.read(), State::Ready(_))
    }

    /// Whether the extended tier has been loaded (it never unloads).
    pub fn extended_loaded(&self) -> bool {
        match &*self.state.read() {
            State::Ready(ready) => ready.ext.is_some(),
            _ => false,
        }
    }

    fn snapshot(&self) -> Result<Snapshot, EngineError> {
        match &*self.state.read() {
            State::Uninitialized => Err(EngineError::NotReady),
            State::Failed(detail) => Err(EngineError::Decode(detail.clone())),
            State::Ready(ready) => Ok(Snapshot {
                core: ready.core.clone(),
                docstore: ready.docstore.clone(),
                idmap: ready.idmap.clone(),
                ext: ready.ext.clone(),
            }),
        }
    }

    /// One-shot extended-tier load. The write lock coalesces concurrent
    /// demands; a failure leaves the state untouched so a later query
    /// retries.
    fn ensure_extended(&self) -> Result<Arc<LoadedTier>, EngineError> {
        let mut state = self.state.write();
        match &mut *state {
            State::Uninitialized => Err(EngineError::NotReady),
            State::Failed(detail) => Err(EngineError::Decode(detail.clone())),
            State::Ready(ready) => {
                if let Some(ext) = &ready.ext {
                    return Ok(ext.clone());
                }
                let (tier, _) = LoadedTier::load(&self.root, Tier::Extended)
                    .map_err(|e| EngineError::load("extended tier", e))?;
                let tier = Arc::new(tier);
                ready.ext = Some(tier.clone());
                Ok(tier)
            }
        }
    }

    /// Latch the failed state. Corrupt artifacts cannot answer queries;
    /// every subsequent call fails fast with the same diagnosis.
    fn poison(&self, context: &str, err: io::Error) -> EngineError {
        let detail = format!("{context}: {err}");
        *self.state.write() = State::Failed(detail.clone());
        EngineError::Decode(detail)
    }

    // =========================================================================
    // PUBLIC QUERY API
    // =========================================================================

    /// Execute a query and return ranked hits.
    pub fn search(
        &self,
        raw_query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>, EngineError> {
        let mut snapshot = self.snapshot()?;

        let parsed = parse_query(raw_query);
        if parsed.is_empty() {
            return Ok(Vec::new());
        }

        let wants_ext =
            options.use_extended || needs_extended(&normalize(raw_query), &parsed.tokens);
        if wants_ext && snapshot.ext.is_none() {
            snapshot.ext = Some(self.ensure_extended()?);
        }

        match self.execute(&snapshot, &parsed, options) {
            Ok(hits) => Ok(hits),
            Err(ExecError::Corrupt { context, err }) => Err(self.poison(&context, err)),
        }
    }

    /// Look up a single record by key or by numeric doc id. Keys win when a
    /// key happens to look numeric.
    pub fn get_entry(&self, id_or_key: &str) -> Result<Option<DocRecord>, EngineError> {
        let snapshot = self.snapshot()?;

        let id = snapshot.idmap.get(id_or_key).copied().or_else(|| {
            id_or_key
                .parse::<u32>()
                .ok()
                .filter(|&n| (n as usize) < snapshot.docstore.len())
        });

        match id {
            None => Ok(None),
            Some(id) => match snapshot.docstore.get(id) {
                Ok(record) => Ok(Some(record)),
                Err(err) => Err(self.poison("docstore", err)),
            },
        }
    }

    // =========================================================================
    // EXECUTION
    // =========================================================================

    fn execute(
        &self,
        snapshot: &Snapshot,
        parsed: &ParsedQuery,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>, ExecError> {
        let mut tiers: Vec<&LoadedTier> = vec![&snapshot.core];
        if let Some(ext) = &snapshot.ext {
            tiers.push(ext);
        }

        // Per-token doc sets.
        let mut token_sets = Vec::with_capacity(parsed.tokens.len());
        for (i, token) in parsed.tokens.iter().enumerate() {
            let expand = parsed.last_is_prefix && i == parsed.tokens.len() - 1;
            let matches = token_matches(&tiers, token, expand)?;
            if matches.docs.is_empty() {
                return Ok(Vec::new());
            }
            token_sets.push(matches);
        }

        // Conjunction, smallest set first.
        let mut candidates: Option<Vec<u32>> = None;
        if !token_sets.is_empty() {
            let mut order: Vec<usize> = (0..token_sets.len()).collect();
            order.sort_by_key(|&i| token_sets[i].docs.len());
            let mut docs = token_sets[order[0]].docs.clone();
            for &i in &order[1..] {
                docs = intersect_sorted(&docs, &token_sets[i].docs);
                if docs.is_empty() {
                    return Ok(Vec::new());
                }
            }
            candidates = Some(docs);
        }

        // Phrase filtering over the core tier's positional fields.
        let mut phrase_sets = Vec::with_capacity(parsed.phrases.len());
        for phrase in &parsed.phrases {
            let matches = phrase_matches(&snapshot.core, phrase)?;
            let all = union_sorted(&matches.title, &matches.authors);
            if all.is_empty() {
                return Ok(Vec::new());
            }
            candidates = Some(match candidates {
                Some(docs) => intersect_sorted(&docs, &all),
                None => all,
            });
            if candidates.as_ref().is_some_and(|d| d.is_empty()) {
                return Ok(Vec::new());
            }
            phrase_sets.push(matches);
        }

        let candidates = candidates.unwrap_or_default();

        // Score and materialize every surviving doc; ordering needs the
        // record fields, so materialization precedes the sort.
        let mut scored = Vec::with_capacity(candidates.len());
        for &doc in &candidates {
            let mut score = 0.0f64;
            for (i, set) in token_sets.iter().enumerate() {
                let info = set.info[&doc];
                let mut weight = best_weight(info.mask);
                let terminal = i == token_sets.len() - 1;
                if terminal && parsed.last_is_prefix && !info.exact {
                    weight *= PREFIX_ONLY_MULTIPLIER;
                }
                score += weight;
            }
            for matches in &phrase_sets {
                if matches.title.binary_search(&doc).is_ok() {
                    score += PHRASE_TITLE_BONUS;
                } else if matches.authors.binary_search(&doc).is_ok() {
                    score += PHRASE_AUTHORS_BONUS;
                }
            }

            let record = snapshot.docstore.get(doc).map_err(|err| ExecError::Corrupt {
                context: "docstore".to_string(),
                err,
            })?;
            scored.push(ScoredDoc { record, score });
        }

        scored.sort_by(compare_scored);
        scored.truncate(options.clamped_limit());

        Ok(scored
            .into_iter()
            .map(|s| {
                let highlight = build_highlight(&s.record, parsed);
                SearchHit {
                    record: s.record,
                    score: s.score,
                    highlight: Some(highlight),
                }
            })
            .collect())
    }
}

// =============================================================================
// TIER CLASSIFICATION
// =============================================================================

/// Decide whether a query needs the extended tier: a 4-digit year token, a
/// DOI prefix (`10.` followed by a digit, checked on the normalized string
/// because tokenization strips the dot), or a citation-key-shaped token
/// (letters then a numeric tail, like `rogaway02`).
fn needs_extended(normalized_query: &str, tokens: &[String]) -> bool {
    if tokens
        .iter()
        .any(|t| t.len() == 4 && t.bytes().all(|b| b.is_ascii_digit()))
    {
        return true;
    }
    if has_doi_marker(normalized_query) {
        return true;
    }
    tokens.iter().any(|t| looks_like_citation_key(t))
}

fn has_doi_marker(s: &str) -> bool {
    s.as_bytes()
        .windows(4)
        .any(|w| w[0] == b'1' && w[1] == b'0' && w[2] == b'.' && w[3].is_ascii_digit())
}

fn looks_like_citation_key(token: &str) -> bool {
    let bytes = token.as_bytes();
    let alpha = bytes.iter().take_while(|b| b.is_ascii_alphabetic()).count();
    let digits = &bytes[alpha..];
    alpha >= 3 && digits.len() >= 2 && digits.iter().all(|b| b.is_ascii_digit())
}

// =============================================================================
// MATCHING
// =============================================================================

enum ExecError {
    Corrupt { context: String, err: io::Error },
}

impl From<io::Error> for ExecError {
    fn from(err: io::Error) -> Self {
        ExecError::Corrupt {
            context: "postings".to_string(),
            err,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TokenDocInfo {
    /// Fields that contained the token for this doc.
    mask: u8,
    /// Whether any containing term was the token itself (vs a prefix
    /// expansion).
    exact: bool,
}

struct TokenMatches {
    docs: Vec<u32>,
    info: HashMap<u32, TokenDocInfo>,
}

/// Union a token's doc lists across its resolved term ids, all fields, all
/// loaded tiers.
fn token_matches(
    tiers: &[&LoadedTier],
    token: &str,
    expand: bool,
) -> Result<TokenMatches, ExecError> {
    let mut info: HashMap<u32, TokenDocInfo> = HashMap::new();

    for tier in tiers {
        let resolved = resolve_token(tier, token, expand);
        for &term_id in &resolved.term_ids {
            let is_exact = resolved.exact == Some(term_id);
            for (field_idx, field) in tier.tier.fields().iter().enumerate() {
                let Some(bytes) = tier.postings_slice(field_idx, term_id) else {
                    continue;
                };
                let docs = if field.is_positional() {
                    decode_positional(bytes)?.docs
                } else {
                    decode_frequency(bytes)?.docs
                };
                for doc in docs {
                    let entry = info.entry(doc).or_default();
                    entry.mask |= field.mask();
                    entry.exact |= is_exact;
                }
            }
        }
    }

    let mut docs: Vec<u32> = info.keys().copied().collect();
    docs.sort_unstable();
    Ok(TokenMatches { docs, info })
}

/// Docs matching one phrase, per positional field. Sorted.
#[derive(Debug, Default)]
struct PhraseMatches {
    title: Vec<u32>,
    authors: Vec<u32>,
}

fn phrase_matches(core: &LoadedTier, phrase: &[String]) -> Result<PhraseMatches, ExecError> {
    // Exact lookups only; one miss empties the phrase.
    let mut term_ids = Vec::with_capacity(phrase.len());
    for token in phrase {
        match resolve_phrase_token(core, token) {
            Some(id) => term_ids.push(id),
            None => return Ok(PhraseMatches::default()),
        }
    }

    let mut out = PhraseMatches::default();
    for (field_idx, field) in core.tier.fields().iter().enumerate() {
        if !field.is_positional() {
            continue;
        }

        let mut lists: Vec<PositionalList> = Vec::with_capacity(term_ids.len());
        let mut missing = false;
        for &id in &term_ids {
            match core.postings_slice(field_idx, id) {
                Some(bytes) => lists.push(decode_positional(bytes)?),
                None => {
                    missing = true;
                    break;
                }
            }
        }
        if missing {
            continue;
        }

        let matched = phrase_docs_in_field(&lists);
        match field {
            crate::types::Field::Title => out.title = matched,
            crate::types::Field::Authors => out.authors = matched,
            _ => unreachable!("positional fields are title and authors"),
        }
    }
    Ok(out)
}

/// Docs where the phrase tokens occur at strictly consecutive positions.
fn phrase_docs_in_field(lists: &[PositionalList]) -> Vec<u32> {
    let first = &lists[0];
    let mut matched = Vec::new();

    'docs: for (i, &doc) in first.docs.iter().enumerate() {
        // Walk the phrase, shifting the live position set right by one.
        let mut live: Vec<u32> = first.positions[i].clone();
        for list in &lists[1..] {
            let Ok(j) = list.docs.binary_search(&doc) else {
                continue 'docs;
            };
            let positions = &list.positions[j];
            live = live
                .iter()
                .filter_map(|&p| {
                    let next = p + 1;
                    positions.binary_search(&next).ok().map(|_| next)
                })
                .collect();
            if live.is_empty() {
                continue 'docs;
            }
        }
        matched.push(doc);
    }
    matched
}

// =============================================================================
// SORTED-LIST ALGEBRA
// =============================================================================

fn intersect_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn union_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

// =============================================================================
// HIGHLIGHTS
// =============================================================================

/// Byte spans of query-matching tokens in the stored title and authors
/// strings. Exact bag and phrase tokens match verbatim; the terminal token of
/// a prefix query matches any token it prefixes.
fn build_highlight(record: &DocRecord, parsed: &ParsedQuery) -> Highlight {
    let mut exact: HashSet<&str> = parsed.tokens.iter().map(String::as_str).collect();
    for phrase in &parsed.phrases {
        exact.extend(phrase.iter().map(String::as_str));
    }
    let prefix = if parsed.last_is_prefix {
        parsed.tokens.last().map(String::as_str)
    } else {
        None
    };

    let spans_for = |text: &str| -> Vec<Span> {
        tokenize_spans(text)
            .into_iter()
            .filter(|token| {
                exact.contains(token.text.as_str())
                    || prefix.is_some_and(|p| token.text.starts_with(p))
            })
            .map(|token| Span {
                start: token.start,
                end: token.end,
            })
            .collect()
    };

    Highlight {
        title: spans_for(&record.title),
        authors: spans_for(&record.authors_str),
    }
}
