//! Phrase matching: adjacency, field scope, quote handling.

use crate::common::{canonical_engine, engine_over, keys, record};
use refdex::{tokenize, SearchOptions};

#[test]
fn phrase_requires_adjacency() {
    let (_dir, engine) = engine_over(&[
        record("ADJ", "Secure Channels Revisited", &["A, A"], "CCS", 2001),
        record("GAP", "Secure and Composable Channels", &["A, A"], "CCS", 2001),
    ]);
    let hits = engine
        .search("\"secure channels\"", &SearchOptions::default())
        .unwrap();
    // "and" is a stopword so GAP's surviving token stream is
    // [secure, composable, channels] — still not adjacent.
    assert_eq!(keys(&hits), vec!["ADJ"]);
}

#[test]
fn stopwords_do_not_break_adjacency() {
    // "Proofs of Knowledge": "of" drops out at index time AND in the query,
    // so the phrase "proofs knowledge" matches.
    let (_dir, engine) = engine_over(&[record(
        "POK",
        "Proofs of Knowledge",
        &["Bellare, M"],
        "CRYPTO",
        1992,
    )]);
    let hits = engine
        .search("\"proofs of knowledge\"", &SearchOptions::default())
        .unwrap();
    assert_eq!(keys(&hits), vec!["POK"]);
}

#[test]
fn phrase_matches_in_authors_too() {
    let (_dir, engine) = canonical_engine();
    let hits = engine
        .search("\"bellare m\"", &SearchOptions::default())
        .unwrap();
    assert_eq!(keys(&hits), vec!["K2"]);
}

#[test]
fn every_phrase_hit_contains_the_phrase() {
    let (_dir, engine) = engine_over(&crate::common::synthetic_corpus(500));
    let hits = engine
        .search("\"lattice protocol\"", &SearchOptions { limit: 1000, ..Default::default() })
        .unwrap();
    for hit in &hits {
        let title_tokens = tokenize(&hit.record.title);
        let author_tokens = tokenize(&hit.record.authors_str);
        let contains = |tokens: &[String]| {
            tokens
                .windows(2)
                .any(|w| w[0] == "lattice" && w[1] == "protocol")
        };
        assert!(
            contains(&title_tokens) || contains(&author_tokens),
            "{} does not contain the phrase",
            hit.record.key
        );
    }
}

#[test]
fn phrase_with_unknown_word_matches_nothing() {
    let (_dir, engine) = canonical_engine();
    let hits = engine
        .search("\"authenticated zzz\"", &SearchOptions::default())
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn phrase_never_matches_across_field_boundaries() {
    // Title ends with "encryption", authors begin with "rogaway" — the
    // phrase "encryption rogaway" must not match across the seam.
    let (_dir, engine) = engine_over(&[record(
        "SEAM",
        "Authenticated Encryption",
        &["Rogaway, P"],
        "CCS",
        2002,
    )]);
    let hits = engine
        .search("\"encryption rogaway\"", &SearchOptions::default())
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn unbalanced_quote_degrades_to_bag_tokens() {
    let (_dir, engine) = canonical_engine();
    // As a phrase "knowledge zero" matches nothing (wrong order); as bag
    // tokens it finds K2.
    let hits = engine
        .search("\"knowledge zero", &SearchOptions::default())
        .unwrap();
    assert_eq!(keys(&hits), vec!["K2"]);

    let as_phrase = engine
        .search("\"knowledge zero\"", &SearchOptions::default())
        .unwrap();
    assert!(as_phrase.is_empty());
}

#[test]
fn repeated_word_phrase() {
    let (_dir, engine) = engine_over(&[
        record("RR", "Random Random Oracles", &["A, A"], "CCS", 2004),
        record("R", "Random Oracles", &["A, A"], "CCS", 2004),
    ]);
    let hits = engine
        .search("\"random random\"", &SearchOptions::default())
        .unwrap();
    assert_eq!(keys(&hits), vec!["RR"]);
}

#[test]
fn multiple_phrases_all_must_match() {
    let (_dir, engine) = canonical_engine();
    let hits = engine
        .search(
            "\"zero knowledge\" \"bellare m\"",
            &SearchOptions::default(),
        )
        .unwrap();
    assert_eq!(keys(&hits), vec!["K2"]);

    let hits = engine
        .search(
            "\"zero knowledge\" \"lattice signatures\"",
            &SearchOptions::default(),
        )
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn phrase_bonus_prefers_title_over_authors() {
    // The same phrase appears in one record's title and another's authors.
    let (_dir, engine) = engine_over(&[
        record("AUTH", "Generic Paper", &["Galois, E"], "CCS", 2001),
        record("TITL", "On Galois Theory", &["Someone, S"], "CCS", 2001),
    ]);
    let hits = engine
        .search("\"galois\"", &SearchOptions::default())
        .unwrap();
    assert_eq!(keys(&hits), vec!["TITL", "AUTH"]);
    assert!(hits[0].score > hits[1].score);
}
