//! Trailing-prefix behavior and the expansion cap.

use crate::common::{engine_over, keys, record};
use refdex::{SearchOptions, SourceRecord, PREFIX_EXPANSION_CAP};

#[test]
fn only_the_terminal_token_expands() {
    let (_dir, engine) = engine_over(&[
        record("A", "Bellare Encryption", &["X, X"], "CCS", 2000),
        record("B", "Bella Encryption", &["X, X"], "CCS", 2000),
    ]);

    // "bella" terminal: prefix — matches both records.
    let hits = engine
        .search("encryption bella", &SearchOptions::default())
        .unwrap();
    assert_eq!(hits.len(), 2);

    // "bella" non-terminal: exact — only B.
    let hits = engine
        .search("bella encryption", &SearchOptions::default())
        .unwrap();
    assert_eq!(keys(&hits), vec!["B"]);
}

#[test]
fn prefix_only_match_is_discounted() {
    let (_dir, engine) = engine_over(&[
        record("EXACT", "Bella Notte", &["X, X"], "CCS", 2000),
        record("PREFIX", "Bellare Bound", &["X, X"], "CCS", 2000),
    ]);
    let hits = engine.search("bella", &SearchOptions::default()).unwrap();
    assert_eq!(keys(&hits), vec!["EXACT", "PREFIX"]);
    assert!((hits[0].score - 3.0).abs() < 1e-9);
    assert!((hits[1].score - 3.0 * 0.8).abs() < 1e-9);
}

#[test]
fn exact_match_among_expansions_keeps_full_weight() {
    // One record contains both "bella" and "bellare" in the title: the
    // exact hit wins, no discount.
    let (_dir, engine) = engine_over(&[record(
        "BOTH",
        "Bella and Bellare",
        &["X, X"],
        "CCS",
        2000,
    )]);
    let hits = engine.search("bella", &SearchOptions::default()).unwrap();
    assert!((hits[0].score - 3.0).abs() < 1e-9);
}

#[test]
fn expansion_stops_at_the_cap() {
    // 300 distinct terms sharing the prefix "zz", one per record. Dictionary
    // order is zz000 < zz001 < …, so the cap keeps the first 128 records.
    let records: Vec<SourceRecord> = (0..300)
        .map(|i| {
            record(
                &format!("Z{i:03}"),
                &format!("zz{i:03} topic"),
                &["X, X"],
                "CCS",
                2000,
            )
        })
        .collect();
    let (_dir, engine) = engine_over(&records);

    let hits = engine
        .search(
            "zz",
            &SearchOptions {
                limit: 1000,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(hits.len(), PREFIX_EXPANSION_CAP);

    let mut matched: Vec<String> = hits.iter().map(|h| h.record.key.clone()).collect();
    matched.sort();
    assert_eq!(matched.first().map(String::as_str), Some("Z000"));
    assert_eq!(matched.last().map(String::as_str), Some("Z127"));
}

#[test]
fn quoted_query_never_prefix_matches() {
    let (_dir, engine) = engine_over(&[record("A", "Bellare Bound", &["X, X"], "CCS", 2000)]);
    let hits = engine
        .search("\"bella\"", &SearchOptions::default())
        .unwrap();
    assert!(hits.is_empty(), "phrases resolve exactly, never by prefix");
}

#[test]
fn prefix_shorter_than_map_key_still_expands() {
    let (_dir, engine) = engine_over(&[
        record("A", "Bellare Bound", &["X, X"], "CCS", 2000),
        record("B", "Benchmarks", &["X, X"], "CCS", 2001),
    ]);
    let hits = engine.search("be", &SearchOptions::default()).unwrap();
    assert_eq!(hits.len(), 2);
}
