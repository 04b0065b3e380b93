//! Artifact emission: file set, determinism, atomicity, input handling.

use std::fs;
use std::io::Write;

use crate::common::{canonical_corpus, synthetic_corpus};
use refdex::{build_index, read_records, run_build, Engine, SearchOptions, Tier};
use tempfile::TempDir;

fn write_jsonl(dir: &TempDir, records: &[refdex::SourceRecord]) -> std::path::PathBuf {
    let path = dir.path().join("records.jsonl");
    let mut file = fs::File::create(&path).unwrap();
    for record in records {
        serde_json::to_writer(&mut file, record).unwrap();
        writeln!(file).unwrap();
    }
    path
}

#[test]
fn run_build_emits_every_artifact() {
    let dir = TempDir::new().unwrap();
    let input = write_jsonl(&dir, &canonical_corpus());
    let out = dir.path().join("artifacts");

    let summary = run_build(&input, &out).unwrap();
    assert_eq!(summary.num_docs, 4);

    for name in [
        "index.core.meta.json",
        "index.core.dict.bin",
        "index.core.ptrs.bin",
        "index.core.postings.bin",
        "index.ext.meta.json",
        "index.ext.dict.bin",
        "index.ext.ptrs.bin",
        "index.ext.postings.bin",
        "doc.index.bin",
        "doc.blob.bin",
        "idmap.json",
    ] {
        assert!(out.join(name).is_file(), "missing {name}");
    }

    // The emitted set loads and answers queries.
    let engine = Engine::open(&out).unwrap();
    let hits = engine.search("rogaway", &SearchOptions::default()).unwrap();
    assert_eq!(hits.len(), 3);
}

#[test]
fn rebuild_replaces_a_previous_artifact_set() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("artifacts");

    let input = write_jsonl(&dir, &canonical_corpus());
    run_build(&input, &out).unwrap();

    let smaller = write_jsonl(&dir, &canonical_corpus()[..2].to_vec());
    let summary = run_build(&smaller, &out).unwrap();
    assert_eq!(summary.num_docs, 2);

    let engine = Engine::open(&out).unwrap();
    assert!(engine.get_entry("K4").unwrap().is_none());
    assert!(engine.get_entry("K1").unwrap().is_some());
}

#[test]
fn builds_over_identical_input_are_byte_identical() {
    let records = synthetic_corpus(300);
    let a = build_index(&records).unwrap();
    let b = build_index(&records).unwrap();
    for ((name_a, bytes_a), (name_b, bytes_b)) in a.files().iter().zip(b.files()) {
        assert_eq!(name_a, name_b);
        assert_eq!(bytes_a, bytes_b, "{name_a} differs between builds");
    }
}

#[test]
fn jsonl_reader_reports_line_numbers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.jsonl");
    fs::write(
        &path,
        "{\"key\":\"K1\",\"title\":\"T\",\"authors\":[]}\nnot json\n",
    )
    .unwrap();

    let err = read_records(&path).unwrap_err();
    assert!(err.contains("line 2"), "got: {err}");
}

#[test]
fn out_of_range_year_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.jsonl");
    fs::write(
        &path,
        "{\"key\":\"K1\",\"title\":\"T\",\"authors\":[],\"year\":99}\n",
    )
    .unwrap();

    let err = read_records(&path).unwrap_err();
    assert!(err.contains("year"), "got: {err}");
}

#[test]
fn blank_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gaps.jsonl");
    fs::write(
        &path,
        "{\"key\":\"K1\",\"title\":\"T\",\"authors\":[]}\n\n\n{\"key\":\"K2\",\"title\":\"U\",\"authors\":[]}\n",
    )
    .unwrap();

    let records = read_records(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].key, "K2");
}

#[test]
fn empty_input_fails_the_build() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.jsonl");
    fs::write(&input, "").unwrap();
    let out = dir.path().join("artifacts");
    assert!(run_build(&input, &out).is_err());
    assert!(!out.exists());
}

#[test]
fn idmap_is_a_bijection_in_record_order() {
    let records = canonical_corpus();
    let built = build_index(&records).unwrap();
    let idmap_bytes = &built
        .files()
        .iter()
        .find(|(name, _)| name == "idmap.json")
        .unwrap()
        .1;
    let idmap: std::collections::BTreeMap<String, u32> =
        serde_json::from_slice(idmap_bytes).unwrap();

    assert_eq!(idmap.len(), 4);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(idmap[&record.key], i as u32);
    }
}

#[test]
fn meta_counts_match_the_dictionary() {
    let built = build_index(&canonical_corpus()).unwrap();
    let dir = TempDir::new().unwrap();
    built.write_to(dir.path()).unwrap();

    for tier in Tier::ALL {
        let meta: refdex::binary::TierMeta = serde_json::from_slice(
            &fs::read(dir.path().join(tier.meta_file())).unwrap(),
        )
        .unwrap();
        let (loaded, _) = refdex::LoadedTier::load(dir.path(), tier).unwrap();
        assert_eq!(meta.num_terms as usize, loaded.dict.len());
        assert_eq!(meta.version, "refdex-1");
    }
}
