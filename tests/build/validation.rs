//! Loader validation: every artifact corruption mode must be refused.

use std::fs;
use std::path::Path;

use crate::common::canonical_corpus;
use refdex::{build_index, Engine, EngineError, LoadedTier, Tier};
use tempfile::TempDir;

fn built_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    build_index(&canonical_corpus())
        .unwrap()
        .write_to(dir.path())
        .unwrap();
    dir
}

fn flip_byte(path: &Path, at: usize) {
    let mut bytes = fs::read(path).unwrap();
    bytes[at] ^= 0xFF;
    fs::write(path, bytes).unwrap();
}

#[test]
fn every_core_artifact_is_checksummed() {
    for name in [
        Tier::Core.dict_file(),
        Tier::Core.ptrs_file(),
        Tier::Core.postings_file(),
        "doc.index.bin".to_string(),
        "doc.blob.bin".to_string(),
    ] {
        let dir = built_dir();
        flip_byte(&dir.path().join(&name), 10);
        let err = Engine::open(dir.path()).unwrap_err();
        assert!(
            matches!(err, EngineError::Load(_)),
            "{name}: expected load error, got {err}"
        );
        assert!(
            err.to_string().contains("checksum mismatch"),
            "{name}: {err}"
        );
    }
}

#[test]
fn truncated_dictionary_is_refused() {
    let dir = built_dir();
    let path = dir.path().join(Tier::Core.dict_file());
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();
    assert!(Engine::open(dir.path()).is_err());
}

#[test]
fn meta_term_count_mismatch_is_refused() {
    let dir = built_dir();
    let path = dir.path().join(Tier::Core.meta_file());
    let mut meta: refdex::binary::TierMeta =
        serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    meta.num_terms += 1;
    fs::write(&path, serde_json::to_vec(&meta).unwrap()).unwrap();

    let err = Engine::open(dir.path()).unwrap_err();
    assert!(err.to_string().contains("terms"), "got: {err}");
}

#[test]
fn meta_doc_count_mismatch_is_refused() {
    let dir = built_dir();
    let path = dir.path().join(Tier::Core.meta_file());
    let mut meta: refdex::binary::TierMeta =
        serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    meta.num_docs = Some(meta.num_docs.unwrap() + 1);
    fs::write(&path, serde_json::to_vec(&meta).unwrap()).unwrap();
    assert!(Engine::open(dir.path()).is_err());
}

#[test]
fn malformed_meta_json_is_refused() {
    let dir = built_dir();
    fs::write(dir.path().join(Tier::Core.meta_file()), b"{ not json").unwrap();
    assert!(Engine::open(dir.path()).is_err());
}

#[test]
fn diagnostics_name_the_artifact_and_version() {
    let dir = built_dir();
    // Shrink the pointer table so structural validation fails after the
    // checksum is recomputed to match.
    let ptrs_path = dir.path().join(Tier::Core.ptrs_file());
    let ptrs = fs::read(&ptrs_path).unwrap();
    let shortened = &ptrs[..ptrs.len() - 8];
    fs::write(&ptrs_path, shortened).unwrap();

    let meta_path = dir.path().join(Tier::Core.meta_file());
    let mut meta: refdex::binary::TierMeta =
        serde_json::from_slice(&fs::read(&meta_path).unwrap()).unwrap();
    meta.checksums
        .insert(Tier::Core.ptrs_file(), refdex::binary::checksum(shortened));
    fs::write(&meta_path, serde_json::to_vec(&meta).unwrap()).unwrap();

    let err = LoadedTier::load(dir.path(), Tier::Core).unwrap_err();
    let detail = err.to_string();
    assert!(detail.contains("index.core.ptrs.bin"), "got: {detail}");
    assert!(detail.contains("refdex-1"), "got: {detail}");
}

#[test]
fn idmap_corruption_is_refused() {
    let dir = built_dir();
    let path = dir.path().join("idmap.json");
    // Map two keys to the same id.
    fs::write(&path, br#"{"K1":0,"K2":0,"K3":2,"K4":3}"#).unwrap();
    let err = Engine::open(dir.path()).unwrap_err();
    assert!(err.to_string().contains("bijection"), "got: {err}");
}

#[test]
fn extended_tier_validates_independently() {
    let dir = built_dir();
    flip_byte(&dir.path().join(Tier::Extended.postings_file()), 0);

    // Core init succeeds; only the lazy extended load fails.
    let engine = Engine::open(dir.path()).unwrap();
    let err = engine
        .search(
            "rogaway",
            &refdex::SearchOptions {
                use_extended: true,
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Load(_)));
}
