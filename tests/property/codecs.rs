//! Codec roundtrip properties: varints and posting lists.
//!
//! The load-bearing property is byte-exactness both ways: decode(encode(x))
//! must reproduce x, and encode(decode(bytes)) must reproduce bytes — the
//! engine relies on posting slices being canonical.

use proptest::prelude::*;
use refdex::binary::{
    decode_frequency, decode_positional, decode_varint, encode_frequency, encode_positional,
    encode_varint, MAX_VARINT_BYTES,
};

// ============================================================================
// STRATEGIES
// ============================================================================

/// Sorted, strictly increasing doc ids with strictly increasing positions.
fn positional_entries() -> impl Strategy<Value = Vec<(u32, Vec<u32>)>> {
    prop::collection::vec(
        (
            1u32..500,
            prop::collection::btree_set(0u32..200, 1..8),
        ),
        0..40,
    )
    .prop_map(|raw| {
        let mut doc = 0u32;
        raw.into_iter()
            .map(|(gap, positions)| {
                doc += gap;
                (doc, positions.into_iter().collect::<Vec<u32>>())
            })
            .collect()
    })
}

/// Sorted, strictly increasing doc ids with nonzero term frequencies.
fn frequency_entries() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((1u32..500, 1u32..50), 0..60).prop_map(|raw| {
        let mut doc = 0u32;
        raw.into_iter()
            .map(|(gap, tf)| {
                doc += gap;
                (doc, tf)
            })
            .collect()
    })
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn varint_roundtrip(value in any::<u64>()) {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        prop_assert!(buf.len() <= MAX_VARINT_BYTES);
        let (decoded, consumed) = decode_varint(&buf).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(consumed, buf.len());
    }

    #[test]
    fn positional_roundtrip(entries in positional_entries()) {
        let mut buf = Vec::new();
        encode_positional(&entries, &mut buf);

        let decoded = decode_positional(&buf).unwrap();
        let docs: Vec<u32> = entries.iter().map(|(doc, _)| *doc).collect();
        prop_assert_eq!(&decoded.docs, &docs);
        for (i, (_, positions)) in entries.iter().enumerate() {
            prop_assert_eq!(&decoded.positions[i], positions);
        }

        // Decoded docs are strictly increasing.
        prop_assert!(decoded.docs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn positional_reencode_is_byte_identical(entries in positional_entries()) {
        let mut original = Vec::new();
        encode_positional(&entries, &mut original);

        let decoded = decode_positional(&original).unwrap();
        let back: Vec<(u32, Vec<u32>)> = decoded
            .docs
            .iter()
            .copied()
            .zip(decoded.positions.iter().cloned())
            .collect();
        let mut reencoded = Vec::new();
        encode_positional(&back, &mut reencoded);
        prop_assert_eq!(reencoded, original);
    }

    #[test]
    fn frequency_roundtrip(entries in frequency_entries()) {
        let mut buf = Vec::new();
        encode_frequency(&entries, &mut buf);

        let decoded = decode_frequency(&buf).unwrap();
        let docs: Vec<u32> = entries.iter().map(|(doc, _)| *doc).collect();
        let tfs: Vec<u32> = entries.iter().map(|(_, tf)| *tf).collect();
        prop_assert_eq!(decoded.docs, docs);
        prop_assert_eq!(decoded.tfs, tfs);
    }

    #[test]
    fn frequency_reencode_is_byte_identical(entries in frequency_entries()) {
        let mut original = Vec::new();
        encode_frequency(&entries, &mut original);

        let decoded = decode_frequency(&original).unwrap();
        let back: Vec<(u32, u32)> = decoded
            .docs
            .iter()
            .copied()
            .zip(decoded.tfs.iter().copied())
            .collect();
        let mut reencoded = Vec::new();
        encode_frequency(&back, &mut reencoded);
        prop_assert_eq!(reencoded, original);
    }

    /// Truncating an encoded list never panics: it decodes to an error or a
    /// shorter valid list, never garbage memory.
    #[test]
    fn truncated_positional_never_panics(entries in positional_entries(), cut in 0usize..64) {
        let mut buf = Vec::new();
        encode_positional(&entries, &mut buf);
        if buf.is_empty() {
            return Ok(());
        }
        let cut = cut % buf.len();
        let _ = decode_positional(&buf[..cut]);
    }

    /// Arbitrary bytes never panic the decoders.
    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode_positional(&bytes);
        let _ = decode_frequency(&bytes);
        let _ = decode_varint(&bytes);
    }
}
