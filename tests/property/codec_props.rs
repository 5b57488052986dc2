//! Codec property tests.
//!
//! - Simple9 decodes what it encodes, in whole 32-bit codewords
//! - Every gap mode inverts, including runs that reset
//! - The rank codebook and window packing invert for any value spread
//! - Decoders reject garbage with an error, never a panic

use proptest::prelude::*;

use hybdex::binary::gaps::{self, GapMode};
use hybdex::binary::{simple9, window, zipf};

fn simple9_value() -> impl Strategy<Value = u32> {
    prop_oneof![
        4 => 0u32..4,
        3 => 0u32..512,
        2 => 0u32..(1 << 14),
        1 => 0u32..=simple9::MAX_VALUE,
    ]
}

// ============================================================================
// SIMPLE9
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: decode(encode(v)) == v and every byte is consumed.
    #[test]
    fn prop_simple9_roundtrip(values in prop::collection::vec(simple9_value(), 0..300)) {
        let mut bytes = Vec::new();
        let words = simple9::encode_into(&values, &mut bytes).unwrap();
        prop_assert_eq!(bytes.len(), words * 4);
        prop_assert!(words <= values.len());

        let mut out = Vec::new();
        let consumed = simple9::decode_into(&bytes, values.len(), &mut out).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(out, values);
    }

    /// Property: one value above 28 bits fails the whole encode.
    #[test]
    fn prop_simple9_rejects_wide_values(
        mut values in prop::collection::vec(simple9_value(), 1..50),
        wide in (simple9::MAX_VALUE + 1)..=u32::MAX,
        at in any::<prop::sample::Index>(),
    ) {
        let i = at.index(values.len());
        values[i] = wide;
        prop_assert!(simple9::encode(&values).is_err());
    }

    /// Property: arbitrary bytes decode to an error or to `count` values.
    #[test]
    fn prop_simple9_garbage_never_panics(
        bytes in prop::collection::vec(any::<u8>(), 0..64),
        count in 0usize..100,
    ) {
        if let Ok(values) = simple9::decode(&bytes, count) {
            prop_assert_eq!(values.len(), count);
        }
    }
}

// ============================================================================
// GAP MODES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_raw_roundtrip(values in prop::collection::vec(simple9_value(), 0..200)) {
        let mut bytes = Vec::new();
        gaps::encode(&values, GapMode::Raw, &mut bytes).unwrap();
        let mut out = Vec::new();
        gaps::decode(&bytes, values.len(), GapMode::Raw, &mut out).unwrap();
        prop_assert_eq!(out, values);
    }

    /// Property: sorted values survive gap coding, equal neighbours included.
    #[test]
    fn prop_gap_roundtrip(mut values in prop::collection::vec(simple9_value(), 0..200)) {
        values.sort_unstable();
        let mut bytes = Vec::new();
        gaps::encode(&values, GapMode::Gap, &mut bytes).unwrap();
        let mut out = Vec::new();
        let consumed = gaps::decode(&bytes, values.len(), GapMode::Gap, &mut out).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(out, values);
    }

    /// Property: unsorted input is refused by plain gap coding.
    #[test]
    fn prop_gap_rejects_decrease(a in 1u32..1000, b in 0u32..1000) {
        prop_assume!(b < a);
        prop_assert!(gaps::to_gaps(&[a, b], GapMode::Gap).is_err());
    }

    /// Property: arbitrary sequences survive reset coding, with one reset
    /// marker per non-increasing step.
    #[test]
    fn prop_reset_roundtrip(values in prop::collection::vec(0u32..simple9::MAX_VALUE, 0..200)) {
        let codes = gaps::to_gaps(&values, GapMode::GapWithReset).unwrap();
        let resets = values.windows(2).filter(|w| w[1] <= w[0]).count();
        prop_assert_eq!(codes.iter().filter(|&&c| c == 0).count(), resets);
        prop_assert_eq!(codes.len(), values.len() + resets);
        prop_assert_eq!(
            gaps::from_gaps(&codes, values.len(), GapMode::GapWithReset).unwrap(),
            values.clone()
        );

        let mut bytes = Vec::new();
        gaps::encode(&values, GapMode::GapWithReset, &mut bytes).unwrap();
        let mut out = Vec::new();
        let consumed =
            gaps::decode(&bytes, values.len(), GapMode::GapWithReset, &mut out).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(out, values);
    }

    /// Property: positions within documents (reset at each new document)
    /// cost about one code per value.
    #[test]
    fn prop_reset_per_document(docs in prop::collection::vec(1usize..20, 1..20)) {
        let mut positions = Vec::new();
        for len in &docs {
            positions.extend((0..*len as u32).map(|p| p * 3));
        }
        let codes = gaps::to_gaps(&positions, GapMode::GapWithReset).unwrap();
        prop_assert_eq!(codes.len(), positions.len() + docs.len() - 1);
    }
}

// ============================================================================
// RANK CODEBOOK AND WINDOW PACKING
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Property: items spread over any offset decode back, ranks are dense.
    #[test]
    fn prop_zipf_roundtrip(
        base in 0u32..10_000_000,
        items in prop::collection::vec(0u32..2000, 0..300),
    ) {
        let items: Vec<u32> = items.iter().map(|i| base + i).collect();
        let mut bytes = Vec::new();
        let written = zipf::encode(&items, &mut bytes).unwrap();
        prop_assert_eq!(written, bytes.len());

        let mut out = Vec::new();
        let consumed = zipf::decode(&bytes, items.len(), &mut out).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(out, items);
    }

    /// Property: the most frequent item gets rank 0, so a skewed stream
    /// needs fewer codewords than its raw ids would.
    #[test]
    fn prop_zipf_frequent_item_first(hot in 0u32..500, n in 30usize..200) {
        let mut items = vec![hot; n];
        items.push(500);
        items.push(0);
        let mut bytes = Vec::new();
        zipf::encode(&items, &mut bytes).unwrap();
        // Header: min, max, then the rank-to-item table.
        let first_item = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        prop_assert_eq!(first_item, hot);
    }

    #[test]
    fn prop_window_roundtrip(values in prop::collection::vec(any::<u32>(), 0..200)) {
        let mut bytes = Vec::new();
        let written = window::encode(&values, &mut bytes).unwrap();
        let spread = match (values.iter().min(), values.iter().max()) {
            (Some(min), Some(max)) => max - min,
            _ => 0,
        };
        prop_assert_eq!(written, window::encoded_len(values.len(), window::width_for(spread)));

        let mut out = Vec::new();
        let consumed = window::decode(&bytes, values.len(), &mut out).unwrap();
        prop_assert_eq!(consumed, written);
        prop_assert_eq!(out, values);
    }

    /// Property: the width covers the spread, and only 28 or 32 bits are used past 26.
    #[test]
    fn prop_window_width(range: u32) {
        let width = window::width_for(range);
        prop_assert!((1..=32).contains(&width));
        prop_assert!(width != 27 && !(29..32).contains(&width));
        if width < 32 {
            prop_assert!(u64::from(range) < 1u64 << width);
        }
    }

    #[test]
    fn prop_window_garbage_never_panics(
        bytes in prop::collection::vec(any::<u8>(), 0..64),
        count in 0usize..64,
    ) {
        let mut out = Vec::new();
        if window::decode(&bytes, count, &mut out).is_ok() {
            prop_assert_eq!(out.len(), count);
        }
    }

    #[test]
    fn prop_zipf_garbage_never_panics(
        bytes in prop::collection::vec(any::<u8>(), 0..96),
        count in 0usize..64,
    ) {
        let mut out = Vec::new();
        if zipf::decode(&bytes, count, &mut out).is_ok() {
            prop_assert_eq!(out.len(), count);
        }
    }
}
