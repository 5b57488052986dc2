// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Simple9 word-aligned packing of small integers.
//!
//! Each 32-bit codeword spends 4 bits on a selector and 28 bits on payload.
//! The selector picks one of nine layouts, from one 28-bit value down to
//! twenty-eight 1-bit values. Values are packed least significant first and
//! codewords are written little-endian.
//!
//! The encoder is greedy: it tries layouts in order of increasing capacity
//! and stops at the first one that cannot hold the next run of values. The
//! layout before it is used.
//!
//! # References
//!
//! - Anh, Moffat (2005): "Inverted Index Compressed Using Word-Aligned Binary
//!   Codes", Information Retrieval 8(1).

use crate::error::{Error, Result};

use super::cursor::ByteCursor;

// ============================================================================
// LAYOUT TABLES
// ============================================================================

/// Number of selectors in use; 9..=15 are invalid.
pub const SELECTOR_COUNT: usize = 9;

/// Values per codeword, indexed by selector.
pub const CAPACITY: [usize; SELECTOR_COUNT] = [1, 2, 3, 4, 5, 7, 9, 14, 28];

/// Bits per value, indexed by selector.
pub const WIDTH: [u32; SELECTOR_COUNT] = [28, 14, 9, 7, 5, 4, 3, 2, 1];

/// Largest value each selector can store.
pub const MAX_FOR_SELECTOR: [u32; SELECTOR_COUNT] = [
    0x0FFF_FFFF,
    0x3FFF,
    0x1FF,
    0x7F,
    0x1F,
    0xF,
    0x7,
    0x3,
    0x1,
];

/// Largest value Simple9 can encode at all.
pub const MAX_VALUE: u32 = MAX_FOR_SELECTOR[0];

const SELECTOR_SHIFT: u32 = 28;

// ============================================================================
// ENCODING
// ============================================================================

/// Append the Simple9 encoding of `values` to `out`.
///
/// Returns the number of codewords written. Fails without writing anything
/// useful if a value exceeds [`MAX_VALUE`]; callers discard `out` on error.
pub fn encode_into(values: &[u32], out: &mut Vec<u8>) -> Result<usize> {
    let n = values.len();
    let mut next = 0;
    let mut words = 0;

    while next < n {
        if values[next] > MAX_VALUE {
            return Err(Error::ValueOutOfRange {
                value: u64::from(values[next]),
                max: u64::from(MAX_VALUE),
            });
        }

        let selector = pick_selector(&values[next..]);
        let take = CAPACITY[selector].min(n - next);
        let width = WIDTH[selector];

        let mut codeword: u32 = 0;
        for &v in values[next..next + take].iter().rev() {
            codeword = (codeword << width) | v;
        }
        codeword |= (selector as u32) << SELECTOR_SHIFT;

        out.extend_from_slice(&codeword.to_le_bytes());
        words += 1;
        next += take;
    }

    Ok(words)
}

/// Encode into a fresh buffer.
pub fn encode(values: &[u32]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(values.len());
    encode_into(values, &mut out)?;
    Ok(out)
}

/// Densest selector whose run of values all fit. `rest[0]` is known to fit
/// selector 0.
#[inline]
fn pick_selector(rest: &[u32]) -> usize {
    for selector in 1..SELECTOR_COUNT {
        let run = CAPACITY[selector].min(rest.len());
        let max = MAX_FOR_SELECTOR[selector];
        if rest[..run].iter().any(|&v| v > max) {
            return selector - 1;
        }
    }
    SELECTOR_COUNT - 1
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode exactly `count` values from `bytes`, appending them to `out`.
///
/// Returns the number of bytes consumed (a multiple of four). Unused bytes
/// after the last needed codeword are left alone.
pub fn decode_into(bytes: &[u8], count: usize, out: &mut Vec<u32>) -> Result<usize> {
    let mut cursor = ByteCursor::new(bytes);
    let mut produced = 0;
    out.reserve(count);

    while produced < count {
        let codeword = cursor.read_u32().map_err(|_| {
            Error::corrupt(format!(
                "simple9 stream ended after {} of {} values",
                produced, count
            ))
        })?;
        let selector = (codeword >> SELECTOR_SHIFT) as usize;
        if selector >= SELECTOR_COUNT {
            return Err(Error::corrupt(format!("invalid simple9 selector {}", selector)));
        }

        let width = WIDTH[selector];
        let mask = MAX_FOR_SELECTOR[selector];
        let take = CAPACITY[selector].min(count - produced);
        let mut payload = codeword & MAX_VALUE;
        for _ in 0..take {
            out.push(payload & mask);
            payload >>= width;
        }
        produced += take;
    }

    Ok(cursor.position())
}

/// Decode `count` values into a fresh vector.
pub fn decode(bytes: &[u8], count: usize) -> Result<Vec<u32>> {
    let mut out = Vec::with_capacity(count);
    decode_into(bytes, count, &mut out)?;
    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// KANI PROOFS
// ============================================================================

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Decoding any single codeword never panics and never yields a value
    /// wider than its selector allows.
    #[kani::proof]
    fn verify_decode_single_word_bounded() {
        let word: u32 = kani::any();
        let count: usize = kani::any();
        kani::assume(count >= 1 && count <= 28);

        let mut out = Vec::new();
        if decode_into(&word.to_le_bytes(), count, &mut out).is_ok() {
            let selector = (word >> 28) as usize;
            assert!(selector < SELECTOR_COUNT);
            assert!(out.len() <= CAPACITY[selector]);
            assert!(out.iter().all(|&v| v <= MAX_FOR_SELECTOR[selector]));
        }
    }

    /// Two encodable values survive encode then decode.
    #[kani::proof]
    #[kani::unwind(4)]
    fn verify_pair_roundtrip() {
        let a: u32 = kani::any();
        let b: u32 = kani::any();
        kani::assume(a <= MAX_VALUE && b <= MAX_VALUE);

        let bytes = encode(&[a, b]).unwrap();
        assert_eq!(decode(&bytes, 2).unwrap(), vec![a, b]);
    }
}
