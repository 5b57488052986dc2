// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the Simple9 word codec.
//!
//! Every sub-list of a block ends in Simple9 codewords, so a panic here is
//! a panic on any corrupt index.

#![no_main]

use hybdex::binary::simple9;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u16, Vec<u32>, &[u8])| {
    let (count, values, garbage) = input;

    // Garbage decodes to an error or to exactly `count` values.
    if let Ok(decoded) = simple9::decode(garbage, usize::from(count)) {
        assert_eq!(decoded.len(), usize::from(count));
    }

    // Values that fit 28 bits survive a roundtrip in whole codewords.
    let values: Vec<u32> = values.iter().map(|v| v & simple9::MAX_VALUE).collect();
    let encoded = simple9::encode(&values).expect("28-bit values always encode");
    assert_eq!(encoded.len() % 4, 0);
    let decoded = simple9::decode(&encoded, values.len()).expect("own output decodes");
    assert_eq!(decoded, values);
});
