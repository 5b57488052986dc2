// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the sub-list decoders: gap modes, the rank codebook and
//! window packing.
//!
//! Decoders see bytes straight from the index file. They must reject what
//! they cannot decode, and what they do decode must encode again.

#![no_main]

use arbitrary::Arbitrary;
use hybdex::binary::gaps::{self, GapMode};
use hybdex::binary::{window, zipf};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Codec {
    Raw,
    Gap,
    GapWithReset,
    Zipf,
    Window,
}

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    codec: Codec,
    count: u16,
    bytes: &'a [u8],
}

fn decode(codec: &Codec, bytes: &[u8], count: usize, out: &mut Vec<u32>) -> hybdex::Result<usize> {
    match codec {
        Codec::Raw => gaps::decode(bytes, count, GapMode::Raw, out),
        Codec::Gap => gaps::decode(bytes, count, GapMode::Gap, out),
        Codec::GapWithReset => gaps::decode(bytes, count, GapMode::GapWithReset, out),
        Codec::Zipf => zipf::decode(bytes, count, out),
        Codec::Window => window::decode(bytes, count, out),
    }
}

fn encode(codec: &Codec, values: &[u32], out: &mut Vec<u8>) -> hybdex::Result<usize> {
    match codec {
        Codec::Raw => gaps::encode(values, GapMode::Raw, out),
        Codec::Gap => gaps::encode(values, GapMode::Gap, out),
        Codec::GapWithReset => gaps::encode(values, GapMode::GapWithReset, out),
        Codec::Zipf => zipf::encode(values, out),
        Codec::Window => window::encode(values, out),
    }
}

fuzz_target!(|input: Input<'_>| {
    let count = usize::from(input.count);
    let mut values = Vec::new();
    let Ok(consumed) = decode(&input.codec, input.bytes, count, &mut values) else {
        return;
    };
    assert!(consumed <= input.bytes.len());
    assert_eq!(values.len(), count);

    // Decoded values can still be out of range for some encoders (a gap
    // stream may sum past 28 bits), so only check what encodes.
    let mut reencoded = Vec::new();
    if encode(&input.codec, &values, &mut reencoded).is_ok() {
        let mut again = Vec::new();
        decode(&input.codec, &reencoded, count, &mut again).expect("own output decodes");
        assert_eq!(again, values);
    }
});
