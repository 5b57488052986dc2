// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the index layout parsers: offset table, boundary table,
//! metadata footer and block headers.

#![no_main]

use hybdex::IndexMode;
use hybdex::binary::ByteCursor;
use hybdex::binary::layout::{self, BlockHeader, Metadata};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, u64, u64, &[u8])| {
    let (flags, start, end, data) = input;

    if let Ok(offsets) = layout::parse_offsets(data) {
        assert!(offsets.len() >= 3);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    let nof_blocks = data.len() / layout::BOUNDARY_ENTRY_LEN;
    if let Ok(boundaries) = layout::parse_boundaries(data, nof_blocks, end) {
        assert_eq!(boundaries.len(), nof_blocks);
        assert_eq!(boundaries.first(), Some(&0));
        assert!(boundaries.windows(2).all(|w| w[0] < w[1]));
    }

    let _ = Metadata::from_bytes(data);

    let mode = match flags % 4 {
        0 => IndexMode::FULL,
        1 => IndexMode::DOCS_ONLY,
        2 => IndexMode {
            positions: false,
            scores: true,
            dups: true,
        },
        _ => IndexMode {
            positions: false,
            scores: false,
            dups: true,
        },
    };
    let mut cursor = ByteCursor::new(data);
    if let Ok(header) = BlockHeader::read(&mut cursor, mode) {
        if let Ok(spans) = header.spans(mode, start, end) {
            let block_len = end.saturating_sub(start);
            assert!(spans.doc.start as u64 <= block_len);
            assert!(spans.words.end as u64 <= block_len);
            assert_eq!(spans.positions.is_some(), mode.positions);
            assert_eq!(spans.scores.is_some(), mode.scores);
        }
    }
});
