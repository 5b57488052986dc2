// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Runtime contracts for the block store and the query engine.
//!
//! Debug-mode assertions only: they compile to nothing in release builds.
//! A contract failure means a bug in this crate, never bad input; bad input
//! is reported through [`crate::Error`].
//!
//! | Contract                       | Checked after                          |
//! |--------------------------------|----------------------------------------|
//! | `check_parallel_lengths`       | block decode                           |
//! | `check_sorted`                 | multi-block sort, every intersection   |
//! | `check_block_range`            | block range resolution                 |
//! | `check_offsets_increasing`     | store open                             |

// ============================================================================
// COMPILE-TIME ASSERTIONS
// ============================================================================

/// Every Simple9 layout fills at most the 28 payload bits of a codeword,
/// and layouts are ordered from few wide values to many narrow ones.
const _: () = {
    use crate::binary::simple9::{CAPACITY, SELECTOR_COUNT, WIDTH};
    let mut i = 0;
    while i < SELECTOR_COUNT {
        assert!(CAPACITY[i] as u32 * WIDTH[i] <= 28);
        if i > 0 {
            assert!(WIDTH[i] < WIDTH[i - 1]);
            assert!(CAPACITY[i] > CAPACITY[i - 1]);
        }
        i += 1;
    }
};

use crate::search::resolve::BlockRange;
use crate::types::{PostingList, WordId, WordRange};

// ============================================================================
// POSTING LISTS
// ============================================================================

/// All present lists have as many entries as the doc-id list.
#[inline]
pub fn check_parallel_lengths(list: &PostingList) {
    let n = list.doc_ids.len();
    debug_assert_eq!(list.word_ids.len(), n, "Contract violation: word ids vs doc ids");
    if let Some(positions) = &list.positions {
        debug_assert_eq!(positions.len(), n, "Contract violation: positions vs doc ids");
    }
    if let Some(scores) = &list.scores {
        debug_assert_eq!(scores.len(), n, "Contract violation: scores vs doc ids");
    }
}

/// The list is sorted by `(doc id, position)`.
#[inline]
pub fn check_sorted(list: &PostingList) {
    if cfg!(debug_assertions) {
        for i in 1..list.len() {
            let prev = list.posting(i - 1);
            let curr = list.posting(i);
            debug_assert!(
                (prev.doc_id, prev.position) <= (curr.doc_id, curr.position),
                "Contract violation: posting {} ({}, {}) after ({}, {})",
                i,
                curr.doc_id,
                curr.position,
                prev.doc_id,
                prev.position
            );
        }
    }
}

// ============================================================================
// BLOCK STORE
// ============================================================================

/// The resolved blocks cover `range` and nothing more than they must.
#[inline]
pub fn check_block_range(boundaries: &[WordId], range: WordRange, blocks: &BlockRange) {
    debug_assert!(blocks.first <= blocks.last, "Contract violation: empty block range");
    debug_assert!(
        boundaries[blocks.first] <= range.first(),
        "Contract violation: block {} starts after word {}",
        blocks.first,
        range.first()
    );
    if let Some(&next) = boundaries.get(blocks.first + 1) {
        debug_assert!(
            range.first() < next,
            "Contract violation: word {} lies past block {}",
            range.first(),
            blocks.first
        );
    }
    debug_assert!(
        boundaries[blocks.last] <= range.last(),
        "Contract violation: block {} starts after word {}",
        blocks.last,
        range.last()
    );
}

/// Block offsets strictly increase.
#[inline]
pub fn check_offsets_increasing(offsets: &[u64]) {
    debug_assert!(
        offsets.windows(2).all(|w| w[0] < w[1]),
        "Contract violation: offsets not strictly increasing"
    );
}
