// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Word range to block range.
//!
//! Block `i` holds the words `[boundary[i], boundary[i + 1])`; the last block
//! runs to the end of the vocabulary. Two binary searches find the blocks a
//! range touches, and two comparisons tell whether the range covers the first
//! and last of them completely. A block that is entirely inside the range
//! needs no per-posting word-id filter.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::types::{BlockId, WordId, WordRange};

/// Blocks overlapping a word range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub first: BlockId,
    pub last: BlockId,
    /// The range starts exactly at the first block's boundary.
    pub starts_exactly: bool,
    /// The range ends exactly at the last block's end.
    pub ends_exactly: bool,
}

impl BlockRange {
    pub fn blocks(&self) -> RangeInclusive<BlockId> {
        self.first..=self.last
    }

    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// True when every word of block `b` lies inside the queried range.
    pub fn whole_block_in_range(&self, b: BlockId) -> bool {
        let (first, last) = (self.first, self.last);
        (b == first && self.starts_exactly && last > first)
            || (first < b && b < last)
            || (b == last && first < last && self.ends_exactly)
            || (first == last && b == first && self.starts_exactly && self.ends_exactly)
    }
}

/// Find the blocks covering `range`.
///
/// `boundaries` must start at 0 and be strictly ascending; `range.last()`
/// must be below `nof_words`.
pub fn resolve_block_range(
    boundaries: &[WordId],
    nof_words: u64,
    range: WordRange,
) -> Result<BlockRange> {
    if boundaries.first() != Some(&0) {
        return Err(Error::corrupt("block boundaries must start at word 0"));
    }
    if u64::from(range.last()) >= nof_words {
        return Err(Error::invalid(format!(
            "word range {} beyond vocabulary of {} words",
            range, nof_words
        )));
    }

    // boundaries[0] == 0 <= first, so both searches find at least one block.
    let first = boundaries.partition_point(|&b| b <= range.first()) - 1;
    let last = boundaries.partition_point(|&b| b <= range.last()) - 1;

    let last_end = boundaries
        .get(last + 1)
        .map_or(nof_words, |&b| u64::from(b));

    Ok(BlockRange {
        first,
        last,
        starts_exactly: range.first() == boundaries[first],
        ends_exactly: u64::from(range.last()) + 1 == last_end,
    })
}
