// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! On-disk layout of a hybrid index file.
//!
//! Everything is little endian. The file is written front to back in one
//! pass and read back to front: the last 8 bytes say where the offset table
//! starts, the offset table says where every block, the boundary table and
//! the metadata start.
//!
//! `BlockHeader` is the single source of truth for where the sub-lists of a
//! block live. The writer plans it from the encoded sub-list sizes and the
//! reader derives sub-list spans from it. Do not compute sub-list offsets
//! anywhere else.

use std::io::{self, Write};
use std::ops::Range;

use crate::error::{Error, Result};
use crate::types::{IndexMode, WordId};

use super::cursor::ByteCursor;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Size of the metadata footer: five u64 fields.
pub const METADATA_LEN: usize = 40;

/// Size of the trailing offset-table pointer.
pub const TRAILER_LEN: usize = 8;

/// Size of one absolute sub-list offset in a block header.
pub const SUB_OFFSET_LEN: usize = 8;

/// Size of the posting-count prefix of every sub-list.
pub const LEN_PREFIX: usize = 8;

/// Size of one boundary-table entry.
pub const BOUNDARY_ENTRY_LEN: usize = 4;

// ============================================================================
// SECURITY LIMITS (prevent resource exhaustion from malicious input)
// ============================================================================

/// Maximum number of blocks in one index.
pub const MAX_BLOCKS: u64 = 1 << 24;

/// Maximum posting count of one block.
pub const MAX_BLOCK_POSTINGS: u64 = 1 << 31;

/// Maximum byte size of one block.
pub const MAX_BLOCK_BYTES: u64 = 1 << 34;

/// Maximum number of entries in a frequency-rank codebook.
pub const MAX_CODEBOOK_LEN: u64 = 1 << 26;

// ============================================================================
// METADATA
// ============================================================================

/// Index-wide counters stored in the footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub max_doc_id: u64,
    pub nof_words: u64,
    pub nof_docs: u64,
    pub nof_word_in_doc_pairs: u64,
    pub nof_blocks: u64,
}

impl Metadata {
    pub const SIZE: usize = METADATA_LEN;

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.max_doc_id.to_le_bytes())?;
        w.write_all(&self.nof_words.to_le_bytes())?;
        w.write_all(&self.nof_docs.to_le_bytes())?;
        w.write_all(&self.nof_word_in_doc_pairs.to_le_bytes())?;
        w.write_all(&self.nof_blocks.to_le_bytes())?;
        Ok(())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(Error::corrupt(format!(
                "metadata footer is {} bytes, expected {}",
                bytes.len(),
                Self::SIZE
            )));
        }
        let mut cursor = ByteCursor::new(bytes);
        Ok(Self {
            max_doc_id: cursor.read_u64()?,
            nof_words: cursor.read_u64()?,
            nof_docs: cursor.read_u64()?,
            nof_word_in_doc_pairs: cursor.read_u64()?,
            nof_blocks: cursor.read_u64()?,
        })
    }
}

// ============================================================================
// BLOCK HEADER
// ============================================================================

/// Absolute file offsets of a block's sub-lists.
///
/// ```text
/// [doc u64][positions u64]?[words u64][scores u64]?
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub doc: u64,
    pub positions: Option<u64>,
    pub words: u64,
    pub scores: Option<u64>,
}

/// Byte spans of a block's sub-lists, relative to the block start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubListSpans {
    pub doc: Range<usize>,
    pub positions: Option<Range<usize>>,
    pub words: Range<usize>,
    pub scores: Option<Range<usize>>,
}

/// Encoded sizes of a block's sub-lists, length prefix included.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubListSizes {
    pub doc: usize,
    pub positions: Option<usize>,
    pub words: usize,
    pub scores: Option<usize>,
}

impl BlockHeader {
    /// Header size for `mode`.
    pub fn len(mode: IndexMode) -> usize {
        SUB_OFFSET_LEN * mode.lists_per_block()
    }

    /// Lay out the sub-lists of a block starting at `start`.
    pub fn plan(start: u64, mode: IndexMode, sizes: &SubListSizes) -> Self {
        let doc = start + Self::len(mode) as u64;
        let mut next = doc + sizes.doc as u64;
        let positions = mode.positions.then(|| {
            let at = next;
            next += sizes.positions.unwrap_or(0) as u64;
            at
        });
        let words = next;
        next += sizes.words as u64;
        let scores = mode.scores.then_some(next);
        Self {
            doc,
            positions,
            words,
            scores,
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.doc.to_le_bytes())?;
        if let Some(positions) = self.positions {
            w.write_all(&positions.to_le_bytes())?;
        }
        w.write_all(&self.words.to_le_bytes())?;
        if let Some(scores) = self.scores {
            w.write_all(&scores.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn read(cursor: &mut ByteCursor<'_>, mode: IndexMode) -> Result<Self> {
        let doc = cursor.read_u64()?;
        let positions = if mode.positions {
            Some(cursor.read_u64()?)
        } else {
            None
        };
        let words = cursor.read_u64()?;
        let scores = if mode.scores {
            Some(cursor.read_u64()?)
        } else {
            None
        };
        Ok(Self {
            doc,
            positions,
            words,
            scores,
        })
    }

    /// Resolve sub-list spans for a block occupying `[start, end)`.
    ///
    /// Offsets must be increasing, the doc list must follow the header
    /// directly and the last sub-list ends at the block end.
    pub fn spans(&self, mode: IndexMode, start: u64, end: u64) -> Result<SubListSpans> {
        let expected_doc = start
            .checked_add(Self::len(mode) as u64)
            .ok_or_else(|| Error::corrupt(format!("block start {} overflows", start)))?;
        if self.doc != expected_doc {
            return Err(Error::corrupt(format!(
                "doc list of block at {} starts at {}, expected {}",
                start, self.doc, expected_doc
            )));
        }

        let mut bounds = Vec::with_capacity(5);
        bounds.push(self.doc);
        bounds.extend(self.positions);
        bounds.push(self.words);
        bounds.extend(self.scores);
        bounds.push(end);
        if bounds.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::corrupt(format!(
                "sub-list offsets of block at {} are not increasing: {:?}",
                start, bounds
            )));
        }

        let rel = |i: usize| -> Range<usize> {
            (bounds[i] - start) as usize..(bounds[i + 1] - start) as usize
        };
        let mut i = 0;
        let doc = rel(i);
        i += 1;
        let positions = if mode.positions {
            let span = rel(i);
            i += 1;
            Some(span)
        } else {
            None
        };
        let words = rel(i);
        i += 1;
        let scores = mode.scores.then(|| rel(i));

        Ok(SubListSpans {
            doc,
            positions,
            words,
            scores,
        })
    }
}

// ============================================================================
// TABLES
// ============================================================================

/// Parse the byte-offset table: u64 entries, at least three, strictly increasing.
pub fn parse_offsets(bytes: &[u8]) -> Result<Vec<u64>> {
    if bytes.len() % 8 != 0 {
        return Err(Error::corrupt(format!(
            "offset table size {} is not a multiple of 8",
            bytes.len()
        )));
    }
    let count = bytes.len() / 8;
    if count < 3 {
        return Err(Error::corrupt(format!(
            "offset table has {} entries, need at least 3",
            count
        )));
    }
    if count as u64 > MAX_BLOCKS + 2 {
        return Err(Error::corrupt(format!(
            "offset table has {} entries, limit is {}",
            count,
            MAX_BLOCKS + 2
        )));
    }

    let mut cursor = ByteCursor::new(bytes);
    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(cursor.read_u64()?);
    }
    if let Some(i) = offsets.windows(2).position(|w| w[0] >= w[1]) {
        return Err(Error::corrupt(format!(
            "offset table not strictly increasing at entry {}: {} then {}",
            i + 1,
            offsets[i],
            offsets[i + 1]
        )));
    }
    Ok(offsets)
}

/// Parse the boundary table: `nof_blocks` ascending word ids starting at 0,
/// all below `nof_words`.
pub fn parse_boundaries(bytes: &[u8], nof_blocks: usize, nof_words: u64) -> Result<Vec<WordId>> {
    if bytes.len() != nof_blocks * BOUNDARY_ENTRY_LEN {
        return Err(Error::corrupt(format!(
            "boundary table is {} bytes, expected {} for {} blocks",
            bytes.len(),
            nof_blocks * BOUNDARY_ENTRY_LEN,
            nof_blocks
        )));
    }
    let mut cursor = ByteCursor::new(bytes);
    let mut boundaries = Vec::with_capacity(nof_blocks);
    for _ in 0..nof_blocks {
        boundaries.push(cursor.read_u32()?);
    }
    if boundaries.first() != Some(&0) {
        return Err(Error::corrupt("first block boundary is not word 0"));
    }
    if let Some(i) = boundaries.windows(2).position(|w| w[0] >= w[1]) {
        return Err(Error::corrupt(format!(
            "block boundaries not ascending at block {}",
            i + 1
        )));
    }
    if let Some(&last) = boundaries.last() {
        if u64::from(last) >= nof_words {
            return Err(Error::corrupt(format!(
                "last block boundary {} not below word count {}",
                last, nof_words
            )));
        }
    }
    Ok(boundaries)
}
