// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Append-only index writer.
//!
//! Blocks are encoded into a buffer, checked, and written in one piece. The
//! tables go out in `finalize`, after the last block.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::binary::gaps::{self, GapMode};
use crate::binary::layout::{BlockHeader, Metadata, SubListSizes, LEN_PREFIX};
use crate::binary::zipf;
use crate::error::{Error, Result};
use crate::types::{DiskScore, DocId, IndexMode, Position, PostingList, WordId};

/// One block's postings, ready to encode.
///
/// Postings must be sorted by doc id. Positions and scores are present
/// exactly when the index mode has them.
#[derive(Debug, Clone, Copy)]
pub struct BlockLists<'a> {
    pub doc_ids: &'a [DocId],
    pub word_ids: &'a [WordId],
    pub positions: Option<&'a [Position]>,
    pub scores: Option<&'a [DiskScore]>,
}

impl BlockLists<'_> {
    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }
}

/// Byte counts of everything written so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteStats {
    pub blocks: u64,
    pub postings: u64,
    pub doc_bytes: u64,
    pub position_bytes: u64,
    pub word_bytes: u64,
    pub score_bytes: u64,
    pub header_bytes: u64,
    pub table_bytes: u64,
    pub total_bytes: u64,
}

impl WriteStats {
    /// Bits per posting spent on `bytes`.
    pub fn bits_per_posting(&self, bytes: u64) -> f64 {
        if self.postings == 0 {
            0.0
        } else {
            (bytes * 8) as f64 / self.postings as f64
        }
    }
}

pub struct IndexWriter<W: Write> {
    out: W,
    mode: IndexMode,
    /// Start of every block so far, plus the current end.
    offsets: Vec<u64>,
    boundaries: Vec<WordId>,
    max_word_id: Option<WordId>,
    block_buf: Vec<u8>,
    stats: WriteStats,
}

impl IndexWriter<BufWriter<File>> {
    /// Create (or truncate) an index file.
    pub fn create(path: impl AsRef<Path>, mode: IndexMode) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file), mode))
    }
}

impl<W: Write> IndexWriter<W> {
    pub fn new(out: W, mode: IndexMode) -> Self {
        Self {
            out,
            mode,
            offsets: vec![0],
            boundaries: Vec::new(),
            max_word_id: None,
            block_buf: Vec::new(),
            stats: WriteStats::default(),
        }
    }

    pub fn mode(&self) -> IndexMode {
        self.mode
    }

    pub fn blocks_written(&self) -> usize {
        self.boundaries.len()
    }

    pub fn stats(&self) -> &WriteStats {
        &self.stats
    }

    fn position(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Encode and write one block.
    pub fn append_block(&mut self, block: BlockLists<'_>) -> Result<()> {
        let block_min_word = self.validate(&block)?;
        let start = self.position();
        let n = block.len();

        let mut doc = Vec::with_capacity(n + LEN_PREFIX);
        doc.extend_from_slice(&(n as u64).to_le_bytes());
        gaps::encode(block.doc_ids, GapMode::Gap, &mut doc)?;

        let positions = match block.positions {
            Some(positions) => {
                let mut buf = Vec::with_capacity(n + 2 * LEN_PREFIX);
                buf.extend_from_slice(&(n as u64).to_le_bytes());
                gaps::encode(positions, GapMode::GapWithReset, &mut buf)?;
                Some(buf)
            }
            None => None,
        };

        let mut words = Vec::with_capacity(n + LEN_PREFIX);
        words.extend_from_slice(&(n as u64).to_le_bytes());
        zipf::encode(block.word_ids, &mut words)?;

        let scores = block.scores.map(|scores| {
            let mut buf = Vec::with_capacity(n + LEN_PREFIX);
            buf.extend_from_slice(&(n as u64).to_le_bytes());
            buf.extend_from_slice(scores);
            buf
        });

        let sizes = SubListSizes {
            doc: doc.len(),
            positions: positions.as_ref().map(Vec::len),
            words: words.len(),
            scores: scores.as_ref().map(Vec::len),
        };
        let header = BlockHeader::plan(start, self.mode, &sizes);

        self.block_buf.clear();
        header.write(&mut self.block_buf)?;
        self.block_buf.extend_from_slice(&doc);
        if let Some(positions) = &positions {
            self.block_buf.extend_from_slice(positions);
        }
        self.block_buf.extend_from_slice(&words);
        if let Some(scores) = &scores {
            self.block_buf.extend_from_slice(scores);
        }
        let end = start + self.block_buf.len() as u64;

        #[cfg(debug_assertions)]
        self.verify_block(&block, start, end)?;

        self.out.write_all(&self.block_buf)?;
        self.offsets.push(end);
        self.max_word_id = block.word_ids.iter().copied().max();
        self.boundaries.push(if self.boundaries.is_empty() {
            0
        } else {
            block_min_word
        });

        self.stats.blocks += 1;
        self.stats.postings += n as u64;
        self.stats.header_bytes += BlockHeader::len(self.mode) as u64;
        self.stats.doc_bytes += doc.len() as u64;
        self.stats.position_bytes += sizes.positions.unwrap_or(0) as u64;
        self.stats.word_bytes += words.len() as u64;
        self.stats.score_bytes += sizes.scores.unwrap_or(0) as u64;
        self.stats.total_bytes = end;

        debug!(
            block = self.boundaries.len() - 1,
            postings = n,
            bytes = end - start,
            "wrote block"
        );
        Ok(())
    }

    /// Check a block against the mode and the previous blocks. Returns the
    /// block's smallest word id.
    fn validate(&self, block: &BlockLists<'_>) -> Result<WordId> {
        let n = block.len();
        if n == 0 {
            return Err(Error::invalid("cannot write an empty block"));
        }
        if block.word_ids.len() != n {
            return Err(Error::invalid(format!(
                "block has {} doc ids but {} word ids",
                n,
                block.word_ids.len()
            )));
        }
        if block.positions.is_some() != self.mode.positions {
            return Err(Error::invalid(format!(
                "positions present: {}, index mode {}",
                block.positions.is_some(),
                self.mode
            )));
        }
        if block.scores.is_some() != self.mode.scores {
            return Err(Error::invalid(format!(
                "scores present: {}, index mode {}",
                block.scores.is_some(),
                self.mode
            )));
        }
        if block.positions.is_some_and(|p| p.len() != n) || block.scores.is_some_and(|s| s.len() != n)
        {
            return Err(Error::invalid("block lists have different lengths"));
        }
        if let Some(i) = block.doc_ids.windows(2).position(|w| w[0] > w[1]) {
            return Err(Error::invalid(format!(
                "block doc ids not sorted at posting {}",
                i + 1
            )));
        }
        if !self.mode.dups {
            let mut seen = HashSet::new();
            for i in 0..n {
                if i > 0 && block.doc_ids[i] != block.doc_ids[i - 1] {
                    seen.clear();
                }
                if !seen.insert(block.word_ids[i]) {
                    return Err(Error::invalid(format!(
                        "word {} repeated in doc {} of an index without duplicates",
                        block.word_ids[i], block.doc_ids[i]
                    )));
                }
            }
        }

        let min_word = block.word_ids.iter().copied().min().unwrap_or(0);
        if let Some(prev_max) = self.max_word_id {
            if min_word <= prev_max {
                return Err(Error::invalid(format!(
                    "block starts at word {} but previous blocks reach word {}",
                    min_word, prev_max
                )));
            }
        }
        Ok(min_word)
    }

    #[cfg(debug_assertions)]
    fn verify_block(&self, block: &BlockLists<'_>, start: u64, end: u64) -> Result<()> {
        let mut decoded = PostingList::new(self.mode);
        super::reader::decode_block(&self.block_buf, start, end, self.mode, None, &mut decoded)?;
        let scores_match = match (block.scores, &decoded.scores) {
            (Some(expected), Some(got)) => expected
                .iter()
                .zip(got)
                .all(|(&e, &g)| u32::from(e) == g),
            (None, None) => true,
            _ => false,
        };
        let matches = decoded.doc_ids == block.doc_ids
            && decoded.word_ids == block.word_ids
            && decoded.positions.as_deref() == block.positions
            && scores_match;
        if !matches {
            return Err(Error::corrupt(format!(
                "block at {} does not decode back to its input",
                start
            )));
        }
        Ok(())
    }

    /// Write the tables and trailer. Returns the final statistics.
    pub fn finalize(mut self, metadata: Metadata) -> Result<WriteStats> {
        let nof_blocks = self.boundaries.len();
        if nof_blocks == 0 {
            return Err(Error::invalid("an index needs at least one block"));
        }
        if metadata.nof_blocks != nof_blocks as u64 {
            return Err(Error::invalid(format!(
                "metadata says {} blocks, wrote {}",
                metadata.nof_blocks, nof_blocks
            )));
        }
        if let Some(max_word) = self.max_word_id {
            if u64::from(max_word) >= metadata.nof_words {
                return Err(Error::invalid(format!(
                    "word id {} not below word count {}",
                    max_word, metadata.nof_words
                )));
            }
        }

        let blocks_end = self.position();
        let mut tail = Vec::with_capacity(nof_blocks * 12 + 64);
        for &boundary in &self.boundaries {
            tail.extend_from_slice(&boundary.to_le_bytes());
        }
        self.offsets.push(blocks_end + tail.len() as u64);
        metadata.write(&mut tail)?;

        let table_start = blocks_end + tail.len() as u64;
        for &offset in &self.offsets {
            tail.extend_from_slice(&offset.to_le_bytes());
        }
        tail.extend_from_slice(&table_start.to_le_bytes());

        self.out.write_all(&tail)?;
        self.out.flush()?;

        self.stats.table_bytes = tail.len() as u64;
        self.stats.total_bytes = blocks_end + tail.len() as u64;
        debug!(
            blocks = nof_blocks,
            bytes = self.stats.total_bytes,
            "finalized index"
        );
        Ok(self.stats)
    }
}

/// Convert in-memory scores to their on-disk byte, clamping at 255.
pub fn disk_scores(list: &PostingList) -> Option<Vec<DiskScore>> {
    list.scores
        .as_ref()
        .map(|scores| scores.iter().map(|&s| s.min(255) as DiskScore).collect())
}
