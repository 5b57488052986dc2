// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Read side of the block store.
//!
//! `BlockStore` owns the file handle and the three small tables (offsets,
//! boundaries, metadata). It is immutable after `open` and shared by every
//! query worker. `BlockReader` is the per-worker half: it owns a scratch
//! buffer and turns block ids into posting lists.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::binary::cursor::ByteCursor;
use crate::binary::gaps::{self, GapMode};
use crate::binary::layout::{
    self, BlockHeader, Metadata, MAX_BLOCK_BYTES, MAX_BLOCK_POSTINGS, TRAILER_LEN,
};
use crate::binary::scratch::ScratchBuffer;
use crate::binary::zipf;
use crate::contracts;
use crate::error::{Error, Result};
use crate::search::resolve::{resolve_block_range, BlockRange};
use crate::types::{BlockId, IndexMode, PostingList, Score, WordId, WordRange};

use super::file::IndexFile;
use super::scores::ScoreOverride;

// ============================================================================
// BLOCK STORE
// ============================================================================

#[derive(Debug)]
pub struct BlockStore {
    file: IndexFile,
    mode: IndexMode,
    offsets: Vec<u64>,
    boundaries: Vec<WordId>,
    metadata: Metadata,
    score_override: Option<Arc<dyn ScoreOverride>>,
}

impl BlockStore {
    /// Open an index built with `mode` and load its tables.
    pub fn open(path: impl AsRef<Path>, mode: IndexMode) -> Result<Self> {
        let file = IndexFile::open(path)?;
        let len = file.len();
        if len < TRAILER_LEN as u64 {
            return Err(Error::corrupt(format!(
                "index file is {} bytes, too small for a trailer",
                len
            )));
        }

        let trailer_start = len - TRAILER_LEN as u64;
        let mut trailer = [0u8; TRAILER_LEN];
        file.read_at(trailer_start, &mut trailer)?;
        let table_start = u64::from_le_bytes(trailer);
        if table_start >= trailer_start {
            return Err(Error::corrupt(format!(
                "offset table start {} not before trailer at {}",
                table_start, trailer_start
            )));
        }

        let offsets = layout::parse_offsets(&file.read_range(table_start, trailer_start)?)?;
        let n = offsets.len();
        let metadata_start = offsets[n - 1];
        if metadata_start > table_start {
            return Err(Error::corrupt(format!(
                "metadata start {} after offset table at {}",
                metadata_start, table_start
            )));
        }
        let metadata = Metadata::from_bytes(&file.read_range(metadata_start, table_start)?)?;

        let nof_blocks = n - 2;
        if metadata.nof_blocks != nof_blocks as u64 {
            return Err(Error::corrupt(format!(
                "metadata lists {} blocks, offset table has {}",
                metadata.nof_blocks, nof_blocks
            )));
        }
        let boundaries = layout::parse_boundaries(
            &file.read_range(offsets[n - 2], offsets[n - 1])?,
            nof_blocks,
            metadata.nof_words,
        )?;
        contracts::check_offsets_increasing(&offsets);

        info!(
            path = %file.path().display(),
            blocks = nof_blocks,
            words = metadata.nof_words,
            docs = metadata.nof_docs,
            mode = %mode,
            "opened index"
        );

        Ok(Self {
            file,
            mode,
            offsets,
            boundaries,
            metadata,
            score_override: None,
        })
    }

    /// Install a read-time score override.
    pub fn with_score_override(mut self, score_override: Arc<dyn ScoreOverride>) -> Self {
        self.score_override = Some(score_override);
        self
    }

    pub fn set_score_override(&mut self, score_override: Option<Arc<dyn ScoreOverride>>) {
        self.score_override = score_override;
    }

    pub fn mode(&self) -> IndexMode {
        self.mode
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn boundaries(&self) -> &[WordId] {
        &self.boundaries
    }

    pub fn nof_blocks(&self) -> usize {
        self.boundaries.len()
    }

    pub fn nof_words(&self) -> u64 {
        self.metadata.nof_words
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Byte span `[start, end)` of block `id`.
    pub fn block_span(&self, id: BlockId) -> Result<(u64, u64)> {
        if id >= self.nof_blocks() {
            return Err(Error::invalid(format!(
                "block {} out of range ({} blocks)",
                id,
                self.nof_blocks()
            )));
        }
        Ok((self.offsets[id], self.offsets[id + 1]))
    }

    /// Word ids `[first, end)` owned by block `id`.
    pub fn block_words(&self, id: BlockId) -> Result<(WordId, u64)> {
        self.block_span(id)?;
        let end = self
            .boundaries
            .get(id + 1)
            .map_or(self.metadata.nof_words, |&b| u64::from(b));
        Ok((self.boundaries[id], end))
    }

    /// Blocks covering `range`.
    pub fn resolve(&self, range: WordRange) -> Result<BlockRange> {
        let blocks = resolve_block_range(&self.boundaries, self.metadata.nof_words, range)?;
        contracts::check_block_range(&self.boundaries, range, &blocks);
        if blocks.last + 2 >= self.offsets.len() {
            return Err(Error::corrupt(format!(
                "block {} has no entry in an offset table of {}",
                blocks.last,
                self.offsets.len()
            )));
        }
        Ok(blocks)
    }

    /// Decode block `id` into a fresh list.
    pub fn read_block(&self, id: BlockId) -> Result<PostingList> {
        let mut list = PostingList::new(self.mode);
        self.reader().read_into(id, &mut list)?;
        Ok(list)
    }

    /// A reader with its own scratch buffer.
    pub fn reader(&self) -> BlockReader<'_> {
        BlockReader::new(self)
    }
}

// ============================================================================
// BLOCK READER
// ============================================================================

/// What one block read cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockReadInfo {
    pub bytes: u64,
    pub postings: usize,
    pub read_time: Duration,
    pub decode_time: Duration,
    pub scratch_grew: bool,
}

#[derive(Debug)]
pub struct BlockReader<'a> {
    store: &'a BlockStore,
    scratch: ScratchBuffer,
}

impl<'a> BlockReader<'a> {
    pub fn new(store: &'a BlockStore) -> Self {
        Self {
            store,
            scratch: ScratchBuffer::new(),
        }
    }

    pub fn store(&self) -> &'a BlockStore {
        self.store
    }

    pub fn scratch(&self) -> &ScratchBuffer {
        &self.scratch
    }

    /// Decode block `id` into `out`, replacing its contents.
    pub fn read_into(&mut self, id: BlockId, out: &mut PostingList) -> Result<BlockReadInfo> {
        let (start, end) = self.store.block_span(id)?;
        let len = end - start;
        if len > MAX_BLOCK_BYTES {
            return Err(Error::corrupt(format!(
                "block {} spans {} bytes, limit is {}",
                id, len, MAX_BLOCK_BYTES
            )));
        }
        let len = len as usize;

        let read_started = Instant::now();
        let scratch_grew = self.scratch.ensure_capacity(len)?;
        self.store.file.read_at(start, self.scratch.slice_mut(len)?)?;
        let read_time = read_started.elapsed();

        let decode_started = Instant::now();
        decode_block(
            self.scratch.slice(len),
            start,
            end,
            self.store.mode,
            self.store.score_override.as_deref(),
            out,
        )
        .map_err(|e| match e {
            Error::Corrupt { detail } => Error::corrupt(format!("block {}: {}", id, detail)),
            other => other,
        })?;

        Ok(BlockReadInfo {
            bytes: len as u64,
            postings: out.len(),
            read_time,
            decode_time: decode_started.elapsed(),
            scratch_grew,
        })
    }
}

// ============================================================================
// BLOCK DECODING
// ============================================================================

/// Parse one block occupying `[start, end)` of the file from `bytes`.
pub(crate) fn decode_block(
    bytes: &[u8],
    start: u64,
    end: u64,
    mode: IndexMode,
    score_override: Option<&dyn ScoreOverride>,
    out: &mut PostingList,
) -> Result<()> {
    out.reshape(mode);

    let header = BlockHeader::read(&mut ByteCursor::new(bytes), mode)?;
    let spans = header.spans(mode, start, end)?;
    let sub_list = |span: &std::ops::Range<usize>| {
        bytes
            .get(span.clone())
            .ok_or_else(|| Error::corrupt(format!("sub-list {:?} outside block", span)))
    };

    // Doc ids fix the posting count for everything else.
    let mut cursor = ByteCursor::new(sub_list(&spans.doc)?);
    let n = cursor.read_len("doc list", MAX_BLOCK_POSTINGS)?;
    let rest = cursor.rest();
    let used = gaps::decode(rest, n, GapMode::Gap, &mut out.doc_ids)?;
    expect_consumed("doc list", used, rest.len())?;

    if let (Some(span), Some(positions)) = (&spans.positions, out.positions.as_mut()) {
        let mut cursor = ByteCursor::new(sub_list(span)?);
        expect_count("position list", cursor.read_len("position list", MAX_BLOCK_POSTINGS)?, n)?;
        let rest = cursor.rest();
        let used = gaps::decode(rest, n, GapMode::GapWithReset, positions)?;
        expect_consumed("position list", used, rest.len())?;
    }

    let mut cursor = ByteCursor::new(sub_list(&spans.words)?);
    expect_count("word list", cursor.read_len("word list", MAX_BLOCK_POSTINGS)?, n)?;
    let rest = cursor.rest();
    let used = zipf::decode(rest, n, &mut out.word_ids)?;
    expect_consumed("word list", used, rest.len())?;

    if let (Some(span), Some(scores)) = (&spans.scores, out.scores.as_mut()) {
        let mut cursor = ByteCursor::new(sub_list(span)?);
        expect_count("score list", cursor.read_len("score list", MAX_BLOCK_POSTINGS)?, n)?;
        let raw = cursor.take(n)?;
        expect_consumed("score list", n, n + cursor.remaining())?;
        scores.reserve(n);
        match score_override {
            Some(table) => scores.extend(
                raw.iter()
                    .zip(&out.word_ids)
                    .map(|(&disk, &word)| table.score(word, disk)),
            ),
            None => scores.extend(raw.iter().map(|&disk| Score::from(disk))),
        }
    }

    contracts::check_parallel_lengths(out);
    out.mark_sorted(true);
    Ok(())
}

fn expect_count(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(Error::corrupt(format!(
            "{} has {} entries, doc list has {}",
            what, got, expected
        )));
    }
    Ok(())
}

fn expect_consumed(what: &str, used: usize, available: usize) -> Result<()> {
    if used != available {
        return Err(Error::corrupt(format!(
            "{} decoded from {} of {} bytes",
            what, used, available
        )));
    }
    Ok(())
}
