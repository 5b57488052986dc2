// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Core data types: ids, index modes, word ranges and posting lists.
//!
//! A posting list is four parallel arrays rather than a vector of structs.
//! Doc ids and word ids are always there. Positions and scores exist only if
//! the index was built with them, so they are `Option<Vec<_>>` instead of
//! vectors that are sometimes silently empty. Every boundary that hands out a
//! `PostingList` guarantees that the present arrays have the same length.

use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type DocId = u32;
pub type WordId = u32;
pub type Position = u32;
/// In-memory score (scores are widened from one byte on disk).
pub type Score = u32;
/// On-disk score, one byte per posting.
pub type DiskScore = u8;
pub type BlockId = usize;

/// Word id of the synthetic posting that carries the candidate side's score
/// for a matching document after an intersection.
pub const SPECIAL_WORD_ID: WordId = WordId::MAX;

/// Position of a special posting. Sorts after every real position of a doc.
pub const SPECIAL_POSITION: Position = Position::MAX;

// ============================================================================
// INDEX MODE
// ============================================================================

/// Which optional lists an index carries.
///
/// Every reader of an index must use the mode it was built with; the file
/// does not record it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexMode {
    /// Per-posting word positions.
    pub positions: bool,
    /// Per-posting scores.
    pub scores: bool,
    /// Keep repeated (word, doc) pairs.
    pub dups: bool,
}

impl IndexMode {
    /// Positions, scores and duplicates: the usual serving mode.
    pub const FULL: IndexMode = IndexMode {
        positions: true,
        scores: true,
        dups: true,
    };

    /// Doc ids and word ids only.
    pub const DOCS_ONLY: IndexMode = IndexMode {
        positions: false,
        scores: false,
        dups: false,
    };

    /// Build a mode, rejecting positions without duplicates (a positional
    /// index has one posting per occurrence).
    pub fn new(positions: bool, scores: bool, dups: bool) -> Result<Self> {
        if positions && !dups {
            return Err(Error::invalid("positions require an index with duplicates"));
        }
        Ok(Self {
            positions,
            scores,
            dups,
        })
    }

    /// Number of sub-lists stored per block (doc ids and word ids always).
    pub fn lists_per_block(self) -> usize {
        2 + usize::from(self.positions) + usize::from(self.scores)
    }
}

impl Default for IndexMode {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec!["docs", "words"];
        if self.positions {
            parts.push("positions");
        }
        if self.scores {
            parts.push("scores");
        }
        if self.dups {
            parts.push("dups");
        }
        write!(f, "{}", parts.join("+"))
    }
}

// ============================================================================
// WORD RANGE
// ============================================================================

/// Closed, non-empty interval of word ids matching a query prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordRange {
    first: WordId,
    last: WordId,
}

impl WordRange {
    pub fn new(first: WordId, last: WordId) -> Result<Self> {
        if first > last {
            return Err(Error::invalid(format!(
                "empty word range [{}, {}]",
                first, last
            )));
        }
        Ok(Self { first, last })
    }

    pub fn single(word_id: WordId) -> Self {
        Self {
            first: word_id,
            last: word_id,
        }
    }

    pub fn first(&self) -> WordId {
        self.first
    }

    pub fn last(&self) -> WordId {
        self.last
    }

    #[inline]
    pub fn contains(&self, word_id: WordId) -> bool {
        word_id >= self.first && word_id <= self.last
    }

    /// Number of word ids in the range (never zero).
    pub fn len(&self) -> u64 {
        u64::from(self.last - self.first) + 1
    }
}

impl fmt::Display for WordRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}

// ============================================================================
// POSTINGS
// ============================================================================

/// One occurrence of a word in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Posting {
    pub doc_id: DocId,
    pub word_id: WordId,
    pub position: Position,
    pub score: Score,
}

impl Posting {
    pub fn new(doc_id: DocId, word_id: WordId, position: Position, score: Score) -> Self {
        Self {
            doc_id,
            word_id,
            position,
            score,
        }
    }

    pub fn is_special(&self) -> bool {
        self.word_id == SPECIAL_WORD_ID
    }
}

/// Parallel-array posting list.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    pub doc_ids: Vec<DocId>,
    pub word_ids: Vec<WordId>,
    pub positions: Option<Vec<Position>>,
    pub scores: Option<Vec<Score>>,
    sorted: bool,
}

impl PartialEq for PostingList {
    fn eq(&self, other: &Self) -> bool {
        self.doc_ids == other.doc_ids
            && self.word_ids == other.word_ids
            && self.positions == other.positions
            && self.scores == other.scores
    }
}

impl Eq for PostingList {}

impl PostingList {
    /// Empty list shaped for `mode`.
    pub fn new(mode: IndexMode) -> Self {
        Self::with_capacity(mode, 0)
    }

    pub fn with_capacity(mode: IndexMode, capacity: usize) -> Self {
        Self {
            doc_ids: Vec::with_capacity(capacity),
            word_ids: Vec::with_capacity(capacity),
            positions: mode.positions.then(|| Vec::with_capacity(capacity)),
            scores: mode.scores.then(|| Vec::with_capacity(capacity)),
            sorted: false,
        }
    }

    /// Build from postings; position and score are dropped when `mode`
    /// excludes them.
    pub fn from_postings(mode: IndexMode, postings: impl IntoIterator<Item = Posting>) -> Self {
        let mut list = Self::new(mode);
        for posting in postings {
            list.push(posting);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    pub fn has_positions(&self) -> bool {
        self.positions.is_some()
    }

    pub fn has_scores(&self) -> bool {
        self.scores.is_some()
    }

    /// True when `other` carries the same optional lists.
    pub fn same_shape(&self, other: &PostingList) -> bool {
        self.has_positions() == other.has_positions() && self.has_scores() == other.has_scores()
    }

    /// Sum of the lengths of all present lists (the sort-cost input).
    pub fn total_elements(&self) -> usize {
        self.doc_ids.len()
            + self.word_ids.len()
            + self.positions.as_ref().map_or(0, Vec::len)
            + self.scores.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn push(&mut self, posting: Posting) {
        self.doc_ids.push(posting.doc_id);
        self.word_ids.push(posting.word_id);
        if let Some(positions) = self.positions.as_mut() {
            positions.push(posting.position);
        }
        if let Some(scores) = self.scores.as_mut() {
            scores.push(posting.score);
        }
        self.sorted = false;
    }

    /// Posting at `index`; absent lists read as zero.
    #[inline]
    pub fn posting(&self, index: usize) -> Posting {
        Posting {
            doc_id: self.doc_ids[index],
            word_id: self.word_ids[index],
            position: self.positions.as_ref().map_or(0, |p| p[index]),
            score: self.scores.as_ref().map_or(0, |s| s[index]),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Posting> + '_ {
        (0..self.len()).map(move |i| self.posting(i))
    }

    /// Append all postings of `other` (same shape).
    pub fn extend_from(&mut self, other: &PostingList) {
        self.doc_ids.extend_from_slice(&other.doc_ids);
        self.word_ids.extend_from_slice(&other.word_ids);
        if let (Some(dst), Some(src)) = (self.positions.as_mut(), other.positions.as_ref()) {
            dst.extend_from_slice(src);
        }
        if let (Some(dst), Some(src)) = (self.scores.as_mut(), other.scores.as_ref()) {
            dst.extend_from_slice(src);
        }
        self.sorted = false;
    }

    /// Drop all postings, keeping capacity and shape.
    pub fn clear(&mut self) {
        self.doc_ids.clear();
        self.word_ids.clear();
        if let Some(positions) = self.positions.as_mut() {
            positions.clear();
        }
        if let Some(scores) = self.scores.as_mut() {
            scores.clear();
        }
        self.sorted = false;
    }

    /// Change the shape to `mode`, clearing the contents.
    pub fn reshape(&mut self, mode: IndexMode) {
        self.clear();
        if mode.positions != self.has_positions() {
            self.positions = mode.positions.then(Vec::new);
        }
        if mode.scores != self.has_scores() {
            self.scores = mode.scores.then(Vec::new);
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn mark_sorted(&mut self, sorted: bool) {
        self.sorted = sorted;
    }

    /// Verify that every present list has the doc-id list's length.
    pub fn check_lengths(&self) -> Result<()> {
        let n = self.doc_ids.len();
        let mismatch = |name: &str, len: usize| {
            Error::corrupt(format!(
                "{} list has {} entries but doc list has {}",
                name, len, n
            ))
        };
        if self.word_ids.len() != n {
            return Err(mismatch("word", self.word_ids.len()));
        }
        if let Some(positions) = &self.positions {
            if positions.len() != n {
                return Err(mismatch("position", positions.len()));
            }
        }
        if let Some(scores) = &self.scores {
            if scores.len() != n {
                return Err(mismatch("score", scores.len()));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // SORTING
    // ------------------------------------------------------------------------

    /// Stable sort of all lists by `(doc id, position)`, special postings last
    /// within their doc.
    ///
    /// Equal keys keep their relative order, so postings appended block by
    /// block stay in block order within a (doc, position) tie. Without a
    /// position list every real posting of a doc ties, so the special flag is
    /// part of the key to keep each doc's special postings adjacent.
    pub fn sort_by_doc_and_position(&mut self) {
        let n = self.len();
        if n < 2 {
            self.sorted = true;
            return;
        }

        let mut order: Vec<u32> = (0..n as u32).collect();
        {
            let docs = &self.doc_ids;
            let words = &self.word_ids;
            let positions = self.positions.as_deref();
            let key = |&i: &u32| {
                let i = i as usize;
                (
                    docs[i],
                    words[i] == SPECIAL_WORD_ID,
                    positions.map_or(0, |p| p[i]),
                )
            };
            #[cfg(feature = "parallel")]
            order.par_sort_by_key(key);
            #[cfg(not(feature = "parallel"))]
            order.sort_by_key(key);
        }

        permute(&mut self.doc_ids, &order);
        permute(&mut self.word_ids, &order);
        if let Some(positions) = self.positions.as_mut() {
            permute(positions, &order);
        }
        if let Some(scores) = self.scores.as_mut() {
            permute(scores, &order);
        }
        self.sorted = true;
    }

    /// Remove special postings that repeat the previous special posting's doc.
    ///
    /// Several blocks intersected against the same candidates each write a
    /// special posting for a shared doc; after sorting they sit next to each
    /// other and carry the same score, so only the first is kept.
    pub fn dedup_special_postings(&mut self) -> usize {
        let n = self.len();
        let mut write = 0;
        for read in 0..n {
            let duplicate = read > 0
                && self.word_ids[read] == SPECIAL_WORD_ID
                && self.word_ids[read - 1] == SPECIAL_WORD_ID
                && self.doc_ids[read] == self.doc_ids[read - 1];
            if duplicate {
                continue;
            }
            if write < read {
                self.doc_ids[write] = self.doc_ids[read];
                self.word_ids[write] = self.word_ids[read];
                if let Some(positions) = self.positions.as_mut() {
                    positions[write] = positions[read];
                }
                if let Some(scores) = self.scores.as_mut() {
                    scores[write] = scores[read];
                }
            }
            write += 1;
        }
        self.truncate(write);
        n - write
    }

    fn truncate(&mut self, len: usize) {
        self.doc_ids.truncate(len);
        self.word_ids.truncate(len);
        if let Some(positions) = self.positions.as_mut() {
            positions.truncate(len);
        }
        if let Some(scores) = self.scores.as_mut() {
            scores.truncate(len);
        }
    }
}

fn permute<T: Copy>(values: &mut Vec<T>, order: &[u32]) {
    let reordered: Vec<T> = order.iter().map(|&i| values[i as usize]).collect();
    *values = reordered;
}
