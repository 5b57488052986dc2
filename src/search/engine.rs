// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-worker query engine: word range in, posting list out.
//!
//! For each block the range touches, in ascending order:
//!
//! 1. check the deadline,
//! 2. decode the block,
//! 3. without candidates, keep the postings whose word is in the range;
//!    with candidates, intersect them with the block.
//!
//! Negated steps (`NonMatches`, `All`) read the whole range first and
//! intersect once, since a candidate can only be dropped after every block
//! has been seen.
//!
//! A result built from more than one block is concatenated out of order and
//! needs a final sort. That sort cannot be interrupted, so it is skipped
//! with a timeout when the estimated cost would overrun the deadline.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::contracts;
use crate::error::{Error, Result};
use crate::store::{BlockReader, BlockStore};
use crate::types::{PostingList, Score, WordId, WordRange};

use super::aggregate::ScoreAggregator;
use super::deadline::{Deadline, SortCostEstimator};
use super::intersect::intersect_with_candidates;
use super::metrics::Metrics;
use super::query::Query;
use super::resolve::BlockRange;
use super::separator::{OutputMode, Separator};

pub struct QueryEngine<'a> {
    reader: BlockReader<'a>,
    block: PostingList,
    sort_cost: Arc<dyn SortCostEstimator>,
    best_match_bonus: Score,
    last_best_match: Option<WordId>,
    whole_block_shortcut: bool,
    metrics: Metrics,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a BlockStore, sort_cost: Arc<dyn SortCostEstimator>) -> Self {
        Self {
            reader: store.reader(),
            block: PostingList::new(store.mode()),
            sort_cost,
            best_match_bonus: 0,
            last_best_match: None,
            whole_block_shortcut: true,
            metrics: Metrics::new(),
        }
    }

    pub fn from_config(
        store: &'a BlockStore,
        config: &EngineConfig,
        sort_cost: Arc<dyn SortCostEstimator>,
    ) -> Self {
        let mut engine = Self::new(store, sort_cost);
        engine.best_match_bonus = config.best_match_bonus;
        engine.whole_block_shortcut = config.whole_block_shortcut;
        engine
    }

    pub fn store(&self) -> &'a BlockStore {
        self.reader.store()
    }

    /// Word whose postings get the best-match bonus on unintersected reads.
    pub fn set_last_best_match(&mut self, word_id: Option<WordId>) {
        self.last_best_match = word_id;
    }

    pub fn set_best_match_bonus(&mut self, bonus: Score) {
        self.best_match_bonus = bonus;
    }

    /// Skip the word-id filter for blocks entirely inside the range.
    pub fn set_whole_block_shortcut(&mut self, enabled: bool) {
        self.whole_block_shortcut = enabled;
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn take_metrics(&mut self) -> Metrics {
        std::mem::take(&mut self.metrics)
    }

    /// Postings of the words in `range`, intersected with `candidates` if given.
    pub fn process_range(
        &mut self,
        candidates: Option<&PostingList>,
        range: WordRange,
        separator: &Separator,
        aggregator: &dyn ScoreAggregator,
        deadline: &Deadline,
    ) -> Result<PostingList> {
        self.metrics.queries += 1;
        match self.run(candidates, range, separator, aggregator, deadline) {
            Ok(result) => {
                self.metrics.postings_emitted += result.len() as u64;
                Ok(result)
            }
            Err(err) => {
                if err.is_timeout() {
                    self.metrics.timeouts += 1;
                    warn!(%range, error = %err, "query timed out");
                }
                Err(err)
            }
        }
    }

    /// Run every step of `query` against one shared deadline.
    ///
    /// Each step intersects its range with the result of the steps before.
    pub fn process_query(
        &mut self,
        query: &Query,
        aggregator: &dyn ScoreAggregator,
        deadline: &Deadline,
    ) -> Result<PostingList> {
        let mut steps = query.steps.iter();
        let Some(first) = steps.next() else {
            return Err(Error::invalid("query has no steps"));
        };
        let mut result =
            self.process_range(None, first.range, &first.separator, aggregator, deadline)?;
        for step in steps {
            if result.is_empty() {
                break;
            }
            result = self.process_range(
                Some(&result),
                step.range,
                &step.separator,
                aggregator,
                deadline,
            )?;
        }
        Ok(result)
    }

    fn run(
        &mut self,
        candidates: Option<&PostingList>,
        range: WordRange,
        separator: &Separator,
        aggregator: &dyn ScoreAggregator,
        deadline: &Deadline,
    ) -> Result<PostingList> {
        let store = self.reader.store();
        let mode = store.mode();
        if separator.window.needs_positions() && !mode.positions {
            return Err(Error::invalid(format!(
                "separator {} needs positions, index mode is {}",
                separator, mode
            )));
        }
        if let Some(candidates) = candidates {
            if !candidates.same_shape(&self.block) {
                return Err(Error::invalid(
                    "candidate list shape does not match the index mode",
                ));
            }
        }

        // Negation needs the complete list of the range before any candidate
        // can be ruled out, so it is read first and intersected once.
        if let Some(candidates) = candidates {
            if separator.output != OutputMode::Matches {
                let own = self.run(None, range, &Separator::SAME_DOC, aggregator, deadline)?;
                let started = Instant::now();
                let mut result = PostingList::new(mode);
                intersect_with_candidates(
                    candidates,
                    &own,
                    &mut result,
                    range,
                    separator,
                    aggregator,
                )?;
                self.metrics.record_intersect(started.elapsed());
                contracts::check_sorted(&result);
                result.mark_sorted(true);
                return Ok(result);
            }
        }

        let blocks = store.resolve(range)?;
        let mut result = PostingList::new(mode);

        for b in blocks.blocks() {
            deadline.check_block(b)?;
            let info = self.reader.read_into(b, &mut self.block)?;
            self.metrics.record_read(&info);

            match candidates {
                None => self.append_in_range(&blocks, b, range, &mut result),
                Some(candidates) => {
                    let started = Instant::now();
                    intersect_with_candidates(
                        candidates,
                        &self.block,
                        &mut result,
                        range,
                        separator,
                        aggregator,
                    )?;
                    self.metrics.record_intersect(started.elapsed());
                }
            }
        }

        if blocks.first < blocks.last {
            let elements = result.total_elements();
            deadline.check_sort(self.sort_cost.estimate(elements))?;

            let started = Instant::now();
            result.sort_by_doc_and_position();
            let dropped = result.dedup_special_postings();
            self.metrics.record_sort(started.elapsed());
            debug!(
                elements,
                dropped_special = dropped,
                sort_us = started.elapsed().as_micros() as u64,
                "sorted multi-block result"
            );
        }
        contracts::check_sorted(&result);
        result.mark_sorted(true);

        debug!(
            %range,
            blocks = blocks.len(),
            postings = result.len(),
            intersected = candidates.is_some(),
            "processed word range"
        );
        Ok(result)
    }

    /// Append the current block's postings whose word lies in `range`.
    fn append_in_range(
        &self,
        blocks: &BlockRange,
        b: usize,
        range: WordRange,
        result: &mut PostingList,
    ) {
        let start = result.len();
        if self.whole_block_shortcut && blocks.whole_block_in_range(b) {
            result.extend_from(&self.block);
        } else {
            for k in 0..self.block.len() {
                if range.contains(self.block.word_ids[k]) {
                    result.push(self.block.posting(k));
                }
            }
        }

        if self.best_match_bonus == 0 {
            return;
        }
        if let (Some(best), Some(scores)) = (self.last_best_match, result.scores.as_mut()) {
            for k in start..scores.len() {
                if result.word_ids[k] == best {
                    scores[k] = scores[k].saturating_add(self.best_match_bonus);
                }
            }
        }
    }
}
