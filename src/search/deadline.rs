// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query time budget and the sort-cost estimate that guards the final sort.
//!
//! A query checks its deadline before every block. The one step it cannot
//! interrupt is the final sort of a multi-block result, so before sorting it
//! asks an estimator how long the sort will take and gives up early if the
//! sort would blow the budget.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, Result, TimeoutStage};
use crate::types::{IndexMode, Posting, PostingList};

// ============================================================================
// DEADLINE
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// A deadline that started `elapsed` ago.
    pub fn started_ago(elapsed: Duration, limit: Duration) -> Self {
        let now = Instant::now();
        Self {
            started: now.checked_sub(elapsed).unwrap_or(now),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Fail if the budget is used up. Called before processing `block`.
    pub fn check_block(&self, block: usize) -> Result<()> {
        let elapsed = self.elapsed();
        if elapsed >= self.limit {
            return Err(self.timeout(elapsed, TimeoutStage::BlockCheckpoint { block }));
        }
        Ok(())
    }

    /// Fail if a step estimated to take `estimate` would overrun the budget.
    pub fn check_sort(&self, estimate: Duration) -> Result<()> {
        let elapsed = self.elapsed();
        if elapsed.saturating_add(estimate) > self.limit {
            return Err(self.timeout(
                elapsed,
                TimeoutStage::BeforeSort {
                    estimated_ms: estimate.as_millis() as u64,
                },
            ));
        }
        Ok(())
    }

    fn timeout(&self, elapsed: Duration, stage: TimeoutStage) -> Error {
        Error::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
            limit_ms: self.limit.as_millis() as u64,
            stage,
        }
    }
}

// ============================================================================
// SORT COST
// ============================================================================

pub trait SortCostEstimator: Send + Sync + fmt::Debug {
    /// Expected time to sort a result with `elements` list entries in total.
    fn estimate(&self, elements: usize) -> Duration;
}

/// Linear cost model: a fixed time per million list elements.
///
/// Results below two million elements are treated as free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasuredSortCost {
    per_million: Duration,
}

/// Postings per calibration array.
const CALIBRATION_POSTINGS: usize = 250_000;
const CALIBRATION_RUNS: u32 = 10;

impl MeasuredSortCost {
    pub fn new(per_million: Duration) -> Self {
        Self { per_million }
    }

    pub fn from_micros(per_million_micros: f64) -> Self {
        Self::new(Duration::from_nanos(
            (per_million_micros.max(0.0) * 1000.0).round() as u64,
        ))
    }

    pub fn per_million(&self) -> Duration {
        self.per_million
    }

    /// Time sorts of a worst-case list: four parallel arrays of 250,000
    /// descending values, one million elements in all.
    pub fn calibrate() -> Self {
        let n = CALIBRATION_POSTINGS;
        let template = PostingList::from_postings(
            IndexMode::FULL,
            (0..n).map(|j| {
                let v = (n - j) as u32;
                Posting::new(v, v * 2, v * 3, v * 4)
            }),
        );

        let mut total = Duration::ZERO;
        for _ in 0..CALIBRATION_RUNS {
            let mut list = template.clone();
            let started = Instant::now();
            list.sort_by_doc_and_position();
            total += started.elapsed();
        }
        let per_million = total / CALIBRATION_RUNS;
        debug!(
            per_million_us = per_million.as_micros() as u64,
            "calibrated sort cost"
        );
        Self::new(per_million)
    }
}

impl SortCostEstimator for MeasuredSortCost {
    fn estimate(&self, elements: usize) -> Duration {
        let millions = (elements / 1_000_000) as u32;
        if millions > 1 {
            self.per_million * millions
        } else {
            Duration::ZERO
        }
    }
}
