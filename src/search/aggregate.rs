// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Score aggregation policies for intersections.
//!
//! The engine never decides how two scores combine; it asks the aggregator.
//! All arithmetic saturates, so a pathological stack of bonuses pins at
//! `u32::MAX` instead of wrapping to a tiny score.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::Score;

pub trait ScoreAggregator: Send + Sync + fmt::Debug {
    /// Combine two scores with no position information.
    fn combine(&self, a: Score, b: Score) -> Score;

    /// Combine two scores whose postings are `distance` positions apart
    /// (`p1 - p2`, so `-1` means the second word directly follows the first).
    fn combine_near(&self, a: Score, b: Score, distance: i64) -> Score {
        let _ = distance;
        self.combine(a, b)
    }

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SumScores;

impl ScoreAggregator for SumScores {
    fn combine(&self, a: Score, b: Score) -> Score {
        a.saturating_add(b)
    }

    fn name(&self) -> &'static str {
        "sum"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxScores;

impl ScoreAggregator for MaxScores {
    fn combine(&self, a: Score, b: Score) -> Score {
        a.max(b)
    }

    fn name(&self) -> &'static str {
        "max"
    }
}

/// Sum plus a bonus for words that occur close together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProximityBonus {
    /// Added when the second word directly follows the first.
    pub phrase_bonus: Score,
    /// Added when the words are less than `neighborhood` positions apart.
    pub near_bonus: Score,
    pub neighborhood: u32,
}

impl Default for ProximityBonus {
    fn default() -> Self {
        Self {
            phrase_bonus: 16,
            near_bonus: 8,
            neighborhood: 10,
        }
    }
}

impl ScoreAggregator for ProximityBonus {
    fn combine(&self, a: Score, b: Score) -> Score {
        a.saturating_add(b)
    }

    fn combine_near(&self, a: Score, b: Score, distance: i64) -> Score {
        let bonus = if distance == -1 {
            self.phrase_bonus
        } else if distance.unsigned_abs() < u64::from(self.neighborhood) {
            self.near_bonus
        } else {
            0
        };
        a.saturating_add(b).saturating_add(bonus)
    }

    fn name(&self) -> &'static str {
        "proximity"
    }
}

/// Aggregation policy as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aggregation {
    #[default]
    Sum,
    Max,
    Proximity(ProximityBonus),
}

impl Aggregation {
    pub fn build(&self) -> Arc<dyn ScoreAggregator> {
        match *self {
            Aggregation::Sum => Arc::new(SumScores),
            Aggregation::Max => Arc::new(MaxScores),
            Aggregation::Proximity(bonus) => Arc::new(bonus),
        }
    }
}
