// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query processing: word ranges in, sorted posting lists out.
//!
//! A query is a chain of word ranges. The first range is read straight from
//! the blocks that cover it; every later range is intersected with the
//! result so far, under a [`Separator`] that says what "together" means
//! (same document, or within a position window). All of it runs against one
//! [`Deadline`] per query.

pub mod aggregate;
pub mod batch;
pub mod deadline;
pub mod engine;
pub mod hits;
pub mod intersect;
pub mod metrics;
pub mod query;
pub mod resolve;
pub mod separator;

pub use aggregate::{Aggregation, MaxScores, ProximityBonus, ScoreAggregator, SumScores};
pub use batch::{load_queries, run_batch, BatchContext, BatchReport, QueryOutcome};
pub use deadline::{Deadline, MeasuredSortCost, SortCostEstimator};
pub use engine::QueryEngine;
pub use hits::{top_completions, top_documents, Completion, DocHit};
pub use intersect::{intersect, intersect_with_candidates};
pub use metrics::Metrics;
pub use query::{parse_query, ParsedQuery, Query, QueryStep, QueryTerm};
pub use resolve::{resolve_block_range, BlockRange};
pub use separator::{IntersectionWindow, OutputMode, Separator};
