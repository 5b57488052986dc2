// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Many queries against one store, one engine per worker thread.
//!
//! Engines own their decode buffers and counters, so workers share nothing
//! but the read-only store. Counters are merged once the batch is done.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::store::BlockStore;
use crate::vocabulary::Vocabulary;

use super::aggregate::ScoreAggregator;
use super::deadline::{Deadline, SortCostEstimator};
use super::engine::QueryEngine;
use super::hits::{top_documents, DocHit};
use super::metrics::Metrics;
use super::query::parse_query;

/// Everything a worker needs to build its own engine.
#[derive(Debug, Clone)]
pub struct BatchContext<'a> {
    pub store: &'a BlockStore,
    pub vocabulary: &'a Vocabulary,
    pub config: &'a EngineConfig,
    pub sort_cost: Arc<dyn SortCostEstimator>,
    pub aggregator: Arc<dyn ScoreAggregator>,
    /// Top documents kept per query.
    pub limit: usize,
}

impl<'a> BatchContext<'a> {
    pub fn new(store: &'a BlockStore, vocabulary: &'a Vocabulary, config: &'a EngineConfig) -> Self {
        Self {
            store,
            vocabulary,
            config,
            sort_cost: config.sort_cost(),
            aggregator: config.aggregation.build(),
            limit: 10,
        }
    }

    fn engine(&self) -> QueryEngine<'a> {
        QueryEngine::from_config(self.store, self.config, Arc::clone(&self.sort_cost))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutcome {
    pub query: String,
    pub postings: usize,
    pub top: Vec<DocHit>,
    pub elapsed_us: u64,
    pub timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub outcomes: Vec<QueryOutcome>,
    pub metrics: Metrics,
    pub elapsed_ms: u64,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }
}

/// Read a query file: one query per line, blank lines and `#` comments skipped.
pub fn load_queries(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

/// Run every query; failures are reported per query, not returned.
pub fn run_batch(context: &BatchContext<'_>, queries: &[String]) -> BatchReport {
    let started = Instant::now();

    #[cfg(feature = "parallel")]
    let results: Vec<(QueryOutcome, Metrics)> = queries
        .par_iter()
        .map_init(
            || context.engine(),
            |engine, query| {
                let outcome = run_one(engine, context, query);
                (outcome, engine.take_metrics())
            },
        )
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<(QueryOutcome, Metrics)> = {
        let mut engine = context.engine();
        queries
            .iter()
            .map(|query| {
                let outcome = run_one(&mut engine, context, query);
                (outcome, engine.take_metrics())
            })
            .collect()
    };

    let mut metrics = Metrics::new();
    let mut outcomes = Vec::with_capacity(results.len());
    for (outcome, m) in results {
        metrics += m;
        outcomes.push(outcome);
    }

    let report = BatchReport {
        outcomes,
        metrics,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        queries = queries.len(),
        failures = report.failures(),
        timeouts = report.metrics.timeouts,
        elapsed_ms = report.elapsed_ms,
        "batch finished"
    );
    report
}

fn run_one(engine: &mut QueryEngine<'_>, context: &BatchContext<'_>, line: &str) -> QueryOutcome {
    let started = Instant::now();
    let mut outcome = QueryOutcome {
        query: line.to_owned(),
        postings: 0,
        top: Vec::new(),
        elapsed_us: 0,
        timed_out: false,
        error: None,
    };

    let result = parse_query(line).and_then(|parsed| match parsed.resolve(context.vocabulary) {
        Some(query) => {
            let deadline = Deadline::start(context.config.query_timeout());
            engine.process_query(&query, context.aggregator.as_ref(), &deadline).map(Some)
        }
        None => Ok(None),
    });

    match result {
        Ok(Some(list)) => {
            outcome.postings = list.len();
            outcome.top = top_documents(&list, context.limit);
        }
        Ok(None) => {}
        Err(err) => {
            outcome.timed_out = err.is_timeout();
            outcome.error = Some(err.to_string());
        }
    }
    outcome.elapsed_us = micros(started.elapsed());
    outcome
}

fn micros(d: Duration) -> u64 {
    d.as_micros().min(u128::from(u64::MAX)) as u64
}
