// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query engine configuration, read from camelCase JSON.
//!
//! ```json
//! {
//!   "queryTimeoutMs": 5000,
//!   "bestMatchBonus": 0,
//!   "aggregation": "sum",
//!   "sortCostMicrosPerMillion": 45000.0,
//!   "wholeBlockShortcut": true
//! }
//! ```
//!
//! Every field is optional. Leaving out `sortCostMicrosPerMillion` makes
//! the engine time a calibration sort at startup.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::search::aggregate::Aggregation;
use crate::search::deadline::{MeasuredSortCost, SortCostEstimator};
use crate::types::Score;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineConfig {
    pub query_timeout_ms: u64,
    /// Added to postings of the last best-matching word on plain reads.
    pub best_match_bonus: Score,
    pub aggregation: Aggregation,
    pub sort_cost_micros_per_million: Option<f64>,
    pub whole_block_shortcut: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 5000,
            best_match_bonus: 0,
            aggregation: Aggregation::Sum,
            sort_cost_micros_per_million: None,
            whole_block_shortcut: true,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|e| match e {
            Error::Config { detail, .. } => Error::Config {
                path: path.to_path_buf(),
                detail,
            },
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text).map_err(|e| Error::Config {
            path: Default::default(),
            detail: e.to_string(),
        })?;
        if config.query_timeout_ms == 0 {
            return Err(Error::Config {
                path: Default::default(),
                detail: "queryTimeoutMs must be positive".into(),
            });
        }
        Ok(config)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// The configured sort cost, or a fresh calibration.
    pub fn sort_cost(&self) -> Arc<dyn SortCostEstimator> {
        match self.sort_cost_micros_per_million {
            Some(micros) => Arc::new(MeasuredSortCost::from_micros(micros)),
            None => Arc::new(MeasuredSortCost::calibrate()),
        }
    }
}
