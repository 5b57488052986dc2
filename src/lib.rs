// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Block-partitioned inverted index with compressed posting lists.
//!
//! Words are numbered alphabetically, so every prefix maps to a contiguous
//! word-id range. The index cuts that id space into blocks; each block
//! stores the postings of its words as four parallel lists (doc ids, word
//! ids, positions, scores), sorted by document. A prefix query reads the
//! blocks covering its range, and a multi-word query intersects each new
//! range with the result so far.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌───────────────────┐
//! │   build/     │────▶│   store/     │────▶│     search/       │
//! │ (words file, │     │ (writer,     │     │ (resolve, engine, │
//! │  policy)     │     │  reader)     │     │  intersect, batch)│
//! └──────────────┘     └──────────────┘     └───────────────────┘
//!                             │
//!                             ▼
//!                ┌───────────────────────────┐
//!                │         binary/           │
//!                │ (simple9, gaps, zipf,     │
//!                │  window, layout, cursor)  │
//!                └───────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use hybdex::{build, BlockStore, Deadline, EngineConfig, QueryEngine, Vocabulary};
//!
//! build::build_index("corpus.words", "corpus.hybrid", "corpus.vocabulary", &Default::default())?;
//!
//! let store = BlockStore::open("corpus.hybrid", Default::default())?;
//! let vocabulary = Vocabulary::load("corpus.vocabulary")?;
//! let config = EngineConfig::default();
//! let mut engine = QueryEngine::from_config(&store, &config, config.sort_cost());
//!
//! let query = hybdex::parse_query("inf.ret")?.resolve(&vocabulary);
//! if let Some(query) = query {
//!     let aggregator = config.aggregation.build();
//!     let deadline = Deadline::start(config.query_timeout());
//!     let hits = engine.process_query(&query, aggregator.as_ref(), &deadline)?;
//! }
//! ```

pub mod binary;
pub mod build;
pub mod config;
pub mod contracts;
pub mod error;
pub mod search;
pub mod store;
pub mod testing;
pub mod types;
pub mod vocabulary;

pub use build::{build_from_records, build_index, BlockPolicy, BuildConfig, BuildReport};
pub use config::EngineConfig;
pub use error::{Error, Result, TimeoutStage};
pub use search::{
    parse_query, run_batch, Aggregation, BatchContext, BatchReport, BlockRange, Deadline,
    IntersectionWindow, MeasuredSortCost, Metrics, OutputMode, Query, QueryEngine,
    ScoreAggregator, Separator, SortCostEstimator,
};
pub use store::{BlockStore, IndexWriter, ScoreOverride, TableScoreOverride};
pub use types::{
    BlockId, DiskScore, DocId, IndexMode, Position, Posting, PostingList, Score, WordId,
    WordRange,
};
pub use vocabulary::Vocabulary;
