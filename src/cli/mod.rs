// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the hybdex command-line interface.
//!
//! Four subcommands: `build` turns a sorted words file into an index and
//! vocabulary, `inspect` examines a `.hybrid` file, `query` runs one query,
//! and `batch` runs a query file across all cores.
//!
//! The index mode is not stored in the file, so every command that opens an
//! index takes the same `--no-positions` / `--no-scores` / `--no-dups` flags
//! it was built with.

pub mod commands;
pub mod display;
pub mod logging;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hybdex::search::ProximityBonus;
use hybdex::{Aggregation, IndexMode};

#[derive(Parser)]
#[command(
    name = "hybdex",
    about = "Block-partitioned inverted index with prefix-range queries",
    version
)]
pub struct Cli {
    /// Debug-level logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an index from a words file sorted by word
    Build {
        /// Words file: `word doc_id score position` per line
        #[arg(short, long)]
        words: PathBuf,

        /// Output base name; writes BASE.hybrid and BASE.vocabulary
        #[arg(short, long)]
        output: PathBuf,

        /// Postings per block, or below 10 one block per prefix of that length
        #[arg(long, conflicts_with = "boundaries")]
        block_volume: Option<u64>,

        /// File of block boundary prefixes, one per line, sorted
        #[arg(long)]
        boundaries: Option<PathBuf>,

        /// Keep at most this many postings per block
        #[arg(long)]
        max_block_volume: Option<usize>,

        /// Build configuration (JSON); flags override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the build report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        mode: ModeArgs,
    },

    /// Inspect the layout of a .hybrid file
    Inspect {
        /// Path to the .hybrid file
        file: PathBuf,

        /// List every block with its word range and size
        #[arg(long)]
        blocks: bool,

        /// Decode every block and check its lists
        #[arg(long)]
        verify: bool,

        /// Vocabulary for showing block boundary words
        #[arg(long)]
        vocabulary: Option<PathBuf>,

        #[command(flatten)]
        mode: ModeArgs,
    },

    /// Run one query and print the best documents and completions
    Query {
        /// Path to the .hybrid file
        file: PathBuf,

        /// Query terms; each is a prefix. `a.b` is a phrase, `a..b` near,
        /// `-a` excludes documents containing a. Put options before the terms.
        #[arg(required = true, allow_hyphen_values = true)]
        terms: Vec<String>,

        #[command(flatten)]
        search: SearchArgs,

        /// Per-word scores (`word<TAB>score`) replacing the stored ones
        #[arg(long)]
        custom_scores: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a file of queries in parallel
    Batch {
        /// Path to the .hybrid file
        file: PathBuf,

        /// One query per line; blank lines and `#` comments are skipped
        #[arg(long)]
        queries: PathBuf,

        #[command(flatten)]
        search: SearchArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Which lists the index carries.
#[derive(Args, Debug, Clone, Copy)]
pub struct ModeArgs {
    /// Index without positions
    #[arg(long)]
    pub no_positions: bool,

    /// Index without scores
    #[arg(long)]
    pub no_scores: bool,

    /// Index with at most one posting per word and document
    #[arg(long)]
    pub no_dups: bool,
}

impl ModeArgs {
    pub fn mode(&self) -> hybdex::Result<IndexMode> {
        IndexMode::new(!self.no_positions, !self.no_scores, !self.no_dups)
    }
}

/// Flags shared by `query` and `batch`.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Vocabulary file; defaults to the index path with a .vocabulary extension
    #[arg(long)]
    pub vocabulary: Option<PathBuf>,

    /// Engine configuration (JSON); flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Per-query time limit in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// How scores combine when postings meet
    #[arg(long, value_enum)]
    pub aggregation: Option<AggregationArg>,

    /// Documents (and completions) to show
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    #[command(flatten)]
    pub mode: ModeArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationArg {
    Sum,
    Max,
    Prox,
}

impl From<AggregationArg> for Aggregation {
    fn from(arg: AggregationArg) -> Self {
        match arg {
            AggregationArg::Sum => Aggregation::Sum,
            AggregationArg::Max => Aggregation::Max,
            AggregationArg::Prox => Aggregation::Proximity(ProximityBonus::default()),
        }
    }
}
