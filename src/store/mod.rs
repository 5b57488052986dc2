// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Block store: write an index once, then serve block reads to many workers.

pub mod file;
pub mod reader;
pub mod scores;
pub mod writer;

pub use file::IndexFile;
pub use reader::{BlockReadInfo, BlockReader, BlockStore};
pub use scores::{ScoreOverride, TableScoreOverride};
pub use writer::{disk_scores, BlockLists, IndexWriter, WriteStats};
