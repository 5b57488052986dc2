// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the store, the codecs and the query engine.
//!
//! Three kinds of failure matter to callers:
//!
//! - **Timeout**: the query ran out of its time budget, either at a block
//!   checkpoint or right before a sort that could not be interrupted. The
//!   request layer reports it to the client. It is never an empty result.
//! - **Format defects** (`Corrupt`, `ValueOutOfRange`): the index file does
//!   not match what the reader expects. Stop serving from that index.
//! - **Resource exhaustion** (`OutOfMemory`): a scratch buffer could not grow.
//!
//! Everything else is plain I/O or a caller passing something the API does
//! not accept.

use std::fmt;
use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Where a query ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStage {
    /// Checked before decoding this block.
    BlockCheckpoint { block: usize },
    /// Elapsed time plus the estimated sort cost would exceed the limit.
    BeforeSort { estimated_ms: u64 },
}

impl fmt::Display for TimeoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutStage::BlockCheckpoint { block } => write!(f, "before block {}", block),
            TimeoutStage::BeforeSort { estimated_ms } => {
                write!(f, "before sorting (estimated {}ms)", estimated_ms)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("query timed out {stage}: elapsed {elapsed_ms}ms, limit {limit_ms}ms")]
    Timeout {
        elapsed_ms: u64,
        limit_ms: u64,
        stage: TimeoutStage,
    },

    #[error("corrupt index data: {detail}")]
    Corrupt { detail: String },

    #[error("value {value} exceeds codec range (max {max})")]
    ValueOutOfRange { value: u64, max: u64 },

    #[error("failed to allocate {requested} bytes of scratch space")]
    OutOfMemory { requested: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration in {path}: {detail}")]
    Config { path: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn corrupt(detail: impl Into<String>) -> Self {
        Error::Corrupt {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        Error::InvalidInput(detail.into())
    }

    /// True for the recoverable timeout category.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// True when the index itself is unusable.
    pub fn is_format_defect(&self) -> bool {
        matches!(self, Error::Corrupt { .. } | Error::ValueOutOfRange { .. })
    }
}
