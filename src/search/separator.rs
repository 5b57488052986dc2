// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! What counts as "together" when two posting lists are intersected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which postings an intersection writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputMode {
    /// Postings of the new list that have a partner in the candidates.
    #[default]
    Matches,
    /// Candidate postings without a partner in the new list (negation).
    NonMatches,
    /// All candidate postings; matched ones carry the combined score.
    All,
}

/// How close two postings must be to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntersectionWindow {
    /// Same document, any positions.
    #[default]
    SameDocument,
    /// The second posting lies within `[p1 + left, p1 + right]`.
    Positions { left: i32, right: i32 },
}

impl IntersectionWindow {
    pub fn positions(left: i32, right: i32) -> Result<Self> {
        if left > right {
            return Err(Error::invalid(format!(
                "position window [{}, {}] is empty",
                left, right
            )));
        }
        Ok(IntersectionWindow::Positions { left, right })
    }

    pub fn needs_positions(&self) -> bool {
        matches!(self, IntersectionWindow::Positions { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Separator {
    pub window: IntersectionWindow,
    pub output: OutputMode,
}

impl Separator {
    /// Plain AND: same document, matches only.
    pub const SAME_DOC: Separator = Separator {
        window: IntersectionWindow::SameDocument,
        output: OutputMode::Matches,
    };

    pub fn new(window: IntersectionWindow, output: OutputMode) -> Self {
        Self { window, output }
    }

    /// Adjacent words, second one right after the first.
    pub fn phrase() -> Self {
        Self::new(
            IntersectionWindow::Positions { left: 1, right: 1 },
            OutputMode::Matches,
        )
    }

    /// Within `distance` words in either direction.
    pub fn near(distance: u32) -> Self {
        let d = distance.min(i32::MAX as u32) as i32;
        Self::new(
            IntersectionWindow::Positions { left: -d, right: d },
            OutputMode::Matches,
        )
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let output = match self.output {
            OutputMode::Matches => "matches",
            OutputMode::NonMatches => "non-matches",
            OutputMode::All => "all",
        };
        match self.window {
            IntersectionWindow::SameDocument => write!(f, "same-doc/{}", output),
            IntersectionWindow::Positions { left, right } => {
                write!(f, "[{}, {}]/{}", left, right, output)
            }
        }
    }
}
