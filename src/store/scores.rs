// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Read-time score overrides.
//!
//! The override replaces each posting's stored score after decoding. It is
//! never written back to the index.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{DiskScore, Score, WordId};
use crate::vocabulary::Vocabulary;

/// Maps a posting's `(word id, stored score)` to the score the engine uses.
pub trait ScoreOverride: Send + Sync + fmt::Debug {
    fn score(&self, word_id: WordId, disk_score: DiskScore) -> Score;
}

/// Fixed per-word scores; words without an entry keep their stored score.
#[derive(Debug, Clone, Default)]
pub struct TableScoreOverride {
    scores: HashMap<WordId, Score>,
}

impl TableScoreOverride {
    pub fn new(scores: HashMap<WordId, Score>) -> Self {
        Self { scores }
    }

    /// Load a `word<TAB>score` file, resolving words through `vocabulary`.
    ///
    /// Unknown words and malformed lines are skipped with a warning.
    pub fn load(path: impl AsRef<Path>, vocabulary: &Vocabulary) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let mut scores = HashMap::new();
        let mut skipped = 0usize;
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((word, score)) = line.split_once('\t') else {
                warn!(line = line_no + 1, "custom score line without a tab, skipped");
                skipped += 1;
                continue;
            };
            let Ok(score) = score.trim().parse::<Score>() else {
                warn!(line = line_no + 1, score, "unparsable custom score, skipped");
                skipped += 1;
                continue;
            };
            match vocabulary.id(word) {
                Some(id) => {
                    scores.insert(id, score);
                }
                None => {
                    warn!(line = line_no + 1, word, "custom score for unknown word, skipped");
                    skipped += 1;
                }
            }
        }

        debug!(
            path = %path.display(),
            loaded = scores.len(),
            skipped,
            "loaded custom scores"
        );
        Ok(Self { scores })
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl ScoreOverride for TableScoreOverride {
    fn score(&self, word_id: WordId, disk_score: DiskScore) -> Score {
        self.scores
            .get(&word_id)
            .copied()
            .unwrap_or(Score::from(disk_score))
    }
}
