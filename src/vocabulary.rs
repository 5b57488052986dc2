// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Sorted word list: word ids are line numbers.
//!
//! The build pipeline emits one of these next to every index. Queries use it
//! to turn a prefix into the contiguous word-id range of all its completions.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{WordId, WordRange};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from words that are already strictly ascending.
    pub fn from_words(words: Vec<String>) -> Result<Self> {
        if let Some(i) = words.windows(2).position(|w| w[0] >= w[1]) {
            return Err(Error::invalid(format!(
                "vocabulary not strictly ascending at line {}: {:?} then {:?}",
                i + 2,
                words[i],
                words[i + 1]
            )));
        }
        if words.len() as u64 > u64::from(WordId::MAX) {
            return Err(Error::invalid("vocabulary has more words than word ids"));
        }
        Ok(Self { words })
    }

    /// Load a newline-separated vocabulary file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let words = text.lines().map(str::to_owned).collect();
        Self::from_words(words)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut out = BufWriter::new(fs::File::create(path.as_ref())?);
        for word in &self.words {
            out.write_all(word.as_bytes())?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Append the next word, which must sort after the last one.
    pub fn push(&mut self, word: &str) -> Result<WordId> {
        if let Some(last) = self.words.last() {
            if word <= last.as_str() {
                return Err(Error::invalid(format!(
                    "words not sorted: {:?} after {:?}",
                    word, last
                )));
            }
        }
        let id = WordId::try_from(self.words.len())
            .map_err(|_| Error::invalid("vocabulary has more words than word ids"))?;
        self.words.push(word.to_owned());
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, id: WordId) -> Option<&str> {
        self.words.get(id as usize).map(String::as_str)
    }

    pub fn id(&self, word: &str) -> Option<WordId> {
        self.words
            .binary_search_by(|w| w.as_str().cmp(word))
            .ok()
            .map(|i| i as WordId)
    }

    /// Word ids of all words starting with `prefix`, or `None` if there are none.
    pub fn prefix_range(&self, prefix: &str) -> Option<WordRange> {
        let lower = self.words.partition_point(|w| w.as_str() < prefix);
        let count = self.words[lower..].partition_point(|w| w.starts_with(prefix));
        if count == 0 {
            return None;
        }
        WordRange::new(lower as WordId, (lower + count - 1) as WordId).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}
