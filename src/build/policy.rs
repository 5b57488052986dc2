// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! When does a new word start a new block?

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockPolicy {
    /// Cut once a block holds at least this many postings.
    Volume(u64),
    /// One block per distinct word prefix of this many characters.
    PrefixLength(usize),
    /// Cut at each of these sorted prefixes.
    Prefixes(Vec<String>),
}

impl Default for BlockPolicy {
    fn default() -> Self {
        BlockPolicy::Volume(1_000_000)
    }
}

impl BlockPolicy {
    /// Command-line convention: a volume below 10 is a prefix length.
    pub fn from_block_volume(volume: u64) -> Self {
        if volume < 10 {
            BlockPolicy::PrefixLength(volume as usize)
        } else {
            BlockPolicy::Volume(volume)
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            BlockPolicy::Volume(0) => Err(Error::invalid("block volume must be positive")),
            BlockPolicy::PrefixLength(0) => Err(Error::invalid("prefix length must be positive")),
            BlockPolicy::Prefixes(prefixes) => {
                if prefixes.is_empty() {
                    return Err(Error::invalid("no boundary prefixes given"));
                }
                if let Some(i) = prefixes.windows(2).position(|p| p[0] > p[1]) {
                    return Err(Error::invalid(format!(
                        "boundary prefixes not sorted: {:?} then {:?}",
                        prefixes[i],
                        prefixes[i + 1]
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Applies a [`BlockPolicy`] to the stream of distinct words.
#[derive(Debug)]
pub(crate) struct BlockCutter<'a> {
    policy: &'a BlockPolicy,
    /// Prefix of the current block (prefix-length policy).
    current_prefix: String,
    /// Next boundary to cross (prefixes policy).
    next_prefix: usize,
    seen_word: bool,
}

impl<'a> BlockCutter<'a> {
    pub(crate) fn new(policy: &'a BlockPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            current_prefix: String::new(),
            next_prefix: 0,
            seen_word: false,
        })
    }

    /// Called once per distinct word, before its postings are added.
    /// `volume` is the posting count of the block so far.
    pub(crate) fn starts_new_block(&mut self, word: &str, volume: u64) -> bool {
        let first = !self.seen_word;
        self.seen_word = true;

        match self.policy {
            BlockPolicy::Volume(limit) => !first && volume >= *limit,
            BlockPolicy::PrefixLength(k) => {
                let k = *k;
                if first {
                    self.current_prefix = char_prefix(word, k).to_owned();
                    return false;
                }
                let cut = !word.starts_with(&self.current_prefix)
                    || (self.current_prefix.chars().count() < k && word.chars().count() >= k);
                if cut {
                    self.current_prefix = char_prefix(word, k).to_owned();
                }
                cut
            }
            BlockPolicy::Prefixes(prefixes) => {
                let mut cut = false;
                while let Some(prefix) = prefixes.get(self.next_prefix) {
                    if word < prefix.as_str() {
                        break;
                    }
                    self.next_prefix += 1;
                    cut = true;
                }
                cut
            }
        }
    }
}

/// The first `k` characters of `word` (all of it if shorter).
fn char_prefix(word: &str, k: usize) -> &str {
    match word.char_indices().nth(k) {
        Some((end, _)) => &word[..end],
        None => word,
    }
}
