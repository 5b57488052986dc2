// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Reader for the words file: one posting per line, sorted by word.
//!
//! ```text
//! # optional header line
//! algebra    17  3  42
//! algebra    21  1   7
//! algorithm  17  5  43
//! ```
//!
//! Columns are word, doc id, score and position, separated by whitespace.
//! Lines that do not parse are skipped with a warning.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::types::{DiskScore, DocId, Position};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub word: String,
    pub doc_id: DocId,
    pub score: DiskScore,
    pub position: Position,
}

pub struct WordsFileReader<R: BufRead> {
    input: R,
    line: String,
    line_number: u64,
    skip_same_word_and_doc: bool,
    last: Option<(String, DocId)>,
    skipped: u64,
    clamped: u64,
}

impl WordsFileReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path.as_ref())?)))
    }
}

impl<R: BufRead> WordsFileReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: String::new(),
            line_number: 0,
            skip_same_word_and_doc: false,
            last: None,
            skipped: 0,
            clamped: 0,
        }
    }

    /// Skip a line that repeats the (word, doc) of the line before it.
    pub fn skip_same_word_and_doc(mut self, skip: bool) -> Self {
        self.skip_same_word_and_doc = skip;
        self
    }

    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Lines skipped so far: malformed or repeated.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Scores above 255 seen so far.
    pub fn clamped(&self) -> u64 {
        self.clamped
    }

    fn parse_line(&mut self) -> Option<WordRecord> {
        let line = self.line.trim_end_matches(['\n', '\r']);
        if line.is_empty() || (self.line_number == 1 && line.starts_with('#')) {
            return None;
        }

        let mut fields = line.split_whitespace();
        let parsed = (|| {
            let word = fields.next()?;
            let doc_id = fields.next()?.parse::<DocId>().ok()?;
            let score = fields.next()?.parse::<u64>().ok()?;
            let position = fields.next()?.parse::<Position>().ok()?;
            fields.next().is_none().then_some((word, doc_id, score, position))
        })();

        let Some((word, doc_id, score, position)) = parsed else {
            warn!(line = self.line_number, text = %line, "skipping malformed words line");
            self.skipped += 1;
            return None;
        };

        if self.skip_same_word_and_doc {
            if let Some((last_word, last_doc)) = &self.last {
                if last_word == word && *last_doc == doc_id {
                    self.skipped += 1;
                    return None;
                }
            }
        }

        let score = if score > u64::from(DiskScore::MAX) {
            if self.clamped == 0 {
                warn!(line = self.line_number, score, "clamping scores to 255");
            }
            self.clamped += 1;
            DiskScore::MAX
        } else {
            score as DiskScore
        };

        let record = WordRecord {
            word: word.to_owned(),
            doc_id,
            score,
            position,
        };
        match &mut self.last {
            Some((last_word, last_doc)) => {
                if last_word != word {
                    last_word.clear();
                    last_word.push_str(word);
                }
                *last_doc = doc_id;
            }
            None => self.last = Some((word.to_owned(), doc_id)),
        }
        Some(record)
    }
}

impl<R: BufRead> Iterator for WordsFileReader<R> {
    type Item = Result<WordRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.input.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    if let Some(record) = self.parse_line() {
                        return Some(Ok(record));
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
