// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.

#![doc(hidden)]

use std::path::{Path, PathBuf};

use crate::build::{build_from_records, BuildConfig, BuildReport, WordRecord};
use crate::error::Result;
use crate::store::IndexWriter;
use crate::types::{DiskScore, DocId, IndexMode, Position, Posting, PostingList};
use crate::vocabulary::Vocabulary;

pub fn record(word: &str, doc_id: DocId, score: DiskScore, position: Position) -> WordRecord {
    WordRecord {
        word: word.to_string(),
        doc_id,
        score,
        position,
    }
}

/// Five words, two blocks at prefix length 1: `[aaa, abb]` and `[baa, bbb, bcc]`.
pub fn sample_records() -> Vec<WordRecord> {
    vec![
        record("aaa", 1, 2, 3),
        record("abb", 4, 5, 6),
        record("baa", 7, 8, 9),
        record("bbb", 6, 5, 4),
        record("bcc", 3, 2, 1),
    ]
}

/// Words file text for `records`.
pub fn words_file_text(records: &[WordRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}\t{}\t{}\t{}\n", r.word, r.doc_id, r.score, r.position))
        .collect()
}

/// A deterministic corpus: `docs` documents of `doc_len` words each, drawn
/// from `vocabulary` words named `w0000`, `w0001`, and so on.
///
/// Records come back sorted by word, then doc, then position.
pub fn synthetic_records(docs: u32, doc_len: u32, vocabulary: u32) -> Vec<WordRecord> {
    let mut records = Vec::with_capacity((docs * doc_len) as usize);
    for doc in 0..docs {
        for position in 0..doc_len {
            let word = (doc.wrapping_mul(7919) ^ position.wrapping_mul(104_729)) % vocabulary;
            let score = ((doc + position) % 50 + 1) as DiskScore;
            records.push(record(&format!("w{:04}", word), doc, score, position));
        }
    }
    records.sort_by(|a, b| {
        (a.word.as_str(), a.doc_id, a.position).cmp(&(b.word.as_str(), b.doc_id, b.position))
    });
    records
}

/// Build an index named `name` inside `dir`.
///
/// Returns the index path, the vocabulary and the build report.
pub fn build_in(
    dir: &Path,
    name: &str,
    records: Vec<WordRecord>,
    config: &BuildConfig,
) -> Result<(PathBuf, Vocabulary, BuildReport)> {
    let path = dir.join(format!("{}.hybrid", name));
    let writer = IndexWriter::create(&path, config.mode)?;
    let (vocabulary, report) = build_from_records(records.into_iter().map(Ok), writer, config)?;
    vocabulary.write(dir.join(format!("{}.vocabulary", name)))?;
    Ok((path, vocabulary, report))
}

/// A full-mode list from `(doc, word, position, score)` tuples.
pub fn postings(tuples: &[(u32, u32, u32, u32)]) -> PostingList {
    postings_in(IndexMode::FULL, tuples)
}

pub fn postings_in(mode: IndexMode, tuples: &[(u32, u32, u32, u32)]) -> PostingList {
    PostingList::from_postings(
        mode,
        tuples
            .iter()
            .map(|&(d, w, p, s)| Posting::new(d, w, p, s)),
    )
}
