// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Top documents and top completions of a result list.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{DocId, PostingList, Score, WordId, SPECIAL_WORD_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocHit {
    pub doc_id: DocId,
    pub score: Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub word_id: WordId,
    pub score: Score,
    pub occurrences: u32,
}

/// The best `limit` documents, scored by the sum of all their postings.
///
/// Special postings count towards the document score. Ties go to the
/// lower doc id. Without scores every posting counts as one.
pub fn top_documents(result: &PostingList, limit: usize) -> Vec<DocHit> {
    let mut hits: Vec<DocHit> = Vec::new();
    for posting in result.iter() {
        let score = if result.has_scores() { posting.score } else { 1 };
        // The list is doc-sorted, so one document is one run.
        match hits.last_mut() {
            Some(last) if last.doc_id == posting.doc_id => {
                last.score = last.score.saturating_add(score);
            }
            _ => hits.push(DocHit {
                doc_id: posting.doc_id,
                score,
            }),
        }
    }
    hits.sort_by(|a, b| b.score.cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
    hits.truncate(limit);
    hits
}

/// The best `limit` words of the result, by summed score.
pub fn top_completions(result: &PostingList, limit: usize) -> Vec<Completion> {
    let mut by_word: HashMap<WordId, Completion> = HashMap::new();
    for posting in result.iter().filter(|p| p.word_id != SPECIAL_WORD_ID) {
        let score = if result.has_scores() { posting.score } else { 1 };
        let entry = by_word.entry(posting.word_id).or_insert(Completion {
            word_id: posting.word_id,
            score: 0,
            occurrences: 0,
        });
        entry.score = entry.score.saturating_add(score);
        entry.occurrences += 1;
    }
    let mut completions: Vec<Completion> = by_word.into_values().collect();
    completions.sort_by(|a, b| b.score.cmp(&a.score).then(a.word_id.cmp(&b.word_id)));
    completions.truncate(limit);
    completions
}
