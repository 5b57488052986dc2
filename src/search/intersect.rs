// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Merge-join of two doc-sorted posting lists.
//!
//! List 1 is the "context" side, list 2 the side whose postings are written.
//! Both are sorted by `(doc id, position)`. A single forward pass over each
//! list produces the result, also sorted, so intersections compose without
//! re-sorting.
//!
//! With a same-document window every list-2 posting of a shared document is
//! written, followed by one special posting that carries the combined list-1
//! scores of that document. With a position window, positions are merged too
//! and each list-2 posting is paired with the nearest list-1 posting at or
//! before it (after shifting by the window).

use crate::error::{Error, Result};
use crate::types::{Posting, PostingList, WordId, WordRange, SPECIAL_POSITION, SPECIAL_WORD_ID};

use super::aggregate::ScoreAggregator;
use super::separator::{IntersectionWindow, OutputMode, Separator};

/// Intersect candidates with freshly read postings.
///
/// For `Matches` the postings are written (filtered to `word_range`) where
/// they meet the candidates. For `NonMatches` and `All` the roles swap: the
/// candidates are written and `postings` only provides context, so it must
/// already be restricted to the word range.
pub fn intersect_with_candidates(
    candidates: &PostingList,
    postings: &PostingList,
    result: &mut PostingList,
    word_range: WordRange,
    separator: &Separator,
    aggregator: &dyn ScoreAggregator,
) -> Result<()> {
    match separator.output {
        OutputMode::Matches => intersect(
            candidates,
            postings,
            result,
            Some(word_range),
            separator.window,
            separator.output,
            aggregator,
        ),
        OutputMode::NonMatches | OutputMode::All => intersect(
            postings,
            candidates,
            result,
            None,
            separator.window,
            separator.output,
            aggregator,
        ),
    }
}

/// Append to `result` the list-2 postings selected by `window` and `output`.
///
/// `word_filter` restricts which list-2 postings may be written.
pub fn intersect(
    list1: &PostingList,
    list2: &PostingList,
    result: &mut PostingList,
    word_filter: Option<WordRange>,
    window: IntersectionWindow,
    output: OutputMode,
    aggregator: &dyn ScoreAggregator,
) -> Result<()> {
    if window.needs_positions() && !(list1.has_positions() && list2.has_positions()) {
        return Err(Error::invalid(
            "a position window needs positions on both lists",
        ));
    }

    let word_ok = |w: WordId| word_filter.map_or(true, |range| range.contains(w));
    let d1 = &list1.doc_ids;
    let d2 = &list2.doc_ids;
    let (len1, len2) = (d1.len(), d2.len());
    let scan_to_end = output != OutputMode::Matches;
    let writes_matches = output != OutputMode::NonMatches;
    let writes_non_matches = output != OutputMode::Matches;

    let mut i = 0;
    let mut j = 0;
    loop {
        if j == len2 {
            break;
        }

        while i < len1 && d1[i] < d2[j] {
            i += 1;
        }
        if i == len1 && !scan_to_end {
            break;
        }

        // List-2 postings whose doc has no partner.
        while j < len2 && (i == len1 || d2[j] < d1[i]) {
            if writes_non_matches && word_ok(list2.word_ids[j]) {
                result.push(list2.posting(j));
            }
            j += 1;
        }
        if j == len2 {
            break;
        }

        let doc = d1[i];
        match window {
            IntersectionWindow::SameDocument => {
                let mut written = false;
                while j < len2 && d2[j] == doc {
                    if writes_matches && word_ok(list2.word_ids[j]) {
                        result.push(list2.posting(j));
                        written = true;
                    }
                    j += 1;
                }
                if written {
                    i = write_special_posting(list1, i, doc, result, aggregator);
                }
            }
            IntersectionWindow::Positions { left, right } => {
                let left = i64::from(left);
                let off1 = left.max(0) as u64;
                let off2 = (-left).max(0) as u64;
                let max_diff = (i64::from(right) - left) as u64;
                let (Some(p1), Some(p2)) = (&list1.positions, &list2.positions) else {
                    return Err(Error::invalid("position window without positions"));
                };

                loop {
                    while i < len1
                        && d1[i] == doc
                        && u64::from(p1[i]) + off1 <= u64::from(p2[j]) + off2
                    {
                        i += 1;
                    }
                    let done1 = i == len1 || d1[i] != doc;

                    while j < len2
                        && d2[j] == doc
                        && (done1 || u64::from(p2[j]) + off2 < u64::from(p1[i]) + off1)
                    {
                        let wanted = word_ok(list2.word_ids[j]);
                        let matched = if i > 0 && d1[i - 1] == doc {
                            let prev = i - 1;
                            let diff = (u64::from(p2[j]) + off2)
                                .saturating_sub(u64::from(p1[prev]) + off1);
                            (diff <= max_diff && p1[prev] != p2[j]).then_some(prev)
                        } else {
                            None
                        };

                        match matched {
                            Some(prev) if writes_matches => {
                                if wanted {
                                    let mut posting = list2.posting(j);
                                    posting.score = aggregator.combine_near(
                                        list1.posting(prev).score,
                                        posting.score,
                                        i64::from(p1[prev]) - i64::from(p2[j]),
                                    );
                                    result.push(posting);
                                }
                            }
                            None if writes_non_matches && wanted => {
                                result.push(list2.posting(j));
                            }
                            _ => {}
                        }
                        j += 1;
                    }

                    if j == len2 || d2[j] != doc {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Fold the list-1 scores of `doc`, starting at `i`, into one special posting.
/// Returns the index past the last list-1 posting of `doc`.
fn write_special_posting(
    list1: &PostingList,
    mut i: usize,
    doc: u32,
    result: &mut PostingList,
    aggregator: &dyn ScoreAggregator,
) -> usize {
    let (Some(scores1), true) = (&list1.scores, result.has_scores()) else {
        return i;
    };
    let d1 = &list1.doc_ids;

    let mut score = scores1[i];
    i += 1;
    while i < d1.len() && d1[i] == doc {
        score = if list1.word_ids[i] != SPECIAL_WORD_ID {
            aggregator.combine(score, scores1[i])
        } else {
            score.saturating_add(scores1[i])
        };
        i += 1;
    }

    if result.word_ids.last() == Some(&SPECIAL_WORD_ID) {
        if let Some(last) = result.scores.as_mut().and_then(|s| s.last_mut()) {
            *last = last.saturating_add(score);
        }
    } else {
        result.push(Posting::new(doc, SPECIAL_WORD_ID, SPECIAL_POSITION, score));
    }
    i
}
