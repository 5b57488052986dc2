//! Merge-join property tests against brute-force oracles.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use hybdex::search::{intersect, SumScores};
use hybdex::types::{Posting, SPECIAL_WORD_ID};
use hybdex::{IndexMode, IntersectionWindow, OutputMode, PostingList};

/// A doc-sorted list whose postings all carry `word`.
fn list_strategy(word: u32) -> impl Strategy<Value = PostingList> {
    prop::collection::vec((0u32..12, 0u32..20, 0u32..50), 0..40).prop_map(move |raw| {
        let mut list = PostingList::from_postings(
            IndexMode::FULL,
            raw.into_iter()
                .map(|(doc, position, score)| Posting::new(doc, word, position, score)),
        );
        list.sort_by_doc_and_position();
        list
    })
}

fn run(
    list1: &PostingList,
    list2: &PostingList,
    window: IntersectionWindow,
    output: OutputMode,
) -> PostingList {
    let mut result = PostingList::new(IndexMode::FULL);
    intersect(list1, list2, &mut result, None, window, output, &SumScores).unwrap();
    result
}

fn docs(list: &PostingList) -> BTreeSet<u32> {
    list.doc_ids.iter().copied().collect()
}

fn key(p: &Posting) -> (u32, u32, u32) {
    (p.doc_id, p.word_id, p.position)
}

/// The last list-1 posting at or before `p2` after shifting, if it lies
/// within the window.
fn oracle_partner(list1: &PostingList, doc: u32, p2: u32, left: i32, right: i32) -> bool {
    let left = i64::from(left);
    let off1 = left.max(0);
    let off2 = (-left).max(0);
    let max_diff = i64::from(right) - left;
    list1
        .iter()
        .filter(|p| p.doc_id == doc && i64::from(p.position) + off1 <= i64::from(p2) + off2)
        .map(|p| p.position)
        .max()
        .is_some_and(|p1| {
            let diff = (i64::from(p2) + off2) - (i64::from(p1) + off1);
            diff <= max_diff && p1 != p2
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Property: same-document matches are the list-2 postings of shared
    /// documents, each document closed by one special posting carrying the
    /// summed list-1 score.
    #[test]
    fn prop_same_doc_matches(list1 in list_strategy(0), list2 in list_strategy(1)) {
        let result = run(&list1, &list2, IntersectionWindow::SameDocument, OutputMode::Matches);
        let shared = docs(&list1);

        let expected: Vec<_> = list2.iter().filter(|p| shared.contains(&p.doc_id)).map(|p| key(&p)).collect();
        let written: Vec<_> = result.iter().filter(|p| !p.is_special()).map(|p| key(&p)).collect();
        prop_assert_eq!(written, expected);

        let mut list1_scores: BTreeMap<u32, u32> = BTreeMap::new();
        for p in list1.iter() {
            *list1_scores.entry(p.doc_id).or_default() += p.score;
        }
        let specials: Vec<(u32, u32)> = result
            .iter()
            .filter(|p| p.word_id == SPECIAL_WORD_ID)
            .map(|p| (p.doc_id, p.score))
            .collect();
        let expected_specials: Vec<(u32, u32)> = docs(&list2)
            .into_iter()
            .filter_map(|d| list1_scores.get(&d).map(|&s| (d, s)))
            .collect();
        prop_assert_eq!(specials, expected_specials);
        result.check_lengths().unwrap();
    }

    /// Property: non-matches are exactly the list-2 postings of documents
    /// list 1 never mentions.
    #[test]
    fn prop_same_doc_non_matches(list1 in list_strategy(0), list2 in list_strategy(1)) {
        let result = run(&list1, &list2, IntersectionWindow::SameDocument, OutputMode::NonMatches);
        let excluded = docs(&list1);
        let expected: Vec<_> = list2.iter().filter(|p| !excluded.contains(&p.doc_id)).map(|p| key(&p)).collect();
        let written: Vec<_> = result.iter().map(|p| key(&p)).collect();
        prop_assert_eq!(written, expected);
    }

    /// Property: `All` writes every list-2 posting once, in order.
    #[test]
    fn prop_all_keeps_list2(list1 in list_strategy(0), list2 in list_strategy(1)) {
        let result = run(&list1, &list2, IntersectionWindow::SameDocument, OutputMode::All);
        let written: Vec<_> = result.iter().filter(|p| !p.is_special()).map(|p| key(&p)).collect();
        let expected: Vec<_> = list2.iter().map(|p| key(&p)).collect();
        prop_assert_eq!(written, expected);
    }

    /// Property: positional matches agree with the nearest-partner oracle
    /// for any window, and matches plus non-matches partition list 2.
    #[test]
    fn prop_position_window(
        list1 in list_strategy(0),
        list2 in list_strategy(1),
        left in -5i32..5,
        width in 0i32..6,
    ) {
        let right = left + width;
        let window = IntersectionWindow::positions(left, right).unwrap();

        let matches = run(&list1, &list2, window, OutputMode::Matches);
        let expected: Vec<_> = list2
            .iter()
            .filter(|p| oracle_partner(&list1, p.doc_id, p.position, left, right))
            .map(|p| key(&p))
            .collect();
        let written: Vec<_> = matches.iter().map(|p| key(&p)).collect();
        prop_assert_eq!(&written, &expected);

        let non_matches = run(&list1, &list2, window, OutputMode::NonMatches);
        prop_assert_eq!(matches.len() + non_matches.len(), list2.len());
    }

    /// Property: output stays sorted by (doc, position), so results chain.
    #[test]
    fn prop_output_sorted(list1 in list_strategy(0), list2 in list_strategy(1)) {
        let window = IntersectionWindow::positions(-3, 3).unwrap();
        for output in [OutputMode::Matches, OutputMode::NonMatches, OutputMode::All] {
            let result = run(&list1, &list2, window, output);
            let keys: Vec<_> = result.iter().map(|p| (p.doc_id, p.position)).collect();
            prop_assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
