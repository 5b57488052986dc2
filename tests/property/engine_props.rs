//! Engine property tests: random corpora, random block cuts, random ranges.

use std::collections::BTreeSet;

use proptest::prelude::*;

use hybdex::build::WordRecord;
use hybdex::search::SumScores;
use hybdex::{BlockPolicy, IndexMode, OutputMode, PostingList, Separator, WordRange};

use super::common::{
    build_test_index, config, engine, generous_deadline, is_doc_sorted, oracle_range, record,
    tuples, TestIndex,
};

// ============================================================================
// STRATEGIES
// ============================================================================

/// Records over words `a0`, `b1`, `c2`, ... sorted as a words file would be.
fn corpus_strategy() -> impl Strategy<Value = Vec<WordRecord>> {
    prop::collection::vec((0u32..30, 0u32..25, 0u32..40, 0u8..=255), 1..300).prop_map(|raw| {
        let mut records: Vec<WordRecord> = raw
            .into_iter()
            .map(|(w, doc, pos, score)| {
                let letter = char::from(b'a' + (w % 3) as u8);
                record(&format!("{}{}", letter, w), doc, score, pos)
            })
            .collect();
        records.sort_by(|a, b| {
            (a.word.as_str(), a.doc_id, a.position).cmp(&(b.word.as_str(), b.doc_id, b.position))
        });
        records
    })
}

fn policy_strategy() -> impl Strategy<Value = BlockPolicy> {
    prop_oneof![
        (1u64..40).prop_map(BlockPolicy::Volume),
        (1usize..3).prop_map(BlockPolicy::PrefixLength),
        Just(BlockPolicy::Prefixes(vec!["b".into(), "b2".into(), "c".into()])),
    ]
}

/// A word range inside the vocabulary, from two arbitrary seeds.
fn pick_range(index: &TestIndex, a: u32, b: u32) -> WordRange {
    let n = index.store.nof_words() as u32;
    let (x, y) = (a % n, b % n);
    WordRange::new(x.min(y), x.max(y)).unwrap()
}

fn read(index: &TestIndex, candidates: Option<&PostingList>, r: WordRange, sep: &Separator) -> PostingList {
    engine(&index.store)
        .process_range(candidates, r, sep, &SumScores, &generous_deadline())
        .unwrap()
}

fn docs_of(tuples: &[(u32, u32, u32, u32)]) -> BTreeSet<u32> {
    tuples.iter().map(|t| t.0).collect()
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: a plain range read returns exactly the range's postings,
    /// doc-sorted, under any block policy.
    #[test]
    fn prop_range_read_matches_oracle(
        records in corpus_strategy(),
        policy in policy_strategy(),
        a: u32,
        b: u32,
    ) {
        let index = build_test_index(records.clone(), &config(IndexMode::FULL, policy));
        let r = pick_range(&index, a, b);
        let result = read(&index, None, r, &Separator::SAME_DOC);
        prop_assert!(is_doc_sorted(&result));
        prop_assert_eq!(tuples(&result), oracle_range(&records, &index.vocabulary, r));
    }

    /// Property: the blocks of an index partition its postings.
    #[test]
    fn prop_blocks_partition_postings(records in corpus_strategy(), policy in policy_strategy()) {
        let index = build_test_index(records.clone(), &config(IndexMode::FULL, policy));
        let mut total = 0;
        let mut previous_last = None;
        for b in 0..index.store.nof_blocks() {
            let block = index.store.read_block(b).unwrap();
            let (first, end) = index.store.block_words(b).unwrap();
            prop_assert!(block.word_ids.iter().all(|&w| first <= w && u64::from(w) < end));
            if let Some(prev) = previous_last {
                prop_assert_eq!(prev, u64::from(first));
            }
            previous_last = Some(end);
            total += block.len();
        }
        prop_assert_eq!(total, records.len());
    }

    /// Property: AND keeps the second range's postings in documents that
    /// hold the first range.
    #[test]
    fn prop_and_matches_oracle(
        records in corpus_strategy(),
        policy in policy_strategy(),
        seeds in (any::<u32>(), any::<u32>(), any::<u32>(), any::<u32>()),
    ) {
        let index = build_test_index(records.clone(), &config(IndexMode::FULL, policy));
        let r1 = pick_range(&index, seeds.0, seeds.1);
        let r2 = pick_range(&index, seeds.2, seeds.3);

        let candidates = read(&index, None, r1, &Separator::SAME_DOC);
        let result = read(&index, Some(&candidates), r2, &Separator::SAME_DOC);

        let context = docs_of(&oracle_range(&records, &index.vocabulary, r1));
        let expected: Vec<_> = oracle_range(&records, &index.vocabulary, r2)
            .into_iter()
            .filter(|t| context.contains(&t.0))
            .collect();
        let written = PostingList::from_postings(
            IndexMode::FULL,
            result.iter().filter(|p| !p.is_special()),
        );
        prop_assert_eq!(tuples(&written), expected);
        prop_assert!(is_doc_sorted(&result));
    }

    /// Property: negation keeps the candidates whose documents lack the range.
    #[test]
    fn prop_negation_matches_oracle(
        records in corpus_strategy(),
        policy in policy_strategy(),
        seeds in (any::<u32>(), any::<u32>(), any::<u32>(), any::<u32>()),
    ) {
        let index = build_test_index(records.clone(), &config(IndexMode::FULL, policy));
        let r1 = pick_range(&index, seeds.0, seeds.1);
        let r2 = pick_range(&index, seeds.2, seeds.3);

        let candidates = read(&index, None, r1, &Separator::SAME_DOC);
        let not = Separator::new(Separator::SAME_DOC.window, OutputMode::NonMatches);
        let result = read(&index, Some(&candidates), r2, &not);

        let excluded = docs_of(&oracle_range(&records, &index.vocabulary, r2));
        let expected: Vec<_> = tuples(&candidates)
            .into_iter()
            .filter(|t| !excluded.contains(&t.0))
            .collect();
        prop_assert_eq!(tuples(&result), expected);
    }
}
