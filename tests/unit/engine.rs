//! Tests for the query engine: range reads, intersections and deadlines.

use std::sync::Arc;
use std::time::Duration;

use hybdex::search::{top_documents, SumScores};
use hybdex::types::SPECIAL_WORD_ID;
use hybdex::{
    parse_query, BlockPolicy, Deadline, Error, IndexMode, OutputMode, PostingList, Query,
    QueryEngine, Separator, SortCostEstimator, TimeoutStage,
};

use super::common::{
    build_test_index, config, engine, generous_deadline, is_doc_sorted, multi_block_index,
    oracle_range, range, record, synthetic_records, tuples, volume_config,
};

fn non_special_docs(list: &PostingList) -> Vec<u32> {
    let mut docs: Vec<u32> = list
        .iter()
        .filter(|p| !p.is_special())
        .map(|p| p.doc_id)
        .collect();
    docs.dedup();
    docs
}

// ============================================================================
// UNINTERSECTED RANGES
// ============================================================================

#[test]
fn test_range_matches_records() {
    let records = synthetic_records(40, 12, 60);
    let index = build_test_index(records.clone(), &volume_config(25));
    assert!(index.store.nof_blocks() > 5);

    let max = index.store.nof_words() as u32 - 1;
    let mut engine = engine(&index.store);
    for (first, last) in [(0, 0), (3, 17), (10, max), (0, max), (42, 43)] {
        let r = range(first, last);
        let result = engine
            .process_range(None, r, &Separator::SAME_DOC, &SumScores, &generous_deadline())
            .unwrap();
        assert!(is_doc_sorted(&result), "range {} not sorted", r);
        assert_eq!(tuples(&result), oracle_range(&records, &index.vocabulary, r));
    }
    assert_eq!(engine.metrics().queries, 5);
    assert!(engine.metrics().blocks_read > 5);
}

#[test]
fn test_whole_block_shortcut_is_equivalent() {
    let index = multi_block_index();
    let boundaries = index.store.boundaries().to_vec();
    let nof_words = index.store.nof_words() as u32;
    // Starts and ends exactly on block boundaries, so inner blocks are whole.
    let r = range(boundaries[1], boundaries[4] - 1);
    let all = range(0, nof_words - 1);

    for r in [r, all] {
        let mut with = engine(&index.store);
        let mut without = engine(&index.store);
        without.set_whole_block_shortcut(false);
        let deadline = generous_deadline();
        let a = with
            .process_range(None, r, &Separator::SAME_DOC, &SumScores, &deadline)
            .unwrap();
        let b = without
            .process_range(None, r, &Separator::SAME_DOC, &SumScores, &deadline)
            .unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_best_match_bonus() {
    let index = build_test_index(
        vec![record("alpha", 1, 4, 0), record("alps", 2, 4, 0)],
        &volume_config(100),
    );
    let mut engine = engine(&index.store);
    engine.set_best_match_bonus(100);
    engine.set_last_best_match(Some(1));
    let result = engine
        .process_range(None, range(0, 1), &Separator::SAME_DOC, &SumScores, &generous_deadline())
        .unwrap();
    assert_eq!(result.scores, Some(vec![4, 104]));
}

// ============================================================================
// INTERSECTIONS
// ============================================================================

fn phrase_index() -> super::common::TestIndex {
    // doc 1: information retrieval
    // doc 2: information systems retrieval
    build_test_index(
        vec![
            record("information", 1, 3, 0),
            record("information", 2, 3, 0),
            record("retrieval", 1, 5, 1),
            record("retrieval", 2, 5, 2),
            record("systems", 2, 1, 1),
        ],
        &config(IndexMode::FULL, BlockPolicy::Volume(1)),
    )
}

fn run_query(index: &super::common::TestIndex, line: &str) -> PostingList {
    let query = parse_query(line)
        .unwrap()
        .resolve(&index.vocabulary)
        .expect("every term has completions");
    engine(&index.store)
        .process_query(&query, &SumScores, &generous_deadline())
        .unwrap()
}

#[test]
fn test_same_document_and() {
    let index = phrase_index();
    let result = run_query(&index, "inf ret");
    assert_eq!(non_special_docs(&result), vec![1, 2]);
    // Two retrieval postings, each followed by the information score.
    assert_eq!(result.word_ids, vec![1, SPECIAL_WORD_ID, 1, SPECIAL_WORD_ID]);
    assert_eq!(result.scores, Some(vec![5, 3, 5, 3]));

    let hits = top_documents(&result, 10);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].score, 8);
}

#[test]
fn test_phrase_and_near() {
    let index = phrase_index();
    assert_eq!(non_special_docs(&run_query(&index, "inf.ret")), vec![1]);
    assert_eq!(non_special_docs(&run_query(&index, "inf..ret")), vec![1, 2]);
    assert_eq!(non_special_docs(&run_query(&index, "sys.ret")), vec![2]);
    assert!(run_query(&index, "ret.inf").is_empty());
}

#[test]
fn test_negation_spans_blocks() {
    // One word per block, so the negated range covers two blocks.
    let index = build_test_index(
        vec![
            record("apple", 1, 1, 0),
            record("apple", 2, 1, 0),
            record("apple", 3, 1, 0),
            record("apple", 4, 1, 0),
            record("bakery", 2, 1, 1),
            record("banana", 3, 1, 1),
        ],
        &config(IndexMode::FULL, BlockPolicy::Volume(1)),
    );
    assert_eq!(index.store.nof_blocks(), 3);

    let result = run_query(&index, "apple -ba");
    assert_eq!(result.doc_ids, vec![1, 4]);
    assert_eq!(result.word_ids, vec![0, 0]);
}

#[test]
fn test_all_output_keeps_every_candidate() {
    let index = phrase_index();
    let mut engine = engine(&index.store);
    let deadline = generous_deadline();
    let candidates = engine
        .process_range(None, range(0, 0), &Separator::SAME_DOC, &SumScores, &deadline)
        .unwrap();
    let separator = Separator::new(Separator::phrase().window, OutputMode::All);
    let result = engine
        .process_range(Some(&candidates), range(1, 1), &separator, &SumScores, &deadline)
        .unwrap();
    assert_eq!(result.doc_ids, vec![1, 2]);
    assert_eq!(result.word_ids, vec![0, 0]);
}

#[test]
fn test_empty_intersection_stops_early() {
    let index = phrase_index();
    let query = parse_query("ret.inf sys")
        .unwrap()
        .resolve(&index.vocabulary)
        .unwrap();
    let mut engine = engine(&index.store);
    let result = engine
        .process_query(&query, &SumScores, &generous_deadline())
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(engine.metrics().queries, 2);
}

#[test]
fn test_and_across_blocks_without_positions() {
    // One word per block; each block writes its own special posting for doc 1.
    let mode = IndexMode::new(false, true, true).unwrap();
    let index = build_test_index(
        vec![
            record("alpha", 1, 10, 0),
            record("beta", 1, 1, 1),
            record("gamma", 1, 1, 2),
        ],
        &config(mode, BlockPolicy::Volume(1)),
    );
    assert_eq!(index.store.nof_blocks(), 3);

    let mut engine = engine(&index.store);
    let deadline = generous_deadline();
    let candidates = engine
        .process_range(None, range(0, 0), &Separator::SAME_DOC, &SumScores, &deadline)
        .unwrap();
    let result = engine
        .process_range(Some(&candidates), range(1, 2), &Separator::SAME_DOC, &SumScores, &deadline)
        .unwrap();
    assert_eq!(result.word_ids, vec![1, 2, SPECIAL_WORD_ID]);
    assert_eq!(result.scores, Some(vec![1, 1, 10]));

    let hits = top_documents(&result, 10);
    assert_eq!(hits.len(), 1);
    assert_eq!((hits[0].doc_id, hits[0].score), (1, 12));
}

#[test]
fn test_phrase_after_and_needs_adjacent_partner() {
    let index = phrase_index();
    // doc 2 has information and systems, but retrieval is two words on.
    assert!(run_query(&index, "sys inf.ret").is_empty());
    assert_eq!(non_special_docs(&run_query(&index, "ret inf.sys")), vec![2]);
}

#[test]
fn test_empty_query_is_rejected() {
    let index = phrase_index();
    let query = Query { steps: Vec::new() };
    let err = engine(&index.store)
        .process_query(&query, &SumScores, &generous_deadline())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_candidates_must_match_index_mode() {
    let index = phrase_index();
    let candidates = PostingList::new(IndexMode::DOCS_ONLY);
    let err = engine(&index.store)
        .process_range(
            Some(&candidates),
            range(0, 0),
            &Separator::SAME_DOC,
            &SumScores,
            &generous_deadline(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_phrase_needs_positions() {
    let mode = IndexMode::new(false, true, true).unwrap();
    let index = build_test_index(
        vec![record("alpha", 1, 1, 0), record("beta", 1, 1, 1)],
        &config(mode, BlockPolicy::Volume(100)),
    );
    let err = engine(&index.store)
        .process_range(None, range(0, 1), &Separator::phrase(), &SumScores, &generous_deadline())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

// ============================================================================
// DEADLINES
// ============================================================================

#[test]
fn test_expired_deadline_times_out_at_first_block() {
    let index = multi_block_index();
    let mut engine = engine(&index.store);
    let max = index.store.nof_words() as u32 - 1;
    let deadline = Deadline::started_ago(Duration::from_secs(10), Duration::from_secs(1));
    let err = engine
        .process_range(None, range(0, max), &Separator::SAME_DOC, &SumScores, &deadline)
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(
        err,
        Error::Timeout {
            stage: TimeoutStage::BlockCheckpoint { block: 0 },
            ..
        }
    ));
    assert_eq!(engine.metrics().timeouts, 1);
}

#[derive(Debug)]
struct SlowSort;

impl SortCostEstimator for SlowSort {
    fn estimate(&self, _elements: usize) -> Duration {
        Duration::from_secs(3600)
    }
}

#[test]
fn test_expensive_sort_times_out() {
    let index = multi_block_index();
    let mut engine = QueryEngine::new(&index.store, Arc::new(SlowSort));
    let deadline = Deadline::start(Duration::from_secs(60));

    // A single block needs no sort.
    let single = range(0, 0);
    assert!(engine
        .process_range(None, single, &Separator::SAME_DOC, &SumScores, &deadline)
        .is_ok());

    let max = index.store.nof_words() as u32 - 1;
    let err = engine
        .process_range(None, range(0, max), &Separator::SAME_DOC, &SumScores, &deadline)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Timeout {
            stage: TimeoutStage::BeforeSort { .. },
            ..
        }
    ));
}
