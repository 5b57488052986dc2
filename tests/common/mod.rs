//! Shared test utilities and fixtures.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hybdex::build::{BuildConfig, BuildReport, WordRecord};
use hybdex::testing::build_in;
use hybdex::{
    BlockPolicy, BlockStore, Deadline, IndexMode, MeasuredSortCost, PostingList, QueryEngine,
    Vocabulary, WordRange,
};
use tempfile::TempDir;

// Re-export canonical test utilities from hybdex::testing
pub use hybdex::testing::{postings, record, sample_records, synthetic_records};

// ============================================================================
// INDEX FIXTURES
// ============================================================================

/// An index on disk, kept alive with its temporary directory.
pub struct TestIndex {
    pub dir: TempDir,
    pub path: PathBuf,
    pub store: BlockStore,
    pub vocabulary: Vocabulary,
    pub report: BuildReport,
}

pub fn build_test_index(records: Vec<WordRecord>, config: &BuildConfig) -> TestIndex {
    let dir = tempfile::tempdir().expect("temp dir");
    let (path, vocabulary, report) =
        build_in(dir.path(), "test", records, config).expect("build index");
    let store = BlockStore::open(&path, config.mode).expect("open index");
    TestIndex {
        dir,
        path,
        store,
        vocabulary,
        report,
    }
}

pub fn config(mode: IndexMode, policy: BlockPolicy) -> BuildConfig {
    BuildConfig {
        mode,
        policy,
        ..BuildConfig::default()
    }
}

/// Full mode, a new block every `volume` postings.
pub fn volume_config(volume: u64) -> BuildConfig {
    config(IndexMode::FULL, BlockPolicy::Volume(volume))
}

/// A synthetic corpus spread over many small blocks.
pub fn multi_block_index() -> TestIndex {
    build_test_index(synthetic_records(40, 12, 60), &volume_config(25))
}

// ============================================================================
// ENGINE
// ============================================================================

/// An engine whose sort never looks expensive.
pub fn engine(store: &BlockStore) -> QueryEngine<'_> {
    QueryEngine::new(store, Arc::new(MeasuredSortCost::from_micros(0.0)))
}

pub fn generous_deadline() -> Deadline {
    Deadline::start(Duration::from_secs(60))
}

pub fn range(first: u32, last: u32) -> WordRange {
    WordRange::new(first, last).expect("valid range")
}

// ============================================================================
// ORACLES
// ============================================================================

/// `(doc, word, position, score)` of every posting, fully sorted.
pub fn tuples(list: &PostingList) -> Vec<(u32, u32, u32, u32)> {
    let mut out: Vec<_> = list
        .iter()
        .map(|p| (p.doc_id, p.word_id, p.position, p.score))
        .collect();
    out.sort_unstable();
    out
}

/// Postings of `range` computed straight from the input records.
pub fn oracle_range(
    records: &[WordRecord],
    vocabulary: &Vocabulary,
    range: WordRange,
) -> Vec<(u32, u32, u32, u32)> {
    let mut out: Vec<_> = records
        .iter()
        .filter_map(|r| {
            let word = vocabulary.id(&r.word)?;
            range
                .contains(word)
                .then_some((r.doc_id, word, r.position, u32::from(r.score)))
        })
        .collect();
    out.sort_unstable();
    out
}

/// True when the list is ordered by `(doc, position)`.
pub fn is_doc_sorted(list: &PostingList) -> bool {
    let keys: Vec<_> = list.iter().map(|p| (p.doc_id, p.position)).collect();
    keys.windows(2).all(|w| w[0] <= w[1])
}
