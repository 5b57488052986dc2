//! Build from a words file on disk, reopen, and answer queries.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use hybdex::build::{build_index, BuildConfig, WordRecord};
use hybdex::search::{top_completions, top_documents};
use hybdex::testing::words_file_text;
use hybdex::{
    parse_query, BlockPolicy, BlockStore, Deadline, EngineConfig, IndexMode, QueryEngine,
    Vocabulary,
};
use tempfile::TempDir;

use super::common::{oracle_range, range, synthetic_records};

struct OnDisk {
    _dir: TempDir,
    index: PathBuf,
    records: Vec<WordRecord>,
}

fn build_on_disk(policy: BlockPolicy) -> OnDisk {
    let dir = tempfile::tempdir().unwrap();
    let records = synthetic_records(30, 10, 40);
    let words = dir.path().join("corpus.words");
    fs::write(&words, format!("# word doc score position\n{}", words_file_text(&records))).unwrap();

    let index = dir.path().join("corpus.hybrid");
    let config = BuildConfig {
        policy,
        ..BuildConfig::default()
    };
    let report = build_index(&words, &index, index.with_extension("vocabulary"), &config).unwrap();
    assert_eq!(report.records, records.len() as u64);
    assert_eq!(report.skipped_lines, 0);
    OnDisk {
        _dir: dir,
        index,
        records,
    }
}

fn docs_with_prefix(records: &[WordRecord], prefix: &str) -> BTreeSet<u32> {
    records
        .iter()
        .filter(|r| r.word.starts_with(prefix))
        .map(|r| r.doc_id)
        .collect()
}

fn engine_config() -> EngineConfig {
    EngineConfig {
        sort_cost_micros_per_million: Some(0.0),
        ..EngineConfig::default()
    }
}

#[test]
fn test_prefix_boundaries_build() {
    let built = build_on_disk(BlockPolicy::Prefixes(vec![
        "w0010".into(),
        "w0020".into(),
        "w0030".into(),
    ]));
    let store = BlockStore::open(&built.index, IndexMode::FULL).unwrap();
    let vocabulary = Vocabulary::load(built.index.with_extension("vocabulary")).unwrap();

    assert_eq!(store.nof_blocks(), 4);
    assert_eq!(store.nof_words(), vocabulary.len() as u64);
    for (b, &first) in store.boundaries().iter().enumerate().skip(1) {
        let word = vocabulary.word(first).unwrap();
        assert_eq!(&word[..4], ["w001", "w002", "w003"][b - 1], "block {}", b);
    }
}

#[test]
fn test_and_query_end_to_end() {
    let built = build_on_disk(BlockPolicy::Volume(20));
    let store = BlockStore::open(&built.index, IndexMode::FULL).unwrap();
    let vocabulary = Vocabulary::load(built.index.with_extension("vocabulary")).unwrap();
    let config = engine_config();

    let query = parse_query("w001 w002").unwrap().resolve(&vocabulary).unwrap();
    let mut engine = QueryEngine::from_config(&store, &config, config.sort_cost());
    let aggregator = config.aggregation.build();
    let result = engine
        .process_query(&query, aggregator.as_ref(), &Deadline::start(config.query_timeout()))
        .unwrap();

    let expected: BTreeSet<u32> = docs_with_prefix(&built.records, "w001")
        .intersection(&docs_with_prefix(&built.records, "w002"))
        .copied()
        .collect();
    let found: BTreeSet<u32> = top_documents(&result, usize::MAX)
        .into_iter()
        .map(|hit| hit.doc_id)
        .collect();
    assert_eq!(found, expected);

    for completion in top_completions(&result, 5) {
        let word = vocabulary.word(completion.word_id).unwrap();
        assert!(word.starts_with("w002"), "{}", word);
    }
    assert_eq!(engine.metrics().queries, 2);
}

#[test]
fn test_prefix_read_end_to_end() {
    let built = build_on_disk(BlockPolicy::PrefixLength(4));
    let store = BlockStore::open(&built.index, IndexMode::FULL).unwrap();
    let vocabulary = Vocabulary::load(built.index.with_extension("vocabulary")).unwrap();
    let config = engine_config();

    let prefix = vocabulary.prefix_range("w000").unwrap();
    let mut engine = QueryEngine::from_config(&store, &config, config.sort_cost());
    let result = engine
        .process_range(
            None,
            prefix,
            &hybdex::Separator::SAME_DOC,
            &hybdex::search::SumScores,
            &Deadline::start(config.query_timeout()),
        )
        .unwrap();
    assert_eq!(
        super::common::tuples(&result),
        oracle_range(&built.records, &vocabulary, prefix)
    );

    let everything = range(0, store.nof_words() as u32 - 1);
    assert!(store.resolve(everything).unwrap().len() >= 4);
}

#[test]
fn test_engine_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    fs::write(
        &path,
        r#"{ "queryTimeoutMs": 250, "aggregation": "max", "sortCostMicrosPerMillion": 1.5 }"#,
    )
    .unwrap();
    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.query_timeout_ms, 250);
    assert_eq!(config.aggregation, hybdex::Aggregation::Max);
    assert!(config.whole_block_shortcut);

    fs::write(&path, r#"{ "queryTimeout": 250 }"#).unwrap();
    match EngineConfig::load(&path) {
        Err(hybdex::Error::Config { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a config error, got {:?}", other),
    }
}
