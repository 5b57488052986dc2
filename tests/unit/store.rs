//! Tests for the block store: layout, block reads and corrupt files.

use std::fs;

use hybdex::{BlockPolicy, BlockStore, Error, IndexMode};

use super::common::{build_test_index, config, range, sample_records, TestIndex};

fn sample_index() -> TestIndex {
    build_test_index(
        sample_records(),
        &config(IndexMode::FULL, BlockPolicy::PrefixLength(1)),
    )
}

// ============================================================================
// LAYOUT
// ============================================================================

#[test]
fn test_sample_metadata() {
    let index = sample_index();
    let m = index.store.metadata();
    assert_eq!(m.nof_blocks, 2);
    assert_eq!(m.nof_words, 5);
    assert_eq!(m.nof_docs, 5);
    assert_eq!(m.max_doc_id, 7);
    assert_eq!(m.nof_word_in_doc_pairs, 5);
    assert_eq!(index.store.boundaries(), &[0, 2]);
    assert_eq!(index.store.offsets().len(), 4);
}

#[test]
fn test_block_words_and_spans() {
    let index = sample_index();
    assert_eq!(index.store.block_words(0).unwrap(), (0, 2));
    assert_eq!(index.store.block_words(1).unwrap(), (2, 5));

    let (start0, end0) = index.store.block_span(0).unwrap();
    let (start1, _) = index.store.block_span(1).unwrap();
    assert_eq!(start0, 0);
    assert_eq!(end0, start1);

    assert!(matches!(
        index.store.block_span(2),
        Err(Error::InvalidInput(_))
    ));
}

// ============================================================================
// BLOCK READS
// ============================================================================

#[test]
fn test_first_block_lists() {
    let index = sample_index();
    let block = index.store.read_block(0).unwrap();
    assert_eq!(block.doc_ids, vec![1, 4]);
    assert_eq!(block.word_ids, vec![0, 1]);
    assert_eq!(block.positions, Some(vec![3, 6]));
    assert_eq!(block.scores, Some(vec![2, 5]));
}

#[test]
fn test_second_block_is_doc_sorted() {
    let index = sample_index();
    let block = index.store.read_block(1).unwrap();
    assert_eq!(block.doc_ids, vec![3, 6, 7]);
    assert_eq!(block.word_ids, vec![4, 3, 2]);
    assert_eq!(block.positions, Some(vec![1, 4, 9]));
    assert_eq!(block.scores, Some(vec![2, 5, 8]));
}

#[test]
fn test_reader_reuses_output_list() {
    let index = sample_index();
    let mut reader = index.store.reader();
    let mut list = hybdex::PostingList::new(IndexMode::FULL);

    let info = reader.read_into(1, &mut list).unwrap();
    assert_eq!(info.postings, 3);
    assert!(info.bytes > 0);

    reader.read_into(0, &mut list).unwrap();
    assert_eq!(list.len(), 2);
    list.check_lengths().unwrap();
}

#[test]
fn test_resolve_through_store() {
    let index = sample_index();
    let blocks = index.store.resolve(range(1, 3)).unwrap();
    assert_eq!((blocks.first, blocks.last), (0, 1));
    assert!(!blocks.starts_exactly);
    assert!(!blocks.ends_exactly);

    let blocks = index.store.resolve(range(2, 4)).unwrap();
    assert_eq!((blocks.first, blocks.last), (1, 1));
    assert!(blocks.whole_block_in_range(1));

    assert!(index.store.resolve(range(3, 5)).is_err());
}

#[test]
fn test_docs_only_mode() {
    let mode = IndexMode::DOCS_ONLY;
    let index = build_test_index(sample_records(), &config(mode, BlockPolicy::PrefixLength(1)));
    let block = index.store.read_block(1).unwrap();
    assert_eq!(block.doc_ids, vec![3, 6, 7]);
    assert_eq!(block.word_ids, vec![4, 3, 2]);
    assert!(block.positions.is_none());
    assert!(block.scores.is_none());
    assert_eq!(index.report.stats.position_bytes, 0);
    assert_eq!(index.report.stats.score_bytes, 0);
}

// ============================================================================
// CORRUPTION
// ============================================================================

#[test]
fn test_tiny_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.hybrid");
    fs::write(&path, [1u8, 2, 3]).unwrap();
    let err = BlockStore::open(&path, IndexMode::FULL).unwrap_err();
    assert!(matches!(err, Error::Corrupt { .. }), "{}", err);
}

#[test]
fn test_trailer_past_end_is_corrupt() {
    let index = sample_index();
    let mut bytes = fs::read(&index.path).unwrap();
    let n = bytes.len();
    bytes[n - 8..].copy_from_slice(&u64::MAX.to_le_bytes());
    fs::write(&index.path, &bytes).unwrap();

    let err = BlockStore::open(&index.path, IndexMode::FULL).unwrap_err();
    assert!(err.is_format_defect(), "{}", err);
}

#[test]
fn test_decreasing_offsets_are_corrupt() {
    let index = sample_index();
    let mut bytes = fs::read(&index.path).unwrap();
    let n = bytes.len();
    let table = u64::from_le_bytes(bytes[n - 8..].try_into().unwrap()) as usize;
    // Second block starts before the first.
    bytes[table + 8..table + 16].copy_from_slice(&0u64.to_le_bytes());
    fs::write(&index.path, &bytes).unwrap();

    let err = BlockStore::open(&index.path, IndexMode::FULL).unwrap_err();
    assert!(matches!(err, Error::Corrupt { .. }), "{}", err);
}

#[test]
fn test_garbled_block_header_is_reported() {
    let index = sample_index();
    let mut bytes = fs::read(&index.path).unwrap();
    bytes[..8].copy_from_slice(&u64::MAX.to_le_bytes());
    fs::write(&index.path, &bytes).unwrap();

    let store = BlockStore::open(&index.path, IndexMode::FULL).unwrap();
    let err = store.read_block(0).unwrap_err();
    assert!(err.is_format_defect(), "{}", err);
    // The other block is untouched.
    assert_eq!(store.read_block(1).unwrap().len(), 3);
}
