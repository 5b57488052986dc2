// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Binary format and integer codecs for hybrid block indexes.
//!
//! A hybrid index splits the vocabulary into contiguous word-id ranges, one
//! block per range, and stores every posting of those words in the block.
//! A prefix query maps to a word range, the range maps to a handful of
//! blocks, and each block is read with one positioned read.
//!
//! # Security Considerations
//!
//! Index files are treated as untrusted input:
//! - All length fields are validated against MAX_* constants
//! - Every read goes through a bounds-checked `ByteCursor`
//! - Decoders are bounded by the byte span of their sub-list
//! - Tables are checked for monotonicity before use
//!
//! # Format Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ BLOCK 0                                                    │
//! │   sub-list offsets: u64 × (2 + positions + scores)         │
//! │   [len u64][doc ids: gap + Simple9]                        │
//! │   [len u64][positions: u64 codes + reset-gap + Simple9]?   │
//! │   [len u64][word ids: frequency ranks + Simple9]           │
//! │   [len u64][scores: u8 each]?                              │
//! ├────────────────────────────────────────────────────────────┤
//! │ BLOCK 1 .. BLOCK n-1                                       │
//! ├────────────────────────────────────────────────────────────┤
//! │ BOUNDARY TABLE: first word id of each block, u32 × n       │
//! ├────────────────────────────────────────────────────────────┤
//! │ METADATA (40 bytes)                                        │
//! │   max_doc_id, nof_words, nof_docs,                         │
//! │   nof_word_in_doc_pairs, nof_blocks: u64                   │
//! ├────────────────────────────────────────────────────────────┤
//! │ OFFSET TABLE: u64 × (n + 2)                                │
//! │   block starts, boundary table start, metadata start       │
//! ├────────────────────────────────────────────────────────────┤
//! │ TRAILER: u64 offset of the offset table                    │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The index mode (positions, scores, dups) is not recorded in the file.
//! Readers must open an index with the mode it was built with.

pub mod cursor;
pub mod gaps;
pub mod layout;
pub mod scratch;
pub mod simple9;
pub mod window;
pub mod zipf;

pub use cursor::ByteCursor;
pub use gaps::GapMode;
pub use layout::{
    BlockHeader, Metadata, SubListSizes, SubListSpans, MAX_BLOCKS, MAX_BLOCK_BYTES,
    MAX_BLOCK_POSTINGS, MAX_CODEBOOK_LEN, METADATA_LEN, TRAILER_LEN,
};
pub use scratch::ScratchBuffer;
