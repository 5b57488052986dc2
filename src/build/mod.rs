// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Index construction: a sorted words file in, an index and vocabulary out.
//!
//! The words file is streamed once. Word ids are handed out in order of
//! first appearance, which is alphabetical because the file is sorted.
//! Postings collect into the current block until the [`BlockPolicy`] says a
//! new word starts the next one; the finished block is sorted by
//! `(doc, position)` and appended to the index.

pub mod policy;
pub mod words;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::binary::layout::Metadata;
use crate::error::{Error, Result};
use crate::store::{disk_scores, BlockLists, IndexWriter, WriteStats};
use crate::types::{DocId, IndexMode, Posting, PostingList, WordId};
use crate::vocabulary::Vocabulary;

pub use policy::BlockPolicy;
pub use words::{WordRecord, WordsFileReader};

use policy::BlockCutter;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    pub mode: IndexMode,
    pub policy: BlockPolicy,
    /// Postings kept per block; the rest are dropped with a warning.
    pub max_block_volume: Option<usize>,
    /// Draw a progress spinner on stderr.
    #[serde(skip)]
    pub show_progress: bool,
}

impl BuildConfig {
    /// Read a camelCase JSON build configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_error = |detail: String| Error::Config {
            path: path.to_path_buf(),
            detail,
        };
        let text = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let config: BuildConfig =
            serde_json::from_str(&text).map_err(|e| config_error(e.to_string()))?;
        config.policy.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub mode: String,
    pub metadata: Metadata,
    pub stats: WriteStats,
    pub records: u64,
    pub skipped_lines: u64,
    pub dropped_postings: u64,
    pub duplicate_postings: u64,
    pub sort_ms: u64,
    pub write_ms: u64,
    pub total_ms: u64,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(
            f,
            "{} blocks, {} words, {} docs, {} postings ({})",
            self.metadata.nof_blocks,
            self.metadata.nof_words,
            self.metadata.nof_docs,
            s.postings,
            self.mode
        )?;
        let lists = [
            ("doc ids", s.doc_bytes),
            ("positions", s.position_bytes),
            ("word ids", s.word_bytes),
            ("scores", s.score_bytes),
            ("total", s.total_bytes),
        ];
        for (name, bytes) in lists {
            writeln!(
                f,
                "  {:<10} {:>12} bytes  {:>6.2} bits/posting",
                name,
                bytes,
                s.bits_per_posting(bytes)
            )?;
        }
        write!(
            f,
            "  {} records, {} skipped lines, {} dropped, {} duplicates; \
             sort {}ms, write {}ms, total {}ms",
            self.records,
            self.skipped_lines,
            self.dropped_postings,
            self.duplicate_postings,
            self.sort_ms,
            self.write_ms,
            self.total_ms
        )
    }
}

/// Build `index_path` and `vocabulary_path` from a sorted words file.
pub fn build_index(
    words_path: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    vocabulary_path: impl AsRef<Path>,
    config: &BuildConfig,
) -> Result<BuildReport> {
    let words_path = words_path.as_ref();
    info!(
        words = %words_path.display(),
        index = %index_path.as_ref().display(),
        mode = %config.mode,
        policy = ?config.policy,
        "building index"
    );

    let mut reader =
        WordsFileReader::open(words_path)?.skip_same_word_and_doc(!config.mode.dups);
    let writer = IndexWriter::create(index_path, config.mode)?;
    let (vocabulary, mut report) = build_from_records(&mut reader, writer, config)?;
    report.skipped_lines = reader.skipped();
    vocabulary.write(vocabulary_path)?;

    info!(
        blocks = report.metadata.nof_blocks,
        words = report.metadata.nof_words,
        postings = report.stats.postings,
        bytes = report.stats.total_bytes,
        skipped_lines = report.skipped_lines,
        total_ms = report.total_ms,
        "index built"
    );
    Ok(report)
}

/// Build an index from records sorted by word, writing through `writer`.
pub fn build_from_records<I, W>(
    records: I,
    writer: IndexWriter<W>,
    config: &BuildConfig,
) -> Result<(Vocabulary, BuildReport)>
where
    I: IntoIterator<Item = Result<WordRecord>>,
    W: Write,
{
    if writer.mode() != config.mode {
        return Err(Error::invalid(format!(
            "writer mode {} differs from build mode {}",
            writer.mode(),
            config.mode
        )));
    }

    let started = Instant::now();
    let mut builder = Builder::new(writer, config)?;

    #[cfg(feature = "parallel")]
    let progress = config.show_progress.then(spinner);

    for record in records {
        let record = record?;
        builder.add(record)?;
        #[cfg(feature = "parallel")]
        if let Some(pb) = &progress {
            if builder.report.records % 100_000 == 0 {
                pb.set_position(builder.report.records);
                pb.set_message(format!("{} blocks", builder.writer.blocks_written()));
            }
        }
    }

    let result = builder.finish(started);

    #[cfg(feature = "parallel")]
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    result
}

#[cfg(feature = "parallel")]
fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:<10} {pos} records {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Building");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

struct Builder<'c, W: Write> {
    writer: IndexWriter<W>,
    config: &'c BuildConfig,
    cutter: BlockCutter<'c>,
    vocabulary: Vocabulary,
    block: PostingList,
    current_word: Option<WordId>,
    dropping_word: bool,
    docs: HashSet<DocId>,
    max_doc_id: DocId,
    sort_time: Duration,
    write_time: Duration,
    report: BuildReport,
}

impl<'c, W: Write> Builder<'c, W> {
    fn new(writer: IndexWriter<W>, config: &'c BuildConfig) -> Result<Self> {
        Ok(Self {
            writer,
            config,
            cutter: BlockCutter::new(&config.policy)?,
            vocabulary: Vocabulary::new(),
            block: PostingList::new(config.mode),
            current_word: None,
            dropping_word: false,
            docs: HashSet::new(),
            max_doc_id: 0,
            sort_time: Duration::ZERO,
            write_time: Duration::ZERO,
            report: BuildReport {
                mode: config.mode.to_string(),
                ..BuildReport::default()
            },
        })
    }

    fn add(&mut self, record: WordRecord) -> Result<()> {
        let is_new_word = self
            .current_word
            .and_then(|id| self.vocabulary.word(id))
            .map_or(true, |current| current != record.word);

        if is_new_word {
            if self.cutter.starts_new_block(&record.word, self.block.len() as u64) {
                self.flush_block()?;
            }
            // Rejects words out of order.
            let id = self.vocabulary.push(&record.word)?;
            self.current_word = Some(id);
            self.dropping_word = false;
        }
        let Some(word_id) = self.current_word else {
            return Err(Error::invalid("record without a word"));
        };

        self.report.records += 1;
        self.docs.insert(record.doc_id);
        self.max_doc_id = self.max_doc_id.max(record.doc_id);

        if let Some(limit) = self.config.max_block_volume {
            if self.block.len() >= limit {
                if !self.dropping_word {
                    warn!(
                        word = %record.word,
                        limit,
                        "block volume limit reached, dropping postings"
                    );
                    self.dropping_word = true;
                }
                self.report.dropped_postings += 1;
                return Ok(());
            }
        }

        self.block.push(Posting::new(
            record.doc_id,
            word_id,
            record.position,
            u32::from(record.score),
        ));
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.block.is_empty() {
            return Ok(());
        }

        let started = Instant::now();
        self.block.sort_by_doc_and_position();
        if !self.config.mode.dups {
            let dropped = dedup_word_in_doc(&mut self.block, self.config.mode);
            self.report.duplicate_postings += dropped as u64;
        }
        self.sort_time += started.elapsed();

        let started = Instant::now();
        let scores = disk_scores(&self.block);
        self.writer.append_block(BlockLists {
            doc_ids: &self.block.doc_ids,
            word_ids: &self.block.word_ids,
            positions: self.block.positions.as_deref(),
            scores: scores.as_deref(),
        })?;
        self.write_time += started.elapsed();

        debug!(
            block = self.writer.blocks_written() - 1,
            postings = self.block.len(),
            "wrote block"
        );
        self.block.clear();
        Ok(())
    }

    fn finish(mut self, started: Instant) -> Result<(Vocabulary, BuildReport)> {
        self.flush_block()?;
        if self.writer.blocks_written() == 0 {
            return Err(Error::invalid("words file has no postings"));
        }

        let metadata = Metadata {
            max_doc_id: u64::from(self.max_doc_id),
            nof_words: self.vocabulary.len() as u64,
            nof_docs: self.docs.len() as u64,
            nof_word_in_doc_pairs: self.report.records
                - self.report.dropped_postings
                - self.report.duplicate_postings,
            nof_blocks: self.writer.blocks_written() as u64,
        };

        let started_write = Instant::now();
        let stats = self.writer.finalize(metadata)?;
        self.write_time += started_write.elapsed();

        let mut report = self.report;
        report.metadata = metadata;
        report.stats = stats;
        report.sort_ms = self.sort_time.as_millis() as u64;
        report.write_ms = self.write_time.as_millis() as u64;
        report.total_ms = started.elapsed().as_millis() as u64;
        Ok((self.vocabulary, report))
    }
}

/// Drop repeated `(doc, word)` pairs from a doc-sorted block, keeping the
/// first. Returns how many were dropped.
fn dedup_word_in_doc(list: &mut PostingList, mode: IndexMode) -> usize {
    let n = list.len();
    let mut kept = PostingList::with_capacity(mode, n);
    let mut last_doc: Option<DocId> = None;
    let mut seen_in_doc: HashSet<WordId> = HashSet::new();
    for posting in list.iter() {
        if last_doc != Some(posting.doc_id) {
            seen_in_doc.clear();
            last_doc = Some(posting.doc_id);
        }
        if seen_in_doc.insert(posting.word_id) {
            kept.push(posting);
        }
    }
    let dropped = n - kept.len();
    if dropped > 0 {
        *list = kept;
        list.mark_sorted(true);
    }
    dropped
}
