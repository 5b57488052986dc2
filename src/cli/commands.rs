// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Subcommand implementations. Results go to stdout, logs to stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use hybdex::build::{build_index, BlockPolicy, BuildConfig, BuildReport};
use hybdex::search::{load_queries, top_completions, top_documents, DocHit};
use hybdex::store::{BlockStore, TableScoreOverride};
use hybdex::{
    parse_query, run_batch, BatchContext, BatchReport, Deadline, EngineConfig, Error, IndexMode,
    QueryEngine, Result, Vocabulary,
};

use super::display::{
    bits_per_posting, error_label, format_count, format_size, kv, pad_left, paint, row,
    score_value, section_bot, section_mid, section_top, timing_ms, BOLD, DIM,
};
use super::{ModeArgs, SearchArgs};

// ═══════════════════════════════════════════════════════════════════════════
// BUILD
// ═══════════════════════════════════════════════════════════════════════════

pub struct BuildArgs {
    pub words: PathBuf,
    pub output: PathBuf,
    pub block_volume: Option<u64>,
    pub boundaries: Option<PathBuf>,
    pub max_block_volume: Option<usize>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub mode: ModeArgs,
}

pub fn run_build(args: BuildArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    config.mode = override_mode(config.mode, &args.mode)?;
    if let Some(volume) = args.block_volume {
        config.policy = BlockPolicy::from_block_volume(volume);
    }
    if let Some(path) = &args.boundaries {
        config.policy = BlockPolicy::Prefixes(read_boundaries(path)?);
    }
    if args.max_block_volume.is_some() {
        config.max_block_volume = args.max_block_volume;
    }
    config.policy.validate()?;
    config.show_progress = !args.json;

    let index_path = with_suffix(&args.output, "hybrid");
    let vocabulary_path = with_suffix(&args.output, "vocabulary");
    let report = build_index(&args.words, &index_path, &vocabulary_path, &config)?;

    if args.json {
        print_json(&report)
    } else {
        print_build_report(&report, &index_path, &vocabulary_path);
        Ok(())
    }
}

/// Flags only ever switch lists off.
fn override_mode(base: IndexMode, flags: &ModeArgs) -> Result<IndexMode> {
    IndexMode::new(
        base.positions && !flags.no_positions,
        base.scores && !flags.no_scores,
        base.dups && !flags.no_dups,
    )
}

fn read_boundaries(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// `out` becomes `out.hybrid`; an existing extension is kept in the stem.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn print_build_report(report: &BuildReport, index: &Path, vocabulary: &Path) {
    let m = &report.metadata;
    let s = &report.stats;

    section_top("INDEX");
    kv("index", &index.display().to_string());
    kv("vocabulary", &vocabulary.display().to_string());
    kv("mode", &report.mode);
    kv("blocks", &format_count(m.nof_blocks));
    kv("words", &format_count(m.nof_words));
    kv("documents", &format_count(m.nof_docs));
    kv("postings", &format_count(s.postings));
    kv("word-in-doc pairs", &format_count(m.nof_word_in_doc_pairs));

    section_mid("SIZE");
    let lists = [
        ("doc ids", s.doc_bytes),
        ("positions", s.position_bytes),
        ("word ids", s.word_bytes),
        ("scores", s.score_bytes),
        ("total", s.total_bytes),
    ];
    for (name, bytes) in lists {
        if bytes == 0 && name != "total" {
            continue;
        }
        kv(
            name,
            &format!(
                "{}  {}",
                pad_left(&format_size(bytes), 10),
                bits_per_posting(s.bits_per_posting(bytes))
            ),
        );
    }

    section_mid("INPUT");
    kv("records", &format_count(report.records));
    kv("skipped lines", &format_count(report.skipped_lines));
    kv("dropped (volume)", &format_count(report.dropped_postings));
    kv("dropped (repeats)", &format_count(report.duplicate_postings));

    section_mid("TIME");
    kv("sort", &timing_ms(report.sort_ms as f64));
    kv("write", &timing_ms(report.write_ms as f64));
    kv("total", &timing_ms(report.total_ms as f64));
    section_bot();
}

// ═══════════════════════════════════════════════════════════════════════════
// INSPECT
// ═══════════════════════════════════════════════════════════════════════════

pub fn run_inspect(
    file: &Path,
    blocks: bool,
    verify: bool,
    vocabulary: Option<&Path>,
    mode: &ModeArgs,
) -> Result<()> {
    let store = BlockStore::open(file, mode.mode()?)?;
    let vocabulary = vocabulary.map(Vocabulary::load).transpose()?;
    let m = store.metadata();
    let file_len = fs::metadata(file)?.len();
    let offsets = store.offsets();
    let n = store.nof_blocks();

    section_top("HYBRID INDEX");
    kv("file", &file.display().to_string());
    kv("size", &format_size(file_len));
    kv("mode (as opened)", &store.mode().to_string());
    kv("blocks", &format_count(m.nof_blocks));
    kv("words", &format_count(m.nof_words));
    kv("documents", &format_count(m.nof_docs));
    kv("max doc id", &m.max_doc_id.to_string());
    kv("word-in-doc pairs", &format_count(m.nof_word_in_doc_pairs));

    section_mid("LAYOUT");
    kv("blocks", &format!("[0, {})", offsets[n]));
    kv("boundary table", &format!("[{}, {})", offsets[n], offsets[n + 1]));
    kv("metadata", &format!("[{}, ..)", offsets[n + 1]));

    if blocks || verify {
        section_mid("BLOCKS");
        row(&paint(
            &[DIM],
            &format!(
                "{:>6}  {:>10}  {:>10}  {:>10}  {}",
                "block", "first", "words", "bytes", "first word"
            ),
        ));
        let mut postings = 0u64;
        for id in 0..n {
            let (start, end) = store.block_span(id)?;
            let (first, words_end) = store.block_words(id)?;
            let first_word = vocabulary
                .as_ref()
                .and_then(|v| v.word(first))
                .unwrap_or("");
            let mut line = format!(
                "{:>6}  {:>10}  {:>10}  {:>10}  {}",
                id,
                first,
                words_end - u64::from(first),
                end - start,
                first_word
            );
            if verify {
                let list = store.read_block(id)?;
                list.check_lengths()?;
                postings += list.len() as u64;
                line.push_str(&format!("  ({} postings)", list.len()));
            }
            row(&line);
        }
        if verify {
            section_mid("VERIFY");
            kv("decoded postings", &format_count(postings));
            kv("status", &paint(&[BOLD], "ok"));
        }
    }
    section_bot();
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// QUERY
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryOutput<'a> {
    query: String,
    postings: usize,
    elapsed_us: u64,
    documents: Vec<DocHit>,
    completions: Vec<CompletionOutput<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOutput<'a> {
    word: &'a str,
    word_id: u32,
    score: u32,
    occurrences: u32,
}

/// Index, vocabulary and engine settings for `query` and `batch`.
struct Session {
    store: BlockStore,
    vocabulary: Vocabulary,
    config: EngineConfig,
}

impl Session {
    fn open(file: &Path, args: &SearchArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(ms) = args.timeout_ms {
            if ms == 0 {
                return Err(Error::InvalidInput("--timeout-ms must be positive".into()));
            }
            config.query_timeout_ms = ms;
        }
        if let Some(aggregation) = args.aggregation {
            config.aggregation = aggregation.into();
        }

        let vocabulary_path = args
            .vocabulary
            .clone()
            .unwrap_or_else(|| file.with_extension("vocabulary"));
        let vocabulary = Vocabulary::load(&vocabulary_path)?;
        let store = BlockStore::open(file, args.mode.mode()?)?;
        if store.nof_words() != vocabulary.len() as u64 {
            return Err(Error::InvalidInput(format!(
                "vocabulary {} has {} words, index has {}",
                vocabulary_path.display(),
                vocabulary.len(),
                store.nof_words()
            )));
        }
        Ok(Self {
            store,
            vocabulary,
            config,
        })
    }
}

pub fn run_query(
    file: &Path,
    terms: &[String],
    args: &SearchArgs,
    custom_scores: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open(file, args)?;
    if let Some(path) = custom_scores {
        let table = TableScoreOverride::load(path, &session.vocabulary)?;
        session.store.set_score_override(Some(Arc::new(table)));
    }
    let Session {
        store,
        vocabulary,
        config,
    } = &session;

    let line = terms.join(" ");
    let parsed = parse_query(&line)?;
    let started = Instant::now();

    let result = match parsed.resolve(vocabulary) {
        Some(query) => {
            let mut engine = QueryEngine::from_config(store, config, config.sort_cost());
            let aggregator = config.aggregation.build();
            let deadline = Deadline::start(config.query_timeout());
            Some(engine.process_query(&query, aggregator.as_ref(), &deadline)?)
        }
        None => None,
    };
    let elapsed = started.elapsed();

    let (postings, documents, completions) = match &result {
        Some(list) => (
            list.len(),
            top_documents(list, args.limit),
            top_completions(list, args.limit),
        ),
        None => (0, Vec::new(), Vec::new()),
    };
    let completions: Vec<CompletionOutput<'_>> = completions
        .iter()
        .map(|c| CompletionOutput {
            word: vocabulary.word(c.word_id).unwrap_or("?"),
            word_id: c.word_id,
            score: c.score,
            occurrences: c.occurrences,
        })
        .collect();

    let output = QueryOutput {
        query: line,
        postings,
        elapsed_us: elapsed.as_micros() as u64,
        documents,
        completions,
    };
    if json {
        return print_json(&output);
    }

    section_top("QUERY");
    kv("query", &paint(&[BOLD], &output.query));
    kv("postings", &format_count(output.postings as u64));
    kv("time", &timing_ms(elapsed.as_secs_f64() * 1000.0));
    section_mid("DOCUMENTS");
    if output.documents.is_empty() {
        row(&paint(&[DIM], "no matching documents"));
    }
    for (rank, hit) in output.documents.iter().enumerate() {
        row(&format!(
            "{:>3}.  doc {:<10} {}",
            rank + 1,
            hit.doc_id,
            score_value(hit.score)
        ));
    }
    section_mid("COMPLETIONS");
    for completion in &output.completions {
        row(&format!(
            "{:<28} {}  {:>6}x",
            completion.word,
            score_value(completion.score),
            completion.occurrences
        ));
    }
    section_bot();
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// BATCH
// ═══════════════════════════════════════════════════════════════════════════

/// Returns the number of failed queries.
pub fn run_batch_file(file: &Path, queries: &Path, args: &SearchArgs, json: bool) -> Result<usize> {
    let session = Session::open(file, args)?;
    let lines = load_queries(queries)?;
    let mut context = BatchContext::new(&session.store, &session.vocabulary, &session.config);
    context.limit = args.limit;
    let report = run_batch(&context, &lines);

    if json {
        print_json(&report)?;
    } else {
        print_batch_report(&report);
    }
    Ok(report.failures())
}

fn print_batch_report(report: &BatchReport) {
    section_top("QUERIES");
    for outcome in &report.outcomes {
        let status = match &outcome.error {
            Some(err) if outcome.timed_out => error_label(&format!("timeout: {}", err)),
            Some(err) => error_label(err),
            None => format!(
                "{:>8} postings  best {}",
                outcome.postings,
                outcome
                    .top
                    .first()
                    .map_or_else(|| "-".to_string(), |hit| format!("doc {}", hit.doc_id))
            ),
        };
        row(&format!(
            "{:<28} {}  {}",
            outcome.query,
            timing_ms(outcome.elapsed_us as f64 / 1000.0),
            status
        ));
    }

    let m = &report.metrics;
    section_mid("METRICS");
    kv("queries", &format_count(report.outcomes.len() as u64));
    kv("failures", &format_count(report.failures() as u64));
    kv("timeouts", &format_count(m.timeouts));
    kv("blocks read", &format_count(m.blocks_read));
    kv("bytes read", &format_size(m.bytes_read));
    kv("postings decoded", &format_count(m.postings_decoded));
    kv("postings emitted", &format_count(m.postings_emitted));
    kv("wall time", &timing_ms(report.elapsed_ms as f64));
    section_bot();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| Error::InvalidInput(format!("cannot serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}
