// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for query parsing and prefix resolution.
//!
//! Query lines come from users. Any string must parse to a query or an
//! error, and a resolved query only names word ids the vocabulary has.

#![no_main]

use hybdex::{parse_query, Vocabulary};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|line: &str| {
    let Ok(parsed) = parse_query(line) else {
        return;
    };
    assert!(!parsed.terms.is_empty());

    let vocabulary = Vocabulary::from_words(
        ["a", "ab", "abc", "b", "ba", "c", "zz", "ü"]
            .iter()
            .map(|w| w.to_string())
            .collect(),
    )
    .expect("sorted vocabulary");

    if let Some(query) = parsed.resolve(&vocabulary) {
        assert!(!query.steps.is_empty());
        for step in &query.steps {
            assert!((step.range.last() as usize) < vocabulary.len());
        }
    }
});
