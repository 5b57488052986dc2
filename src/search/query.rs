// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query lines: prefixes joined by separators.
//!
//! ```text
//! inf                 all words starting with "inf"
//! inf ret             both, anywhere in the same document
//! inf.ret             "ret..." directly after "inf..."
//! inf..ret            within ten words of each other
//! inf -ret            documents with "inf..." but without "ret..."
//! ```
//!
//! Steps run left to right. Each step after the first intersects its word
//! range with the result so far.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::WordRange;
use crate::vocabulary::Vocabulary;

use super::separator::{IntersectionWindow, OutputMode, Separator};

/// Word distance of the `..` operator.
pub const NEIGHBORHOOD: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTerm {
    pub prefix: String,
    /// How this term joins the terms before it (ignored for the first).
    #[serde(skip)]
    pub separator: Separator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    pub terms: Vec<QueryTerm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryStep {
    pub range: WordRange,
    pub separator: Separator,
}

/// A query with every prefix resolved to a word range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub steps: Vec<QueryStep>,
}

impl Query {
    /// A single word range, no intersections.
    pub fn single(range: WordRange) -> Self {
        Self {
            steps: vec![QueryStep {
                range,
                separator: Separator::SAME_DOC,
            }],
        }
    }
}

/// Split a query line into terms.
pub fn parse_query(line: &str) -> Result<ParsedQuery> {
    let mut terms = Vec::new();
    for group in line.split_whitespace() {
        let (negated, body) = match group.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, group),
        };
        let output = if negated {
            OutputMode::NonMatches
        } else {
            OutputMode::Matches
        };

        let mut window = IntersectionWindow::SameDocument;
        let mut rest = body;
        loop {
            let (prefix, next_window, tail) = match rest.find('.') {
                Some(at) => {
                    let after = &rest[at..];
                    if after.starts_with("..") {
                        (&rest[..at], near_window(), &rest[at + 2..])
                    } else {
                        (&rest[..at], phrase_window(), &rest[at + 1..])
                    }
                }
                None => (rest, IntersectionWindow::SameDocument, ""),
            };
            if prefix.is_empty() {
                return Err(Error::invalid(format!("empty term in query {:?}", line)));
            }
            terms.push(QueryTerm {
                prefix: prefix.to_owned(),
                separator: Separator::new(window, output),
            });
            if tail.is_empty() && next_window == IntersectionWindow::SameDocument {
                break;
            }
            if tail.is_empty() {
                return Err(Error::invalid(format!(
                    "query {:?} ends with a separator",
                    line
                )));
            }
            window = next_window;
            rest = tail;
        }
    }

    match terms.first() {
        None => Err(Error::invalid("empty query")),
        Some(first) if first.separator.output != OutputMode::Matches => Err(Error::invalid(
            "a query cannot start with a negated term",
        )),
        Some(_) => Ok(ParsedQuery { terms }),
    }
}

fn phrase_window() -> IntersectionWindow {
    IntersectionWindow::Positions { left: 1, right: 1 }
}

fn near_window() -> IntersectionWindow {
    let d = NEIGHBORHOOD as i32;
    IntersectionWindow::Positions { left: -d, right: d }
}

impl ParsedQuery {
    /// Resolve prefixes through `vocabulary`.
    ///
    /// Returns `None` when a required term has no completions, so the query
    /// cannot match anything. Negated terms without completions are dropped.
    pub fn resolve(&self, vocabulary: &Vocabulary) -> Option<Query> {
        let mut steps = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            match vocabulary.prefix_range(&term.prefix) {
                Some(range) => steps.push(QueryStep {
                    range,
                    separator: term.separator,
                }),
                None if term.separator.output == OutputMode::NonMatches => {}
                None => return None,
            }
        }
        Some(Query { steps })
    }
}
