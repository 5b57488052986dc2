//! Tests for query parsing and prefix resolution against a real vocabulary.

use hybdex::search::query::NEIGHBORHOOD;
use hybdex::{parse_query, IntersectionWindow, OutputMode, Separator, Vocabulary};

fn vocabulary() -> Vocabulary {
    Vocabulary::from_words(
        ["info", "inform", "information", "retrieval", "system", "systems"]
            .iter()
            .map(|w| w.to_string())
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_prefix_resolves_to_word_range() {
    let query = parse_query("inf").unwrap().resolve(&vocabulary()).unwrap();
    assert_eq!(query.steps.len(), 1);
    assert_eq!(query.steps[0].range.first(), 0);
    assert_eq!(query.steps[0].range.last(), 2);
}

#[test]
fn test_separators_follow_operators() {
    let query = parse_query("inf.ret sys..ret -syst")
        .unwrap()
        .resolve(&vocabulary())
        .unwrap();
    let separators: Vec<Separator> = query.steps.iter().map(|s| s.separator).collect();
    let near = NEIGHBORHOOD as i32;
    assert_eq!(
        separators,
        vec![
            Separator::SAME_DOC,
            Separator::phrase(),
            Separator::SAME_DOC,
            Separator::new(
                IntersectionWindow::Positions {
                    left: -near,
                    right: near
                },
                OutputMode::Matches
            ),
            Separator::new(IntersectionWindow::SameDocument, OutputMode::NonMatches),
        ]
    );
}

#[test]
fn test_unknown_required_term_matches_nothing() {
    let parsed = parse_query("info zebra").unwrap();
    assert!(parsed.resolve(&vocabulary()).is_none());
}

#[test]
fn test_unknown_negated_term_is_dropped() {
    let query = parse_query("info -zebra")
        .unwrap()
        .resolve(&vocabulary())
        .unwrap();
    assert_eq!(query.steps.len(), 1);
}

#[test]
fn test_malformed_queries() {
    assert!(parse_query("").is_err());
    assert!(parse_query("   ").is_err());
    assert!(parse_query("-info").is_err());
    assert!(parse_query("info.").is_err());
    assert!(parse_query(".info").is_err());
}
