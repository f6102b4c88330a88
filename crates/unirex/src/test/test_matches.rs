// Tests for the match iterator (global-flag scanning)
use super::{chars, compile_default};

#[test]
fn test_iterates_all_matches() {
    let program = compile_default("a");
    let subject = chars("banana");
    let spans: Vec<(usize, usize)> = program.matches(&subject).map(|c| c.span()).collect();
    assert_eq!(spans, vec![(1, 2), (3, 4), (5, 6)]);
}

#[test]
fn test_empty_match_advances_one_code_point() {
    let program = compile_default("a*");
    let subject = chars("baa");
    let spans: Vec<(usize, usize)> = program.matches(&subject).map(|c| c.span()).collect();
    assert_eq!(spans, vec![(0, 0), (1, 3), (3, 3)]);
}

#[test]
fn test_no_matches() {
    let program = compile_default("x");
    let subject = chars("abc");
    let mut matches = program.matches(&subject);
    assert!(matches.next().is_none());
    assert!(matches.abort_reason().is_none());
}

#[test]
fn test_captures_available_per_match() {
    let program = compile_default("(\\d+)");
    let subject = chars("a12b345");
    let texts: Vec<String> = program
        .matches(&subject)
        .map(|c| c.group_text(&subject, 1).unwrap())
        .collect();
    assert_eq!(texts, vec!["12", "345"]);
}
