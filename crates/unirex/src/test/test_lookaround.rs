// Tests for lookahead and lookbehind
use super::{chars, compile_default, find};
use crate::MatchOutcome;

#[test]
fn test_lookahead() {
    assert_eq!(find("a(?=b)", "ab"), Some((0, 1)));
    assert_eq!(find("a(?=b)", "ac"), None);
    assert_eq!(find("\\w+(?=;)", "foo; bar"), Some((0, 3)));
}

#[test]
fn test_negative_lookahead() {
    assert_eq!(find("a(?!b)", "ac"), Some((0, 1)));
    assert_eq!(find("a(?!b)", "ab"), None);
    assert_eq!(find("a(?!b)c", "ac"), Some((0, 2)));
}

#[test]
fn test_lookbehind() {
    assert_eq!(find("(?<=a)b", "ab"), Some((1, 2)));
    assert_eq!(find("(?<=a)b", "cb"), None);
    assert_eq!(find("(?<=ab)c", "abc"), Some((2, 3)));
}

#[test]
fn test_negative_lookbehind() {
    assert_eq!(find("(?<!a)b", "cb"), Some((1, 2)));
    assert_eq!(find("(?<!a)b", "ab"), None);
    assert_eq!(find("(?<!a)b", "b"), Some((0, 1)));
}

#[test]
fn test_variable_length_lookbehind() {
    assert_eq!(find("(?<=a+)b", "aaab"), Some((3, 4)));
    assert_eq!(find("(?<=\\d{2,4})x", "123x"), Some((3, 4)));
    assert_eq!(find("(?<=\\d{2,4})x", "1x"), None);
}

#[test]
fn test_lookahead_is_zero_width() {
    // The lookahead consumes nothing; the same char is matched again.
    assert_eq!(find("(?=a)a", "a"), Some((0, 1)));
    assert_eq!(find("a(?=b)b", "ab"), Some((0, 2)));
}

#[test]
fn test_capture_inside_lookahead_is_kept() {
    let program = compile_default("(?=(a+))a");
    let subject = chars("aaa");
    let MatchOutcome::Match(caps) = program.exec(&subject, 0) else {
        panic!("expected a match");
    };
    assert_eq!(caps.span(), (0, 1));
    assert_eq!(caps.group(1), Some((0, 3)));
}

#[test]
fn test_capture_inside_lookbehind() {
    let program = compile_default("(?<=(a))b");
    let subject = chars("ab");
    let MatchOutcome::Match(caps) = program.exec(&subject, 0) else {
        panic!("expected a match");
    };
    assert_eq!(caps.span(), (1, 2));
    assert_eq!(caps.group(1), Some((0, 1)));
}

#[test]
fn test_negative_lookaround_discards_captures() {
    let program = compile_default("(?!(x))a");
    let subject = chars("a");
    let MatchOutcome::Match(caps) = program.exec(&subject, 0) else {
        panic!("expected a match");
    };
    assert_eq!(caps.group(1), None);
}

#[test]
fn test_nested_lookaround() {
    // Lookahead inside lookbehind evaluates forward from its own
    // position.
    assert_eq!(find("(?<=a(?=b)b)c", "abc"), Some((2, 3)));
    assert_eq!(find("(?<=(?!x)a)b", "ab"), Some((1, 2)));
}

#[test]
fn test_lookaround_is_atomic() {
    // Once a lookaround succeeds, the matcher does not revisit it for
    // different sub-matches.
    assert_eq!(find("(?=a+)aab", "aab"), Some((0, 3)));
}

#[test]
fn test_lookbehind_at_start() {
    assert_eq!(find("(?<=a)b", "b"), None);
    assert_eq!(find("(?<!a)^b", "b"), Some((0, 1)));
}
