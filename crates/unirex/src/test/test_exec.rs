// Tests for the backtracking matcher
use super::{chars, compile_default, compile_with, find, find_with};
use crate::MatchOutcome;

#[test]
fn test_literal_match() {
    assert_eq!(find("hello", "say hello world"), Some((4, 9)));
    assert_eq!(find("hello", "goodbye"), None);
}

#[test]
fn test_literal_roundtrip_at_origin() {
    for pattern in ["a", "abc", "x7_", "long_literal_pattern"] {
        let span = find(pattern, pattern).unwrap();
        assert_eq!(span, (0, pattern.chars().count()));
    }
}

#[test]
fn test_backtracking_with_captures() {
    // a(b+)c against "xabbbcy" => match [1,6), group 1 = [2,5)
    let program = compile_default("a(b+)c");
    let subject = chars("xabbbcy");
    let MatchOutcome::Match(caps) = program.exec(&subject, 0) else {
        panic!("expected a match");
    };
    assert_eq!(caps.span(), (1, 6));
    assert_eq!(caps.group(1), Some((2, 5)));
    assert_eq!(caps.group_text(&subject, 1).unwrap(), "bbb");
}

#[test]
fn test_empty_pattern_matches_everywhere() {
    let program = compile_default("");
    let subject = chars("ab");
    for k in 0..=subject.len() {
        let MatchOutcome::Match(caps) = program.exec(&subject, k) else {
            panic!("expected a match at {k}");
        };
        assert_eq!(caps.span(), (k, k));
    }
}

#[test]
fn test_match_never_starts_before_offset() {
    let program = compile_default("ab");
    let subject = chars("abab");
    for k in 0..=subject.len() {
        if let MatchOutcome::Match(caps) = program.exec(&subject, k) {
            assert!(caps.span().0 >= k);
        }
    }
    // Concretely: starting inside the first "ab" finds the second.
    let caps = program.exec(&subject, 1);
    assert_eq!(caps.captures().unwrap().span(), (2, 4));
}

#[test]
fn test_start_offset_past_end() {
    let program = compile_default("a");
    assert_eq!(program.exec(&chars("a"), 2), MatchOutcome::NoMatch);
}

#[test]
fn test_alternation_prefers_leftmost() {
    assert_eq!(find("a|ab", "ab"), Some((0, 1)));
    assert_eq!(find("cat|dog|bird", "a dog"), Some((2, 5)));
}

#[test]
fn test_greedy_vs_lazy() {
    assert_eq!(find("a+", "aaa"), Some((0, 3)));
    assert_eq!(find("a+?", "aaa"), Some((0, 1)));
    assert_eq!(find("<.*>", "<a><b>"), Some((0, 6)));
    assert_eq!(find("<.*?>", "<a><b>"), Some((0, 3)));
    assert_eq!(find("a??", "a"), Some((0, 0)));
}

#[test]
fn test_star_backtracks() {
    assert_eq!(find("a*b", "aaab"), Some((0, 4)));
    assert_eq!(find("a*a", "aaa"), Some((0, 3)));
}

#[test]
fn test_counted_quantifiers() {
    assert_eq!(find("a{3}", "aaaa"), Some((0, 3)));
    assert_eq!(find("a{3}", "aa"), None);
    assert_eq!(find("a{2,4}", "aaaaa"), Some((0, 4)));
    assert_eq!(find("a{2,4}?", "aaaaa"), Some((0, 2)));
    assert_eq!(find("a{2,}", "aaaaa"), Some((0, 5)));
    assert_eq!(find("a{0}b", "b"), Some((0, 1)));
}

#[test]
fn test_counted_quantifier_above_unroll_limit() {
    // 100 > QUANT_UNROLL_LIMIT forces the counter-loop lowering.
    assert_eq!(find("a{2,100}", "aaa"), Some((0, 3)));
    assert_eq!(find("a{10,}b", &format!("{}b", "a".repeat(12))), Some((0, 13)));
    assert_eq!(find("a{10,}", "a".repeat(9).as_str()), None);
    assert_eq!(find("a{9,100}?", "a".repeat(50).as_str()), Some((0, 9)));
}

#[test]
fn test_empty_body_loop_terminates() {
    // The quantified body can match empty; the progress guard must
    // stop the loop instead of spinning.
    assert_eq!(find("(?:a?)*b", "aab"), Some((0, 3)));
    assert_eq!(find("(a*)*b", "aaab"), Some((0, 4)));
    assert_eq!(find("(a*)*b", "c"), None);
    assert_eq!(find("(?:)*x", "x"), Some((0, 1)));
}

#[test]
fn test_dot() {
    assert_eq!(find("a.c", "abc"), Some((0, 3)));
    assert_eq!(find(".", "\n"), None);
    assert_eq!(find_with(".", "s", "\n"), Some((0, 1)));
    assert_eq!(find(".", "\u{2028}"), None);
}

#[test]
fn test_anchors() {
    assert_eq!(find("^ab", "ab"), Some((0, 2)));
    assert_eq!(find("^b", "ab"), None);
    assert_eq!(find("b$", "ab"), Some((1, 2)));
    assert_eq!(find("a$", "ab"), None);
    assert_eq!(find("^$", ""), Some((0, 0)));
}

#[test]
fn test_multiline_anchors() {
    assert_eq!(find("^b", "a\nb"), None);
    assert_eq!(find_with("^b", "m", "a\nb"), Some((2, 3)));
    assert_eq!(find_with("a$", "m", "a\nb"), Some((0, 1)));
}

#[test]
fn test_word_boundaries() {
    assert_eq!(find("\\bfoo\\b", "a foo b"), Some((2, 5)));
    assert_eq!(find("\\bfoo\\b", "afoob"), None);
    assert_eq!(find("\\Boo\\B", "food"), Some((1, 3)));
}

#[test]
fn test_character_classes() {
    assert_eq!(find("[abc]+", "zzabccz"), Some((2, 6)));
    assert_eq!(find("[^abc]+", "abxyc"), Some((2, 4)));
    assert_eq!(find("[a-f0-9]+", "zz3fE"), Some((2, 4)));
    assert_eq!(find("[\\d]+", "ab12"), Some((2, 4)));
    assert_eq!(find("[\\D]+", "12ab"), Some((2, 4)));
    assert_eq!(find("[\\w-]+", "x-y z"), Some((0, 3)));
    assert_eq!(find("[]x", "x"), None);
    assert_eq!(find("[^]", "x"), Some((0, 1)));
}

#[test]
fn test_class_escapes() {
    assert_eq!(find("\\d+", "abc123def"), Some((3, 6)));
    assert_eq!(find("\\D+", "12abc34"), Some((2, 5)));
    assert_eq!(find("\\w+", "  foo_1  "), Some((2, 8)));
    assert_eq!(find("\\s+", "ab \t\ncd"), Some((2, 5)));
    assert_eq!(find("\\S+", "  xy  "), Some((2, 4)));
}

#[test]
fn test_space_class_covers_unicode_spaces() {
    assert_eq!(find("\\s", "\u{a0}"), Some((0, 1)));
    assert_eq!(find("\\s", "\u{2003}"), Some((0, 1)));
}

#[test]
fn test_character_escapes() {
    assert_eq!(find("\\n", "a\nb"), Some((1, 2)));
    assert_eq!(find("\\t", "\t"), Some((0, 1)));
    assert_eq!(find("\\x41", "A"), Some((0, 1)));
    assert_eq!(find("\\u0041", "A"), Some((0, 1)));
    assert_eq!(find("\\0", "\0"), Some((0, 1)));
    assert_eq!(find("\\cJ", "\n"), Some((0, 1)));
    assert_eq!(find("\\.", "a.b"), Some((1, 2)));
    assert_eq!(find("[\\101]", "A"), Some((0, 1)));
}

#[test]
fn test_case_insensitive() {
    assert_eq!(find_with("abc", "i", "xAbCy"), Some((1, 4)));
    assert_eq!(find_with("[a-z]+", "i", "HELLO"), Some((0, 5)));
    assert_eq!(find_with("[^a-z]", "i", "Ab!"), Some((2, 3)));
    assert_eq!(find("abc", "ABC"), None);
}

#[test]
fn test_backreference() {
    assert_eq!(find("(a+)\\1", "aaaa"), Some((0, 4)));
    assert_eq!(find("(ab)\\1", "abab"), Some((0, 4)));
    assert_eq!(find("(ab)\\1", "abba"), None);
    assert_eq!(find_with("(ab)\\1", "i", "abAB"), Some((0, 4)));
}

#[test]
fn test_backreference_to_unmatched_group_fails() {
    // The unset-group branch must fail rather than match empty.
    assert_eq!(find("(?:(a)|b)\\1", "b"), None);
    assert_eq!(find("(?:(a)|b)\\1", "aa"), Some((0, 2)));
    assert_eq!(find("(?:\\1(a))", "a"), None);
}

#[test]
fn test_capture_reset_between_iterations() {
    // Captures inside a quantified group reset at each iteration.
    let program = compile_default("(?:(a)|(b))+");
    let subject = chars("ab");
    let MatchOutcome::Match(caps) = program.exec(&subject, 0) else {
        panic!("expected a match");
    };
    assert_eq!(caps.span(), (0, 2));
    assert_eq!(caps.group(1), None);
    assert_eq!(caps.group(2), Some((1, 2)));
}

#[test]
fn test_sticky_only_tries_start_offset() {
    let program = compile_with("b", "y");
    let subject = chars("ab");
    assert_eq!(program.exec(&subject, 0), MatchOutcome::NoMatch);
    assert!(program.exec(&subject, 1).is_match());
}

#[test]
fn test_concurrent_execution_shares_program() {
    let program = compile_default("a(b+)c");
    let subject: Vec<char> = chars("xxabbcyy");
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let outcome = program.exec(&subject, 0);
                assert_eq!(outcome.captures().unwrap().span(), (2, 6));
            });
        }
    });
}
