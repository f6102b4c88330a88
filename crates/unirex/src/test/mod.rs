pub mod test_exec;
pub mod test_lookaround;
pub mod test_matches;

use crate::{compile, Flags, MatchOutcome, Program};

/// Opt into `RUST_LOG` output while debugging a test run.
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn compile_default(pattern: &str) -> Program {
    compile(pattern, Flags::default()).unwrap()
}

pub(crate) fn compile_with(pattern: &str, letters: &str) -> Program {
    compile(pattern, Flags::from_letters(letters).unwrap()).unwrap()
}

pub(crate) fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// First match span of `pattern` in `text` with default flags.
pub(crate) fn find(pattern: &str, text: &str) -> Option<(usize, usize)> {
    find_with(pattern, "", text)
}

pub(crate) fn find_with(pattern: &str, letters: &str, text: &str) -> Option<(usize, usize)> {
    match compile_with(pattern, letters).find_str(text, 0) {
        MatchOutcome::Match(caps) => Some(caps.span()),
        MatchOutcome::NoMatch => None,
        MatchOutcome::Aborted(reason) => panic!("unexpected abort: {reason}"),
    }
}
