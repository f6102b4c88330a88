// Match iteration with global-flag semantics

use super::executor::{Captures, MatchOutcome};
use super::program::Program;

/// Iterator over successive non-overlapping matches.
///
/// After an empty match the scan advances one code point so the
/// iteration always makes progress; a resource-limit abort ends the
/// iteration (inspect `abort_reason` afterwards to distinguish it from
/// running out of matches).
pub struct Matches<'p, 's> {
    program: &'p Program,
    subject: &'s [char],
    pos: usize,
    done: bool,
    abort_reason: Option<super::executor::AbortReason>,
}

impl<'p, 's> Matches<'p, 's> {
    pub(crate) fn new(program: &'p Program, subject: &'s [char]) -> Self {
        Matches {
            program,
            subject,
            pos: 0,
            done: false,
            abort_reason: None,
        }
    }

    /// Set if the iteration stopped because an attempt was aborted.
    pub fn abort_reason(&self) -> Option<super::executor::AbortReason> {
        self.abort_reason
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = Captures;

    fn next(&mut self) -> Option<Captures> {
        if self.done {
            return None;
        }
        match self.program.exec(self.subject, self.pos) {
            MatchOutcome::Match(caps) => {
                let (start, end) = caps.span();
                if end == start {
                    // Empty match: step past it to guarantee progress.
                    self.pos = end + 1;
                } else {
                    self.pos = end;
                }
                if self.pos > self.subject.len() {
                    self.done = true;
                }
                Some(caps)
            }
            MatchOutcome::NoMatch => {
                self.done = true;
                None
            }
            MatchOutcome::Aborted(reason) => {
                self.abort_reason = Some(reason);
                self.done = true;
                None
            }
        }
    }
}
