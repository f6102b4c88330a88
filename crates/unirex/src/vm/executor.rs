// Backtracking bytecode interpreter
// Splits push saved states onto an explicit stack; lookarounds run one
// recursive VM level per entry and are atomic once satisfied.

use super::checks::ResourceChecks;
use super::limits::TIMEOUT_POLL_INTERVAL;
use super::opcode::{OpCode, CLASS_NEGATED};
use super::program::{read_u16, read_u32, Flags, Program};
use crate::unicode::case_fold::canonicalize;
use crate::unicode::props::category_bit;

/// Result of one `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A match was found; capture spans are code-point offsets.
    Match(Captures),
    /// No match at any attempted start offset. A normal result, not an
    /// error.
    NoMatch,
    /// The attempt hit a resource limit before completing.
    Aborted(AbortReason),
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Match(_))
    }

    pub fn captures(&self) -> Option<&Captures> {
        match self {
            MatchOutcome::Match(caps) => Some(caps),
            _ => None,
        }
    }
}

/// Why a match attempt was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    StepBudget,
    Timeout,
    StackOverflow,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::StepBudget => write!(f, "step budget exhausted"),
            AbortReason::Timeout => write!(f, "timeout"),
            AbortReason::StackOverflow => write!(f, "stack limit reached"),
        }
    }
}

/// Capture spans recorded by a successful match. Index 0 is the whole
/// match; groups that did not participate are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    spans: Box<[Option<(usize, usize)>]>,
}

impl Captures {
    /// Span of group `i` as half-open code-point offsets.
    pub fn group(&self, i: usize) -> Option<(usize, usize)> {
        self.spans.get(i).copied().flatten()
    }

    /// Whole-match span. Always present on a successful match.
    pub fn span(&self) -> (usize, usize) {
        self.spans[0].expect("whole-match group is always recorded")
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The text of group `i`, copied out of `subject`.
    pub fn group_text(&self, subject: &[char], i: usize) -> Option<String> {
        self.group(i).map(|(s, e)| subject[s..e].iter().collect())
    }
}

type CaptureSlots = Vec<Option<usize>>;

/// A saved alternative: restored wholesale when the current path fails.
struct BtEntry {
    pc: usize,
    pos: usize,
    caps: CaptureSlots,
    vstack: Vec<usize>,
}

struct ExecState<'a> {
    prog: &'a Program,
    subject: &'a [char],
    checks: &'a mut dyn ResourceChecks,
    steps: u64,
    budget: u64,
}

/// Run `program` against `subject`, attempting start offsets
/// `start..=subject.len()` left to right (only `start` when sticky).
pub fn execute(
    program: &Program,
    subject: &[char],
    start: usize,
    checks: &mut dyn ResourceChecks,
) -> MatchOutcome {
    if start > subject.len() {
        return MatchOutcome::NoMatch;
    }

    let budget = checks.step_budget();
    let mut st = ExecState {
        prog: program,
        subject,
        checks,
        steps: 0,
        budget,
    };

    let last = if program.flags.sticky {
        start
    } else {
        subject.len()
    };

    let nslots = 2 * program.group_count as usize;
    for k in start..=last {
        let mut caps: CaptureSlots = vec![None; nslots];
        match exec_level(&mut st, 0, k, false, &mut caps, 0) {
            Err(reason) => {
                log::trace!("match aborted at offset {k}: {reason}");
                return MatchOutcome::Aborted(reason);
            }
            Ok(Some(_end)) => {
                let spans = (0..program.group_count as usize)
                    .map(|g| match (caps[2 * g], caps[2 * g + 1]) {
                        (Some(s), Some(e)) => Some((s, e)),
                        _ => None,
                    })
                    .collect();
                return MatchOutcome::Match(Captures { spans });
            }
            Ok(None) => {}
        }
    }
    MatchOutcome::NoMatch
}

/// Interpret one VM level starting at `pc`/`pos`. Returns the end
/// position on reaching `Match`, or `None` once every queued
/// alternative is exhausted. Lookarounds recurse with `backward`
/// flipped as appropriate.
fn exec_level(
    st: &mut ExecState<'_>,
    mut pc: usize,
    mut pos: usize,
    backward: bool,
    caps: &mut CaptureSlots,
    depth: usize,
) -> Result<Option<usize>, AbortReason> {
    let prog = st.prog;
    let subject = st.subject;
    let code = &prog.code;
    let flags = prog.flags;
    let mut bt: Vec<BtEntry> = Vec::new();
    let mut vstack: Vec<usize> = Vec::new();

    macro_rules! fail {
        () => {
            match bt.pop() {
                Some(entry) => {
                    pc = entry.pc;
                    pos = entry.pos;
                    *caps = entry.caps;
                    vstack = entry.vstack;
                    continue;
                }
                None => return Ok(None),
            }
        };
    }

    loop {
        st.steps += 1;
        if st.steps > st.budget {
            return Err(AbortReason::StepBudget);
        }
        if st.steps % TIMEOUT_POLL_INTERVAL == 0 && st.checks.should_abort_for_time() {
            return Err(AbortReason::Timeout);
        }

        let op = OpCode::from_u8(code[pc]);
        match op {
            OpCode::Char => {
                let want = read_u32(code, pc + 1);
                match input_char(subject, pos, backward) {
                    Some(got) if fold_input(got, flags) as u32 == want => {
                        pos = advanced(pos, backward);
                        pc += 5;
                    }
                    _ => fail!(),
                }
            }
            OpCode::AnyChar => match input_char(subject, pos, backward) {
                Some(_) => {
                    pos = advanced(pos, backward);
                    pc += 1;
                }
                None => fail!(),
            },
            OpCode::Class => {
                let cflags = code[pc + 1];
                let nranges = read_u16(code, pc + 2) as usize;
                let mask = read_u32(code, pc + 4);
                let body = pc + 8;
                let next = body + 8 * nranges;
                match input_char(subject, pos, backward) {
                    Some(got) => {
                        let folded = fold_input(got, flags) as u32;
                        let mut found = mask != 0 && mask & category_bit(got) != 0;
                        if !found {
                            for r in 0..nranges {
                                let lo = read_u32(code, body + 8 * r);
                                if folded < lo {
                                    break;
                                }
                                let hi = read_u32(code, body + 8 * r + 4);
                                if folded <= hi {
                                    found = true;
                                    break;
                                }
                            }
                        }
                        if found != (cflags & CLASS_NEGATED != 0) {
                            pos = advanced(pos, backward);
                            pc = next;
                        } else {
                            fail!()
                        }
                    }
                    None => fail!(),
                }
            }
            OpCode::BackRef | OpCode::BackRefBack => {
                let group = code[pc + 1] as usize;
                let (Some(gs), Some(ge)) = (caps[2 * group], caps[2 * group + 1]) else {
                    // An unmatched group fails the path outright.
                    fail!()
                };
                let len = ge - gs;
                let matched = if op == OpCode::BackRef {
                    pos + len <= subject.len() && ref_eq(subject, flags, gs, ge, pos)
                } else {
                    pos >= len && ref_eq(subject, flags, gs, ge, pos - len)
                };
                if matched {
                    pos = if op == OpCode::BackRef { pos + len } else { pos - len };
                    pc += 2;
                } else {
                    fail!()
                }
            }
            OpCode::LineStart => {
                let at_start =
                    pos == 0 || (flags.multiline && is_line_terminator(subject[pos - 1]));
                if at_start {
                    pc += 1;
                } else {
                    fail!()
                }
            }
            OpCode::LineEnd => {
                let at_end = pos == subject.len()
                    || (flags.multiline && is_line_terminator(subject[pos]));
                if at_end {
                    pc += 1;
                } else {
                    fail!()
                }
            }
            OpCode::WordBoundary | OpCode::NotWordBoundary => {
                let before = pos > 0 && is_word_char(subject[pos - 1]);
                let after = pos < subject.len() && is_word_char(subject[pos]);
                if (before != after) == (op == OpCode::WordBoundary) {
                    pc += 1;
                } else {
                    fail!()
                }
            }
            OpCode::Match => return Ok(Some(pos)),
            OpCode::Jump => {
                let rel = read_u32(code, pc + 1) as i32;
                pc = offset_pc(pc + 5, rel);
            }
            OpCode::SplitNextFirst => {
                let rel = read_u32(code, pc + 1) as i32;
                bt.push(BtEntry {
                    pc: offset_pc(pc + 5, rel),
                    pos,
                    caps: caps.clone(),
                    vstack: vstack.clone(),
                });
                pc += 5;
            }
            OpCode::SplitGotoFirst => {
                let rel = read_u32(code, pc + 1) as i32;
                bt.push(BtEntry {
                    pc: pc + 5,
                    pos,
                    caps: caps.clone(),
                    vstack: vstack.clone(),
                });
                pc = offset_pc(pc + 5, rel);
            }
            OpCode::SaveStart => {
                caps[2 * code[pc + 1] as usize] = Some(pos);
                pc += 2;
            }
            OpCode::SaveEnd => {
                caps[2 * code[pc + 1] as usize + 1] = Some(pos);
                pc += 2;
            }
            OpCode::SaveReset => {
                let first = code[pc + 1] as usize;
                let last = code[pc + 2] as usize;
                for g in first..=last {
                    caps[2 * g] = None;
                    caps[2 * g + 1] = None;
                }
                pc += 3;
            }
            OpCode::PushI32 => {
                vstack.push(read_u32(code, pc + 1) as usize);
                pc += 5;
            }
            OpCode::Loop => {
                let rel = read_u32(code, pc + 1) as i32;
                let counter = match vstack.last_mut() {
                    Some(counter) => counter,
                    None => corrupt_program(pc),
                };
                *counter -= 1;
                if *counter > 0 {
                    pc = offset_pc(pc + 5, rel);
                } else {
                    pc += 5;
                }
            }
            OpCode::Drop => {
                if vstack.pop().is_none() {
                    corrupt_program(pc);
                }
                pc += 1;
            }
            OpCode::PushPos => {
                vstack.push(pos);
                pc += 1;
            }
            OpCode::CheckAdvance => {
                let saved = match vstack.pop() {
                    Some(saved) => saved,
                    None => corrupt_program(pc),
                };
                if saved == pos {
                    fail!()
                }
                pc += 1;
            }
            OpCode::LookAhead
            | OpCode::NegLookAhead
            | OpCode::LookBehind
            | OpCode::NegLookBehind => {
                if st.checks.should_abort_for_stack(depth + 1) {
                    return Err(AbortReason::StackOverflow);
                }
                let len = read_u32(code, pc + 1) as usize;
                let sub_pc = pc + 5;
                let cont = sub_pc + len;
                let sub_backward = matches!(op, OpCode::LookBehind | OpCode::NegLookBehind);
                let negative = matches!(op, OpCode::NegLookAhead | OpCode::NegLookBehind);

                let snapshot = caps.clone();
                let hit = exec_level(st, sub_pc, pos, sub_backward, caps, depth + 1)?;
                match (hit.is_some(), negative) {
                    // Positive lookaround keeps its capture results.
                    (true, false) => pc = cont,
                    (false, true) => {
                        *caps = snapshot;
                        pc = cont;
                    }
                    _ => {
                        *caps = snapshot;
                        fail!()
                    }
                }
            }
        }
    }
}

/// Compare the captured text `subject[gs..ge]` against the input at
/// `at`, honoring case folding.
fn ref_eq(subject: &[char], flags: Flags, gs: usize, ge: usize, at: usize) -> bool {
    (gs..ge)
        .all(|i| fold_input(subject[i], flags) == fold_input(subject[at + (i - gs)], flags))
}

#[inline(always)]
fn fold_input(c: char, flags: Flags) -> char {
    if flags.ignore_case {
        canonicalize(c, flags.unicode)
    } else {
        c
    }
}

#[inline(always)]
fn input_char(subject: &[char], pos: usize, backward: bool) -> Option<char> {
    if backward {
        if pos > 0 { Some(subject[pos - 1]) } else { None }
    } else {
        subject.get(pos).copied()
    }
}

#[inline(always)]
fn advanced(pos: usize, backward: bool) -> usize {
    if backward { pos - 1 } else { pos + 1 }
}

#[inline(always)]
fn offset_pc(after: usize, rel: i32) -> usize {
    (after as i64 + rel as i64) as usize
}

pub(crate) fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Malformed bytecode reaching the matcher is a compiler defect, not a
/// recoverable condition.
#[cold]
fn corrupt_program(pc: usize) -> ! {
    panic!("corrupt regex bytecode at pc {pc}");
}
