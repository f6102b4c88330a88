// Compiled pattern: immutable bytecode plus capture metadata
// Shareable read-only across threads; never mutated after compilation.

use ahash::AHashMap;
use smol_str::SmolStr;

use super::checks::{NoChecks, ResourceChecks};
use super::executor::{execute, MatchOutcome};
use super::matches::Matches;
use super::opcode::{OpCode, CLASS_NEGATED};

/// Pattern flags, mirroring the usual regex flag letters
/// (`i`, `m`, `s`, `u`, `y`, `g`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub sticky: bool,
    pub global: bool,
}

impl Flags {
    /// Parse a flag-letter string like `"imu"`. Returns the offending
    /// character on an unknown or repeated letter.
    pub fn from_letters(letters: &str) -> Result<Flags, char> {
        let mut flags = Flags::default();
        for ch in letters.chars() {
            let slot = match ch {
                'i' => &mut flags.ignore_case,
                'm' => &mut flags.multiline,
                's' => &mut flags.dot_all,
                'u' => &mut flags.unicode,
                'y' => &mut flags.sticky,
                'g' => &mut flags.global,
                _ => return Err(ch),
            };
            if *slot {
                return Err(ch);
            }
            *slot = true;
        }
        Ok(flags)
    }
}

/// Ordered mapping from capture-group name to group index.
/// Names are unique; unnamed groups do not appear.
#[derive(Debug, Clone, Default)]
pub struct GroupNames {
    // names[i] is the name of group i + 1, if any
    names: Box<[Option<SmolStr>]>,
    by_name: AHashMap<SmolStr, u32>,
}

impl GroupNames {
    pub(crate) fn new(names: Vec<Option<SmolStr>>) -> Self {
        let mut by_name = AHashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if let Some(name) = name {
                by_name.insert(name.clone(), (i + 1) as u32);
            }
        }
        GroupNames {
            names: names.into_boxed_slice(),
            by_name,
        }
    }

    /// Group index for `name`, if the pattern defines it.
    pub fn get(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// `(name, group index)` pairs in group-index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| name.as_deref().map(|n| (n, (i + 1) as u32)))
    }

    /// Number of named groups.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// A compiled pattern.
pub struct Program {
    pub(crate) code: Box<[u8]>,
    pub(crate) flags: Flags,
    /// Capture groups including the whole-match group 0.
    pub(crate) group_count: u32,
    pub(crate) group_names: GroupNames,
}

impl Program {
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Number of capture groups, including the whole-match group 0.
    pub fn group_count(&self) -> u32 {
        self.group_count
    }

    pub fn group_names(&self) -> &GroupNames {
        &self.group_names
    }

    /// Run the pattern against `subject` starting at code-point offset
    /// `start`, with no-op resource checks.
    pub fn exec(&self, subject: &[char], start: usize) -> MatchOutcome {
        execute(self, subject, start, &mut NoChecks)
    }

    /// Run the pattern with caller-supplied resource checks.
    pub fn exec_with(
        &self,
        subject: &[char],
        start: usize,
        checks: &mut dyn ResourceChecks,
    ) -> MatchOutcome {
        execute(self, subject, start, checks)
    }

    /// Convenience wrapper matching against a `&str`; offsets in the
    /// result are code-point offsets.
    pub fn find_str(&self, text: &str, start: usize) -> MatchOutcome {
        let subject: Vec<char> = text.chars().collect();
        self.exec(&subject, start)
    }

    /// Iterate all matches in `subject`, advancing one code point past
    /// empty matches.
    pub fn matches<'p, 's>(&'p self, subject: &'s [char]) -> Matches<'p, 's> {
        Matches::new(self, subject)
    }

    /// Render the bytecode as a human-readable listing.
    pub fn disassemble(&self) -> String {
        use std::fmt::Write;

        let code = &self.code;
        let mut out = String::new();
        let mut pc = 0usize;
        while pc < code.len() {
            let op = OpCode::from_u8(code[pc]);
            let _ = write!(out, "{pc:05} {}", op.name());
            let mut next = pc + 1;
            match op {
                OpCode::Char => {
                    let cp = read_u32(code, next);
                    match char::from_u32(cp) {
                        Some(c) if !c.is_control() => {
                            let _ = write!(out, " '{c}'");
                        }
                        _ => {
                            let _ = write!(out, " u+{cp:04x}");
                        }
                    }
                    next += 4;
                }
                OpCode::Class => {
                    let flags = code[next];
                    let nranges = read_u16(code, next + 1) as usize;
                    let mask = read_u32(code, next + 3);
                    next += 7;
                    if flags & CLASS_NEGATED != 0 {
                        let _ = write!(out, " neg");
                    }
                    if mask != 0 {
                        let _ = write!(out, " props={mask:#x}");
                    }
                    for _ in 0..nranges {
                        let lo = read_u32(code, next);
                        let hi = read_u32(code, next + 4);
                        next += 8;
                        if lo == hi {
                            let _ = write!(out, " u+{lo:04x}");
                        } else {
                            let _ = write!(out, " u+{lo:04x}-u+{hi:04x}");
                        }
                    }
                }
                OpCode::Jump | OpCode::SplitNextFirst | OpCode::SplitGotoFirst | OpCode::Loop => {
                    let rel = read_u32(code, next) as i32;
                    next += 4;
                    let target = (next as i64 + rel as i64) as usize;
                    let _ = write!(out, " -> {target:05}");
                }
                OpCode::LookAhead
                | OpCode::NegLookAhead
                | OpCode::LookBehind
                | OpCode::NegLookBehind => {
                    let len = read_u32(code, next) as usize;
                    next += 4;
                    let _ = write!(out, " len={len} cont={:05}", next + len);
                }
                OpCode::PushI32 => {
                    let n = read_u32(code, next);
                    next += 4;
                    let _ = write!(out, " {n}");
                }
                OpCode::SaveStart | OpCode::SaveEnd | OpCode::BackRef | OpCode::BackRefBack => {
                    let _ = write!(out, " {}", code[next]);
                    next += 1;
                }
                OpCode::SaveReset => {
                    let _ = write!(out, " {}..={}", code[next], code[next + 1]);
                    next += 2;
                }
                _ => {}
            }
            out.push('\n');
            pc = next;
        }
        out
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("code_len", &self.code.len())
            .field("flags", &self.flags)
            .field("group_count", &self.group_count)
            .field("named_groups", &self.group_names.len())
            .finish()
    }
}

#[inline(always)]
pub(crate) fn read_u16(code: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([code[at], code[at + 1]])
}

#[inline(always)]
pub(crate) fn read_u32(code: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([code[at], code[at + 1], code[at + 2], code[at + 3]])
}
