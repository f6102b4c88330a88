// Bytecode instruction set for the backtracking matcher

/// Complete opcode set. One byte per opcode, operands follow little-endian.
///
/// Jump-style operands (`Jump`, the splits, `Loop`) are `i32` offsets
/// relative to the end of the instruction. Lookaround operands are the
/// byte length of the enclosed sub-program, which always ends with
/// `Match` and is followed by the continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    // Consuming instructions
    Char = 0,   // u32 code point
    AnyChar,    // any code point, including line terminators
    Class,      // u8 flags, u16 range count, u32 category mask, ranges
    BackRef,    // u8 group, compare forward
    BackRefBack, // u8 group, compare backward (lookbehind bodies)

    // Zero-width assertions
    LineStart,
    LineEnd,
    WordBoundary,
    NotWordBoundary,

    // Control flow
    Match,
    Jump,          // i32 offset
    SplitNextFirst, // i32 offset; prefer fallthrough, queue target
    SplitGotoFirst, // i32 offset; prefer target, queue fallthrough

    // Capture bookkeeping
    SaveStart, // u8 group
    SaveEnd,   // u8 group
    SaveReset, // u8 first group, u8 last group (inclusive)

    // Quantifier machinery
    PushI32,      // u32 loop counter
    Loop,         // i32 offset; decrement counter, jump while > 0
    Drop,         // pop counter
    PushPos,      // push current position
    CheckAdvance, // pop position, fail the path if no progress was made

    // Lookaround; operand is the sub-program length in bytes
    LookAhead,      // u32 len
    NegLookAhead,   // u32 len
    LookBehind,     // u32 len
    NegLookBehind,  // u32 len
}

/// Class opcode flag bits.
pub const CLASS_NEGATED: u8 = 0x01;

impl OpCode {
    pub const LAST: u8 = OpCode::NegLookBehind as u8;

    #[inline(always)]
    pub fn from_u8(byte: u8) -> Self {
        debug_assert!(byte <= Self::LAST, "invalid opcode byte {byte}");
        unsafe { std::mem::transmute(byte) }
    }

    /// Operand size in bytes for fixed-width instructions.
    /// `Class` is variable-width and must be decoded from its header.
    pub fn operand_len(self) -> usize {
        use OpCode::*;
        match self {
            Char | PushI32 => 4,
            Jump | SplitNextFirst | SplitGotoFirst | Loop => 4,
            LookAhead | NegLookAhead | LookBehind | NegLookBehind => 4,
            SaveStart | SaveEnd | BackRef | BackRefBack => 1,
            SaveReset => 2,
            Class => usize::MAX, // variable
            AnyChar | LineStart | LineEnd | WordBoundary | NotWordBoundary | Match | Drop
            | PushPos | CheckAdvance => 0,
        }
    }

    pub fn name(self) -> &'static str {
        use OpCode::*;
        match self {
            Char => "char",
            AnyChar => "any_char",
            Class => "class",
            BackRef => "back_ref",
            BackRefBack => "back_ref_back",
            LineStart => "line_start",
            LineEnd => "line_end",
            WordBoundary => "word_boundary",
            NotWordBoundary => "not_word_boundary",
            Match => "match",
            Jump => "jump",
            SplitNextFirst => "split_next_first",
            SplitGotoFirst => "split_goto_first",
            SaveStart => "save_start",
            SaveEnd => "save_end",
            SaveReset => "save_reset",
            PushI32 => "push_i32",
            Loop => "loop",
            Drop => "drop",
            PushPos => "push_pos",
            CheckAdvance => "check_advance",
            LookAhead => "lookahead",
            NegLookAhead => "neg_lookahead",
            LookBehind => "lookbehind",
            NegLookBehind => "neg_lookbehind",
        }
    }
}
