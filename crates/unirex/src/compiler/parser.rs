// Recursive-descent pattern parser
// One pass over the pattern code points, producing the syntax tree and
// the capture-group tables. Numeric and named backreferences may point
// forward, so they are validated after the walk.

use ahash::AHashMap;
use smol_str::SmolStr;

use super::ast::{
    invert_ranges, AssertionKind, ClassSet, LookKind, Node, DIGIT_RANGES, SPACE_RANGES,
    WORD_RANGES,
};
use super::error::{CompileError, CompileErrorKind};
use super::reader::Reader;
use crate::unicode::props::{mask_for_name, MASK_ALL};
use crate::vm::limits::{MAX_CAPTURES, MAX_PARSE_DEPTH};
use crate::vm::Flags;

pub(crate) struct ParsedPattern {
    pub node: Node,
    /// Capturing groups, excluding the whole-match group 0.
    pub capture_count: u32,
    /// `names[i]` is the name of group `i + 1`, if any.
    pub names: Vec<Option<SmolStr>>,
}

pub(crate) fn parse(pattern: &[char], flags: Flags) -> Result<ParsedPattern, CompileError> {
    let mut p = Parser {
        reader: Reader::new(pattern),
        flags,
        capture_count: 0,
        names: Vec::new(),
        by_name: AHashMap::new(),
        numeric_refs: Vec::new(),
        depth: 0,
    };

    let mut node = p.parse_disjunction()?;
    if !p.reader.is_eof() {
        // Only a stray ')' can stop the top-level disjunction.
        return Err(p.error_here(CompileErrorKind::UnbalancedParen));
    }
    for &(index, offset) in &p.numeric_refs {
        if index == 0 || index > p.capture_count {
            return Err(CompileError::new(
                CompileErrorKind::InvalidBackReference,
                offset,
            ));
        }
    }
    p.resolve_named(&mut node)?;

    Ok(ParsedPattern {
        node,
        capture_count: p.capture_count,
        names: p.names,
    })
}

/// Identity escapes accepted in unicode mode outside a class.
const SYNTAX_CHARS: &str = "^$\\.*+?()[]{}|/";

enum ClassAtom {
    Char(char),
    Ranges(Vec<(u32, u32)>),
    Mask(u32),
}

struct Parser<'a> {
    reader: Reader<'a>,
    flags: Flags,
    capture_count: u32,
    names: Vec<Option<SmolStr>>,
    by_name: AHashMap<SmolStr, u32>,
    numeric_refs: Vec<(u32, usize)>,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, kind: CompileErrorKind, offset: usize) -> CompileError {
        CompileError::new(kind, offset)
    }

    fn error_here(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, self.reader.pos())
    }

    fn parse_disjunction(&mut self) -> Result<Node, CompileError> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(self.error_here(CompileErrorKind::NestingTooDeep));
        }
        self.depth += 1;

        let mut alternatives = vec![self.parse_alternative()?];
        while self.reader.eat('|') {
            alternatives.push(self.parse_alternative()?);
        }

        self.depth -= 1;
        Ok(if alternatives.len() == 1 {
            alternatives.pop().expect("one alternative")
        } else {
            Node::Alternate(alternatives)
        })
    }

    fn parse_alternative(&mut self) -> Result<Node, CompileError> {
        let mut items = Vec::new();
        loop {
            match self.reader.current() {
                None | Some('|') | Some(')') => break,
                _ => items.push(self.parse_term()?),
            }
        }
        Ok(match items.len() {
            0 => Node::Empty,
            1 => items.pop().expect("one term"),
            _ => Node::Concat(items),
        })
    }

    fn parse_term(&mut self) -> Result<Node, CompileError> {
        let atom = self.parse_atom()?;
        let quant_offset = self.reader.pos();
        let Some((min, max, greedy)) = self.parse_quantifier()? else {
            return Ok(atom);
        };

        if matches!(atom, Node::Assertion(_) | Node::Look { .. }) {
            return Err(self.error(CompileErrorKind::NothingToRepeat, quant_offset));
        }
        if matches!(self.reader.current(), Some('*' | '+' | '?')) {
            return Err(self.error_here(CompileErrorKind::NothingToRepeat));
        }
        Ok(Node::Repeat {
            node: Box::new(atom),
            min,
            max,
            greedy,
        })
    }

    fn parse_atom(&mut self) -> Result<Node, CompileError> {
        let offset = self.reader.pos();
        let c = self
            .reader
            .bump()
            .expect("parse_alternative checked for input");
        match c {
            '^' => Ok(Node::Assertion(AssertionKind::LineStart)),
            '$' => Ok(Node::Assertion(AssertionKind::LineEnd)),
            '.' => Ok(Node::Dot),
            '(' => self.parse_group(offset),
            '[' => self.parse_class(offset),
            '\\' => self.parse_atom_escape(offset),
            '*' | '+' | '?' => Err(self.error(CompileErrorKind::NothingToRepeat, offset)),
            '{' => {
                self.reader.rewind(offset);
                if self.quantifier_ahead() {
                    Err(self.error(CompileErrorKind::NothingToRepeat, offset))
                } else if self.flags.unicode {
                    Err(self.error(CompileErrorKind::LoneQuantifierBracket, offset))
                } else {
                    self.reader.bump();
                    Ok(Node::Char('{'))
                }
            }
            '}' => {
                if self.flags.unicode {
                    Err(self.error(CompileErrorKind::LoneQuantifierBracket, offset))
                } else {
                    Ok(Node::Char('}'))
                }
            }
            ']' => {
                if self.flags.unicode {
                    Err(self.error(CompileErrorKind::LoneClassBracket, offset))
                } else {
                    Ok(Node::Char(']'))
                }
            }
            _ => Ok(Node::Char(c)),
        }
    }

    // ===== Quantifiers =====

    fn parse_quantifier(&mut self) -> Result<Option<(u32, Option<u32>, bool)>, CompileError> {
        let start = self.reader.pos();
        let (min, max) = match self.reader.current() {
            Some('*') => {
                self.reader.bump();
                (0, None)
            }
            Some('+') => {
                self.reader.bump();
                (1, None)
            }
            Some('?') => {
                self.reader.bump();
                (0, Some(1))
            }
            Some('{') => match self.scan_braced_quant() {
                Some((min, max)) => {
                    if let Some(max) = max {
                        if min > max {
                            return Err(self.error(CompileErrorKind::InvalidQuantRange, start));
                        }
                    }
                    (min, max)
                }
                None => {
                    if self.flags.unicode {
                        return Err(self.error(CompileErrorKind::LoneQuantifierBracket, start));
                    }
                    return Ok(None);
                }
            },
            _ => return Ok(None),
        };
        let greedy = !self.reader.eat('?');
        Ok(Some((min, max, greedy)))
    }

    /// Consume `{n}`, `{n,}` or `{n,m}`. On malformed syntax the reader
    /// is rewound and `None` returned.
    fn scan_braced_quant(&mut self) -> Option<(u32, Option<u32>)> {
        let start = self.reader.pos();
        if !self.reader.eat('{') {
            return None;
        }
        let result = (|| {
            let min = self.reader.eat_decimal()?;
            let max = if self.reader.eat(',') {
                if self.reader.current() == Some('}') {
                    None
                } else {
                    Some(self.reader.eat_decimal()?)
                }
            } else {
                Some(min)
            };
            if self.reader.eat('}') {
                Some((min, max))
            } else {
                None
            }
        })();
        if result.is_none() {
            self.reader.rewind(start);
        }
        result
    }

    fn quantifier_ahead(&mut self) -> bool {
        let start = self.reader.pos();
        let ok = self.scan_braced_quant().is_some();
        self.reader.rewind(start);
        ok
    }

    // ===== Groups =====

    fn parse_group(&mut self, offset: usize) -> Result<Node, CompileError> {
        if !self.reader.eat('?') {
            let index = self.new_capture(None, offset)?;
            let node = self.parse_disjunction()?;
            self.expect_close(offset)?;
            return Ok(Node::Group {
                index: Some(index),
                node: Box::new(node),
            });
        }

        match self.reader.current() {
            Some(':') => {
                self.reader.bump();
                let node = self.parse_disjunction()?;
                self.expect_close(offset)?;
                Ok(Node::Group {
                    index: None,
                    node: Box::new(node),
                })
            }
            Some('=') => {
                self.reader.bump();
                self.parse_lookaround(offset, LookKind::Ahead)
            }
            Some('!') => {
                self.reader.bump();
                self.parse_lookaround(offset, LookKind::AheadNeg)
            }
            Some('<') => match self.reader.peek(1) {
                Some('=') => {
                    self.reader.bump();
                    self.reader.bump();
                    self.parse_lookaround(offset, LookKind::Behind)
                }
                Some('!') => {
                    self.reader.bump();
                    self.reader.bump();
                    self.parse_lookaround(offset, LookKind::BehindNeg)
                }
                _ => {
                    self.reader.bump();
                    let name_offset = self.reader.pos();
                    let name = self.parse_group_name()?;
                    let index = self.new_capture(Some((name, name_offset)), offset)?;
                    let node = self.parse_disjunction()?;
                    self.expect_close(offset)?;
                    Ok(Node::Group {
                        index: Some(index),
                        node: Box::new(node),
                    })
                }
            },
            _ => Err(self.error(CompileErrorKind::InvalidGroup, offset)),
        }
    }

    fn parse_lookaround(&mut self, offset: usize, kind: LookKind) -> Result<Node, CompileError> {
        let node = self.parse_disjunction()?;
        self.expect_close(offset)?;
        Ok(Node::Look {
            kind,
            node: Box::new(node),
        })
    }

    fn expect_close(&mut self, group_offset: usize) -> Result<(), CompileError> {
        if self.reader.eat(')') {
            Ok(())
        } else {
            Err(self.error(CompileErrorKind::UnterminatedGroup, group_offset))
        }
    }

    fn new_capture(
        &mut self,
        name: Option<(SmolStr, usize)>,
        offset: usize,
    ) -> Result<u32, CompileError> {
        if self.capture_count as usize >= MAX_CAPTURES {
            return Err(self.error(CompileErrorKind::TooManyCaptures, offset));
        }
        self.capture_count += 1;
        let index = self.capture_count;
        match name {
            Some((name, name_offset)) => {
                if self.by_name.insert(name.clone(), index).is_some() {
                    return Err(self.error(CompileErrorKind::DuplicateGroupName, name_offset));
                }
                self.names.push(Some(name));
            }
            None => self.names.push(None),
        }
        Ok(index)
    }

    /// Group name between `<` and `>`: letters, digits, `_`, `$`, not
    /// starting with a digit.
    fn parse_group_name(&mut self) -> Result<SmolStr, CompileError> {
        let offset = self.reader.pos();
        let Some(first) = self.reader.current() else {
            return Err(self.error(CompileErrorKind::InvalidGroupName, offset));
        };
        if !(first.is_alphabetic() || first == '_' || first == '$') {
            return Err(self.error(CompileErrorKind::InvalidGroupName, offset));
        }
        let mut name = String::new();
        name.push(first);
        self.reader.bump();
        while let Some(c) = self.reader.current() {
            if c == '>' {
                self.reader.bump();
                return Ok(SmolStr::new(name));
            }
            if c.is_alphanumeric() || c == '_' || c == '$' {
                name.push(c);
                self.reader.bump();
            } else {
                return Err(self.error_here(CompileErrorKind::InvalidGroupName));
            }
        }
        Err(self.error(CompileErrorKind::InvalidGroupName, offset))
    }

    // ===== Escapes outside classes =====

    fn parse_atom_escape(&mut self, offset: usize) -> Result<Node, CompileError> {
        let Some(c) = self.reader.current() else {
            return Err(self.error(CompileErrorKind::UnexpectedEnd, offset));
        };

        if let Some(ch) = self.parse_char_escape_common(offset)? {
            return Ok(Node::Char(ch));
        }

        match c {
            '1'..='9' => {
                let index = self
                    .reader
                    .eat_decimal()
                    .ok_or_else(|| self.error(CompileErrorKind::InvalidBackReference, offset))?;
                self.numeric_refs.push((index, offset));
                Ok(Node::BackRef(index))
            }
            '0' => {
                self.reader.bump();
                match self.reader.current() {
                    Some('0'..='9') if self.flags.unicode => {
                        Err(self.error(CompileErrorKind::InvalidEscape, offset))
                    }
                    Some('0'..='7') => Ok(Node::Char(self.finish_legacy_octal(0))),
                    _ => Ok(Node::Char('\0')),
                }
            }
            'b' => {
                self.reader.bump();
                Ok(Node::Assertion(AssertionKind::WordBoundary))
            }
            'B' => {
                self.reader.bump();
                Ok(Node::Assertion(AssertionKind::NotWordBoundary))
            }
            'd' | 'D' | 's' | 'S' | 'w' | 'W' => {
                self.reader.bump();
                Ok(Node::Class(self.class_escape_set(c)))
            }
            'p' | 'P' => self.parse_property(offset, c == 'P').map(|atom| match atom {
                ClassAtom::Mask(mask) => Node::Class(ClassSet {
                    ranges: Vec::new(),
                    prop_mask: mask,
                    negated: false,
                }),
                ClassAtom::Char(ch) => Node::Char(ch),
                ClassAtom::Ranges(_) => unreachable!("property escape yields mask or char"),
            }),
            'k' => {
                self.reader.bump();
                if !self.reader.eat('<') {
                    return Err(self.error(CompileErrorKind::InvalidEscape, offset));
                }
                let name = self.parse_group_name()?;
                Ok(Node::NamedBackRef { name, offset })
            }
            _ if SYNTAX_CHARS.contains(c) => {
                self.reader.bump();
                Ok(Node::Char(c))
            }
            _ => {
                if self.flags.unicode {
                    Err(self.error(CompileErrorKind::InvalidEscape, offset))
                } else {
                    self.reader.bump();
                    Ok(Node::Char(c))
                }
            }
        }
    }

    /// The range set behind `\d`, `\s`, `\w` and their negations.
    fn class_escape_set(&self, escape: char) -> ClassSet {
        let (table, negated): (&[(u32, u32)], bool) = match escape {
            'd' => (DIGIT_RANGES, false),
            'D' => (DIGIT_RANGES, true),
            's' => (SPACE_RANGES, false),
            'S' => (SPACE_RANGES, true),
            'w' => (WORD_RANGES, false),
            'W' => (WORD_RANGES, true),
            _ => unreachable!("not a class escape"),
        };
        if negated {
            ClassSet {
                ranges: invert_ranges(table),
                prop_mask: 0,
                negated: false,
            }
        } else {
            ClassSet::from_ranges(table)
        }
    }

    /// Character escapes shared between atom and class context:
    /// `\f \n \r \t \v \cX \xHH \uHHHH \u{..}`.
    fn parse_char_escape_common(&mut self, offset: usize) -> Result<Option<char>, CompileError> {
        let Some(c) = self.reader.current() else {
            return Err(self.error(CompileErrorKind::UnexpectedEnd, offset));
        };
        let ch = match c {
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{b}',
            'c' => match self.reader.peek(1) {
                Some(letter) if letter.is_ascii_alphabetic() => {
                    self.reader.bump();
                    self.reader.bump();
                    return Ok(Some(((letter as u8) % 32) as char));
                }
                _ => {
                    if self.flags.unicode {
                        return Err(self.error(CompileErrorKind::InvalidEscape, offset));
                    }
                    // Leave the 'c' for the next atom; the backslash
                    // matches itself.
                    return Ok(Some('\\'));
                }
            },
            'x' => {
                self.reader.bump();
                return match self.eat_hex(2) {
                    Some(v) => Ok(char::from_u32(v)),
                    None => {
                        if self.flags.unicode {
                            Err(self.error(CompileErrorKind::InvalidEscape, offset))
                        } else {
                            Ok(Some('x'))
                        }
                    }
                };
            }
            'u' => {
                self.reader.bump();
                return self.parse_unicode_escape(offset).map(Some);
            }
            _ => return Ok(None),
        };
        self.reader.bump();
        Ok(Some(ch))
    }

    fn parse_unicode_escape(&mut self, offset: usize) -> Result<char, CompileError> {
        if self.flags.unicode && self.reader.eat('{') {
            let mut value: u32 = 0;
            let mut any = false;
            while let Some(c) = self.reader.current() {
                if c == '}' {
                    break;
                }
                let Some(d) = c.to_digit(16) else {
                    return Err(self.error(CompileErrorKind::InvalidCodePoint, offset));
                };
                value = value * 16 + d;
                if value > super::ast::MAX_CODE_POINT {
                    return Err(self.error(CompileErrorKind::InvalidCodePoint, offset));
                }
                self.reader.bump();
                any = true;
            }
            if !self.reader.eat('}') || !any {
                return Err(self.error(CompileErrorKind::InvalidCodePoint, offset));
            }
            return char::from_u32(value)
                .ok_or_else(|| self.error(CompileErrorKind::InvalidCodePoint, offset));
        }

        match self.eat_hex(4) {
            None => {
                if self.flags.unicode {
                    Err(self.error(CompileErrorKind::InvalidEscape, offset))
                } else {
                    Ok('u')
                }
            }
            Some(high) if (0xD800..0xDC00).contains(&high) => {
                let save = self.reader.pos();
                if self.reader.eat('\\') && self.reader.eat('u') {
                    if let Some(low) = self.eat_hex(4) {
                        if (0xDC00..0xE000).contains(&low) {
                            let cp = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                            return char::from_u32(cp).ok_or_else(|| {
                                self.error(CompileErrorKind::InvalidCodePoint, offset)
                            });
                        }
                    }
                }
                self.reader.rewind(save);
                Err(self.error(CompileErrorKind::InvalidCodePoint, offset))
            }
            Some(v) => char::from_u32(v)
                .ok_or_else(|| self.error(CompileErrorKind::InvalidCodePoint, offset)),
        }
    }

    /// `\p{Name}` / `\P{Name}`. Outside unicode mode the escape is the
    /// identity escape for `p` / `P`.
    fn parse_property(
        &mut self,
        offset: usize,
        negated: bool,
    ) -> Result<ClassAtom, CompileError> {
        let letter = self.reader.bump().expect("property escape letter");
        if !self.flags.unicode {
            return Ok(ClassAtom::Char(letter));
        }
        if !self.reader.eat('{') {
            return Err(self.error(CompileErrorKind::InvalidProperty, offset));
        }
        let mut name = String::new();
        while let Some(c) = self.reader.current() {
            if c == '}' {
                break;
            }
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.reader.bump();
            } else {
                return Err(self.error(CompileErrorKind::InvalidProperty, offset));
            }
        }
        if !self.reader.eat('}') {
            return Err(self.error(CompileErrorKind::InvalidProperty, offset));
        }
        let mask = mask_for_name(&name)
            .ok_or_else(|| self.error(CompileErrorKind::InvalidProperty, offset))?;
        Ok(ClassAtom::Mask(if negated { !mask & MASK_ALL } else { mask }))
    }

    /// Continue a legacy octal escape whose first digit(s) produced
    /// `value`; consumes further octal digits while the value stays in
    /// a byte.
    fn finish_legacy_octal(&mut self, mut value: u32) -> char {
        while let Some(c @ '0'..='7') = self.reader.current() {
            let next = value * 8 + c.to_digit(8).expect("octal digit");
            if next > 0xFF {
                break;
            }
            value = next;
            self.reader.bump();
        }
        char::from_u32(value).unwrap_or('\0')
    }

    /// Exactly `n` hex digits; consumes nothing on failure.
    fn eat_hex(&mut self, n: usize) -> Option<u32> {
        let mut value = 0;
        for i in 0..n {
            let d = self.reader.peek(i)?.to_digit(16)?;
            value = value * 16 + d;
        }
        for _ in 0..n {
            self.reader.bump();
        }
        Some(value)
    }

    // ===== Character classes =====

    fn parse_class(&mut self, offset: usize) -> Result<Node, CompileError> {
        let mut set = ClassSet::new();
        set.negated = self.reader.eat('^');

        loop {
            let Some(c) = self.reader.current() else {
                return Err(self.error(CompileErrorKind::UnterminatedClass, offset));
            };
            if c == ']' {
                self.reader.bump();
                break;
            }

            let atom_offset = self.reader.pos();
            let first = self.parse_class_atom()?;
            let dash_range = self.reader.current() == Some('-')
                && self.reader.peek(1).is_some()
                && self.reader.peek(1) != Some(']');
            if dash_range {
                self.reader.bump();
                let second = self.parse_class_atom()?;
                match (first, second) {
                    (ClassAtom::Char(lo), ClassAtom::Char(hi)) => {
                        if lo as u32 > hi as u32 {
                            return Err(
                                self.error(CompileErrorKind::InvalidClassRange, atom_offset)
                            );
                        }
                        set.add_range(lo as u32, hi as u32);
                    }
                    (a, b) => {
                        if self.flags.unicode {
                            return Err(
                                self.error(CompileErrorKind::InvalidClassRange, atom_offset)
                            );
                        }
                        // Legacy: the dash is a literal member.
                        add_class_atom(&mut set, a);
                        set.add_char('-');
                        add_class_atom(&mut set, b);
                    }
                }
            } else {
                add_class_atom(&mut set, first);
            }
        }
        Ok(Node::Class(set))
    }

    fn parse_class_atom(&mut self) -> Result<ClassAtom, CompileError> {
        let offset = self.reader.pos();
        let c = self.reader.bump().expect("class loop checked for input");
        if c == '\\' {
            self.parse_class_escape(offset)
        } else {
            Ok(ClassAtom::Char(c))
        }
    }

    fn parse_class_escape(&mut self, offset: usize) -> Result<ClassAtom, CompileError> {
        let Some(c) = self.reader.current() else {
            return Err(self.error(CompileErrorKind::UnexpectedEnd, offset));
        };

        if let Some(ch) = self.parse_char_escape_common(offset)? {
            return Ok(ClassAtom::Char(ch));
        }

        match c {
            'b' => {
                self.reader.bump();
                Ok(ClassAtom::Char('\u{8}'))
            }
            'd' | 'D' | 's' | 'S' | 'w' | 'W' => {
                self.reader.bump();
                let set = self.class_escape_set(c);
                Ok(ClassAtom::Ranges(set.ranges))
            }
            'p' | 'P' => self.parse_property(offset, c == 'P'),
            '0'..='9' => {
                if self.flags.unicode {
                    if c == '0' {
                        self.reader.bump();
                        if matches!(self.reader.current(), Some('0'..='9')) {
                            return Err(self.error(CompileErrorKind::InvalidEscape, offset));
                        }
                        return Ok(ClassAtom::Char('\0'));
                    }
                    return Err(self.error(CompileErrorKind::InvalidEscape, offset));
                }
                if ('0'..='7').contains(&c) {
                    self.reader.bump();
                    let value = c.to_digit(8).expect("octal digit");
                    Ok(ClassAtom::Char(self.finish_legacy_octal(value)))
                } else {
                    self.reader.bump();
                    Ok(ClassAtom::Char(c))
                }
            }
            '-' => {
                self.reader.bump();
                Ok(ClassAtom::Char('-'))
            }
            _ if SYNTAX_CHARS.contains(c) => {
                self.reader.bump();
                Ok(ClassAtom::Char(c))
            }
            _ => {
                if self.flags.unicode {
                    Err(self.error(CompileErrorKind::InvalidEscape, offset))
                } else {
                    self.reader.bump();
                    Ok(ClassAtom::Char(c))
                }
            }
        }
    }

    // ===== Post-parse fixups =====

    fn resolve_named(&self, node: &mut Node) -> Result<(), CompileError> {
        if let Node::NamedBackRef { name, offset } = node {
            let index = self
                .by_name
                .get(name.as_str())
                .copied()
                .ok_or(CompileError::new(CompileErrorKind::UnknownGroupName, *offset))?;
            *node = Node::BackRef(index);
            return Ok(());
        }
        match node {
            Node::Group { node, .. } | Node::Look { node, .. } | Node::Repeat { node, .. } => {
                self.resolve_named(node)
            }
            Node::Concat(items) | Node::Alternate(items) => {
                for item in items {
                    self.resolve_named(item)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn add_class_atom(set: &mut ClassSet, atom: ClassAtom) {
    match atom {
        ClassAtom::Char(c) => set.add_char(c),
        ClassAtom::Ranges(ranges) => set.add_ranges(&ranges),
        ClassAtom::Mask(mask) => set.add_mask(mask),
    }
}
