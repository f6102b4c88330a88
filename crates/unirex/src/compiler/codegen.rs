// Bytecode emission from the syntax tree
// Lookbehind bodies are emitted in reverse term order so the matcher
// can evaluate them walking backward from the current position.

use super::ast::{AssertionKind, ClassSet, LookKind, Node, LINE_TERMINATOR_RANGES};
use crate::unicode::case_fold::canonicalize;
use crate::vm::limits::QUANT_UNROLL_LIMIT;
use crate::vm::opcode::{OpCode, CLASS_NEGATED};
use crate::vm::Flags;

pub(crate) fn generate(node: &Node, flags: Flags) -> Vec<u8> {
    let mut cg = CodeGen {
        e: Emitter { code: Vec::new() },
        flags,
    };
    cg.e.op(OpCode::SaveStart);
    cg.e.byte(0);
    cg.emit(node, false);
    cg.e.op(OpCode::SaveEnd);
    cg.e.byte(0);
    cg.e.op(OpCode::Match);
    cg.e.code
}

struct Emitter {
    code: Vec<u8>,
}

impl Emitter {
    fn here(&self) -> usize {
        self.code.len()
    }

    fn op(&mut self, op: OpCode) {
        self.code.push(op as u8);
    }

    fn byte(&mut self, b: u8) {
        self.code.push(b);
    }

    fn u16(&mut self, v: u16) {
        self.code.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.code.extend_from_slice(&v.to_le_bytes());
    }

    /// Emit `op` with a placeholder 4-byte operand; returns the operand
    /// position for patching.
    fn jump_site(&mut self, op: OpCode) -> usize {
        self.op(op);
        let site = self.code.len();
        self.u32(0);
        site
    }

    /// Point the operand at `site` to the current position.
    fn patch_here(&mut self, site: usize) {
        let target = self.here();
        self.patch_to(site, target);
    }

    /// Point the operand at `site` to `target` (relative to the end of
    /// the operand).
    fn patch_to(&mut self, site: usize, target: usize) {
        let rel = target as i64 - (site as i64 + 4);
        self.code[site..site + 4].copy_from_slice(&(rel as i32).to_le_bytes());
    }
}

struct CodeGen {
    e: Emitter,
    flags: Flags,
}

impl CodeGen {
    fn emit(&mut self, node: &Node, backward: bool) {
        match node {
            Node::Empty => {}
            Node::Char(c) => {
                let c = if self.flags.ignore_case {
                    canonicalize(*c, self.flags.unicode)
                } else {
                    *c
                };
                self.e.op(OpCode::Char);
                self.e.u32(c as u32);
            }
            Node::Dot => {
                if self.flags.dot_all {
                    self.e.op(OpCode::AnyChar);
                } else {
                    let mut set = ClassSet::from_ranges(LINE_TERMINATOR_RANGES);
                    set.negated = true;
                    self.emit_class(&set);
                }
            }
            Node::Class(set) => self.emit_class(set),
            Node::Assertion(kind) => self.e.op(match kind {
                AssertionKind::LineStart => OpCode::LineStart,
                AssertionKind::LineEnd => OpCode::LineEnd,
                AssertionKind::WordBoundary => OpCode::WordBoundary,
                AssertionKind::NotWordBoundary => OpCode::NotWordBoundary,
            }),
            Node::Group { index, node } => match index {
                Some(i) => {
                    let (before, after) = if backward {
                        (OpCode::SaveEnd, OpCode::SaveStart)
                    } else {
                        (OpCode::SaveStart, OpCode::SaveEnd)
                    };
                    self.e.op(before);
                    self.e.byte(*i as u8);
                    self.emit(node, backward);
                    self.e.op(after);
                    self.e.byte(*i as u8);
                }
                None => self.emit(node, backward),
            },
            Node::Look { kind, node } => {
                let op = match kind {
                    LookKind::Ahead => OpCode::LookAhead,
                    LookKind::AheadNeg => OpCode::NegLookAhead,
                    LookKind::Behind => OpCode::LookBehind,
                    LookKind::BehindNeg => OpCode::NegLookBehind,
                };
                let site = self.e.jump_site(op);
                self.emit(node, kind.is_behind());
                self.e.op(OpCode::Match);
                self.e.patch_here(site);
            }
            Node::BackRef(index) => {
                self.e.op(if backward {
                    OpCode::BackRefBack
                } else {
                    OpCode::BackRef
                });
                self.e.byte(*index as u8);
            }
            Node::NamedBackRef { .. } => {
                unreachable!("named backreferences are resolved before codegen")
            }
            Node::Concat(items) => {
                if backward {
                    for item in items.iter().rev() {
                        self.emit(item, backward);
                    }
                } else {
                    for item in items {
                        self.emit(item, backward);
                    }
                }
            }
            Node::Alternate(alternatives) => {
                let mut end_sites = Vec::with_capacity(alternatives.len() - 1);
                for (i, alt) in alternatives.iter().enumerate() {
                    if i + 1 < alternatives.len() {
                        let site = self.e.jump_site(OpCode::SplitNextFirst);
                        self.emit(alt, backward);
                        end_sites.push(self.e.jump_site(OpCode::Jump));
                        self.e.patch_here(site);
                    } else {
                        self.emit(alt, backward);
                    }
                }
                for site in end_sites {
                    self.e.patch_here(site);
                }
            }
            Node::Repeat {
                node,
                min,
                max,
                greedy,
            } => self.emit_repeat(node, *min, *max, *greedy, backward),
        }
    }

    fn emit_class(&mut self, set: &ClassSet) {
        let mut set = set.clone();
        if self.flags.ignore_case {
            set.canonicalize_case(self.flags.unicode);
        } else {
            set.normalize();
        }
        debug_assert!(set.ranges.len() <= u16::MAX as usize);

        self.e.op(OpCode::Class);
        self.e.byte(if set.negated { CLASS_NEGATED } else { 0 });
        self.e.u16(set.ranges.len() as u16);
        self.e.u32(set.prop_mask);
        for &(lo, hi) in &set.ranges {
            self.e.u32(lo);
            self.e.u32(hi);
        }
    }

    /// One quantifier iteration: captures inside the body are reset so
    /// earlier iterations cannot leak spans into later ones.
    fn emit_quant_body(&mut self, node: &Node, backward: bool) {
        if let Some((first, last)) = node.capture_range() {
            self.e.op(OpCode::SaveReset);
            self.e.byte(first as u8);
            self.e.byte(last as u8);
        }
        self.emit(node, backward);
    }

    fn emit_repeat(&mut self, node: &Node, min: u32, max: Option<u32>, greedy: bool, backward: bool) {
        let split_op = if greedy {
            OpCode::SplitNextFirst
        } else {
            OpCode::SplitGotoFirst
        };

        // Mandatory part.
        if min > 0 {
            if min <= QUANT_UNROLL_LIMIT {
                for _ in 0..min {
                    self.emit_quant_body(node, backward);
                }
            } else {
                self.e.op(OpCode::PushI32);
                self.e.u32(min);
                let head = self.e.here();
                self.emit_quant_body(node, backward);
                let site = self.e.jump_site(OpCode::Loop);
                self.e.patch_to(site, head);
                self.e.op(OpCode::Drop);
            }
        }

        // Optional part.
        match max {
            None => {
                let guard = node.can_match_empty();
                let head = self.e.here();
                let exit = self.e.jump_site(split_op);
                if guard {
                    self.e.op(OpCode::PushPos);
                }
                self.emit_quant_body(node, backward);
                if guard {
                    self.e.op(OpCode::CheckAdvance);
                }
                let back = self.e.jump_site(OpCode::Jump);
                self.e.patch_to(back, head);
                self.e.patch_here(exit);
            }
            Some(max) => {
                let optional = max - min;
                if optional == 0 {
                    // Exact count; nothing more to emit.
                } else if optional <= QUANT_UNROLL_LIMIT {
                    let mut exits = Vec::with_capacity(optional as usize);
                    for _ in 0..optional {
                        exits.push(self.e.jump_site(split_op));
                        self.emit_quant_body(node, backward);
                    }
                    for site in exits {
                        self.e.patch_here(site);
                    }
                } else {
                    self.e.op(OpCode::PushI32);
                    self.e.u32(optional);
                    let head = self.e.here();
                    let exit = self.e.jump_site(split_op);
                    self.emit_quant_body(node, backward);
                    let site = self.e.jump_site(OpCode::Loop);
                    self.e.patch_to(site, head);
                    // Early exit and counter exhaustion both land on
                    // the Drop.
                    self.e.patch_here(exit);
                    self.e.op(OpCode::Drop);
                }
            }
        }
    }
}
