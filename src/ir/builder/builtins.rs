//! Builtin actions and functions.
//!
//! Builtins are not calls: they are instruction templates applied to
//! already-resolved operands of the current frame. The registry is supplied
//! by the embedder; `Builtins::standard()` holds the usual set.

use std::collections::BTreeMap;

use super::frame::Operand;
use super::CodegenContext;
use crate::ast::Call;
use crate::error::{CompileError, CompileResult};
use crate::ir::{Address, Cell, Instruction, LabelId};

/// Which accumulator tests a comparison hands to the enclosing conditional.
///
/// The jumps go to the region laid out second. With `swap_branches` that
/// region holds the `then` body (a taken jump means the test succeeded);
/// otherwise it holds the `else` body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchCondition {
    pub on_zero: bool,
    pub on_negative: bool,
    pub swap_branches: bool,
}

impl BranchCondition {
    pub(crate) fn jumps(self, target: LabelId) -> Vec<Instruction> {
        let mut ops = Vec::with_capacity(2);
        if self.on_zero {
            ops.push(Instruction::JumpIfZero(target));
        }
        if self.on_negative {
            ops.push(Instruction::JumpIfNegative(target));
        }
        ops
    }
}

/// A comparison lowers to `left - right` after an optional operand swap,
/// then describes how to branch on the difference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub on_zero: bool,
    pub on_negative: bool,
    pub swap_operands: bool,
    pub swap_branches: bool,
}

impl Comparison {
    pub const fn new(
        on_zero: bool,
        on_negative: bool,
        swap_operands: bool,
        swap_branches: bool,
    ) -> Self {
        Self {
            on_zero,
            on_negative,
            swap_operands,
            swap_branches,
        }
    }

    pub fn condition(&self) -> BranchCondition {
        BranchCondition {
            on_zero: self.on_zero,
            on_negative: self.on_negative,
            swap_branches: self.swap_branches,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// Action: take the next inbox value.
    Read,
    /// Action: emit nothing.
    Nop,
    /// Send the operand to the outbox.
    Write,
    /// Load floor cell `n`, or the cell whose index a variable holds.
    Addr,
    Add,
    Sub,
    Compare(Comparison),
}

impl Builtin {
    pub fn arity(&self) -> usize {
        match self {
            Builtin::Read | Builtin::Nop => 0,
            Builtin::Write | Builtin::Addr => 1,
            Builtin::Add | Builtin::Sub | Builtin::Compare(_) => 2,
        }
    }
}

/// Name → builtin registry consulted before user functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Builtins {
    entries: BTreeMap<String, Builtin>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::standard()
    }
}

impl Builtins {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// `read`, `nop`, `write`, `addr`, `add`, `sub` and the six comparisons.
    pub fn standard() -> Self {
        Self::empty()
            .with("read", Builtin::Read)
            .with("nop", Builtin::Nop)
            .with("write", Builtin::Write)
            .with("addr", Builtin::Addr)
            .with("add", Builtin::Add)
            .with("sub", Builtin::Sub)
            // b - a < 0
            .with("gt", Builtin::Compare(Comparison::new(false, true, true, true)))
            // b - a <= 0
            .with("ge", Builtin::Compare(Comparison::new(true, true, true, true)))
            // a - b < 0
            .with("lt", Builtin::Compare(Comparison::new(false, true, false, true)))
            // a - b <= 0
            .with("le", Builtin::Compare(Comparison::new(true, true, false, true)))
            // a - b == 0
            .with("eq", Builtin::Compare(Comparison::new(true, false, false, true)))
            // a - b == 0 selects the else branch
            .with("neq", Builtin::Compare(Comparison::new(true, false, false, false)))
    }

    pub fn with(mut self, name: &str, builtin: Builtin) -> Self {
        self.entries.insert(name.to_string(), builtin);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.entries.remove(name);
        self
    }

    pub fn get(&self, name: &str) -> Option<Builtin> {
        self.entries.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// ─── Lowering ──────────────────────────────────────────────────────

/// Largest magnitude a cell of the machine can hold.
pub const MAX_VALUE: i64 = 999;

impl CodegenContext<'_> {
    pub(super) fn emit_builtin(
        &mut self,
        builtin: Builtin,
        call: &Call,
    ) -> CompileResult<Option<BranchCondition>> {
        let name = &call.name.node;
        if call.args.len() != builtin.arity() {
            return Err(CompileError::Arity {
                name: name.clone(),
                expected: builtin.arity(),
                found: call.args.len(),
                span: call.name.span,
            });
        }

        // Temporaries below are dead once the result is in the accumulator.
        let mark = self.frame.next_cell;
        let mut operands = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            operands.push(self.resolve_operand(arg)?);
        }

        let mut condition = None;
        match builtin {
            Builtin::Read => self.emit(Instruction::Input),
            Builtin::Nop => {}
            Builtin::Write => {
                let cell = self.require_cell(name, operands[0], call)?;
                self.emit(Instruction::CopyFrom(Cell::Direct(cell)));
                self.emit(Instruction::Output);
            }
            Builtin::Addr => match operands[0] {
                Operand::Literal(n) => {
                    let cell = Address::try_from(n).map_err(|_| CompileError::InvalidAddress {
                        value: n,
                        span: call.args[0].span,
                    })?;
                    self.emit(Instruction::CopyFrom(Cell::Direct(cell)));
                }
                Operand::Cell(a) => self.emit(Instruction::CopyFrom(Cell::Indirect(a))),
            },
            Builtin::Add => self.emit_add(operands[0], operands[1], call)?,
            Builtin::Sub => self.emit_sub(operands[0], operands[1], call)?,
            Builtin::Compare(cmp) => {
                let (left, right) = if cmp.swap_operands {
                    (operands[1], operands[0])
                } else {
                    (operands[0], operands[1])
                };
                self.emit_sub(left, right, call)?;
                condition = Some(cmp.condition());
            }
        }

        self.frame.next_cell = mark;
        Ok(condition)
    }

    fn require_cell(&self, name: &str, operand: Operand, call: &Call) -> CompileResult<Address> {
        match operand {
            Operand::Cell(a) => Ok(a),
            Operand::Literal(value) => Err(CompileError::LiteralOperand {
                name: name.to_string(),
                value,
                span: call.name.span,
            }),
        }
    }

    /// `a + b`. Two cells add through a scratch copy; a cell and a literal
    /// bump a scratch copy of the cell once per unit of the literal.
    fn emit_add(&mut self, a: Operand, b: Operand, call: &Call) -> CompileResult<()> {
        match (a, b) {
            (Operand::Cell(x), Operand::Cell(y)) => {
                let dest = self.alloc_cell()?;
                self.emit(Instruction::CopyFrom(Cell::Direct(x)));
                self.emit(Instruction::CopyTo(Cell::Direct(dest)));
                self.emit(Instruction::CopyFrom(Cell::Direct(y)));
                self.emit(Instruction::Add(Cell::Direct(dest)));
            }
            (Operand::Cell(x), Operand::Literal(c)) | (Operand::Literal(c), Operand::Cell(x)) => {
                self.emit_offset(x, c, call)?;
            }
            (Operand::Literal(left), Operand::Literal(right)) => {
                return Err(two_literals(call, left, right));
            }
        }
        Ok(())
    }

    /// `a - b`.
    fn emit_sub(&mut self, a: Operand, b: Operand, call: &Call) -> CompileResult<()> {
        match (a, b) {
            (Operand::Cell(x), Operand::Cell(y)) => {
                let dest = self.alloc_cell()?;
                self.emit(Instruction::CopyFrom(Cell::Direct(y)));
                self.emit(Instruction::CopyTo(Cell::Direct(dest)));
                self.emit(Instruction::CopyFrom(Cell::Direct(x)));
                self.emit(Instruction::Sub(Cell::Direct(dest)));
            }
            (Operand::Cell(x), Operand::Literal(c)) => {
                let count = bump_count(c, call)?;
                self.emit_bumps(x, count, c < 0)?;
            }
            (Operand::Literal(c), Operand::Cell(y)) => {
                // c - y: zero a scratch cell via y - y, bump it to c, subtract y.
                let count = bump_count(c, call)?;
                let dest = self.alloc_cell()?;
                self.emit(Instruction::CopyFrom(Cell::Direct(y)));
                self.emit(Instruction::CopyTo(Cell::Direct(dest)));
                self.emit(Instruction::Sub(Cell::Direct(dest)));
                if c != 0 {
                    self.emit(Instruction::CopyTo(Cell::Direct(dest)));
                    self.emit_repeat(dest, count, c > 0);
                }
                self.emit(Instruction::Sub(Cell::Direct(y)));
            }
            (Operand::Literal(left), Operand::Literal(right)) => {
                return Err(two_literals(call, left, right));
            }
        }
        Ok(())
    }

    /// Load `cell + c` into the accumulator without touching `cell`.
    fn emit_offset(&mut self, cell: Address, c: i64, call: &Call) -> CompileResult<()> {
        let count = bump_count(c, call)?;
        self.emit_bumps(cell, count, c > 0)
    }

    fn emit_bumps(&mut self, cell: Address, count: u64, up: bool) -> CompileResult<()> {
        self.emit(Instruction::CopyFrom(Cell::Direct(cell)));
        if count == 0 {
            return Ok(());
        }
        let dest = self.alloc_cell()?;
        self.emit(Instruction::CopyTo(Cell::Direct(dest)));
        self.emit_repeat(dest, count, up);
        Ok(())
    }

    fn emit_repeat(&mut self, dest: Address, count: u64, up: bool) {
        let op = if up {
            Instruction::Increment(Cell::Direct(dest))
        } else {
            Instruction::Decrement(Cell::Direct(dest))
        };
        for _ in 0..count {
            self.emit(op);
        }
    }
}

/// Number of bumps a literal operand expands to.
fn bump_count(value: i64, call: &Call) -> CompileResult<u64> {
    if !(-MAX_VALUE..=MAX_VALUE).contains(&value) {
        return Err(CompileError::LiteralOutOfRange {
            name: call.name.node.clone(),
            value,
            span: call.name.span,
        });
    }
    Ok(value.unsigned_abs())
}

fn two_literals(call: &Call, left: i64, right: i64) -> CompileError {
    CompileError::TwoLiterals {
        name: call.name.node.clone(),
        left,
        right,
        span: call.name.span,
    }
}
