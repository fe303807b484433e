//! Instruction set of the office-worker machine.
//!
//! The machine has a single accumulator, a floor of numbered memory cells,
//! an inbox and an outbox. Every arithmetic or copy instruction reads or
//! writes the accumulator; conditional jumps test its sign.
//!
//! The builder emits a flat `Vec<Instruction>`, the optimizer rewrites it,
//! and a `Lowering` renders it as program text.

pub mod builder;
pub mod lower;
pub mod optimize;

use std::collections::BTreeMap;
use std::fmt;

/// Index of a memory cell on the floor.
pub type Address = u32;

/// Opaque jump-target token; allocated monotonically during emission.
pub type LabelId = u32;

/// A memory operand: the cell itself, or the cell whose index it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Direct(Address),
    Indirect(Address),
}

// ─── Instructions ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    // ── I/O ──
    /// Take the next inbox value into the accumulator.
    Input,
    /// Move the accumulator to the outbox.
    Output,

    // ── Memory ──
    CopyFrom(Cell),
    CopyTo(Cell),
    /// Increment the cell, then load it into the accumulator.
    Increment(Cell),
    /// Decrement the cell, then load it into the accumulator.
    Decrement(Cell),
    Add(Cell),
    Sub(Cell),

    // ── Control flow ──
    Jump(LabelId),
    JumpIfZero(LabelId),
    JumpIfNegative(LabelId),
    Label(LabelId),
}

impl Instruction {
    /// The label a jump refers to; `None` for everything else, labels included.
    pub fn jump_target(&self) -> Option<LabelId> {
        match self {
            Instruction::Jump(l) | Instruction::JumpIfZero(l) | Instruction::JumpIfNegative(l) => {
                Some(*l)
            }
            _ => None,
        }
    }

    pub fn declared_label(&self) -> Option<LabelId> {
        match self {
            Instruction::Label(l) => Some(*l),
            _ => None,
        }
    }

    /// Replace the label operand of a jump or label declaration.
    pub fn with_label(self, label: LabelId) -> Self {
        match self {
            Instruction::Jump(_) => Instruction::Jump(label),
            Instruction::JumpIfZero(_) => Instruction::JumpIfZero(label),
            Instruction::JumpIfNegative(_) => Instruction::JumpIfNegative(label),
            Instruction::Label(_) => Instruction::Label(label),
            other => other,
        }
    }

    /// Memory operand of `CopyFrom`/`CopyTo`.
    pub fn copy_operand(&self) -> Option<Cell> {
        match self {
            Instruction::CopyFrom(c) | Instruction::CopyTo(c) => Some(*c),
            _ => None,
        }
    }

    /// Mnemonic in the game's assembly listing.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Input => "INBOX",
            Instruction::Output => "OUTBOX",
            Instruction::CopyFrom(_) => "COPYFROM",
            Instruction::CopyTo(_) => "COPYTO",
            Instruction::Increment(_) => "BUMPUP",
            Instruction::Decrement(_) => "BUMPDN",
            Instruction::Add(_) => "ADD",
            Instruction::Sub(_) => "SUB",
            Instruction::Jump(_) => "JUMP",
            Instruction::JumpIfZero(_) => "JUMPZ",
            Instruction::JumpIfNegative(_) => "JUMPN",
            Instruction::Label(_) => "LABEL",
        }
    }
}

// ─── Display ───────────────────────────────────────────────────────

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Direct(a) => write!(f, "{}", a),
            Cell::Indirect(a) => write!(f, "[{}]", a),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Input => write!(f, "input"),
            Instruction::Output => write!(f, "output"),
            Instruction::CopyFrom(c) => write!(f, "copy_from {}", c),
            Instruction::CopyTo(c) => write!(f, "copy_to {}", c),
            Instruction::Increment(c) => write!(f, "inc {}", c),
            Instruction::Decrement(c) => write!(f, "dec {}", c),
            Instruction::Add(c) => write!(f, "add {}", c),
            Instruction::Sub(c) => write!(f, "sub {}", c),
            Instruction::Jump(l) => write!(f, "jump L{}", l),
            Instruction::JumpIfZero(l) => write!(f, "jump_zero L{}", l),
            Instruction::JumpIfNegative(l) => write!(f, "jump_neg L{}", l),
            Instruction::Label(l) => write!(f, "L{}:", l),
        }
    }
}

// ─── Label closure ─────────────────────────────────────────────────

/// Check that every jump targets a label declared exactly once.
///
/// With `require_referenced`, additionally check that every declared label
/// is the target of some jump (holds after optimization).
pub fn check_label_closure(ops: &[Instruction], require_referenced: bool) -> Result<(), String> {
    let mut declared: BTreeMap<LabelId, usize> = BTreeMap::new();
    for op in ops {
        if let Some(l) = op.declared_label() {
            *declared.entry(l).or_default() += 1;
        }
    }
    if let Some((label, count)) = declared.iter().find(|(_, n)| **n > 1) {
        return Err(format!("label L{} declared {} times", label, count));
    }
    for op in ops {
        if let Some(l) = op.jump_target() {
            if !declared.contains_key(&l) {
                return Err(format!("`{}` targets an undeclared label", op));
            }
        }
    }
    if require_referenced {
        for label in declared.keys() {
            if !ops.iter().any(|op| op.jump_target() == Some(*label)) {
                return Err(format!("label L{} is never jumped to", label));
            }
        }
    }
    Ok(())
}
