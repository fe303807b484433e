//! Human Resource Machine text format.

use super::Lowering;
use crate::ir::{Instruction, LabelId};

/// First line of every program the game accepts on paste.
pub const HEADER: &str = "-- HUMAN RESOURCE MACHINE PROGRAM --";

/// Width the mnemonic is padded to before its operand.
const MNEMONIC_WIDTH: usize = 9;

#[derive(Debug, Default)]
pub struct HrmLowering {
    header: bool,
}

impl HrmLowering {
    pub fn new() -> Self {
        Self { header: true }
    }

    /// Omit the header line, e.g. when splicing into an existing listing.
    pub fn without_header(mut self) -> Self {
        self.header = false;
        self
    }

    fn lower_op(&self, op: &Instruction) -> String {
        match op {
            Instruction::Label(l) => format!("{}:", label_name(*l)),
            Instruction::Input | Instruction::Output => format!("    {}", op.mnemonic()),
            Instruction::Jump(l) | Instruction::JumpIfZero(l) | Instruction::JumpIfNegative(l) => {
                format!(
                    "    {:width$}{}",
                    op.mnemonic(),
                    label_name(*l),
                    width = MNEMONIC_WIDTH
                )
            }
            Instruction::CopyFrom(c)
            | Instruction::CopyTo(c)
            | Instruction::Increment(c)
            | Instruction::Decrement(c)
            | Instruction::Add(c)
            | Instruction::Sub(c) => {
                format!("    {:width$}{}", op.mnemonic(), c, width = MNEMONIC_WIDTH)
            }
        }
    }
}

impl Lowering for HrmLowering {
    fn lower(&self, ops: &[Instruction]) -> Vec<String> {
        let mut out = Vec::with_capacity(ops.len() + 1);
        if self.header {
            out.push(HEADER.to_string());
        }
        out.extend(ops.iter().map(|op| self.lower_op(op)));
        out
    }
}

/// `0 -> a`, `25 -> z`, `26 -> aa`, `27 -> ab`, ...
pub fn label_name(label: LabelId) -> String {
    let mut n = label as u64;
    let mut letters = Vec::new();
    loop {
        letters.push(b'a' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}
