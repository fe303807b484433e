//! Lowering: consumes `Vec<Instruction>` and produces program text.
//!
//! `HrmLowering` writes the game's paste format; `ListingLowering` writes
//! the internal instruction names, one per line, for debugging emission.

mod hrm;

use super::Instruction;

pub use hrm::{label_name, HrmLowering, HEADER};

/// Lowers instructions into output lines.
pub trait Lowering {
    /// Convert a sequence of instructions into text lines.
    fn lower(&self, ops: &[Instruction]) -> Vec<String>;
}

/// Plain listing using the `Display` form of each instruction.
#[derive(Debug, Default)]
pub struct ListingLowering;

impl Lowering for ListingLowering {
    fn lower(&self, ops: &[Instruction]) -> Vec<String> {
        ops.iter()
            .map(|op| match op {
                Instruction::Label(_) => op.to_string(),
                _ => format!("    {}", op),
            })
            .collect()
    }
}

/// Create a lowering backend by format name (`hrm` or `listing`).
pub fn create_lowering(format: &str) -> Box<dyn Lowering> {
    match format {
        "listing" => Box::new(ListingLowering),
        _ => Box::new(HrmLowering::new()),
    }
}
