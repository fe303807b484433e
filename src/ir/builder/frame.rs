//! Compile-time call frames.
//!
//! The machine has no call stack, so every non-tail call is inlined and a
//! frame only models which names are visible while its body is emitted.
//! Cells are handed out upward from the caller's high-water mark, so nested
//! frames never overlap their callers while sibling calls reuse the same range.

use crate::ir::Address;

/// The value of a bound name: a memory cell, or a literal that occupies none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Cell(Address),
    Literal(i64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Binding {
    pub(crate) name: String,
    pub(crate) operand: Operand,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Frame {
    /// Formal parameters in declaration order; tail calls rebind these.
    pub(crate) params: Vec<Operand>,
    /// Every binding in order; later entries shadow earlier ones.
    pub(crate) bindings: Vec<Binding>,
    /// Next cell this frame may hand out.
    pub(crate) next_cell: Address,
}

impl Frame {
    pub(crate) fn new(next_cell: Address) -> Self {
        Self {
            params: Vec::new(),
            bindings: Vec::new(),
            next_cell,
        }
    }

    pub(crate) fn bind(&mut self, name: &str, operand: Operand) {
        self.bindings.push(Binding {
            name: name.to_string(),
            operand,
        });
    }

    pub(crate) fn bind_param(&mut self, name: &str, operand: Operand) {
        self.params.push(operand);
        self.bind(name, operand);
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Operand> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.name == name)
            .map(|b| b.operand)
    }

    /// Cells of the bindings currently visible (shadowed names excluded).
    pub(crate) fn live_cells(&self) -> Vec<(String, Address)> {
        let mut seen: Vec<&str> = Vec::new();
        let mut cells = Vec::new();
        for b in self.bindings.iter().rev() {
            if seen.contains(&b.name.as_str()) {
                continue;
            }
            seen.push(&b.name);
            if let Operand::Cell(a) = b.operand {
                cells.push((b.name.clone(), a));
            }
        }
        cells.reverse();
        cells
    }
}
