//! CodegenContext: lowers a parsed program into `Vec<Instruction>`.
//!
//! Emission starts from a synthetic call to the entry function and inlines
//! every non-recursive call, since the machine has no call stack. A call to
//! the function currently being emitted, in tail position, becomes a jump
//! back to that function's entry label after its parameters are rebound.
//!
//! State threaded through emission:
//! - a stack of frames (visible names and the cells they occupy),
//! - a stack of activations (function name + entry label) for recursion checks,
//! - a monotonic label counter.
//!
//! Comparisons do not leave state behind: they return a [`BranchCondition`]
//! that the enclosing `if` or guard consumes directly.

mod builtins;
mod call;
mod frame;
mod stmt;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::ir::{Address, Instruction, LabelId};
use crate::span::Spanned;

pub use self::builtins::{BranchCondition, Builtin, Builtins, Comparison};
pub use self::frame::Operand;
use self::frame::Frame;

/// One function currently being emitted.
#[derive(Clone, Debug)]
pub(crate) struct Activation {
    pub(crate) name: String,
    /// Loop-back target for tail self-calls.
    pub(crate) entry: LabelId,
}

/// Mutable compile-time state for one compilation.
pub struct CodegenContext<'a> {
    /// Accumulated instructions.
    pub(crate) ops: Vec<Instruction>,
    program: &'a Program,
    /// User functions by name.
    functions: BTreeMap<&'a str, &'a FunctionDef>,
    builtins: &'a Builtins,
    /// Frame of the call whose body is being emitted.
    pub(crate) frame: Frame,
    /// Frames of the enclosing calls, innermost last.
    saved_frames: Vec<Frame>,
    /// Functions currently being emitted, innermost last.
    pub(crate) call_chain: Vec<Activation>,
    /// Monotonic label counter.
    next_label: LabelId,
    /// Cells the allocator never hands out.
    reserved: BTreeSet<Address>,
    /// Name of the function the synthetic top-level call targets.
    entry: String,
}

impl<'a> CodegenContext<'a> {
    pub fn new(program: &'a Program, builtins: &'a Builtins) -> Self {
        let functions = program
            .functions
            .iter()
            .map(|f| (f.name.node.as_str(), f))
            .collect();
        let reserved = floor_literals(program, builtins);
        Self {
            ops: Vec::new(),
            program,
            functions,
            builtins,
            frame: Frame::new(0),
            saved_frames: Vec::new(),
            call_chain: Vec::new(),
            next_label: 0,
            reserved,
            entry: "main".to_string(),
        }
    }

    // ── Builder-pattern configuration ─────────────────────────────

    pub fn with_entry(mut self, entry: &str) -> Self {
        self.entry = entry.to_string();
        self
    }

    pub fn with_first_cell(mut self, first: Address) -> Self {
        self.frame.next_cell = first;
        self
    }

    pub fn with_reserved_cells(mut self, cells: impl IntoIterator<Item = Address>) -> Self {
        self.reserved.extend(cells);
        self
    }

    // ═══════════════════════════════════════════════════════════════
    // ── Top-level entry: build ────────────────────────────────────
    // ═══════════════════════════════════════════════════════════════

    /// Emit the whole program, starting from a call to the entry function.
    pub fn build(mut self) -> CompileResult<Vec<Instruction>> {
        let functions = &self.program.functions;
        for (i, func) in functions.iter().enumerate() {
            if functions[..i]
                .iter()
                .any(|f| f.name.node == func.name.node)
            {
                return Err(CompileError::DuplicateFunction {
                    name: func.name.node.clone(),
                    span: func.name.span,
                });
            }
        }

        let entry = Call::new(Spanned::dummy(self.entry.clone()), Vec::new());
        self.emit_call(&entry, false)?;

        if !self.saved_frames.is_empty() || !self.call_chain.is_empty() {
            return Err(CompileError::Internal(format!(
                "unbalanced emission: {} saved frame(s), {} active call(s)",
                self.saved_frames.len(),
                self.call_chain.len()
            )));
        }
        log::debug!(
            "emitted {} instructions using {} label(s)",
            self.ops.len(),
            self.next_label
        );
        Ok(self.ops)
    }

    // ── Emission primitives ───────────────────────────────────────

    pub(crate) fn emit(&mut self, op: Instruction) {
        self.ops.push(op);
    }

    pub(crate) fn new_label(&mut self) -> LabelId {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    /// Hand out the next free cell of the current frame.
    pub(crate) fn alloc_cell(&mut self) -> CompileResult<Address> {
        let exhausted = CompileError::FloorExhausted {
            first: self.frame.next_cell,
        };
        let mut cell = self.frame.next_cell;
        while self.reserved.contains(&cell) {
            cell = cell.checked_add(1).ok_or_else(|| exhausted.clone())?;
        }
        self.frame.next_cell = cell.checked_add(1).ok_or(exhausted)?;
        Ok(cell)
    }

    /// Enter a callee frame that allocates above everything the caller holds.
    pub(crate) fn push_frame(&mut self) {
        let callee = Frame::new(self.frame.next_cell);
        let caller = std::mem::replace(&mut self.frame, callee);
        self.saved_frames.push(caller);
    }

    pub(crate) fn pop_frame(&mut self) {
        if let Some(caller) = self.saved_frames.pop() {
            self.frame = caller;
        }
    }

    /// Cells of every visible name, in the current frame and its callers.
    pub(crate) fn live_cells(&self) -> Vec<(String, Address)> {
        self.saved_frames
            .iter()
            .chain(std::iter::once(&self.frame))
            .flat_map(Frame::live_cells)
            .collect()
    }

    /// No two visible names may share a cell.
    pub(crate) fn check_live_cells(&self) -> CompileResult<()> {
        let mut owners: BTreeMap<Address, String> = BTreeMap::new();
        for (name, cell) in self.live_cells() {
            if let Some(other) = owners.insert(cell, name.clone()) {
                return Err(CompileError::Internal(format!(
                    "`{}` and `{}` both live in cell {}",
                    other, name, cell
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn function(&self, name: &str) -> Option<&'a FunctionDef> {
        self.functions.get(name).copied()
    }

    pub(crate) fn builtin(&self, name: &str) -> Option<Builtin> {
        self.builtins.get(name)
    }
}

/// Cells named by `addr <literal>` anywhere in the program.
///
/// These hold prepared floor values, so the allocator must not reuse them.
fn floor_literals(program: &Program, builtins: &Builtins) -> BTreeSet<Address> {
    let addr_names: Vec<&str> = builtins
        .names()
        .filter(|n| builtins.get(n) == Some(Builtin::Addr))
        .collect();
    let mut cells = BTreeSet::new();
    for func in &program.functions {
        collect_floor_literals(&func.body.node, &addr_names, &mut cells);
    }
    cells
}

fn collect_floor_literals(expr: &Expr, addr_names: &[&str], out: &mut BTreeSet<Address>) {
    match expr {
        Expr::Do(stmts) => {
            for s in stmts {
                collect_floor_literals(&s.node, addr_names, out);
            }
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
        } => {
            collect_floor_literals(&cond.node, addr_names, out);
            collect_floor_literals(&then_branch.node, addr_names, out);
            if let Some(e) = else_branch {
                collect_floor_literals(&e.node, addr_names, out);
            }
        }
        Expr::Guards(guards) => {
            for g in guards {
                collect_floor_literals(&g.cond.node, addr_names, out);
                collect_floor_literals(&g.body.node, addr_names, out);
            }
        }
        Expr::Assign { value, .. } => collect_floor_literals(&value.node, addr_names, out),
        Expr::Call(call) => collect_call_floor_literals(call, addr_names, out),
    }
}

fn collect_call_floor_literals(call: &Call, addr_names: &[&str], out: &mut BTreeSet<Address>) {
    let is_addr = addr_names.contains(&call.name.node.as_str());
    for arg in &call.args {
        match &arg.node {
            Arg::Const(n) if is_addr => {
                if let Ok(cell) = Address::try_from(*n) {
                    out.insert(cell);
                }
            }
            Arg::Call(inner) => collect_call_floor_literals(inner, addr_names, out),
            _ => {}
        }
    }
}
