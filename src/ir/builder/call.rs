//! Calls: inlining, tail self-calls, and argument resolution.

use super::builtins::BranchCondition;
use super::frame::Operand;
use super::{Activation, CodegenContext};
use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::ir::{Address, Cell, Instruction};
use crate::span::{Span, Spanned};

impl CodegenContext<'_> {
    /// Emit a call expression.
    ///
    /// A bare name bound in the current frame is a variable read. Otherwise
    /// the name is looked up among the builtins, then the user functions.
    pub(super) fn emit_call(
        &mut self,
        call: &Call,
        tail: bool,
    ) -> CompileResult<Option<BranchCondition>> {
        let name = call.name.node.as_str();

        if call.args.is_empty() {
            if let Some(operand) = self.frame.lookup(name) {
                let cell = self.require_bound_cell(name, operand, call.name.span)?;
                self.emit(Instruction::CopyFrom(Cell::Direct(cell)));
                return Ok(None);
            }
        }

        if let Some(builtin) = self.builtin(name) {
            return self.emit_builtin(builtin, call);
        }

        let Some(func) = self.function(name) else {
            return Err(CompileError::UnresolvedName {
                name: name.to_string(),
                span: call.name.span,
            });
        };
        if call.args.len() != func.params.len() {
            return Err(CompileError::Arity {
                name: name.to_string(),
                expected: func.params.len(),
                found: call.args.len(),
                span: call.name.span,
            });
        }

        if let Some(depth) = self.call_chain.iter().position(|a| a.name == name) {
            if tail && depth + 1 == self.call_chain.len() {
                self.emit_tail_call(call)?;
                return Ok(None);
            }
            return Err(CompileError::Recursion {
                name: name.to_string(),
                span: call.name.span,
            });
        }

        self.emit_inline(func, call)
    }

    /// Expand `func` in place with its parameters bound to the arguments.
    fn emit_inline(
        &mut self,
        func: &FunctionDef,
        call: &Call,
    ) -> CompileResult<Option<BranchCondition>> {
        let mark = self.frame.next_cell;
        let mut values = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            values.push(self.resolve_argument(arg)?);
        }

        self.push_frame();
        for (param, value) in func.params.iter().zip(values) {
            self.frame.bind_param(&param.node, value);
        }
        let entry = self.new_label();
        self.call_chain.push(Activation {
            name: func.name.node.clone(),
            entry,
        });
        log::debug!("inlining `{}` at L{}", func.name.node, entry);

        self.emit(Instruction::Label(entry));
        let result = self.emit_expr(&func.body, true);

        self.call_chain.pop();
        self.pop_frame();
        // Argument copies are dead once the callee body has run.
        self.frame.next_cell = mark;
        result
    }

    /// Rebind the innermost function's parameters and jump to its entry.
    ///
    /// Arguments are evaluated against the old parameter values: every
    /// changed argument but the last goes through a scratch cell first.
    fn emit_tail_call(&mut self, call: &Call) -> CompileResult<()> {
        let Some(entry) = self.call_chain.last().map(|a| a.entry) else {
            return Err(CompileError::Internal(format!(
                "tail call to `{}` outside of any function",
                call.name.node
            )));
        };
        let params = self.frame.params.clone();

        let mut changed: Vec<(Address, &Spanned<Arg>)> = Vec::new();
        for (param, arg) in params.iter().zip(&call.args) {
            match *param {
                Operand::Literal(value) => {
                    if self.literal_value(arg) != Some(value) {
                        return Err(CompileError::LiteralOperand {
                            name: call.name.node.clone(),
                            value,
                            span: arg.span,
                        });
                    }
                }
                Operand::Cell(cell) => {
                    if let Arg::Var(name) = &arg.node {
                        if self.frame.lookup(name) == Some(Operand::Cell(cell)) {
                            continue;
                        }
                    }
                    changed.push((cell, arg));
                }
            }
        }

        let mark = self.frame.next_cell;
        let mut staged = Vec::new();
        if let Some((last, rest)) = changed.split_last() {
            for (param, arg) in rest {
                self.emit_arg_value(call, arg)?;
                let scratch = self.alloc_cell()?;
                self.emit(Instruction::CopyTo(Cell::Direct(scratch)));
                staged.push((scratch, *param));
            }
            let (param, arg) = last;
            self.emit_arg_value(call, arg)?;
            self.emit(Instruction::CopyTo(Cell::Direct(*param)));
        }
        for (scratch, param) in staged {
            self.emit(Instruction::CopyFrom(Cell::Direct(scratch)));
            self.emit(Instruction::CopyTo(Cell::Direct(param)));
        }
        self.frame.next_cell = mark;

        self.emit(Instruction::Jump(entry));
        Ok(())
    }

    /// Operand of a builtin argument. Bound names are used in place.
    pub(super) fn resolve_operand(&mut self, arg: &Spanned<Arg>) -> CompileResult<Operand> {
        match &arg.node {
            Arg::Const(n) => Ok(Operand::Literal(*n)),
            Arg::Var(name) => match self.frame.lookup(name) {
                Some(operand) => Ok(operand),
                None => self.spill(&Call::new(Spanned::new(name.clone(), arg.span), Vec::new())),
            },
            Arg::Call(call) => self.spill(call),
        }
    }

    /// Value bound to a callee parameter. Cells are copied, so rebinding the
    /// parameter in a loop never clobbers the caller's variable.
    fn resolve_argument(&mut self, arg: &Spanned<Arg>) -> CompileResult<Operand> {
        let bound = match &arg.node {
            Arg::Var(name) => self.frame.lookup(name),
            _ => None,
        };
        match bound {
            Some(Operand::Cell(source)) => {
                self.emit(Instruction::CopyFrom(Cell::Direct(source)));
                let copy = self.alloc_cell()?;
                self.emit(Instruction::CopyTo(Cell::Direct(copy)));
                Ok(Operand::Cell(copy))
            }
            Some(literal) => Ok(literal),
            None => self.resolve_operand(arg),
        }
    }

    /// Load an argument into the accumulator.
    fn emit_arg_value(&mut self, call: &Call, arg: &Spanned<Arg>) -> CompileResult<()> {
        match &arg.node {
            Arg::Const(value) => Err(CompileError::LiteralOperand {
                name: call.name.node.clone(),
                value: *value,
                span: arg.span,
            }),
            Arg::Var(name) => {
                let read = Call::new(Spanned::new(name.clone(), arg.span), Vec::new());
                self.emit_call(&read, false).map(|_| ())
            }
            Arg::Call(inner) => self.emit_call(inner, false).map(|_| ()),
        }
    }

    /// Evaluate a call and park its result in a fresh cell.
    fn spill(&mut self, call: &Call) -> CompileResult<Operand> {
        self.emit_call(call, false)?;
        let cell = self.alloc_cell()?;
        self.emit(Instruction::CopyTo(Cell::Direct(cell)));
        Ok(Operand::Cell(cell))
    }

    fn literal_value(&self, arg: &Spanned<Arg>) -> Option<i64> {
        match &arg.node {
            Arg::Const(n) => Some(*n),
            Arg::Var(name) => match self.frame.lookup(name) {
                Some(Operand::Literal(n)) => Some(n),
                _ => None,
            },
            Arg::Call(_) => None,
        }
    }

    fn require_bound_cell(
        &self,
        name: &str,
        operand: Operand,
        span: Span,
    ) -> CompileResult<Address> {
        match operand {
            Operand::Cell(cell) => Ok(cell),
            Operand::Literal(value) => Err(CompileError::LiteralOperand {
                name: name.to_string(),
                value,
                span,
            }),
        }
    }
}
