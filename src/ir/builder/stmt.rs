//! Expression and control-flow emission.

use super::builtins::BranchCondition;
use super::frame::Operand;
use super::CodegenContext;
use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::ir::{Cell, Instruction};
use crate::span::Spanned;

impl CodegenContext<'_> {
    /// Emit `expr`. `tail` is true when nothing in the enclosing function
    /// body runs after it.
    ///
    /// Returns the branch condition left by a trailing comparison.
    pub(super) fn emit_expr(
        &mut self,
        expr: &Spanned<Expr>,
        tail: bool,
    ) -> CompileResult<Option<BranchCondition>> {
        match &expr.node {
            Expr::Do(stmts) => {
                let last = stmts.len().saturating_sub(1);
                let mut condition = None;
                for (i, stmt) in stmts.iter().enumerate() {
                    condition = self.emit_expr(stmt, tail && i == last)?;
                }
                Ok(condition)
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.emit_if(cond, then_branch, else_branch.as_deref(), tail)?;
                Ok(None)
            }
            Expr::Guards(guards) => {
                self.emit_guards(guards, tail)?;
                Ok(None)
            }
            Expr::Assign { name, value } => {
                self.emit_expr(value, false)?;
                let cell = self.alloc_cell()?;
                self.emit(Instruction::CopyTo(Cell::Direct(cell)));
                self.frame.bind(&name.node, Operand::Cell(cell));
                self.check_live_cells()?;
                Ok(None)
            }
            Expr::Call(call) => self.emit_call(call, tail),
        }
    }

    fn emit_condition(&mut self, cond: &Spanned<Expr>) -> CompileResult<BranchCondition> {
        self.emit_expr(cond, false)?
            .ok_or(CompileError::NotACondition { span: cond.span })
    }

    /// Layout:
    /// ```text
    ///     <cond>
    ///     <jumps to skip>
    ///     <fall-through body>
    ///     jump end
    /// skip:
    ///     <jump body>
    /// end:
    /// ```
    /// The jump body is `then` when the condition swaps branches, else `else`.
    fn emit_if(
        &mut self,
        cond: &Spanned<Expr>,
        then_branch: &Spanned<Expr>,
        else_branch: Option<&Spanned<Expr>>,
        tail: bool,
    ) -> CompileResult<()> {
        let condition = self.emit_condition(cond)?;
        let skip = self.new_label();
        let end = self.new_label();

        let (fall_through, jump_body) = if condition.swap_branches {
            (else_branch, Some(then_branch))
        } else {
            (Some(then_branch), else_branch)
        };

        for op in condition.jumps(skip) {
            self.emit(op);
        }
        if let Some(body) = fall_through {
            self.emit_branch(body, tail)?;
        }
        self.emit(Instruction::Jump(end));
        self.emit(Instruction::Label(skip));
        if let Some(body) = jump_body {
            self.emit_branch(body, tail)?;
        }
        self.emit(Instruction::Label(end));
        Ok(())
    }

    /// Guards are tried in order; the first whose condition holds runs and
    /// control continues after the whole chain. No match runs nothing.
    fn emit_guards(&mut self, guards: &[Guard], tail: bool) -> CompileResult<()> {
        let end = self.new_label();
        let scope = self.frame.bindings.len();
        for guard in guards {
            let condition = self.emit_condition(&guard.cond)?;
            let next = self.new_label();
            if condition.swap_branches {
                let body = self.new_label();
                for op in condition.jumps(body) {
                    self.emit(op);
                }
                self.emit(Instruction::Jump(next));
                self.emit(Instruction::Label(body));
            } else {
                for op in condition.jumps(next) {
                    self.emit(op);
                }
            }
            self.emit_expr(&guard.body, tail)?;
            self.frame.bindings.truncate(scope);
            self.emit(Instruction::Jump(end));
            self.emit(Instruction::Label(next));
        }
        self.emit(Instruction::Label(end));
        Ok(())
    }

    /// Emit one arm of a conditional. Names bound inside the arm go out of
    /// scope with it; its cells stay allocated, so sibling arms never reuse them.
    fn emit_branch(&mut self, body: &Spanned<Expr>, tail: bool) -> CompileResult<()> {
        let scope = self.frame.bindings.len();
        self.emit_expr(body, tail)?;
        self.frame.bindings.truncate(scope);
        Ok(())
    }
}
