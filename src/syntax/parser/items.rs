use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::lexeme::Lexeme;
use crate::span::Spanned;

use super::Parser;

impl Parser {
    pub(super) fn parse_functions(&mut self) -> Program {
        let mut program = Program::default();
        while !self.at(&Lexeme::Eof) {
            let errors_before = self.diagnostics.len();
            if let Some(func) = self.parse_function() {
                if let Some(prev) = program.function(&func.name.node) {
                    self.diagnostics.push(
                        Diagnostic::error(
                            format!("duplicate definition of `{}`", func.name.node),
                            func.name.span,
                        )
                        .with_note(format!(
                            "first defined at byte offset {}",
                            prev.name.span.start
                        )),
                    );
                } else {
                    program.functions.push(func);
                }
            }
            if self.diagnostics.len() > errors_before && !self.at(&Lexeme::Eof) {
                self.recover_to_margin();
            } else if !self.at(&Lexeme::Eof) && !self.at_margin() {
                self.error_with_help(
                    &format!("unexpected {} after function body", self.peek().description()),
                    "function definitions start in column 0",
                );
                self.recover_to_margin();
            }
        }
        program
    }

    /// `name params* = expr` or `name params* (| cond = expr)+`
    fn parse_function(&mut self) -> Option<FunctionDef> {
        let name = self.expect_ident();
        let mut params = Vec::new();
        while let Lexeme::Ident(param) = self.peek().clone() {
            if self.at_margin() {
                break;
            }
            params.push(Spanned::new(param, self.current_span()));
            self.advance();
        }

        if self.eat(&Lexeme::Eq) {
            let body = self.parse_expr()?;
            return Some(FunctionDef { name, params, body });
        }

        if self.at(&Lexeme::Bar) {
            let start = self.current_span();
            let mut guards = Vec::new();
            while self.at(&Lexeme::Bar) && !self.at_margin() {
                self.advance();
                let cond = self.parse_expr()?;
                self.expect(&Lexeme::Eq);
                let body = self.parse_expr()?;
                guards.push(Guard { cond, body });
            }
            let body = Spanned::new(Expr::Guards(guards), start.merge(self.prev_span()));
            return Some(FunctionDef { name, params, body });
        }

        self.error_with_help(
            &format!(
                "expected '=' or '|' after the header of `{}`, found {}",
                name.node,
                self.peek().description()
            ),
            "write `name params = body` or one `| condition = body` line per guard",
        );
        None
    }
}
