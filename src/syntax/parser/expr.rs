use crate::ast::*;
use crate::lexeme::Lexeme;
use crate::span::Spanned;

use super::Parser;

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Option<Spanned<Expr>> {
        if !self.enter_nesting() {
            return None;
        }
        let expr = match self.peek() {
            Lexeme::Do => self.parse_do(),
            Lexeme::If => self.parse_if(),
            Lexeme::Ident(_) => {
                let call = self.parse_call();
                let span = call.name.span.merge(self.prev_span());
                Some(Spanned::new(Expr::Call(call), span))
            }
            other => {
                let msg = format!("expected expression, found {}", other.description());
                self.error_with_help(&msg, "expressions are `do { .. }`, `if .. then ..`, or calls");
                None
            }
        };
        self.exit_nesting();
        expr
    }

    fn parse_do(&mut self) -> Option<Spanned<Expr>> {
        let start = self.expect(&Lexeme::Do);
        self.expect(&Lexeme::LBrace);
        let mut stmts = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            stmts.push(self.parse_stmt()?);
            if !self.eat(&Lexeme::Semicolon) {
                break;
            }
        }
        let end = self.expect(&Lexeme::RBrace);
        Some(Spanned::new(Expr::Do(stmts), start.merge(end)))
    }

    fn parse_stmt(&mut self) -> Option<Spanned<Expr>> {
        if matches!(self.peek(), Lexeme::Ident(_)) && self.peek_ahead(1) == &Lexeme::LeftArrow {
            let name = self.expect_ident();
            self.expect(&Lexeme::LeftArrow);
            let value = self.parse_expr()?;
            let span = name.span.merge(value.span);
            return Some(Spanned::new(
                Expr::Assign {
                    name,
                    value: Box::new(value),
                },
                span,
            ));
        }
        self.parse_expr()
    }

    fn parse_if(&mut self) -> Option<Spanned<Expr>> {
        let start = self.expect(&Lexeme::If);
        let cond = self.parse_expr()?;
        self.expect(&Lexeme::Then);
        let then_branch = self.parse_expr()?;
        let else_branch = if self.eat(&Lexeme::Else) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        let span = start.merge(self.prev_span());
        Some(Spanned::new(
            Expr::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch,
            },
            span,
        ))
    }

    /// `name arg*`; the argument list ends at the first token that cannot
    /// start an argument or that sits in column 0.
    fn parse_call(&mut self) -> Call {
        let name = self.expect_ident();
        let mut args = Vec::new();
        while self.peek().starts_argument() && !self.at_margin() {
            match self.parse_arg() {
                Some(arg) => args.push(arg),
                None => break,
            }
        }
        Call::new(name, args)
    }

    fn parse_arg(&mut self) -> Option<Spanned<Arg>> {
        let start = self.current_span();
        match self.peek().clone() {
            Lexeme::Ident(name) => {
                self.advance();
                Some(Spanned::new(Arg::Var(name), start))
            }
            Lexeme::Integer(n) => {
                self.advance();
                Some(Spanned::new(Arg::Const(n), start))
            }
            Lexeme::Minus => {
                self.advance();
                if let Lexeme::Integer(n) = *self.peek() {
                    self.advance();
                    Some(Spanned::new(Arg::Const(-n), start.merge(self.prev_span())))
                } else {
                    self.error_at_current("expected integer literal after '-'");
                    None
                }
            }
            Lexeme::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let end = self.expect(&Lexeme::RParen);
                match inner.node {
                    Expr::Call(call) => Some(Spanned::new(Arg::Call(call), start.merge(end))),
                    _ => {
                        self.diagnostics.push(
                            crate::diagnostic::Diagnostic::error(
                                "only calls can be passed as parenthesized arguments".to_string(),
                                inner.span,
                            )
                            .with_help(
                                "move the block into its own function and pass a call to it"
                                    .to_string(),
                            ),
                        );
                        None
                    }
                }
            }
            _ => None,
        }
    }
}
