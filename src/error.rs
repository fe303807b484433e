//! Errors raised while lowering a program to machine instructions.
//!
//! Every variant aborts the whole compilation: a partially emitted listing
//! with unresolved cells is never returned.

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::ir::Address;
use crate::span::Span;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    #[error("unresolved name `{name}`")]
    UnresolvedName { name: String, span: Span },

    #[error("`{name}` takes {expected} argument(s) but {found} were supplied")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("`{name}` cannot combine two literals ({left} and {right})")]
    TwoLiterals {
        name: String,
        left: i64,
        right: i64,
        span: Span,
    },

    #[error("recursive call to `{name}` is not a tail call to the innermost function")]
    Recursion { name: String, span: Span },

    #[error("`{name}` needs a memory cell but was given the literal {value}")]
    LiteralOperand { name: String, value: i64, span: Span },

    #[error("`addr` cannot address negative cell {value}")]
    InvalidAddress { value: i64, span: Span },

    #[error("`{name}` literal {value} is outside the machine's range of -999..=999")]
    LiteralOutOfRange { name: String, value: i64, span: Span },

    #[error("no free floor cell at or above {first}")]
    FloorExhausted { first: Address },

    #[error("condition is not a comparison")]
    NotACondition { span: Span },

    #[error("duplicate definition of `{name}`")]
    DuplicateFunction { name: String, span: Span },

    #[error("internal compiler error: {0}")]
    Internal(String),
}

pub type CompileResult<T> = Result<T, CompileError>;

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::UnresolvedName { span, .. }
            | CompileError::Arity { span, .. }
            | CompileError::TwoLiterals { span, .. }
            | CompileError::Recursion { span, .. }
            | CompileError::LiteralOperand { span, .. }
            | CompileError::LiteralOutOfRange { span, .. }
            | CompileError::InvalidAddress { span, .. }
            | CompileError::NotACondition { span }
            | CompileError::DuplicateFunction { span, .. } => *span,
            CompileError::FloorExhausted { .. } | CompileError::Internal(_) => Span::dummy(),
        }
    }

    /// Convert into a renderable diagnostic with a hint where one helps.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string(), self.span());
        match self {
            CompileError::UnresolvedName { .. } => diag.with_help(
                "define a function with this name, or bind the variable with `<-`".to_string(),
            ),
            CompileError::TwoLiterals { .. } => diag.with_help(
                "the machine has no literal load; bind one operand to a variable first"
                    .to_string(),
            ),
            CompileError::Recursion { .. } => diag
                .with_note("the machine has no call stack".to_string())
                .with_help(
                    "only a function calling itself as its very last action can recurse"
                        .to_string(),
                ),
            CompileError::NotACondition { .. } => diag.with_help(
                "use one of `gt`, `ge`, `lt`, `le`, `eq`, `neq`, or a function ending in one"
                    .to_string(),
            ),
            CompileError::FloorExhausted { .. } => diag.with_help(
                "lower `first` or the reserved cells in the floor configuration".to_string(),
            ),
            CompileError::Internal(_) => {
                diag.with_note("this is a bug in the compiler, not in your program".to_string())
            }
            _ => diag,
        }
    }
}
