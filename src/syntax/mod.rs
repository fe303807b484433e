//! Front-end: source text to [`crate::ast::Program`].

pub mod lexeme;
pub mod lexer;
pub mod parser;
pub mod span;
