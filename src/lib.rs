pub mod api;
pub mod ast;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod ir;
pub mod syntax;

// Re-exports: flat `clerk::X` paths for the front-end modules
pub use config::project;
pub use syntax::lexeme;
pub(crate) use syntax::lexer;
pub(crate) use syntax::parser;
pub use syntax::span;

// Re-export public API: `clerk::compile()` etc.
pub use api::*;

use diagnostic::{render_diagnostics, Diagnostic};
use lexer::Lexer;
use parser::Parser;

/// Parse a source file, rendering any diagnostics to stderr.
pub fn parse_source(source: &str, filename: &str) -> Result<ast::Program, Vec<Diagnostic>> {
    parse_source_silent(source, filename).inspect_err(|errors| {
        render_diagnostics(errors, filename, source);
    })
}

pub fn parse_source_silent(source: &str, _filename: &str) -> Result<ast::Program, Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }
    Parser::new(tokens).parse_program()
}
