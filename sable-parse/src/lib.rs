#![forbid(unsafe_code)]

mod error;
mod lower;
mod parser;

use miette::IntoDiagnostic;
use sable_lex::Lexer;

pub use error::ParseError;
pub use parser::Parser;

/// Parse a whole script into a `TopLevel` node.
pub fn parse_source(src: &str) -> miette::Result<sable_ast::Node> {
    let tokens = Lexer::new(src).lex().into_diagnostic()?;
    let mut parser = Parser::new(&tokens);
    parser.parse_program().into_diagnostic()
}

/// Parse a single expression (no proofs, assertions or assumptions).
pub fn parse_expr(src: &str) -> miette::Result<sable_ast::Node> {
    let tokens = Lexer::new(src).lex().into_diagnostic()?;
    let mut parser = Parser::new(&tokens);
    parser.parse_expr_eof().into_diagnostic()
}
