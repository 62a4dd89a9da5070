#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use crate::Span;

/// A tree that breaks a structural invariant (e.g. a non-initializer where a
/// field initializer is required). Always a bug in whoever built the tree.
#[derive(Debug, Error, Diagnostic)]
#[error("malformed AST: {message}")]
#[diagnostic(code(sable::ast))]
#[allow(unused_assignments)]
pub struct AstError {
    pub message: String,
    #[label]
    pub span: Span,
}
