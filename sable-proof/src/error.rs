#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use sable_ast::{AstError, Span};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("proof error: {message}")]
#[diagnostic(code(sable::proof))]
#[allow(unused_assignments)]
pub struct ProofError {
    pub message: String,
    #[label]
    pub span: Span,
}

impl From<AstError> for ProofError {
    fn from(err: AstError) -> Self {
        Self {
            message: err.to_string(),
            span: err.span,
        }
    }
}
