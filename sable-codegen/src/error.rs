#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use sable_ast::AstError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("codegen error: {message}")]
#[diagnostic(code(sable::codegen))]
#[allow(unused_assignments)]
pub struct CodegenError {
    pub message: String,
}

impl CodegenError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<AstError> for CodegenError {
    fn from(err: AstError) -> Self {
        Self::new(err.to_string())
    }
}
