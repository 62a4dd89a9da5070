#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Problems with the environment the verifier runs in. A verifier that runs
/// and rejects the program is not an error; see [`crate::VerifyOutcome`].
#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum VerifyError {
    #[error("couldn't find executable `{name}` on your PATH")]
    #[diagnostic(
        code(sable::verify::missing_executable),
        help("try specifying an additional search path with the --path argument (or `verifier.paths` in sable.toml)")
    )]
    MissingExecutable { name: String },

    #[error("verify error: {message}")]
    #[diagnostic(code(sable::verify))]
    Io { message: String },
}

impl VerifyError {
    pub(crate) fn io(action: &str, err: std::io::Error) -> Self {
        VerifyError::Io {
            message: format!("{action}: {err}"),
        }
    }
}
