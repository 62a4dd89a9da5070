#![forbid(unsafe_code)]

//! Hands generated programs to an external verifier and reports the result.

mod error;
pub mod locate;
mod runtime;

pub use error::VerifyError;
pub use locate::find_executable;
pub use runtime::{script_name, Backend, Verifier, VerifyOutcome};
