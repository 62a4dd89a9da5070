#![forbid(unsafe_code)]

mod builder;
mod dialect;
mod emitter;
mod error;
mod ident;
pub mod template;

pub use builder::{invariant_params, CodeBuilder, DefKind, Definition, Param};
pub use dialect::{Dialect, EquivalenceStyle, LemmaSyntax, WholeObjectCheck};
pub use emitter::{compile, ObligationEmitter};
pub use error::CodegenError;
pub use ident::IdGen;
pub use template::{Delimiters, Snippet, Templates};
