#![forbid(unsafe_code)]

mod error;
mod invariant;
mod obligation;
mod program;
pub mod tags;

pub use error::ProofError;
pub use invariant::{default_invariant, interpret, Invariant, Side};
pub use obligation::{Equivalence, Expectation, Obligation, Seed};
pub use program::Program;
