#![forbid(unsafe_code)]

//! Front end tying the parser, obligation builder, backends and verifier together.

pub mod config;
pub mod pipeline;

pub use config::{find_manifest, load_config, load_manifest, Config, ConfigError};
pub use pipeline::{compile_proofs, compile_run, ProgramSource, Verdict};
