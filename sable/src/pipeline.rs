#![forbid(unsafe_code)]

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use miette::IntoDiagnostic;
use sable_backend_dafny::Dafny;
use sable_backend_rosette::Rosette;
use sable_codegen::{compile, CodegenError};
use sable_proof::tags::ScriptTags;
use sable_proof::{Expectation, Obligation, Program, Seed};
use sable_verify::{Backend, Verifier};

use crate::config::Config;

/// Where the program text of a command line argument comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramSource {
    Stdin,
    File(PathBuf),
    Literal(String),
}

impl ProgramSource {
    /// `-` is stdin, an existing path is a file, anything else is program text.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            ProgramSource::Stdin
        } else if Path::new(arg).exists() {
            ProgramSource::File(PathBuf::from(arg))
        } else {
            ProgramSource::Literal(arg.to_string())
        }
    }

    pub fn read(&self) -> miette::Result<String> {
        match self {
            ProgramSource::Stdin => {
                let mut src = String::new();
                std::io::stdin().read_to_string(&mut src).into_diagnostic()?;
                Ok(src)
            }
            ProgramSource::File(path) => fs::read_to_string(path).into_diagnostic(),
            ProgramSource::Literal(src) => Ok(src.clone()),
        }
    }

    /// Directory to start the `sable.toml` search from.
    pub fn config_start(&self) -> miette::Result<PathBuf> {
        match self {
            ProgramSource::File(path) => fs::canonicalize(path).into_diagnostic(),
            ProgramSource::Stdin | ProgramSource::Literal(_) => std::env::current_dir().into_diagnostic(),
        }
    }
}

/// Render `obs` for `backend`, including the library root from `config`.
pub fn generate(obs: &[Obligation], backend: Backend, config: &Config) -> Result<String, CodegenError> {
    let root = config.library_root(backend).to_path_buf();
    tracing::debug!(backend = backend.name(), obligations = obs.len(), "generating program");
    match backend {
        Backend::Dafny => compile(Dafny::new(root)?, obs),
        Backend::Rosette => compile(Rosette::new(root)?, obs),
    }
}

/// Backend program proving every claim in `src`.
pub fn compile_proofs(src: &str, backend: Backend, config: &Config) -> miette::Result<String> {
    let obs = Program::parse(src)?.proof_obligations()?;
    Ok(generate(&obs, backend, config)?)
}

/// Backend program evaluating `src` and tracing each top-level result.
///
/// Without an explicit seed or expectation, the script's `CONTEXT` and
/// `EXPECT` tags are used.
pub fn compile_run(
    src: &str,
    seed: Option<Seed>,
    expect: Option<Expectation>,
    backend: Backend,
    config: &Config,
) -> miette::Result<String> {
    let tags = ScriptTags::parse(src);
    let seed = match seed {
        Some(seed) => Some(seed),
        None => tags.context()?,
    };
    let expect = expect.or_else(|| tags.expect());
    let obs = Program::parse(src)?
        .with_seed(seed)
        .with_expectation(expect)
        .evaluate_obligations();
    Ok(generate(&obs, backend, config)?)
}

/// Verifier for `backend` configured from `config` plus command line search paths.
pub fn verifier(backend: Backend, config: &Config, extra_paths: &[PathBuf], keep: bool) -> Verifier {
    Verifier::new(backend)
        .with_executable(config.executable(backend))
        .with_search_paths(extra_paths.iter().cloned())
        .with_search_paths(config.search_paths.iter().cloned())
        .keep_in(keep.then(|| config.keep_dir.clone()))
}

/// How a script's `XFAIL`/`SKIP` tags change the meaning of a verifier result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
    ExpectedFailure,
    UnexpectedPass,
}

impl Verdict {
    pub fn new(success: bool, xfail: bool) -> Self {
        match (success, xfail) {
            (true, false) => Verdict::Passed,
            (false, false) => Verdict::Failed,
            (false, true) => Verdict::ExpectedFailure,
            (true, true) => Verdict::UnexpectedPass,
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Verdict::Passed | Verdict::ExpectedFailure)
    }
}

pub fn verdict(src: &str, backend: Backend, success: bool) -> Verdict {
    Verdict::new(success, ScriptTags::parse(src).is_xfail(backend.name()))
}

pub fn is_skipped(src: &str, backend: Backend) -> bool {
    ScriptTags::parse(src).is_skipped(backend.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::empty(PathBuf::from("/proj"))
    }

    #[test]
    fn literal_programs_are_not_paths() {
        assert_eq!(ProgramSource::from_arg("-"), ProgramSource::Stdin);
        assert_eq!(
            ProgramSource::from_arg("x = 1; assert x == 1"),
            ProgramSource::Literal("x = 1; assert x == 1".to_string())
        );
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let arg = file.path().to_str().expect("utf-8 path");
        assert_eq!(ProgramSource::from_arg(arg), ProgramSource::File(file.path().to_path_buf()));
    }

    #[test]
    fn proofs_include_the_configured_library() {
        let out = compile_proofs("assert 1 == 1", Backend::Dafny, &config()).expect("compile");
        assert!(out.starts_with("include \"/proj/backend/dafny/Lang.dfy\""), "{out}");
        let out = compile_proofs("assert 1 == 1", Backend::Rosette, &config()).expect("compile");
        assert!(out.contains("(require (file \"/proj/backend/rosette/eval.rkt\"))"), "{out}");
    }

    #[test]
    fn run_falls_back_to_script_tags() {
        let src = "// EXPECT: 11\n// CONTEXT: k = 10\nk + 1";
        let out = compile_run(src, None, None, Backend::Dafny, &config()).expect("compile");
        assert!(out.contains("Pair(\"k\", Int(10))"), "{out}");
        assert!(out.contains("assert ret0 == Int(11);"), "{out}");

        let out = compile_run(src, None, Expectation::parse("12"), Backend::Dafny, &config()).expect("compile");
        assert!(out.contains("assert ret0 == Int(12);"), "{out}");
    }

    #[test]
    fn bad_context_tag_is_an_error() {
        assert!(compile_run("// CONTEXT: k\n1", None, None, Backend::Dafny, &config()).is_err());
    }

    #[test]
    fn parse_errors_surface() {
        assert!(compile_proofs("x = = 1", Backend::Dafny, &config()).is_err());
    }

    #[test]
    fn xfail_inverts_the_verdict() {
        let src = "// XFAIL: dafny\nassert 1 == 2";
        assert_eq!(verdict(src, Backend::Dafny, false), Verdict::ExpectedFailure);
        assert!(!verdict(src, Backend::Dafny, true).is_ok());
        assert_eq!(verdict(src, Backend::Rosette, false), Verdict::Failed);
        assert!(is_skipped("// SKIP: *\n1", Backend::Rosette));
    }
}
