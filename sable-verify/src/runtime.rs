#![forbid(unsafe_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use sha2::{Digest, Sha256};

use crate::error::VerifyError;
use crate::locate::find_executable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Dafny,
    Rosette,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Dafny => "dafny",
            Backend::Rosette => "rosette",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Backend::Dafny => "dfy",
            Backend::Rosette => "rkt",
        }
    }

    pub fn default_executable(self) -> &'static str {
        match self {
            Backend::Dafny => "dafny",
            Backend::Rosette => "racket",
        }
    }

    fn args(self, script: &Path) -> Vec<String> {
        let script = script.display().to_string();
        match self {
            Backend::Dafny => vec!["/compile:3".to_string(), "/induction:1".to_string(), script],
            Backend::Rosette => vec![script],
        }
    }
}

/// Result of handing one program to the verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// The verifier exited with status zero.
    pub success: bool,
    /// Captured stdout followed by stderr; empty in verbose mode.
    pub output: String,
    /// Where the program was kept, if it was.
    pub script: Option<PathBuf>,
}

/// How to invoke an external verifier.
#[derive(Clone, Debug)]
pub struct Verifier {
    backend: Backend,
    executable: String,
    search_paths: Vec<PathBuf>,
    keep_dir: Option<PathBuf>,
    verbose: bool,
}

impl Verifier {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            executable: backend.default_executable().to_string(),
            search_paths: Vec::new(),
            keep_dir: None,
            verbose: false,
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_search_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.search_paths.extend(paths);
        self
    }

    /// Keep the generated program in `dir` instead of a temporary file.
    pub fn keep_in(mut self, dir: Option<PathBuf>) -> Self {
        self.keep_dir = dir;
        self
    }

    /// Stream verifier output to the terminal instead of capturing it.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Write `program` out and run the verifier on it. The verifier's exit
    /// status decides success.
    pub fn verify(&self, program: &str) -> Result<VerifyOutcome, VerifyError> {
        match &self.keep_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .map_err(|e| VerifyError::io(&format!("create {}", dir.display()), e))?;
                let path = dir.join(script_name(program, self.backend.extension()));
                fs::write(&path, program)
                    .map_err(|e| VerifyError::io(&format!("write {}", path.display()), e))?;
                let mut outcome = self.run_script(&path)?;
                outcome.script = Some(path);
                Ok(outcome)
            }
            None => {
                let mut file = tempfile::Builder::new()
                    .prefix("sable-")
                    .suffix(&format!(".{}", self.backend.extension()))
                    .tempfile()
                    .map_err(|e| VerifyError::io("create temporary program file", e))?;
                file.write_all(program.as_bytes())
                    .and_then(|_| file.flush())
                    .map_err(|e| VerifyError::io("write temporary program file", e))?;
                self.run_script(file.path())
            }
        }
    }

    fn run_script(&self, script: &Path) -> Result<VerifyOutcome, VerifyError> {
        let exe = find_executable(&self.executable, &self.search_paths)?;
        let args = self.backend.args(script);
        tracing::info!(
            backend = self.backend.name(),
            executable = %exe.display(),
            script = %script.display(),
            "running verifier"
        );

        let mut cmd = Command::new(&exe);
        cmd.args(&args).stdin(Stdio::null());

        if self.verbose {
            let status = cmd
                .status()
                .map_err(|e| VerifyError::io(&format!("run {}", exe.display()), e))?;
            return Ok(VerifyOutcome {
                success: status.success(),
                output: String::new(),
                script: None,
            });
        }

        let out = cmd
            .output()
            .map_err(|e| VerifyError::io(&format!("run {}", exe.display()), e))?;
        let success = out.status.success();
        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);
        tracing::debug!(success, status = ?out.status.code(), "verifier finished");

        let output = match (self.backend, success) {
            (Backend::Dafny, true) if stdout.contains(DAFNY_RUN_MARKER) => trim_dafny_output(&stdout),
            _ => format!("{stdout}{stderr}"),
        };
        Ok(VerifyOutcome {
            success,
            output,
            script: None,
        })
    }
}

const DAFNY_RUN_MARKER: &str = "Running...";

/// What the compiled program printed, without Dafny's own verification chatter.
fn trim_dafny_output(stdout: &str) -> String {
    stdout
        .split(DAFNY_RUN_MARKER)
        .nth(1)
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// `test-<first 8 hex digits of sha256(program)>.<ext>`
pub fn script_name(program: &str, extension: &str) -> String {
    let digest = hex::encode(Sha256::digest(program.as_bytes()));
    format!("test-{}.{extension}", &digest[..8])
}
