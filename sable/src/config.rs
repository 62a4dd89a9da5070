#![forbid(unsafe_code)]

//! `sable.toml`: where the backend libraries live and how to find the verifiers.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use sable_verify::Backend;
use thiserror::Error;

pub const MANIFEST_NAME: &str = "sable.toml";

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(sable::config))]
pub struct ConfigError {
    pub message: String,
}

/// Settings with every path made absolute against the manifest directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub manifest_path: Option<PathBuf>,
    pub project_root: PathBuf,
    pub backend: Backend,
    /// Extra directories searched after `PATH`.
    pub search_paths: Vec<PathBuf>,
    pub dafny: String,
    pub racket: String,
    pub dafny_root: PathBuf,
    pub rosette_root: PathBuf,
    pub keep_dir: PathBuf,
}

impl Config {
    pub fn empty(project_root: PathBuf) -> Self {
        Self {
            manifest_path: None,
            dafny_root: project_root.join("backend").join("dafny"),
            rosette_root: project_root.join("backend").join("rosette"),
            keep_dir: project_root.clone(),
            project_root,
            backend: Backend::Dafny,
            search_paths: Vec::new(),
            dafny: Backend::Dafny.default_executable().to_string(),
            racket: Backend::Rosette.default_executable().to_string(),
        }
    }

    /// Executable name configured for `backend`.
    pub fn executable(&self, backend: Backend) -> &str {
        match backend {
            Backend::Dafny => &self.dafny,
            Backend::Rosette => &self.racket,
        }
    }

    /// Library root the generated program includes for `backend`.
    pub fn library_root(&self, backend: Backend) -> &Path {
        match backend {
            Backend::Dafny => &self.dafny_root,
            Backend::Rosette => &self.rosette_root,
        }
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    verifier: Verifier,

    #[serde(default)]
    backend: Libraries,

    #[serde(default)]
    output: Output,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
struct Verifier {
    #[serde(default)]
    backend: Option<String>,

    #[serde(default)]
    paths: Vec<String>,

    #[serde(default)]
    dafny: Option<String>,

    #[serde(default)]
    racket: Option<String>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
struct Libraries {
    #[serde(default)]
    dafny_root: Option<String>,

    #[serde(default)]
    rosette_root: Option<String>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
struct Output {
    #[serde(default)]
    keep_dir: Option<String>,
}

pub fn parse_backend(name: &str) -> Option<Backend> {
    match name.trim().to_ascii_lowercase().as_str() {
        "dafny" => Some(Backend::Dafny),
        "rosette" | "racket" => Some(Backend::Rosette),
        _ => None,
    }
}

/// Nearest `sable.toml` in `start` or one of its ancestors.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    let mut cur = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = cur.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        match cur.parent() {
            Some(p) => cur = p.to_path_buf(),
            None => return None,
        }
    }
}

/// Discover a manifest from `start`; no manifest means defaults rooted at `start`.
pub fn load_config(start: &Path) -> Result<Config, ConfigError> {
    let project_root = if start.is_file() {
        start.parent().unwrap_or_else(|| Path::new(".")).to_path_buf()
    } else {
        start.to_path_buf()
    };

    match find_manifest(&project_root) {
        Some(manifest_path) => load_manifest(&manifest_path),
        None => Ok(Config::empty(project_root)),
    }
}

/// Read one specific manifest file.
pub fn load_manifest(manifest_path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(manifest_path).map_err(|e| ConfigError {
        message: format!("failed to read {}: {e}", manifest_path.display()),
    })?;
    let manifest_dir = manifest_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let mut config = from_manifest_str(&raw, &manifest_dir).map_err(|e| ConfigError {
        message: format!("{}: {}", manifest_path.display(), e.message),
    })?;
    config.manifest_path = Some(manifest_path.to_path_buf());
    tracing::debug!(manifest = %manifest_path.display(), "loaded config");
    Ok(config)
}

/// Resolve manifest text whose relative paths are relative to `manifest_dir`.
pub fn from_manifest_str(raw: &str, manifest_dir: &Path) -> Result<Config, ConfigError> {
    let parsed: Manifest = toml::from_str(raw).map_err(|e| ConfigError {
        message: format!("failed to parse: {e}"),
    })?;

    let mut out = Config::empty(manifest_dir.to_path_buf());

    if let Some(name) = parsed.verifier.backend {
        out.backend = parse_backend(&name).ok_or_else(|| ConfigError {
            message: format!("unknown backend `{name}` (expected `dafny` or `rosette`)"),
        })?;
    }
    out.search_paths = parsed
        .verifier
        .paths
        .iter()
        .map(|p| resolve_path(manifest_dir, p))
        .collect();
    if let Some(dafny) = parsed.verifier.dafny {
        out.dafny = dafny;
    }
    if let Some(racket) = parsed.verifier.racket {
        out.racket = racket;
    }
    if let Some(root) = parsed.backend.dafny_root {
        out.dafny_root = resolve_path(manifest_dir, &root);
    }
    if let Some(root) = parsed.backend.rosette_root {
        out.rosette_root = resolve_path(manifest_dir, &root);
    }
    if let Some(dir) = parsed.output.keep_dir {
        out.keep_dir = resolve_path(manifest_dir, &dir);
    }
    Ok(out)
}

fn resolve_path(base: &Path, p: &str) -> PathBuf {
    let pb = PathBuf::from(p);
    if pb.is_absolute() {
        pb
    } else {
        base.join(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_rooted_at_the_project() {
        let config = Config::empty(PathBuf::from("/proj"));
        assert_eq!(config.backend, Backend::Dafny);
        assert_eq!(config.dafny_root, Path::new("/proj/backend/dafny"));
        assert_eq!(config.executable(Backend::Rosette), "racket");
        assert_eq!(config.keep_dir, Path::new("/proj"));
    }

    #[test]
    fn manifest_paths_resolve_against_its_directory() {
        let raw = r#"
[verifier]
backend = "rosette"
paths = ["bin", "/opt/dafny"]
racket = "raco-racket"

[backend]
rosette_root = "lib/rosette"

[output]
keep_dir = "out"
"#;
        let config = from_manifest_str(raw, Path::new("/proj")).expect("parse manifest");
        assert_eq!(config.backend, Backend::Rosette);
        assert_eq!(
            config.search_paths,
            vec![PathBuf::from("/proj/bin"), PathBuf::from("/opt/dafny")]
        );
        assert_eq!(config.executable(Backend::Rosette), "raco-racket");
        assert_eq!(config.library_root(Backend::Rosette), Path::new("/proj/lib/rosette"));
        assert_eq!(config.library_root(Backend::Dafny), Path::new("/proj/backend/dafny"));
        assert_eq!(config.keep_dir, Path::new("/proj/out"));
    }

    #[test]
    fn unknown_backend_and_sections_are_rejected() {
        let err = from_manifest_str("[verifier]\nbackend = \"coq\"\n", Path::new("/p")).unwrap_err();
        assert!(err.message.contains("unknown backend `coq`"), "{}", err.message);
        assert!(from_manifest_str("[linker]\npaths = []\n", Path::new("/p")).is_err());
    }

    #[test]
    fn manifest_is_found_in_an_ancestor() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        let nested = dir.path().join("proofs").join("deep");
        fs::create_dir_all(&nested).expect("create nested");
        fs::write(dir.path().join(MANIFEST_NAME), "[output]\nkeep_dir = \"kept\"\n").expect("write manifest");
        let script = nested.join("a.sbl");
        fs::write(&script, "1").expect("write script");

        let config = load_config(&script).expect("load config");
        assert_eq!(config.manifest_path, Some(dir.path().join(MANIFEST_NAME)));
        assert_eq!(config.keep_dir, dir.path().join("kept"));
    }

    #[test]
    fn no_manifest_means_defaults() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        let config = load_config(dir.path()).expect("load config");
        // A manifest further up the real filesystem would make this flaky.
        if config.manifest_path.is_none() {
            assert_eq!(config, Config::empty(dir.path().to_path_buf()));
        }
    }
}
