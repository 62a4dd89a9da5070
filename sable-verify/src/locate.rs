#![forbid(unsafe_code)]

use std::env;
use std::path::{Path, PathBuf};

use crate::error::VerifyError;

/// Suffixes tried after the bare name, in order.
fn candidates(name: &str) -> Vec<String> {
    if cfg!(windows) {
        ["", ".exe", ".cmd", ".bat"]
            .iter()
            .map(|ext| format!("{name}{ext}"))
            .collect()
    } else {
        vec![name.to_string()]
    }
}

/// First `dir/name` that exists, searching `dirs` in order.
pub fn find_in<I, P>(name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let names = candidates(name);
    dirs.into_iter().find_map(|dir| {
        names
            .iter()
            .map(|n| dir.as_ref().join(n))
            .find(|p| p.is_file())
    })
}

/// Look `name` up on `PATH`, then in `extra`.
///
/// A name that already contains a path separator is used as given.
pub fn find_executable(name: &str, extra: &[PathBuf]) -> Result<PathBuf, VerifyError> {
    let given = Path::new(name);
    if given.components().count() > 1 {
        return if given.is_file() {
            Ok(given.to_path_buf())
        } else {
            Err(VerifyError::MissingExecutable {
                name: name.to_string(),
            })
        };
    }

    let path_dirs: Vec<PathBuf> = env::var_os("PATH")
        .map(|p| env::split_paths(&p).collect())
        .unwrap_or_default();
    let found = find_in(name, path_dirs.iter().chain(extra.iter()));
    match found {
        Some(path) => {
            tracing::debug!(executable = %path.display(), "located verifier");
            Ok(path)
        }
        None => Err(VerifyError::MissingExecutable {
            name: name.to_string(),
        }),
    }
}
