//! Runs the verifier runtime against shell scripts standing in for Dafny and Racket.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use sable_verify::{script_name, Backend, Verifier, VerifyError};

fn fake_tool(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod");
}

#[test]
fn successful_dafny_run_is_trimmed_to_program_output() {
    let bin = tempfile::TempDir::new().expect("create temp dir");
    fake_tool(
        bin.path(),
        "fake-dafny",
        r#"echo "Dafny program verifier finished with 2 verified, 0 errors"
echo "Running..."
echo ""
echo "args: $1 $2"
exit 0"#,
    );
    let outcome = Verifier::new(Backend::Dafny)
        .with_executable("fake-dafny")
        .with_search_paths([bin.path().to_path_buf()])
        .verify("method Main() {}")
        .expect("verify");
    assert!(outcome.success);
    assert_eq!(outcome.output, "args: /compile:3 /induction:1");
    assert_eq!(outcome.script, None);
}

#[test]
fn failure_is_an_outcome_with_both_streams() {
    let bin = tempfile::TempDir::new().expect("create temp dir");
    fake_tool(bin.path(), "fake-racket", "echo out\necho err >&2\nexit 1");
    let outcome = Verifier::new(Backend::Rosette)
        .with_executable("fake-racket")
        .with_search_paths([bin.path().to_path_buf()])
        .verify("#lang rosette")
        .expect("verify");
    assert!(!outcome.success);
    assert_eq!(outcome.output, "out\nerr\n");
}

#[test]
fn kept_scripts_are_named_by_content() {
    let bin = tempfile::TempDir::new().expect("create temp dir");
    let keep = tempfile::TempDir::new().expect("create temp dir");
    fake_tool(bin.path(), "fake-racket", "cat \"$1\"");
    let program = "#lang rosette\n\n(display 1)";
    let outcome = Verifier::new(Backend::Rosette)
        .with_executable("fake-racket")
        .with_search_paths([bin.path().to_path_buf()])
        .keep_in(Some(keep.path().join("out")))
        .verify(program)
        .expect("verify");
    let script = outcome.script.expect("kept script");
    assert_eq!(script, keep.path().join("out").join(script_name(program, "rkt")));
    assert_eq!(fs::read_to_string(&script).expect("read"), program);
    assert_eq!(outcome.output, program);
}

#[test]
fn missing_verifier_is_an_error() {
    let err = Verifier::new(Backend::Dafny)
        .with_executable("sable-definitely-not-installed")
        .verify("method Main() {}")
        .unwrap_err();
    assert!(matches!(err, VerifyError::MissingExecutable { .. }));
}
