//! Drives the `sable` binary end to end with a shell script posing as Dafny.
#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// A project directory with a `sable.toml` naming `fake-dafny` in `bin/`.
fn project(dafny_body: &str) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let bin = dir.path().join("bin");
    fs::create_dir_all(&bin).expect("create bin");
    let tool = bin.join("fake-dafny");
    fs::write(&tool, format!("#!/bin/sh\n{dafny_body}\n")).expect("write fake dafny");
    let mut perms = fs::metadata(&tool).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&tool, perms).expect("chmod");
    fs::write(
        dir.path().join("sable.toml"),
        "[verifier]\npaths = [\"bin\"]\ndafny = \"fake-dafny\"\n\n[output]\nkeep_dir = \"kept\"\n",
    )
    .expect("write manifest");
    dir
}

fn sable(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sable"))
        .args(args)
        .current_dir(dir)
        .env_remove("SABLE_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("spawn sable")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn prove_reports_success() {
    let dir = project("exit 0");
    let out = sable(dir.path(), &["prove", "x = 6; assert x == 6"]);
    assert!(out.status.success(), "{out:?}");
    assert!(stdout(&out).contains("Success!"), "{out:?}");
}

#[test]
fn prove_reports_failure_with_exit_code() {
    let dir = project("echo 'assertion might not hold'\nexit 4");
    let out = sable(dir.path(), &["prove", "assert 1 == 2"]);
    assert_eq!(out.status.code(), Some(1), "{out:?}");
    let text = stdout(&out);
    assert!(text.contains("assertion might not hold"), "{text}");
    assert!(text.contains("FAILED!"), "{text}");
}

#[test]
fn prove_reads_a_script_file_and_prints_the_program() {
    let dir = project("exit 0");
    fs::write(dir.path().join("eq.sbl"), "A() { new(x=1) { get() { x } } }\nA() ~ A()\n").expect("write script");
    let out = sable(dir.path(), &["prove", "eq.sbl", "-v"]);
    assert!(out.status.success(), "{out:?}");
    let text = stdout(&out);
    assert!(text.contains("\nScript:\n"), "{text}");
    assert!(text.contains("lemma equivalent0_get("), "{text}");
    assert!(text.contains("Lang.dfy"), "{text}");
}

#[test]
fn keep_file_names_the_script_by_content() {
    let dir = project("exit 0");
    let out = sable(dir.path(), &["prove", "assert 1 == 1", "-k"]);
    assert!(out.status.success(), "{out:?}");
    let text = stdout(&out);
    let line = text
        .lines()
        .find(|l| l.starts_with("  Script: "))
        .expect("kept script line");
    let kept = Path::new(line.trim_start_matches("  Script: "));
    assert!(kept.starts_with(dir.path().join("kept")), "{text}");
    let name = kept.file_name().and_then(|n| n.to_str()).expect("file name");
    assert!(name.starts_with("test-") && name.ends_with(".dfy"), "{name}");
    let program = fs::read_to_string(kept).expect("read kept script");
    assert!(program.contains("method assertion0()"), "{program}");
}

#[test]
fn run_prints_the_traced_results() {
    let dir = project("echo 'Dafny program verifier finished'\necho 'Running...'\necho '5 + 6 ==> 11'\nexit 0");
    let out = sable(dir.path(), &["run", "5 + 6", "-e", "11"]);
    assert!(out.status.success(), "{out:?}");
    let text = stdout(&out);
    assert!(text.starts_with("5 + 6 ==> 11"), "{text}");
    assert!(!text.contains("FAILED!"), "{text}");
}

#[test]
fn run_failure_prints_output_after_the_banner() {
    let dir = project("echo 'assertion violation'\nexit 3");
    let out = sable(dir.path(), &["run", "1 / 0", "-c", "k=1"]);
    assert_eq!(out.status.code(), Some(1), "{out:?}");
    let text = stdout(&out);
    assert!(text.starts_with("FAILED!\n\nassertion violation"), "{text}");
}

#[test]
fn xfail_scripts_invert_the_exit_code() {
    let dir = project("exit 1");
    let out = sable(dir.path(), &["prove", "// XFAIL: dafny\nassert 1 == 2"]);
    assert!(out.status.success(), "{out:?}");
    assert!(stdout(&out).contains("(expected failure)"), "{out:?}");
}

#[test]
fn stdin_programs_print_a_separator() {
    let dir = project("exit 0");
    let mut child = Command::new(env!("CARGO_BIN_EXE_sable"))
        .args(["prove", "-"])
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn sable");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"assert 2 == 2\n")
        .expect("write stdin");
    let out = child.wait_with_output().expect("wait");
    assert!(out.status.success(), "{out:?}");
    assert!(stdout(&out).starts_with("---\nSuccess!"), "{out:?}");
}

#[test]
fn missing_verifier_is_a_diagnostic() {
    let dir = project("exit 0");
    fs::write(dir.path().join("sable.toml"), "[verifier]\ndafny = \"no-such-dafny-binary\"\n").expect("write manifest");
    let out = sable(dir.path(), &["prove", "assert 1 == 1"]);
    assert!(!out.status.success(), "{out:?}");
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("no-such-dafny-binary"), "{err}");
}

#[test]
fn explicit_config_overrides_discovery() {
    let dir = project("exit 0");
    let other = TempDir::new().expect("create temp dir");
    let manifest = other.path().join("alt.toml");
    fs::write(&manifest, "[verifier]\nbackend = \"rosette\"\nracket = \"no-such-racket\"\n").expect("write manifest");
    let manifest = manifest.to_str().expect("utf-8 path");
    let out = sable(dir.path(), &["--config", manifest, "prove", "assert 1 == 1"]);
    assert!(!out.status.success(), "{out:?}");
    assert!(String::from_utf8_lossy(&out.stderr).contains("no-such-racket"), "{out:?}");
}

#[test]
fn syntax_errors_fail_before_the_verifier_runs() {
    let dir = project("echo 'should not run'\nexit 0");
    let out = sable(dir.path(), &["prove", "assert (1 =="]);
    assert!(!out.status.success(), "{out:?}");
    assert!(!stdout(&out).contains("should not run"), "{out:?}");
}
