//! End-to-end tests for the `phpfmt` binary.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn phpfmt() -> Command {
    Command::new(env!("CARGO_BIN_EXE_phpfmt"))
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = phpfmt()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn phpfmt");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for phpfmt")
}

/// Create a PHP source file for testing.
fn scratch(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write scratch file");
    path
}

// -----------------------------------------------------------
// Standard input.
// -----------------------------------------------------------

#[test]
fn stdin_is_formatted_to_stdout() {
    let out = run_with_stdin(&[], "<?php\nif($x){echo 1;}");
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "<?php\n\nif ($x) {\n\techo 1;\n}\n"
    );
}

#[test]
fn stdin_syntax_error() {
    let out = run_with_stdin(&[], "<?php function a(");
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert_eq!(
        String::from_utf8(out.stderr).unwrap(),
        "phpfmt: <stdin>:1:18: expecting ), found EOF\n"
    );
}

#[test]
fn write_flag_rejects_stdin() {
    let out = run_with_stdin(&["-w"], "<?php echo 1;");
    assert_eq!(out.status.code(), Some(2));
    assert_eq!(
        String::from_utf8(out.stderr).unwrap(),
        "phpfmt: cannot use -w with standard input\n"
    );
}

// -----------------------------------------------------------
// Files.
// -----------------------------------------------------------

#[test]
fn files_are_printed_in_order() {
    let dir = TempDir::new().expect("create temp dir");
    let a = scratch(&dir, "a.php", "<?php echo 'a';");
    let b = scratch(&dir, "b.php", "<?php echo 'b';");
    let out = phpfmt().arg(&a).arg(&b).output().expect("run phpfmt");
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "<?php\n\necho 'a';\n<?php\n\necho 'b';\n"
    );
}

#[test]
fn write_flag_rewrites_file() {
    let dir = TempDir::new().expect("create temp dir");
    let path = scratch(&dir, "rewrite.php", "<?php function f(){return 1;}");
    let out = phpfmt().arg("-w").arg(&path).output().expect("run phpfmt");
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "<?php\n\nfunction f()\n{\n\treturn 1;\n}\n"
    );
}

#[test]
fn bad_file_does_not_stop_the_others() {
    let dir = TempDir::new().expect("create temp dir");
    let bad = scratch(&dir, "bad.php", "<?php class a{");
    let good = scratch(&dir, "good.php", "<?php echo 1;");
    let out = phpfmt().arg(&bad).arg(&good).output().expect("run phpfmt");
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(String::from_utf8(out.stdout).unwrap(), "<?php\n\necho 1;\n");
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert_eq!(
        stderr,
        format!("phpfmt: {}:1:15: expecting }}, found EOF\n", bad.display())
    );
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("missing.php");
    let out = phpfmt().arg(&path).output().expect("run phpfmt");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.starts_with(&format!("phpfmt: {}: ", path.display())));
}
