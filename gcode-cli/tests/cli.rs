// This file is part of gcode-cli, the dump-gcode command-line tool.
// Copyright (c) the gcode-syntax contributors.

//! End-to-end tests of the `dump-gcode` binary (SPEC_FULL.md §6/§8).

use std::fs;
use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_dump-gcode");
const TMPDIR: &str = env!("CARGO_TARGET_TMPDIR");

fn run(name: &str, script: &str) -> std::process::Output {
    let path = std::path::Path::new(TMPDIR).join(name);
    fs::write(&path, script).unwrap();
    Command::new(BIN).arg(&path).output().unwrap()
}

fn stdout(name: &str, script: &str) -> String {
    let output = run(name, script);
    assert!(output.status.success(), "{output:?}");
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn prints_traditional_command_parameters() {
    let out = stdout("traditional.gcode", "G1 X10 Y20\n");
    assert_eq!(out, "G1 X=10 Y=20\n");
}

#[test]
fn prints_embedded_expression_result() {
    let out = stdout("embedded.gcode", "G1 X{1+2*3}\n");
    assert_eq!(out, "G1 X=7\n");
}

#[test]
fn prints_raw_command_with_interpolated_global() {
    let out = stdout("raw.gcode", "ECHO hello {foo}\n");
    assert_eq!(out, "ECHO *=hello bar\n");
}

#[test]
fn division_by_zero_is_nan_not_an_error() {
    let out = stdout("divzero.gcode", "G1 X{1/0}\n");
    assert_eq!(out, "G1 X=nan\n");
}

#[test]
fn syntax_errors_are_prefixed_and_do_not_abort_the_run() {
    let out = stdout("bad_then_good.gcode", "G1 X@\nG1 Y1\n");
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("* Unexpected \"@\""));
    assert!(lines.iter().any(|l| l.starts_with("*   in command: G1 X@")));
    assert_eq!(lines.last(), Some(&"G1 Y=1"));
}

#[test]
fn missing_filename_argument_exits_with_failure() {
    let output = Command::new(BIN).output().unwrap();
    assert!(!output.status.success());
}
