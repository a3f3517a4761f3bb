// This file is part of gcode-cli, the dump-gcode command-line tool.
// Copyright (c) the gcode-syntax contributors.

//! `dump-gcode`: reads a file, parses it as a G-Code script, and prints
//! each evaluated `(command, parameters)` pair, one per line.
//!
//! Grounded on `dump-gcode.py`'s loop (SPEC_FULL.md §6): `eval_next` is
//! called repeatedly with a fixed `{"foo": "bar"}` local scope until the
//! queue drains; a domain error prints its (possibly multi-line) message
//! with every line prefixed `"* "` and does not stop the loop, since later
//! entries in the queue remain independently evaluable (§7).

use gcode_syntax::runtime::Value;
use gcode_syntax::script::Script;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "dump-gcode".to_string());
    let Some(path) = args.next() else {
        eprintln!("usage: {program} FILENAME");
        return ExitCode::FAILURE;
    };
    if args.next().is_some() {
        eprintln!("usage: {program} FILENAME");
        return ExitCode::FAILURE;
    }

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("{program}: cannot read '{path}': {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut script = Script::new();
    script.parse_segment(&contents);
    script.parse_finish();

    let locals: BTreeMap<String, Value> = BTreeMap::from([("foo".to_string(), Value::Str("bar".to_string()))]);

    while let Some(result) = script.eval_next(locals.clone()) {
        match result {
            Ok((command, params)) => {
                let rendered = params
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{command} {rendered}");
            }
            Err(error) => {
                for line in error.message.lines() {
                    println!("* {line}");
                }
            }
        }
    }

    ExitCode::SUCCESS
}
