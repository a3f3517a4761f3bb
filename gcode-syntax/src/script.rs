// This file is part of gcode-syntax, a G-Code expression parser and evaluator.
// Copyright (c) the gcode-syntax contributors.

//! The streaming command queue.
//!
//! Grounded on `gcode_script.py`'s `Script` class: text arrives in
//! arbitrarily-sized chunks (a socket read, a file chunk) via
//! [`Script::parse_segment`], is split on newlines, and each complete line
//! is parsed immediately and pushed onto a FIFO as either a
//! [`crate::compiler::CommandEntry`] or an [`crate::compiler::ErrorEntry`]
//! — a syntax error on one line never blocks independently valid
//! neighboring lines (§4.3, §4.4). [`Script::eval_next`] then drains the
//! queue one entry at a time, each call supplying the local parameters for
//! that one evaluation.

use crate::compiler::{CommandEntry, Entry, ErrorEntry};
use crate::diagnostic;
use crate::error::GCodeError;
use crate::parser::parse_line;
use crate::runtime::{Environment, Value};
use crate::source::Line;
use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroU64;
use std::rc::Rc;

/// A streaming G-Code command queue (§4.3/§4.4/§6).
#[derive(Debug, Default)]
pub struct Script {
    queue: VecDeque<Entry>,
    /// Text received by [`Script::parse_segment`] that did not yet end in a
    /// newline, carried over to be prepended to the next segment.
    partial_line: String,
    next_line_number: u64,
    globals: BTreeMap<String, Value>,
    /// Latched true the moment an `M112` raw command is queued; never
    /// cleared by parsing, only by [`Script::check_m112`] (§4.4, §6).
    has_m112: bool,
    /// Set only by [`Script::set_fatal`]; `check_fatal` clears it. Ordinary
    /// syntax and runtime errors never touch this field — §7 reserves
    /// "fatal" for conditions outside the script itself (bridged-allocator
    /// OOM, an explicit fatal callback), mirroring `gcode_bridge.py`'s
    /// `gcode_python_fatal`, which is invoked by native code independently
    /// of the per-line `gcode_python_error` result channel (§6).
    fatal: Option<GCodeError>,
}

impl Script {
    #[must_use]
    pub fn new() -> Self {
        Script {
            next_line_number: 1,
            ..Default::default()
        }
    }

    /// Exposes a pseudo-root object (e.g. `status`, `config`) under `name`
    /// for later `{status.foo}` lookups (§3 Environments, §6
    /// `expose_config`/`expose_inputs`). Out of scope: keeping a live view
    /// synced to the real printer/config objects this stands in for — the
    /// caller is responsible for calling this again whenever the
    /// underlying data changes.
    pub fn expose_inputs(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Exposes the `config` pseudo-root specifically (§6 `expose_config`),
    /// a thin, named wrapper over [`Script::expose_inputs`] for the
    /// printer-config object every embedder exposes under that fixed name.
    pub fn expose_config(&mut self, config: Value) {
        self.expose_inputs("config", config);
    }

    /// Removes a previously exposed pseudo-root (§6 `remove_inputs`).
    pub fn remove_inputs(&mut self, name: &str) {
        self.globals.remove(name);
    }

    /// Latches a fatal condition from outside the script itself — an
    /// out-of-memory from the bridged allocator, or an explicit fatal
    /// callback (§7) — mirroring `gcode_bridge.py`'s `gcode_python_fatal`.
    /// Never called from parsing or evaluation; those surface ordinary
    /// [`GCodeError`]s through [`Script::parse_one_line`]'s queued
    /// [`crate::compiler::ErrorEntry`] and [`Script::eval_next`]'s `Result`.
    pub fn set_fatal(&mut self, error: GCodeError) {
        self.fatal = Some(error);
    }

    /// Feeds `data` into the parser. Splits on `\n`; everything after the
    /// last `\n` (including none at all) is buffered as
    /// [`Script::partial_line`] until a future call completes it.
    pub fn parse_segment(&mut self, data: &str) {
        let mut combined = std::mem::take(&mut self.partial_line);
        combined.push_str(data);
        let ends_with_newline = combined.ends_with('\n');
        let mut lines: Vec<&str> = combined.split('\n').collect();
        if !ends_with_newline {
            self.partial_line = lines.pop().unwrap_or_default().to_string();
        } else {
            lines.pop(); // drop the trailing empty segment after the final '\n'
        }
        for line in lines {
            self.parse_one_line(line);
        }
    }

    /// Flushes any buffered partial line as a final, newline-less line
    /// (§4.3: a script's last line need not end in `\n`).
    pub fn parse_finish(&mut self) {
        if !self.partial_line.is_empty() {
            let line = std::mem::take(&mut self.partial_line);
            self.parse_one_line(&line);
        }
    }

    fn parse_one_line(&mut self, text: &str) {
        let number = NonZeroU64::new(self.next_line_number).unwrap();
        self.next_line_number += 1;
        let line = Rc::new(Line {
            value: text.to_string(),
            number,
        });
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(parsed)) => {
                if parsed.name.eq_ignore_ascii_case("M112") {
                    self.has_m112 = true;
                }
                self.queue.push_back(Entry::Command(CommandEntry::new(line, parsed)));
            }
            Err(parse_error) => {
                let message = diagnostic::render(
                    &parse_error.cause.message(),
                    &line.value,
                    parse_error.location.as_ref(),
                );
                let error = GCodeError::new(message);
                self.queue.push_back(Entry::Error(ErrorEntry::new(error)));
            }
        }
    }

    /// The number of entries (commands and errors alike) still queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.is_empty()
    }

    /// Evaluates and removes the next queued entry. `locals` supplies the
    /// per-call parameters a command's expressions may reference via
    /// `GetParameter` (§3 Environments). Returns `None` once the queue is
    /// drained.
    pub fn eval_next(
        &mut self,
        locals: BTreeMap<String, Value>,
    ) -> Option<Result<(String, Vec<(String, String)>), GCodeError>> {
        match self.queue.pop_front()? {
            Entry::Command(entry) => {
                let env = Environment::new(self.globals.clone(), locals);
                Some(entry.eval(&env))
            }
            Entry::Error(entry) => Some(Err(entry.error)),
        }
    }

    /// Reports and clears the latched `M112` flag (§4.4, §6).
    pub fn check_m112(&mut self) -> bool {
        std::mem::take(&mut self.has_m112)
    }

    /// Reports and clears the latched fatal error, if any (§6).
    pub fn check_fatal(&mut self) -> Option<GCodeError> {
        self.fatal.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_lines_are_buffered_across_segments() {
        let mut script = Script::new();
        script.parse_segment("G1 X");
        assert_eq!(script.len(), 0);
        script.parse_segment("10\n");
        assert_eq!(script.len(), 1);
    }

    #[test]
    fn parse_finish_flushes_a_trailing_line_without_newline() {
        let mut script = Script::new();
        script.parse_segment("M112");
        assert_eq!(script.len(), 0);
        script.parse_finish();
        assert_eq!(script.len(), 1);
    }

    #[test]
    fn a_syntax_error_does_not_block_later_valid_lines() {
        let mut script = Script::new();
        script.parse_segment("G1 X@\nG1 Y1\n");
        assert_eq!(script.len(), 2);
        assert!(script.eval_next(BTreeMap::new()).unwrap().is_err());
        assert!(script.eval_next(BTreeMap::new()).unwrap().is_ok());
    }

    #[test]
    fn m112_is_latched_until_checked() {
        let mut script = Script::new();
        script.parse_segment("M112\n");
        assert!(script.check_m112());
        assert!(!script.check_m112());
    }

    #[test]
    fn ordinary_syntax_errors_never_set_fatal() {
        let mut script = Script::new();
        script.parse_segment("G1 X@\n");
        assert!(script.check_fatal().is_none());
    }

    #[test]
    fn ordinary_runtime_errors_never_set_fatal() {
        let mut script = Script::new();
        script.parse_segment("G1 X{missing}\n");
        assert!(script.eval_next(BTreeMap::new()).unwrap().is_err());
        assert!(script.check_fatal().is_none());
    }

    #[test]
    fn set_fatal_is_latched_until_checked() {
        let mut script = Script::new();
        script.set_fatal(GCodeError::new("out of memory".to_string()));
        assert!(script.check_fatal().is_some());
        assert!(script.check_fatal().is_none());
    }

    #[test]
    fn expose_config_is_visible_under_the_config_root() {
        let mut script = Script::new();
        script.expose_config(Value::Dict(BTreeMap::from([("max_velocity".to_string(), Value::Num(300.0))])));
        script.parse_segment("ECHO {config.max_velocity}\n");
        let (_, params) = script.eval_next(BTreeMap::new()).unwrap().unwrap();
        assert_eq!(params[0].1, "300");
    }

    #[test]
    fn exposed_inputs_are_visible_to_expressions() {
        let mut script = Script::new();
        script.expose_inputs("status", Value::Dict(BTreeMap::from([("busy".to_string(), Value::Bool(true))])));
        script.parse_segment("ECHO {status.busy}\n");
        let (name, params) = script.eval_next(BTreeMap::new()).unwrap().unwrap();
        assert_eq!(name, "ECHO");
        assert_eq!(params[0].1, "true");
    }
}
