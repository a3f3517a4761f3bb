// This file is part of gcode-syntax, a G-Code expression parser and evaluator.
// Copyright (c) the gcode-syntax contributors.

//! Compiled script entries.
//!
//! Grounded on `gcode_script.py`'s `CommandEntry`/`ErrorEntry` pair, which a
//! `Script`'s internal queue stores interchangeably so that a syntax error
//! on one line does not stop later, independently-valid lines from still
//! being queued (§4.3, §4.4). `CommandEntry` keeps the parsed `(key, value)`
//! expression pairs rather than flattening them to strings, because a
//! traditional or extended key may itself be a `{…}` expression or string
//! literal and must only be stringified after evaluation (§4.2).

use crate::ast::Expr;
use crate::diagnostic;
use crate::error::{GCodeError, RuntimeError};
use crate::parser::ParsedCommand;
use crate::runtime::{eval_expr, Environment};
use crate::source::Line;
use std::rc::Rc;

/// One successfully parsed command, ready to be evaluated against an
/// [`Environment`] supplying that call's local parameters.
#[derive(Debug)]
pub struct CommandEntry {
    pub line: Rc<Line>,
    pub name: String,
    pub params: Vec<(Expr, Expr)>,
}

impl CommandEntry {
    #[must_use]
    pub fn new(line: Rc<Line>, parsed: ParsedCommand) -> Self {
        CommandEntry {
            line,
            name: parsed.name,
            params: parsed.params,
        }
    }

    /// Evaluates every `(key, value)` pair against `env`, producing the
    /// `(command_name, parameters)` result described in §3. Keys are
    /// stringified via [`crate::runtime::Value::to_display_string`] after
    /// evaluation, since a dynamic key (`{expr}`) is only known at this
    /// point; later pairs overwrite earlier ones with the same rendered
    /// key, matching ordinary dictionary-literal semantics.
    pub fn eval(&self, env: &Environment) -> Result<(String, Vec<(String, String)>), GCodeError> {
        let mut ordered: Vec<(String, String)> = Vec::new();
        for (key_expr, value_expr) in &self.params {
            let (key, value) = self
                .eval_pair(key_expr, value_expr, env)
                .map_err(|e| self.wrap_runtime_error(&e))?;
            if let Some(existing) = ordered.iter_mut().find(|(k, _)| *k == key) {
                existing.1 = value;
            } else {
                ordered.push((key, value));
            }
        }
        Ok((self.name.clone(), ordered))
    }

    fn eval_pair(
        &self,
        key_expr: &Expr,
        value_expr: &Expr,
        env: &Environment,
    ) -> Result<(String, String), RuntimeError> {
        let key = eval_expr(key_expr, env)?.to_display_string();
        let value = eval_expr(value_expr, env)?.to_display_string();
        Ok((key, value))
    }

    fn wrap_runtime_error(&self, cause: &RuntimeError) -> GCodeError {
        GCodeError::new(diagnostic::render(&cause.message(), &self.line.value, None))
    }
}

/// A line that failed to parse, carrying its precomputed [`GCodeError`] so
/// that draining the queue later can raise it verbatim, in the order it
/// was encountered relative to the commands around it (§4.4).
#[derive(Debug)]
pub struct ErrorEntry {
    pub error: GCodeError,
}

impl ErrorEntry {
    #[must_use]
    pub fn new(error: GCodeError) -> Self {
        ErrorEntry { error }
    }
}

/// Either a parsed command or a precomputed error, stored in queue order.
#[derive(Debug)]
pub enum Entry {
    Command(CommandEntry),
    Error(ErrorEntry),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use std::collections::BTreeMap;

    fn compile(text: &str) -> CommandEntry {
        let line = Line::dummy(text);
        let parsed = parse_line(&line).unwrap().unwrap();
        CommandEntry::new(line, parsed)
    }

    #[test]
    fn eval_renders_keys_and_values_in_order() {
        let entry = compile("G1 X10 Y20");
        let env = Environment::default();
        let (name, params) = entry.eval(&env).unwrap();
        assert_eq!(name, "G1");
        assert_eq!(
            params,
            vec![("X".to_string(), "10".to_string()), ("Y".to_string(), "20".to_string())]
        );
    }

    #[test]
    fn eval_surfaces_runtime_errors_with_command_context() {
        let entry = compile("G1 X{missing}");
        let env = Environment::default();
        let err = entry.eval(&env).unwrap_err();
        assert!(err.message.contains("in command: G1 X{missing}"));
        assert!(err.message.contains("Parameter 'missing' is not defined"));
    }

    #[test]
    fn duplicate_keys_take_the_last_value() {
        let entry = compile("SET_FAN SPEED=1 SPEED=2");
        let env = Environment::new(BTreeMap::new(), BTreeMap::new());
        let (_, params) = entry.eval(&env).unwrap();
        assert_eq!(params, vec![("SPEED".to_string(), "2".to_string())]);
    }
}
