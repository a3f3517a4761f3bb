// This file is part of gcode-syntax, a G-Code expression parser and evaluator.
// Copyright (c) the gcode-syntax contributors.

//! The embedder-facing value and result types used at the C/Python
//! boundary.
//!
//! Grounded on `gcode_bridge.py`'s `gcode_python_*` callback surface and its
//! `GCodeValue`/`GCodePyResult` pair: a host process owns a
//! [`crate::script::Script`], pushes raw text into it, and on each
//! evaluation step receives either a flattened parameter list or an error
//! string to forward across the boundary. This module only defines the
//! Rust-side types that shape; it deliberately does not implement the
//! `extern "C"` functions, a build script, or any `cbindgen` tooling that
//! real FFI glue would need — out of scope (§1 Non-goals).

use crate::error::GCodeError;
use crate::runtime::Value;

/// A parameter value crossing the embedder boundary, flattened from
/// [`crate::runtime::Value`] into the handful of shapes a C caller can
/// represent without a Rust-side tag enum of its own (`gcode_bridge.py`'s
/// `GCodeValue` union).
#[derive(Clone, Debug, PartialEq)]
pub enum GCodeValue {
    Num(f64),
    Str(String),
    Bool(bool),
}

impl From<Value> for GCodeValue {
    /// A `Dict` has no representation on the other side of the boundary —
    /// it is stringified the same way [`Value::to_display_string`] would,
    /// since only scalar leaves of an evaluated parameter ever reach here
    /// (`Script::eval_next` already stringifies command parameters before
    /// this conversion is needed).
    fn from(value: Value) -> Self {
        match value {
            Value::Num(n) => GCodeValue::Num(n),
            Value::Str(s) => GCodeValue::Str(s),
            Value::Bool(b) => GCodeValue::Bool(b),
            Value::Dict(_) => GCodeValue::Str(value.to_display_string()),
        }
    }
}

/// The result of one [`crate::script::Script::eval_next`] call, shaped the
/// way `gcode_bridge.py`'s `GCodePyResult` is returned to its C caller:
/// either a command ready to execute, or an error string to report.
#[derive(Clone, Debug, PartialEq)]
pub enum GCodePyResult {
    Command {
        name: String,
        params: Vec<(String, String)>,
    },
    Error(String),
}

impl GCodePyResult {
    #[must_use]
    pub fn from_eval(
        result: Result<(String, Vec<(String, String)>), GCodeError>,
    ) -> GCodePyResult {
        match result {
            Ok((name, params)) => GCodePyResult::Command { name, params },
            Err(error) => GCodePyResult::Error(error.message),
        }
    }
}

/// The subset of `gcode_bridge.py`'s `Executor` responsibilities that are
/// in scope here: driving a [`crate::script::Script`] to completion and
/// handing results back one at a time. A real embedder additionally owns
/// the C-side queue draining, GIL handling, and printer object lookups
/// that back `expose_inputs`/`expose_config` — all out of scope.
pub trait Executor {
    fn push_result(&mut self, result: GCodePyResult);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_values_are_stringified_at_the_boundary() {
        let dict = Value::Dict(Default::default());
        assert_eq!(GCodeValue::from(dict), GCodeValue::Str("{...}".to_string()));
    }

    #[test]
    fn from_eval_maps_ok_and_err_to_command_and_error() {
        let ok = GCodePyResult::from_eval(Ok(("G1".to_string(), vec![("X".to_string(), "1".to_string())])));
        assert_eq!(
            ok,
            GCodePyResult::Command {
                name: "G1".to_string(),
                params: vec![("X".to_string(), "1".to_string())]
            }
        );
        let err = GCodePyResult::from_eval(Err(GCodeError::new("boom".to_string())));
        assert_eq!(err, GCodePyResult::Error("boom".to_string()));
    }
}
