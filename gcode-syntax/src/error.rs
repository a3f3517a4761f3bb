// This file is part of gcode-syntax, a G-Code expression parser and evaluator.
// Copyright (c) the gcode-syntax contributors.

//! Error types.
//!
//! Mirrors the teacher's `SyntaxError`/`ErrorCause` split: a low-level,
//! `#[non_exhaustive]` enum per failure domain with a `message()` method
//! producing the user-facing sentence, wrapped by a top-level error that
//! [`thiserror`] derives `Display` from via `#[error("{}", self.message())]`.

use crate::source::Location;

/// Failures detected while lexing or parsing a single line.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{}", self.message())]
#[non_exhaustive]
pub enum SyntaxError {
    /// A byte did not start any valid token.
    UnexpectedCharacter { found: char, expected: Vec<String> },
    /// A token appeared where the grammar did not expect it.
    UnexpectedToken {
        found: String,
        expected: Vec<String>,
    },
    /// `{` was never closed before the end of the line.
    UnclosedBrace,
    /// A string literal was never closed before the end of the line.
    UnclosedString,
    /// A function call named something other than `bool`, `str`, `int` or `float`.
    UndefinedFunction { name: String },
    /// A malformed numeric literal (should be unreachable given the lexer's
    /// own character classes, kept for defense in depth).
    InvalidNumber { text: String },
}

impl SyntaxError {
    /// The user-facing headline for this error, not including the
    /// `in command: ...` / caret footer that [`crate::diagnostic`] adds.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            SyntaxError::UnexpectedCharacter { found, expected } => format!(
                "Unexpected \"{found}\" (expected {})",
                crate::diagnostic::join_expected(expected)
            ),
            SyntaxError::UnexpectedToken { found, expected } => format!(
                "Unexpected {found} (expected {})",
                crate::diagnostic::join_expected(expected)
            ),
            SyntaxError::UnclosedBrace => "Unclosed '{'".to_string(),
            SyntaxError::UnclosedString => "Unclosed string literal".to_string(),
            SyntaxError::UndefinedFunction { name } => {
                format!("Function '{name}' is undefined")
            }
            SyntaxError::InvalidNumber { text } => format!("Invalid number '{text}'"),
        }
    }
}

/// A [`SyntaxError`] together with the location it occurred at, if any.
///
/// The location is optional because some failures (end-of-input expectations)
/// have no single offending character.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{cause}")]
pub struct ParseError {
    pub cause: SyntaxError,
    pub location: Option<Location>,
}

/// Failures detected while evaluating a compiled [`crate::compiler::CommandEntry`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{}", self.message())]
#[non_exhaustive]
pub enum RuntimeError {
    /// `_runtime_get_parameter` found no such name in either scope.
    UndefinedParameter { name: String, options: Vec<String> },
    /// `_runtime_get_member` found no such key in the target object.
    UndefinedMember { name: String, options: Vec<String> },
}

impl RuntimeError {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            RuntimeError::UndefinedParameter { name, options } => format!(
                "Parameter '{name}' is not defined ({})",
                crate::diagnostic::join_options(options)
            ),
            RuntimeError::UndefinedMember { name, options } => format!(
                "No property '{name}' ({})",
                crate::diagnostic::join_options(options)
            ),
        }
    }
}

/// Top-level domain error, as raised from [`crate::script::Script::eval_next`].
///
/// Combines the headline message from a [`SyntaxError`] or [`RuntimeError`]
/// with the `  in command: <line>` / caret footer described in §4.6 of the
/// specification.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct GCodeError {
    pub message: String,
}

impl GCodeError {
    #[must_use]
    pub fn new(message: String) -> Self {
        GCodeError { message }
    }
}

/// A defect in the AST builder or entry compiler — never raised by user
/// input. Kept distinct from [`GCodeError`] per §7: an internal error
/// indicates a bug in this crate, not a malformed script.
#[derive(Clone, Debug, thiserror::Error)]
#[error("internal error: {description}")]
pub struct InternalError {
    pub description: String,
}

