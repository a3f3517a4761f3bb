// This file is part of gcode-syntax, a G-Code expression parser and evaluator.
// Copyright (c) the gcode-syntax contributors.

//! G-Code script frontend: lexer, parser, expression AST and evaluator for
//! the extended G-Code dialect used by a 3D-printer control host.
//!
//! A line of input is one of three command shapes — raw (`M112`, `ECHO`),
//! traditional (`G1 X10 Y20`), or extended (`SET_FAN SPEED=0.5`) — each of
//! which may interleave `{ … }` embedded expressions with literal text. The
//! [`script`] module is the entry point: push raw bytes into a
//! [`script::Script`] via [`script::Script::parse_segment`], then drain
//! compiled entries one at a time with [`script::Script::eval_next`].
//!
//! See the [`ast`] module for the expression tree, [`runtime`] for the
//! tree-walking evaluator and two-level name environment, and
//! [`diagnostic`] for how parse/eval failures become the caret-annotated
//! messages a user sees.
//!
//! The [`bridge`] module defines the Rust-side value and result types a C
//! or Python embedder would bind against; it does not implement the FFI
//! boundary itself (out of scope, see SPEC_FULL.md §6).

pub mod ast;
pub mod bridge;
pub mod compiler;
pub mod diagnostic;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod script;
pub mod source;
