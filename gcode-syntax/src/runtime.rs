// This file is part of gcode-syntax, a G-Code expression parser and evaluator.
// Copyright (c) the gcode-syntax contributors.

//! Runtime values, the name environment, and the tree-walking evaluator.
//!
//! Grounded on `yash_arith::env::Env` (a trait for variable lookup, blanket-
//! implemented for `HashMap`/`BTreeMap`) and `yash_arith::eval` (a
//! recursive evaluator over the AST). Two differences from that teacher:
//!
//! - `yash_arith::eval` raises `DivisionByZero`; here division by zero never
//!   raises (§4.2, §8 invariant 4) because `Expr::divide` already lowers the
//!   check into the AST as an `IfExp` before evaluation ever sees a `BinOp`
//!   divide with a zero divisor from that call site. A bare `{1/0}` written
//!   directly as `BinOp(Div, ...)` (rather than through the `divide` helper)
//!   would be a builder bug, not user input, so `eval_expr` still guards it
//!   defensively and returns NaN rather than panicking.
//! - Variables here map to a tagged [`Value`], not a bare `String`, since
//!   G-Code parameters are duck-typed scalars (§9 Design Notes).
//!
//! `BTreeMap` (rather than `HashMap`) backs both scopes and `Value::Dict`,
//! the same two container choices `yash_arith::env` blanket-implements
//! `Env` for; the ordering is what makes the enumerated option lists in
//! `_runtime_get_parameter`/`_runtime_get_member` error messages
//! deterministic and testable.

use crate::ast::{BinaryOperator, BoolOperator, CompareOperator, Expr, Function, UnaryOperator};
use crate::error::RuntimeError;
use std::collections::BTreeMap;
use std::fmt;

/// A duck-typed runtime value (§9 Design Notes).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
    /// The pseudo-root objects exposed to G-Code (`config`, `status`); see
    /// SPEC_FULL.md §3. Out of scope: the real printer-object/config
    /// registries this stands in for.
    Dict(BTreeMap<String, Value>),
}

impl Value {
    /// Renders a value the way a compiled parameter is stringified for the
    /// `(command, parameters)` output pair (§3, §8 end-to-end scenarios).
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Num(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Dict(_) => "{...}".to_string(),
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Dict(d) => !d.is_empty(),
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            Value::Num(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Str(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            Value::Dict(_) => f64::NAN,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// Formats a float the way G-Code parameter values are rendered: integral
/// values print without a trailing `.0` (`7`, not `7.0`), matching the
/// end-to-end scenarios in SPEC_FULL.md §8 (`G1 X{1+2*3}` → `"7"`).
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// The two-level name scope used at evaluation time (§3 Environments, §9
/// Design Notes: "explicit `Environment` struct carrying `globals`
/// (shared, read-only during eval) and `locals` (per-call, owned)").
#[derive(Clone, Debug, Default)]
pub struct Environment {
    pub globals: BTreeMap<String, Value>,
    pub locals: BTreeMap<String, Value>,
}

impl Environment {
    #[must_use]
    pub fn new(globals: BTreeMap<String, Value>, locals: BTreeMap<String, Value>) -> Self {
        Environment { globals, locals }
    }

    /// `_runtime_get_parameter(name)` (§4.5): local scope first, then
    /// global; raises with the enumerated available names on failure.
    pub fn get_parameter(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(v) = self.locals.get(name) {
            return Ok(v.clone());
        }
        if let Some(v) = self.globals.get(name) {
            return Ok(v.clone());
        }
        let mut options: Vec<String> = self
            .locals
            .keys()
            .chain(self.globals.keys())
            .cloned()
            .collect();
        options.sort();
        options.dedup();
        Err(RuntimeError::UndefinedParameter {
            name: name.to_string(),
            options,
        })
    }
}

/// `_runtime_get_member(obj, name)` (§4.5): indexes a dict-like value;
/// raises with the enumerated available keys on failure.
pub fn runtime_get_member(obj: &Value, name: &str) -> Result<Value, RuntimeError> {
    match obj {
        Value::Dict(map) => match map.get(name) {
            Some(v) => Ok(v.clone()),
            None => Err(RuntimeError::UndefinedMember {
                name: name.to_string(),
                options: map.keys().cloned().collect(),
            }),
        },
        _ => Err(RuntimeError::UndefinedMember {
            name: name.to_string(),
            options: Vec::new(),
        }),
    }
}

/// `_runtime_num_cast(v)` (§4.5): total, never raises. Numbers pass
/// through unchanged; everything else attempts a float parse and falls
/// back to NaN (§8 invariant 5).
#[must_use]
pub fn runtime_num_cast(v: &Value) -> Value {
    match v {
        Value::Num(_) => v.clone(),
        other => Value::Num(other.as_f64()),
    }
}

/// Evaluates an [`Expr`] tree against an [`Environment`].
pub fn eval_expr(expr: &Expr, env: &Environment) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Num(n) => Ok(Value::Num(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::GetParameter(name) => env.get_parameter(name),
        Expr::GetMember(base, key) => {
            let base = eval_expr(base, env)?;
            runtime_get_member(&base, key)
        }
        Expr::Call(func, args) => eval_call(*func, args, env),
        Expr::UnaryOp(op, operand) => {
            let v = eval_expr(operand, env)?;
            Ok(eval_unary(*op, v))
        }
        Expr::BinOp(op, l, r) => {
            let l = eval_expr(l, env)?;
            let r = eval_expr(r, env)?;
            Ok(eval_binary(*op, l, r))
        }
        Expr::Compare(op, l, r) => {
            let l = eval_expr(l, env)?;
            let r = eval_expr(r, env)?;
            Ok(Value::Bool(eval_compare(*op, &l, &r)))
        }
        Expr::BoolOp(op, l, r) => eval_bool_op(*op, l, r, env),
        Expr::IfExp(test, yes, no) => {
            let test = eval_expr(test, env)?;
            if test.truthy() {
                eval_expr(yes, env)
            } else {
                eval_expr(no, env)
            }
        }
        Expr::NumCast(inner) => {
            let v = eval_expr(inner, env)?;
            Ok(runtime_num_cast(&v))
        }
    }
}

fn eval_call(func: Function, args: &[Expr], env: &Environment) -> Result<Value, RuntimeError> {
    let values = args
        .iter()
        .map(|a| eval_expr(a, env))
        .collect::<Result<Vec<_>, _>>()?;
    let v = values.into_iter().next().unwrap_or(Value::Str(String::new()));
    Ok(match func {
        Function::Bool => Value::Bool(v.truthy()),
        Function::Str => Value::Str(v.to_display_string()),
        Function::Int => Value::Num(v.as_f64().trunc()),
        Function::Float => Value::Num(v.as_f64()),
    })
}

fn eval_unary(op: UnaryOperator, v: Value) -> Value {
    match op {
        UnaryOperator::Plus => Value::Num(v.as_f64()),
        UnaryOperator::Minus => Value::Num(-v.as_f64()),
        UnaryOperator::Not => Value::Bool(!v.truthy()),
    }
}

fn eval_binary(op: BinaryOperator, l: Value, r: Value) -> Value {
    if op == BinaryOperator::Concat {
        return Value::Str(format!("{}{}", l.to_display_string(), r.to_display_string()));
    }
    let (l, r) = (l.as_f64(), r.as_f64());
    let n = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Sub => l - r,
        BinaryOperator::Mul => l * r,
        BinaryOperator::Div => {
            if r == 0.0 {
                f64::NAN
            } else {
                l / r
            }
        }
        BinaryOperator::Mod => l % r,
        BinaryOperator::Pow => l.powf(r),
        BinaryOperator::Concat => unreachable!(),
    };
    Value::Num(n)
}

fn eval_compare(op: CompareOperator, l: &Value, r: &Value) -> bool {
    if let (Value::Str(l), Value::Str(r)) = (l, r) {
        return match op {
            CompareOperator::Lt => l < r,
            CompareOperator::Gt => l > r,
            CompareOperator::Le => l <= r,
            CompareOperator::Ge => l >= r,
            CompareOperator::Eq => l == r,
            CompareOperator::Ne => l != r,
        };
    }
    let (l, r) = (l.as_f64(), r.as_f64());
    match op {
        CompareOperator::Lt => l < r,
        CompareOperator::Gt => l > r,
        CompareOperator::Le => l <= r,
        CompareOperator::Ge => l >= r,
        CompareOperator::Eq => l == r,
        CompareOperator::Ne => l != r,
    }
}

fn eval_bool_op(
    op: BoolOperator,
    l: &Expr,
    r: &Expr,
    env: &Environment,
) -> Result<Value, RuntimeError> {
    let l = eval_expr(l, env)?;
    match op {
        BoolOperator::And => {
            if l.truthy() {
                eval_expr(r, env)
            } else {
                Ok(l)
            }
        }
        BoolOperator::Or => {
            if l.truthy() {
                Ok(l)
            } else {
                eval_expr(r, env)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn env_with(locals: &[(&str, Value)], globals: &[(&str, Value)]) -> Environment {
        Environment::new(
            globals.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            locals.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        )
    }

    #[test]
    fn division_by_zero_never_raises() {
        let env = env_with(&[], &[]);
        let expr = Expr::divide(Expr::Num(1.0), Expr::Num(0.0));
        let v = eval_expr(&expr, &env).unwrap();
        assert_matches!(v, Value::Num(n) if n.is_nan());
    }

    #[test]
    fn num_cast_is_total_on_strings() {
        assert_eq!(runtime_num_cast(&Value::Str("abc".into())), Value::Num(f64::NAN));
        assert_eq!(runtime_num_cast(&Value::Str("3.5".into())), Value::Num(3.5));
    }

    #[test]
    fn num_cast_is_idempotent_on_numbers() {
        let v = Value::Num(4.0);
        assert_eq!(runtime_num_cast(&v), v);
    }

    #[test]
    fn get_parameter_prefers_locals_then_globals() {
        let env = env_with(&[("x", Value::Num(1.0))], &[("x", Value::Num(2.0))]);
        assert_eq!(env.get_parameter("x").unwrap(), Value::Num(1.0));
    }

    #[test]
    fn get_parameter_reports_options_on_miss() {
        let env = env_with(&[], &[("foo", Value::Str("bar".into()))]);
        let err = env.get_parameter("missing").unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UndefinedParameter {
                name: "missing".into(),
                options: vec!["foo".into()],
            }
        );
    }

    #[test]
    fn get_member_reports_empty_object() {
        let err = runtime_get_member(&Value::Dict(BTreeMap::new()), "x").unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UndefinedMember {
                name: "x".into(),
                options: Vec::new(),
            }
        );
    }

    #[test]
    fn if_exp_short_circuits_the_untaken_branch() {
        let env = env_with(&[], &[]);
        let expr = Expr::IfExp(
            Box::new(Expr::Bool(true)),
            Box::new(Expr::Num(10.0)),
            Box::new(Expr::GetParameter("undefined".into())),
        );
        assert_eq!(eval_expr(&expr, &env).unwrap(), Value::Num(10.0));
    }

    #[test]
    fn format_number_drops_trailing_zero() {
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "nan");
    }
}
