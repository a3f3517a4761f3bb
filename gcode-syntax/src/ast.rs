// This file is part of gcode-syntax, a G-Code expression parser and evaluator.
// Copyright (c) the gcode-syntax contributors.

//! The expression abstract syntax tree.
//!
//! Unlike the teacher's [`yash_arith::ast::Ast`](../../examples/magicant-yash-rs/yash-arith/src/ast.rs),
//! which is a flat reverse-Polish `Vec<Ast>` (each non-leaf node storing the
//! length of its right-hand subtree so the whole expression can live in one
//! vector), this is a direct tree: every node owns its children through
//! `Box`. The flat representation exists in `yash-arith` to let one passes
//! re-walk an already-tokenized slice without further allocation; here the
//! specification calls for a literal "tagged variant" tree that a
//! tree-walking evaluator can recurse over directly (see Design Notes in
//! SPEC_FULL.md), so the extra boxing is the right trade.

use std::fmt;

/// Unary operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

/// Binary arithmetic/concatenation operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// `~`, string concatenation. Lowers to `BinOp` with no numeric cast
    /// wrapping around its operands (§4.2).
    Concat,
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOperator {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

/// Short-circuiting boolean operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoolOperator {
    And,
    Or,
}

/// The fixed set of callable functions (§1 Non-goals: no user-defined
/// functions beyond this set).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Function {
    Bool,
    Str,
    Int,
    Float,
}

impl Function {
    /// Parses a lower-cased identifier into a `Function`, returning `None`
    /// if it does not name one of the four built-ins.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Function> {
        match name {
            "bool" => Some(Function::Bool),
            "str" => Some(Function::Str),
            "int" => Some(Function::Int),
            "float" => Some(Function::Float),
            _ => None,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Function::Bool => "bool",
            Function::Str => "str",
            Function::Int => "int",
            Function::Float => "float",
        };
        f.write_str(name)
    }
}

/// An expression node.
///
/// This is exactly the tagged variant list from §3 of the specification:
/// `Num`, `Str`, `Bool`, `GetParameter`, `GetMember`, `Call`, `UnaryOp`,
/// `BinOp`, `Compare`, `BoolOp`, `IfExp`, `NumCast`.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A numeric literal. Holds an `f64`; integer literals are folded into
    /// the same variant since every runtime numeric value is floating point
    /// once `_runtime_num_cast` has run (§9 Duck-typed values: `Value::Num(f64)`).
    Num(f64),
    /// A string literal, already unescaped at build time (§4.2).
    Str(String),
    /// A boolean literal.
    Bool(bool),
    /// `GetParameter(name)`: a bare identifier, resolved dynamically at
    /// evaluation time against the local then global scope.
    GetParameter(String),
    /// `GetMember(base, key)`: dot or bracket access. Both forms lower to
    /// this node; `base` is always retained (see SPEC_FULL.md §4.2 on the
    /// original source's dropped-base bug, which this AST does not
    /// replicate).
    GetMember(Box<Expr>, String),
    /// `Call(func_name, args)`, restricted at parse time to the four
    /// built-in coercion functions.
    Call(Function, Vec<Expr>),
    UnaryOp(UnaryOperator, Box<Expr>),
    BinOp(BinaryOperator, Box<Expr>, Box<Expr>),
    Compare(CompareOperator, Box<Expr>, Box<Expr>),
    BoolOp(BoolOperator, Box<Expr>, Box<Expr>),
    /// `IfExp(test, yes, no)`. The grammar production reads `yes if test
    /// else no`; the builder reorders the operands into this canonical
    /// `(test, yes, no)` shape (§4.2).
    IfExp(Box<Expr>, Box<Expr>, Box<Expr>),
    /// Wraps an operand that must be numeric at evaluation time; falls back
    /// to NaN rather than raising (§4.5, `_runtime_num_cast`).
    NumCast(Box<Expr>),
}

impl Expr {
    /// Builds `divide(l, r)` as `IfExp(Compare(==, r, Num(0)), Num(nan),
    /// BinOp(/, l, r))`, per §4.2: division by zero never raises.
    #[must_use]
    pub fn divide(l: Expr, r: Expr) -> Expr {
        Expr::IfExp(
            Box::new(Expr::Compare(
                CompareOperator::Eq,
                Box::new(r.clone()),
                Box::new(Expr::Num(0.0)),
            )),
            Box::new(Expr::Num(f64::NAN)),
            Box::new(Expr::BinOp(BinaryOperator::Div, Box::new(l), Box::new(r))),
        )
    }

    /// Wraps `self` in [`Expr::NumCast`] unless it is already a literal
    /// `Num`, in which case the cast is a no-op and is folded away (a small
    /// constant-folding step the AST Builder is responsible for per the
    /// component table in SPEC_FULL.md §2).
    #[must_use]
    pub fn num_cast(self) -> Expr {
        match self {
            Expr::Num(_) => self,
            other => Expr::NumCast(Box::new(other)),
        }
    }

    /// Concatenates `self` and `other` via string concatenation (`~`),
    /// folding two adjacent string literals into one at build time.
    #[must_use]
    pub fn concat(self, other: Expr) -> Expr {
        if let (Expr::Str(mut a), Expr::Str(b)) = (self.clone(), other.clone()) {
            a.push_str(&b);
            return Expr::Str(a);
        }
        Expr::BinOp(BinaryOperator::Concat, Box::new(self), Box::new(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_lowers_to_conditional_nan() {
        let e = Expr::divide(Expr::Num(1.0), Expr::Num(0.0));
        match e {
            Expr::IfExp(test, yes, no) => {
                assert_eq!(
                    *test,
                    Expr::Compare(
                        CompareOperator::Eq,
                        Box::new(Expr::Num(0.0)),
                        Box::new(Expr::Num(0.0))
                    )
                );
                assert!(matches!(*yes, Expr::Num(n) if n.is_nan()));
                assert_eq!(
                    *no,
                    Expr::BinOp(
                        BinaryOperator::Div,
                        Box::new(Expr::Num(1.0)),
                        Box::new(Expr::Num(0.0))
                    )
                );
            }
            _ => panic!("expected IfExp"),
        }
    }

    #[test]
    fn num_cast_folds_over_literal_numbers() {
        assert_eq!(Expr::Num(1.0).num_cast(), Expr::Num(1.0));
        assert_eq!(
            Expr::GetParameter("x".into()).num_cast(),
            Expr::NumCast(Box::new(Expr::GetParameter("x".into())))
        );
    }

    #[test]
    fn concat_folds_adjacent_string_literals() {
        let e = Expr::Str("hello ".into()).concat(Expr::Str("bar".into()));
        assert_eq!(e, Expr::Str("hello bar".into()));
    }

    #[test]
    fn function_from_name_rejects_unknown_names() {
        assert_eq!(Function::from_name("bool"), Some(Function::Bool));
        assert_eq!(Function::from_name("sqrt"), None);
    }
}
