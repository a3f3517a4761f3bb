// This file is part of gcode-syntax, a G-Code expression parser and evaluator.
// Copyright (c) the gcode-syntax contributors.

//! The recursive-descent/precedence-climbing parser.
//!
//! Drives the grammar described in SPEC_FULL.md §4.2 over the character
//! cursor from [`crate::lexer`]. The precedence-climbing technique for
//! embedded expressions is grounded on `yash_arith::ast::parse_tree`
//! (minimum-precedence threshold, recursive `parse_leaf`); unlike that
//! teacher, which builds a flat reverse-Polish `Vec<Ast>`, each level here
//! directly returns a boxed [`Expr`] node, because SPEC_FULL.md prescribes a
//! tagged tree rather than a flattened instruction vector (see
//! `crate::ast`'s module doc).

use crate::ast::{BinaryOperator, BoolOperator, CompareOperator, Expr, Function, UnaryOperator};
use crate::error::{ParseError, SyntaxError};
use crate::lexer::{is_blank, is_ident_continue, is_ident_start, Cursor};
use crate::source::Line;
use std::rc::Rc;

/// One successfully parsed, non-empty line, before it is bound into a
/// [`crate::compiler::CommandEntry`] (§4.3).
#[derive(Debug)]
pub struct ParsedCommand {
    pub name: String,
    /// Ordered `(key, value)` expression pairs (§3 CommandEntry).
    pub params: Vec<(Expr, Expr)>,
}

/// Parses one already-trimmed-of-newline line.
///
/// Returns `Ok(None)` for an empty line, a line with only a line number
/// and/or comment (§8 boundary cases), and `Err` for a syntax error.
pub fn parse_line(line: &Rc<Line>) -> Result<Option<ParsedCommand>, ParseError> {
    let mut cursor = Cursor::new(line);
    skip_line_number(&mut cursor);
    cursor.skip_required_blanks();

    if cursor.at_end() {
        return Ok(None);
    }
    if cursor.peek() == Some(';') {
        cursor.rest();
        return Ok(None);
    }

    let name = scan_name(&mut cursor)?;
    let command = dispatch_command(&mut cursor, name)?;
    Ok(Some(command))
}

/// `_LINE_NUMBER: /N[0-9]+/i`, suppressed by the lexer (§4.1).
fn skip_line_number(cursor: &mut Cursor<'_>) {
    let Some(c) = cursor.peek() else { return };
    if c != 'n' && c != 'N' {
        return;
    }
    if !cursor.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
        return;
    }
    cursor.advance();
    while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
        cursor.advance();
    }
}

/// Scans the maximal run of command-name characters (letters, digits, `$`,
/// `_`) from the current position, without yet classifying it.
fn scan_name(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let start = cursor.location();
    let mut name = String::new();
    while let Some(c) = cursor.peek() {
        if c.is_ascii_alphanumeric() || c == '$' || c == '_' {
            name.push(c);
            cursor.advance();
        } else {
            break;
        }
    }
    if name.is_empty() {
        let found = cursor.peek().unwrap_or('\n');
        return Err(ParseError {
            cause: SyntaxError::UnexpectedCharacter {
                found,
                expected: vec!["a command name".to_string()],
            },
            location: Some(start),
        });
    }
    Ok(name)
}

/// Classifies `name` per the terminal priority in §3/§4.2 (raw beats
/// traditional beats extended) and parses the rest of the line
/// accordingly.
fn dispatch_command(cursor: &mut Cursor<'_>, name: String) -> Result<ParsedCommand, ParseError> {
    let upper = name.to_ascii_uppercase();
    if upper == "M112" || upper == "ECHO" {
        return parse_raw_command(cursor, upper);
    }
    if is_traditional_name(&name) {
        return parse_traditional_command(cursor, upper);
    }
    if is_extended_name(&name) {
        return parse_extended_command(cursor, upper);
    }
    Err(ParseError {
        cause: SyntaxError::UnexpectedToken {
            found: format!("command name '{name}'"),
            expected: vec!["a valid command name".to_string()],
        },
        location: Some(cursor.location()),
    })
}

/// `TRAD_COMMAND_NAME: /[A-Z][0-9]+/i` — one letter then one or more
/// digits, the *whole* scanned name (no trailing non-digit characters).
fn is_traditional_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic() && chars.clone().next().is_some() && chars.all(|c| c.is_ascii_digit())
}

/// `EXT_COMMAND_NAME: /[A-Z$_][A-Z0-9$_]*/i`.
fn is_extended_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '$' || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '$' || c == '_')
}

/// `raw_command: RAW_COMMAND_NAME (_WS raw_arg_segment*)?` (§4.2), where
/// `raw_arg_segment` is `RAW_ARG_TEXT | expr_embed | STRING`: a raw
/// command's trailing text may interleave any number of literal-text runs
/// with `{…}` expressions and `"…"` string literals, all concatenated into
/// one expression (the same segment-concatenation shape as `param_expr`,
/// §4.2 "`param_expr` concatenates adjacent segments").
fn parse_raw_command(cursor: &mut Cursor<'_>, name: String) -> Result<ParsedCommand, ParseError> {
    let skipped = cursor.skip_required_blanks();
    if skipped == 0 || cursor.at_end() {
        return Ok(ParsedCommand {
            name,
            params: Vec::new(),
        });
    }
    let mut value: Option<Expr> = None;
    while !cursor.at_end() {
        let segment = match cursor.peek() {
            Some('{') => parse_embedded_expr(cursor)?,
            Some('"') => Expr::Str(parse_string_literal(cursor)?),
            _ => parse_segment_run(cursor, is_raw_text_char)?,
        };
        value = Some(match value {
            None => segment,
            Some(prev) => prev.concat(segment),
        });
    }
    let value = value.unwrap_or_else(|| Expr::Str(String::new()));
    Ok(ParsedCommand {
        name,
        params: vec![(Expr::Str("*".to_string()), value)],
    })
}

/// `RAW_ARG_TEXT: /[^"{]+/` — everything except a string-literal opener or
/// brace stops a bare text run; other characters (including whitespace and
/// `;`) are ordinary literal content inside a raw command's argument.
fn is_raw_text_char(c: char) -> bool {
    c != '"' && c != '{'
}

/// `trad_command: TRAD_COMMAND_NAME trad_param* _COMMENT?`.
fn parse_traditional_command(
    cursor: &mut Cursor<'_>,
    name: String,
) -> Result<ParsedCommand, ParseError> {
    let mut params = Vec::new();
    loop {
        cursor.skip_required_blanks();
        if cursor.at_end() || cursor.peek() == Some(';') {
            break;
        }
        let key = parse_trad_param_key(cursor)?;
        if cursor.peek() == Some('=') {
            cursor.advance();
        }
        let value = parse_param_expr(cursor)?;
        params.push((key, value));
    }
    finish_with_optional_comment(cursor)?;
    Ok(ParsedCommand { name, params })
}

/// `trad_param_key: TRAD_PARAM_KEY_STR -> upper | expr_embed | STRING -> escaped_str`.
fn parse_trad_param_key(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    match cursor.peek() {
        Some('{') => parse_embedded_expr(cursor),
        Some('"') => Ok(Expr::Str(parse_string_literal(cursor)?)),
        Some(c) if c.is_ascii_alphabetic() => {
            cursor.advance();
            Ok(Expr::Str(c.to_ascii_uppercase().to_string()))
        }
        other => Err(unexpected(cursor, other, &["a parameter name", "\"", "{"])),
    }
}

/// `ext_command: EXT_COMMAND_NAME ext_param* _COMMENT?`.
fn parse_extended_command(
    cursor: &mut Cursor<'_>,
    name: String,
) -> Result<ParsedCommand, ParseError> {
    let mut params = Vec::new();
    loop {
        cursor.skip_required_blanks();
        if cursor.at_end() || cursor.peek() == Some(';') {
            break;
        }
        let key = parse_param_expr(cursor)?;
        cursor.skip_required_blanks();
        if cursor.peek() != Some('=') {
            return Err(unexpected(cursor, cursor.peek(), &["="]));
        }
        cursor.advance();
        cursor.skip_required_blanks();
        let value = parse_param_expr(cursor)?;
        params.push((key, value));
    }
    finish_with_optional_comment(cursor)?;
    Ok(ParsedCommand { name, params })
}

fn finish_with_optional_comment(cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
    cursor.skip_required_blanks();
    if cursor.peek() == Some(';') {
        cursor.rest();
        return Ok(());
    }
    if !cursor.at_end() {
        return Err(unexpected(cursor, cursor.peek(), &["end of line", ";"]));
    }
    Ok(())
}

/// `?param_expr: param_expr_segment+` — one or more text/embed/string
/// segments concatenated with `+` (§4.2).
fn parse_param_expr(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut expr: Option<Expr> = None;
    loop {
        let segment = match cursor.peek() {
            Some('{') => parse_embedded_expr(cursor)?,
            Some('"') => Expr::Str(parse_string_literal(cursor)?),
            Some(c) if is_param_expr_text_char(c) => parse_segment_run(cursor, is_param_expr_text_char)?,
            _ => break,
        };
        expr = Some(match expr {
            None => segment,
            Some(prev) => prev.concat(segment),
        });
    }
    expr.ok_or_else(|| unexpected(cursor, cursor.peek(), &["a value", "\"", "{"]))
}

/// Unquoted `param_expr` segment text, uppercased at build time (`->
/// upper`). Narrower than `original_source/klippy/gcode_script.py`'s
/// `EXPR_SEGMENT_TEXT: /[^{"\s=;]+/`, which (read literally) would also
/// accept a bare `@` as ordinary value text — contradicted by §8's own
/// worked example (`G1 X@` must raise `Unexpected "@"`). Restricted here to
/// the character set every other worked example actually uses for
/// unquoted values (digits, letters, and the handful of punctuation marks
/// a bare numeric/word token needs), so anything else falls through to the
/// unexpected-character diagnostic instead of being accepted as literal
/// text (see DESIGN.md Open Question decisions).
fn is_param_expr_text_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_' | '$' | ':' | '/')
}

/// Scans a run matching `is_char`, producing a `Str` literal. `raw` text
/// keeps its case; `param_expr` text segments are uppercased (§4.2).
fn parse_segment_run(cursor: &mut Cursor<'_>, is_char: fn(char) -> bool) -> Result<Expr, ParseError> {
    let mut text = String::new();
    while let Some(c) = cursor.peek() {
        if is_char(c) {
            text.push(c);
            cursor.advance();
        } else {
            break;
        }
    }
    let uppercase = is_char as usize == is_param_expr_text_char as usize;
    Ok(Expr::Str(if uppercase {
        text.to_ascii_uppercase()
    } else {
        text
    }))
}

/// `"…"` string literals, unescaped via C-style escape sequences (§4.2,
/// §8 round-trips).
fn parse_string_literal(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let start = cursor.location();
    cursor.advance(); // opening quote
    let mut value = String::new();
    loop {
        match cursor.advance() {
            None => {
                return Err(ParseError {
                    cause: SyntaxError::UnclosedString,
                    location: Some(start),
                })
            }
            Some('"') => return Ok(value),
            Some('\\') => match cursor.advance() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some('0') => value.push('\0'),
                Some('\\') => value.push('\\'),
                Some('"') => value.push('"'),
                Some('\'') => value.push('\''),
                Some(other) => value.push(other),
                None => {
                    return Err(ParseError {
                        cause: SyntaxError::UnclosedString,
                        location: Some(start),
                    })
                }
            },
            Some(c) => value.push(c),
        }
    }
}

/// `?expr_embed: "{" expr "}"`, with the PostLex whitespace rule active for
/// the whole span (§4.1).
fn parse_embedded_expr(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let open = cursor.location();
    cursor.advance(); // '{'
    cursor.enter_braces();
    cursor.skip_blanks_in_braces();
    let expr = parse_expr(cursor)?;
    cursor.skip_blanks_in_braces();
    if cursor.peek() != Some('}') {
        cursor.exit_braces();
        return Err(ParseError {
            cause: SyntaxError::UnclosedBrace,
            location: Some(open),
        });
    }
    cursor.advance();
    cursor.exit_braces();
    Ok(expr)
}

fn unexpected(cursor: &Cursor<'_>, found: Option<char>, expected: &[&str]) -> ParseError {
    let expected = expected.iter().map(|s| (*s).to_string()).collect();
    match found {
        Some(found) => ParseError {
            cause: SyntaxError::UnexpectedCharacter { found, expected },
            location: Some(cursor.location()),
        },
        None => ParseError {
            cause: SyntaxError::UnexpectedToken {
                found: "end of line".to_string(),
                expected,
            },
            location: None,
        },
    }
}

// --- Expression grammar (precedence climbing) -----------------------------
//
// Lowest to highest, per SPEC_FULL.md §4.2: ternary if/else; or; and; not;
// comparisons; additive; multiplicative; unary +/-; `**` (right-assoc);
// postfix access; call; atom.

fn parse_expr(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let yes = parse_or(cursor)?;
    cursor.skip_blanks_in_braces();
    if peek_keyword(cursor, "if") {
        consume_keyword(cursor, "if");
        cursor.skip_blanks_in_braces();
        let test = parse_or(cursor)?;
        cursor.skip_blanks_in_braces();
        if !peek_keyword(cursor, "else") {
            return Err(unexpected(cursor, cursor.peek(), &["'else'"]));
        }
        consume_keyword(cursor, "else");
        cursor.skip_blanks_in_braces();
        let no = parse_expr(cursor)?;
        return Ok(Expr::IfExp(Box::new(test), Box::new(yes), Box::new(no)));
    }
    Ok(yes)
}

fn parse_or(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut left = parse_and(cursor)?;
    loop {
        cursor.skip_blanks_in_braces();
        if !peek_keyword(cursor, "or") {
            break;
        }
        consume_keyword(cursor, "or");
        cursor.skip_blanks_in_braces();
        let right = parse_and(cursor)?;
        left = Expr::BoolOp(BoolOperator::Or, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_and(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut left = parse_not(cursor)?;
    loop {
        cursor.skip_blanks_in_braces();
        if !peek_keyword(cursor, "and") {
            break;
        }
        consume_keyword(cursor, "and");
        cursor.skip_blanks_in_braces();
        let right = parse_not(cursor)?;
        left = Expr::BoolOp(BoolOperator::And, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_not(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    cursor.skip_blanks_in_braces();
    if peek_keyword(cursor, "not") {
        consume_keyword(cursor, "not");
        cursor.skip_blanks_in_braces();
        let operand = parse_not(cursor)?;
        return Ok(Expr::UnaryOp(UnaryOperator::Not, Box::new(operand)));
    }
    parse_comparison(cursor)
}

fn parse_comparison(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut left = parse_additive(cursor)?;
    loop {
        cursor.skip_blanks_in_braces();
        let op = match (cursor.peek(), cursor.peek_at(1)) {
            (Some('<'), Some('=')) => Some((CompareOperator::Le, 2)),
            (Some('>'), Some('=')) => Some((CompareOperator::Ge, 2)),
            (Some('='), Some('=')) => Some((CompareOperator::Eq, 2)),
            (Some('!'), Some('=')) => Some((CompareOperator::Ne, 2)),
            (Some('<'), _) => Some((CompareOperator::Lt, 1)),
            (Some('>'), _) => Some((CompareOperator::Gt, 1)),
            _ => None,
        };
        let Some((op, width)) = op else { break };
        for _ in 0..width {
            cursor.advance();
        }
        cursor.skip_blanks_in_braces();
        let right = parse_additive(cursor)?;
        left = Expr::Compare(op, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_additive(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut left = parse_multiplicative(cursor)?;
    loop {
        cursor.skip_blanks_in_braces();
        let op = match cursor.peek() {
            Some('+') => Some('+'),
            Some('-') => Some('-'),
            Some('~') => Some('~'),
            _ => None,
        };
        let Some(op) = op else { break };
        cursor.advance();
        cursor.skip_blanks_in_braces();
        let right = parse_multiplicative(cursor)?;
        left = match op {
            '~' => left.concat(right),
            '+' => Expr::BinOp(BinaryOperator::Add, Box::new(left.num_cast()), Box::new(right.num_cast())),
            '-' => Expr::BinOp(BinaryOperator::Sub, Box::new(left.num_cast()), Box::new(right.num_cast())),
            _ => unreachable!(),
        };
    }
    Ok(left)
}

fn parse_multiplicative(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut left = parse_unary(cursor)?;
    loop {
        cursor.skip_blanks_in_braces();
        let op = match cursor.peek() {
            Some('*') if cursor.peek_at(1) != Some('*') => Some('*'),
            Some('/') => Some('/'),
            Some('%') => Some('%'),
            _ => None,
        };
        let Some(op) = op else { break };
        cursor.advance();
        cursor.skip_blanks_in_braces();
        let right = parse_unary(cursor)?;
        left = match op {
            '/' => Expr::divide(left.num_cast(), right.num_cast()),
            '*' => Expr::BinOp(BinaryOperator::Mul, Box::new(left.num_cast()), Box::new(right.num_cast())),
            '%' => Expr::BinOp(BinaryOperator::Mod, Box::new(left.num_cast()), Box::new(right.num_cast())),
            _ => unreachable!(),
        };
    }
    Ok(left)
}

fn parse_unary(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    cursor.skip_blanks_in_braces();
    match cursor.peek() {
        Some('+') => {
            cursor.advance();
            cursor.skip_blanks_in_braces();
            let operand = parse_unary(cursor)?;
            Ok(Expr::UnaryOp(UnaryOperator::Plus, Box::new(operand.num_cast())))
        }
        Some('-') => {
            cursor.advance();
            cursor.skip_blanks_in_braces();
            let operand = parse_unary(cursor)?;
            Ok(Expr::UnaryOp(UnaryOperator::Minus, Box::new(operand.num_cast())))
        }
        _ => parse_power(cursor),
    }
}

fn parse_power(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let left = parse_postfix(cursor)?;
    cursor.skip_blanks_in_braces();
    if cursor.peek() == Some('*') && cursor.peek_at(1) == Some('*') {
        cursor.advance();
        cursor.advance();
        cursor.skip_blanks_in_braces();
        let right = parse_unary(cursor)?; // right-associative
        return Ok(Expr::BinOp(BinaryOperator::Pow, Box::new(left.num_cast()), Box::new(right.num_cast())));
    }
    Ok(left)
}

fn parse_postfix(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut expr = parse_atom(cursor)?;
    loop {
        cursor.skip_blanks_in_braces();
        match cursor.peek() {
            Some('.') => {
                cursor.advance();
                cursor.skip_blanks_in_braces();
                let name = parse_identifier(cursor)?;
                expr = Expr::GetMember(Box::new(expr), name);
            }
            Some('[') => {
                cursor.advance();
                cursor.skip_blanks_in_braces();
                let name = match cursor.peek() {
                    Some('"') => parse_string_literal(cursor)?,
                    _ => parse_identifier(cursor)?,
                };
                cursor.skip_blanks_in_braces();
                if cursor.peek() != Some(']') {
                    return Err(unexpected(cursor, cursor.peek(), &["]"]));
                }
                cursor.advance();
                expr = Expr::GetMember(Box::new(expr), name);
            }
            _ => break,
        }
    }
    Ok(expr)
}

fn parse_identifier(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let start = cursor.location();
    if !cursor.peek().is_some_and(is_ident_start) {
        return Err(unexpected(cursor, cursor.peek(), &["IDENTIFIER"]));
    }
    let mut name = String::new();
    while let Some(c) = cursor.peek() {
        if is_ident_continue(c) {
            name.push(c);
            cursor.advance();
        } else {
            break;
        }
    }
    let _ = start;
    Ok(name)
}

fn parse_atom(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    cursor.skip_blanks_in_braces();
    match cursor.peek() {
        Some('(') => {
            cursor.advance();
            cursor.skip_blanks_in_braces();
            let expr = parse_expr(cursor)?;
            cursor.skip_blanks_in_braces();
            if cursor.peek() != Some(')') {
                return Err(unexpected(cursor, cursor.peek(), &[")"]));
            }
            cursor.advance();
            Ok(expr)
        }
        Some('"') => Ok(Expr::Str(parse_string_literal(cursor)?)),
        Some(c) if c.is_ascii_digit() => parse_number(cursor),
        Some(c) if is_ident_start(c) => parse_identifier_atom(cursor),
        other => Err(unexpected(cursor, other, &["an expression"])),
    }
}

fn parse_number(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut text = String::new();
    while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
        text.push(cursor.advance().unwrap());
    }
    if cursor.peek() == Some('.') && cursor.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
        text.push(cursor.advance().unwrap());
        while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
            text.push(cursor.advance().unwrap());
        }
    }
    if matches!(cursor.peek(), Some('e') | Some('E')) {
        let mut lookahead = 1;
        if matches!(cursor.peek_at(1), Some('+') | Some('-')) {
            lookahead += 1;
        }
        if cursor.peek_at(lookahead).is_some_and(|c| c.is_ascii_digit()) {
            text.push(cursor.advance().unwrap());
            if matches!(cursor.peek(), Some('+') | Some('-')) {
                text.push(cursor.advance().unwrap());
            }
            while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                text.push(cursor.advance().unwrap());
            }
        }
    }
    text.parse::<f64>().map(Expr::Num).map_err(|_| ParseError {
        cause: SyntaxError::InvalidNumber { text },
        location: Some(cursor.location()),
    })
}

/// `IDENTIFIER` atoms: lower-cased, then routed per §4.2 — `inf`/`nan` →
/// `Call(float, Str(name))`; `true`/`false` → `Bool`; a name directly
/// followed by `(` → a restricted function call; anything else →
/// `GetParameter(name)`.
fn parse_identifier_atom(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let name = parse_identifier(cursor)?;
    let lower = name.to_ascii_lowercase();
    cursor.skip_blanks_in_braces();
    if cursor.peek() == Some('(') {
        return parse_call(cursor, &lower);
    }
    Ok(match lower.as_str() {
        "true" => Expr::Bool(true),
        "false" => Expr::Bool(false),
        "inf" | "nan" => Expr::Call(Function::Float, vec![Expr::Str(lower)]),
        _ => Expr::GetParameter(lower),
    })
}

fn parse_call(cursor: &mut Cursor<'_>, lower_name: &str) -> Result<Expr, ParseError> {
    let Some(func) = Function::from_name(lower_name) else {
        return Err(ParseError {
            cause: SyntaxError::UndefinedFunction {
                name: lower_name.to_string(),
            },
            location: Some(cursor.location()),
        });
    };
    cursor.advance(); // '('
    cursor.skip_blanks_in_braces();
    let mut args = Vec::new();
    if cursor.peek() != Some(')') {
        loop {
            args.push(parse_expr(cursor)?);
            cursor.skip_blanks_in_braces();
            if cursor.peek() == Some(',') {
                cursor.advance();
                cursor.skip_blanks_in_braces();
                continue;
            }
            break;
        }
    }
    if cursor.peek() != Some(')') {
        return Err(unexpected(cursor, cursor.peek(), &[")"]));
    }
    cursor.advance();
    Ok(Expr::Call(func, args))
}

fn peek_keyword(cursor: &Cursor<'_>, keyword: &str) -> bool {
    let mut offset = 0;
    for expected in keyword.chars() {
        match cursor.peek_at(offset) {
            Some(c) if c.to_ascii_lowercase() == expected => offset += 1,
            _ => return false,
        }
    }
    !cursor
        .peek_at(offset)
        .is_some_and(is_ident_continue)
}

fn consume_keyword(cursor: &mut Cursor<'_>, keyword: &str) {
    for _ in keyword.chars() {
        cursor.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, CompareOperator};

    fn parse(line: &str) -> ParsedCommand {
        parse_line(&Line::dummy(line))
            .expect("should parse")
            .expect("should not be empty")
    }

    #[test]
    fn empty_and_comment_only_lines_parse_to_none() {
        assert!(parse_line(&Line::dummy("")).unwrap().is_none());
        assert!(parse_line(&Line::dummy("N42 ; comment")).unwrap().is_none());
        assert!(parse_line(&Line::dummy("   ")).unwrap().is_none());
    }

    #[test]
    fn traditional_command_parses_letter_keys() {
        let cmd = parse("G1 X10 Y20");
        assert_eq!(cmd.name, "G1");
        assert_eq!(cmd.params.len(), 2);
        assert_eq!(cmd.params[0].0, Expr::Str("X".into()));
        assert_eq!(cmd.params[0].1, Expr::Str("10".into()));
        assert_eq!(cmd.params[1].0, Expr::Str("Y".into()));
    }

    #[test]
    fn extended_command_parses_key_value_pairs() {
        let cmd = parse("SET_FAN SPEED=0.5");
        assert_eq!(cmd.name, "SET_FAN");
        assert_eq!(cmd.params[0].0, Expr::Str("SPEED".into()));
        assert_eq!(cmd.params[0].1, Expr::Str("0.5".into()));
    }

    #[test]
    fn raw_command_collects_interleaved_text_and_expr() {
        let cmd = parse("ECHO hello {foo}");
        assert_eq!(cmd.name, "ECHO");
        assert_eq!(cmd.params.len(), 1);
        assert_eq!(cmd.params[0].0, Expr::Str("*".into()));
        assert_eq!(
            cmd.params[0].1,
            Expr::Str("hello ".into()).concat(Expr::GetParameter("foo".into()))
        );
    }

    #[test]
    fn m112_with_no_trailing_text_has_no_params() {
        let cmd = parse("M112");
        assert_eq!(cmd.name, "M112");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn line_number_and_comment_are_stripped() {
        let cmd = parse("N5 G1 X1 ; go");
        assert_eq!(cmd.name, "G1");
        assert_eq!(cmd.params[0].1, Expr::Str("1".into()));
    }

    #[test]
    fn brace_whitespace_is_insignificant() {
        let a = parse("G1 X{1+2}");
        let b = parse("G1 X{   1   +   2   }");
        assert_eq!(a.params[0].1, b.params[0].1);
    }

    #[test]
    fn division_lowers_through_embedded_expr() {
        let cmd = parse("G1 X{1/0}");
        match &cmd.params[0].1 {
            Expr::IfExp(_, _, _) => {}
            other => panic!("expected IfExp lowering, got {other:?}"),
        }
    }

    #[test]
    fn ternary_reorders_to_canonical_shape() {
        let cmd = parse("G1 Z{10 if foo==\"bar\" else 0}");
        match &cmd.params[0].1 {
            Expr::IfExp(test, yes, no) => {
                assert_eq!(**yes, Expr::Num(10.0));
                assert_eq!(**no, Expr::Num(0.0));
                assert_eq!(
                    **test,
                    Expr::Compare(
                        CompareOperator::Eq,
                        Box::new(Expr::GetParameter("foo".into())),
                        Box::new(Expr::Str("bar".into()))
                    )
                );
            }
            other => panic!("expected IfExp, got {other:?}"),
        }
    }

    #[test]
    fn power_is_right_associative() {
        let cmd = parse("G1 X{2**3**2}");
        match &cmd.params[0].1 {
            Expr::BinOp(BinaryOperator::Pow, left, right) => {
                assert_eq!(**left, Expr::Num(2.0));
                assert!(matches!(**right, Expr::BinOp(BinaryOperator::Pow, _, _)));
            }
            other => panic!("expected right-associative Pow, got {other:?}"),
        }
    }

    #[test]
    fn unknown_function_is_a_syntax_error() {
        let err = parse_line(&Line::dummy("G1 X{sqrt(2)}")).unwrap_err();
        assert_eq!(
            err.cause,
            SyntaxError::UndefinedFunction {
                name: "sqrt".to_string()
            }
        );
    }

    #[test]
    fn unexpected_character_reports_column() {
        let err = parse_line(&Line::dummy("G1 X@")).unwrap_err();
        match err.cause {
            SyntaxError::UnexpectedCharacter { found, .. } => assert_eq!(found, '@'),
            other => panic!("expected UnexpectedCharacter, got {other:?}"),
        }
        assert_eq!(err.location.unwrap().column.get(), 5);
    }

    #[test]
    fn escaped_string_literal_unescapes_c_style_sequences() {
        let cmd = parse("ECHO \"a\\nb\\tc\"");
        assert_eq!(cmd.params[0].1, Expr::Str("a\nb\tc".to_string()));
    }

    #[test]
    fn member_access_retains_base_expression() {
        let cmd = parse("G1 X{status.toolhead.position}");
        match &cmd.params[0].1 {
            Expr::GetMember(base, key) => {
                assert_eq!(key, "position");
                assert!(matches!(**base, Expr::GetMember(_, _)));
            }
            other => panic!("expected nested GetMember, got {other:?}"),
        }
    }
}
