// This file is part of gcode-syntax, a G-Code expression parser and evaluator.
// Copyright (c) the gcode-syntax contributors.

//! Human-facing diagnostic rendering.
//!
//! The caret-annotation format is grounded on
//! `yash_syntax::source::pretty` (an `Annotation`/`MessageBase` pair that
//! formats a headline plus a pointer into the source), generalized here to
//! operate over a single flat [`crate::source::Location`] rather than a
//! nested `Source`/alias chain, since a [`crate::script::Script`] only ever
//! reports errors against the one line currently being parsed or
//! evaluated (§4.6).

use crate::source::Location;
use itertools::Itertools as _;

/// Joins a list of expected-token descriptions into a sentence fragment,
/// e.g. `"a" or "b" or "c"` (§4.6). Used by [`crate::error::SyntaxError::message`].
#[must_use]
pub fn join_expected(expected: &[String]) -> String {
    join_with_or(expected, "nothing")
}

/// Joins a list of valid option names for an `UndefinedParameter`/
/// `UndefinedMember` error. An empty list renders as "object is empty"
/// rather than an empty disjunction, since "expected nothing" would be a
/// confusing thing to tell someone about a dictionary's keys (§4.6).
#[must_use]
pub fn join_options(options: &[String]) -> String {
    if options.is_empty() {
        return "object is empty".to_string();
    }
    join_with_or(options, "object is empty")
}

fn join_with_or(items: &[String], empty: &str) -> String {
    match items {
        [] => empty.to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {last}", init.iter().join(", ")),
    }
}

const IN_COMMAND_PREFIX: &str = "  in command: ";

/// Renders `headline` together with the `  in command: <line>` / caret
/// footer described in §4.6. `location` is `None` for diagnostics with no
/// single offending character (e.g. an end-of-line expectation), in which
/// case only the headline and the command line are shown, without a caret.
#[must_use]
pub fn render(headline: &str, line_text: &str, location: Option<&Location>) -> String {
    let mut message = format!("{headline}\n{IN_COMMAND_PREFIX}{line_text}");
    if let Some(location) = location {
        let column = IN_COMMAND_PREFIX.len() + location.column.get() as usize - 1;
        message.push('\n');
        message.push_str(&" ".repeat(column));
        message.push_str("^ here");
    }
    message
}

/// A type that can produce the two pieces [`render`] needs: a one-line
/// headline and (optionally) the source location the headline refers to.
///
/// Grounded on `yash_syntax::source::pretty::MessageBase`, simplified
/// since this crate has no multi-annotation diagnostics.
pub trait MessageBase {
    fn headline(&self) -> String;
    fn location(&self) -> Option<&Location>;
}

impl MessageBase for crate::error::ParseError {
    fn headline(&self) -> String {
        self.cause.message()
    }

    fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

#[cfg(feature = "annotate-snippets")]
pub mod pretty {
    //! An alternate renderer built on [`annotate_snippets`], grounded on the
    //! teacher's own use of that crate in `yash_syntax::source::pretty`.
    //! Produces the same information as [`super::render`] with the
    //! gutter/underline styling `annotate-snippets` is known for; intended
    //! for terminals, not for embedding in `GCodeError` messages that cross
    //! the C/Python bridge (§6), which always use the plain [`super::render`]
    //! form.
    use super::MessageBase;
    use annotate_snippets::{Level, Renderer, Snippet};

    #[must_use]
    pub fn render_pretty(message: &impl MessageBase, line_text: &str) -> String {
        let headline = message.headline();
        let mut snippet = Snippet::source(line_text).fold(true);
        if let Some(location) = message.location() {
            let column = location.column.get() as usize - 1;
            snippet = snippet.annotation(Level::Error.span(column..column + 1));
        }
        let message = Level::Error.title(&headline).snippet(snippet);
        Renderer::styled().render(message).to_string()
    }
}
