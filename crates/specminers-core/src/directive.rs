//! Generic directive-driven line parser.
//!
//! Declarations files are made of lines of the form `keyword arguments...`.
//! The same loop parses three nested grammar levels (the whole file, one
//! program point, one variable), each supplying its own:
//!
//! - **handler table** ([`DirectiveParser::lookup`]): keyword to handler;
//! - **finish predicate** ([`DirectiveParser::is_finished`]): evaluated before
//!   each line, by peeking at the buffer;
//! - **finalizer** ([`DirectiveParser::finalize`]): validates mandatory fields
//!   and builds the immutable value.
//!
//! Handlers receive the line buffer so a directive such as `ppt` can hand the
//! following lines to a nested parser.

use crate::error::CodecError;
use crate::lines::{LineBuffer, LineSource};

/// A directive handler. Receives the text after the keyword.
pub type Handler<P, I> = fn(&mut P, &str, &mut LineBuffer<I>) -> Result<(), CodecError>;

/// Splits a directive line into its keyword and the remainder of the line.
pub fn split_directive(line: &str) -> (&str, &str) {
    line.split_once(' ').unwrap_or((line, ""))
}

/// Positional arguments of a directive: the remainder split on single spaces.
pub fn arguments(rest: &str) -> impl Iterator<Item = &str> {
    rest.split(' ').filter(|arg| !arg.is_empty())
}

/// Returns `rest` if it is non-empty, else a [`CodecError::MissingArgument`].
pub fn required<'a>(directive: &str, rest: &'a str) -> Result<&'a str, CodecError> {
    if rest.is_empty() {
        return Err(CodecError::MissingArgument {
            directive: directive.to_string(),
        });
    }
    Ok(rest)
}

/// A parser state machine for one level of the directive grammar.
pub trait DirectiveParser<I: LineSource>: Sized {
    type Output;

    /// Looks up the handler for `keyword` in this context.
    fn lookup(keyword: &str) -> Option<Handler<Self, I>>;

    /// Whether this level is complete. End of input always ends the loop.
    fn is_finished(&self, _lines: &mut LineBuffer<I>) -> Result<bool, CodecError> {
        Ok(false)
    }

    /// Removes context-specific decoration (indentation) from a line.
    fn strip(line: &str) -> &str {
        line
    }

    /// Validates the collected state and builds the value.
    fn finalize(self) -> Result<Self::Output, CodecError>;

    /// Runs the directive loop over `lines` and finalizes.
    fn parse(mut self, lines: &mut LineBuffer<I>) -> Result<Self::Output, CodecError> {
        while !self.is_finished(lines)? {
            let Some(line) = lines.pop()? else {
                break;
            };
            let text = <Self as DirectiveParser<I>>::strip(&line);
            if text.is_empty() {
                continue;
            }
            tracing::trace!("parsing line: {}", text);
            let (keyword, rest) = split_directive(text);
            let handler = <Self as DirectiveParser<I>>::lookup(keyword).ok_or_else(|| {
                CodecError::UnknownDirective {
                    keyword: keyword.to_string(),
                    line: lines.line_number(),
                }
            })?;
            handler(&mut self, rest, lines)?;
        }
        self.finalize()
    }
}
