//! Codec error types for specminers-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering every
//! way a declarations, trace or invariant stream can be rejected. Each variant
//! carries the program point, variable and raw text needed to diagnose the
//! failure without re-reading the input.

use thiserror::Error;

use crate::value::RepType;

/// Errors produced while reading or writing Daikon files.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying line source or output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------
    // Structural
    // -------------------------------------------------------------------
    /// A line started with a keyword that has no handler in its context.
    #[error("unknown directive '{keyword}' on line {line}")]
    UnknownDirective { keyword: String, line: usize },

    /// A directive that requires a value was given none.
    #[error("directive '{directive}' is missing its argument")]
    MissingArgument { directive: String },

    /// A mandatory field of a declaration block was never set.
    #[error("incomplete declaration for {owner}: missing '{field}'")]
    MissingField { owner: String, field: &'static str },

    /// A program point block had no `ppt-type` directive.
    #[error("program point '{ppt}' has no ppt-type")]
    MissingPptType { ppt: String },

    /// A `ppt-type` value outside the known set of kinds.
    #[error("invalid ppt-type '{value}' for program point '{ppt}'")]
    InvalidPptType { ppt: String, value: String },

    /// A `rep-type` value outside the supported representation types.
    #[error("invalid rep-type '{value}' for variable '{variable}'")]
    InvalidRepType { variable: String, value: String },

    /// Two program points share a name.
    #[error("duplicate program point: '{name}'")]
    DuplicateProgramPoint { name: String },

    /// Two variables of one program point share a name.
    #[error("duplicate variable '{name}' in program point '{ppt}'")]
    DuplicateVariable { ppt: String, name: String },

    /// A trace record did not start with a blank line.
    #[error("expected blank line before trace record, found '{actual}'")]
    ExpectedBlankLine { actual: String },

    /// An invariant report block did not start with the delimiter line.
    #[error("expected invariant block delimiter, found '{actual}'")]
    ExpectedDelimiter { actual: String },

    /// An invariant report ended between a delimiter and its program point name.
    #[error("truncated invariant block: delimiter on line {line} has no program point")]
    TruncatedInvariantBlock { line: usize },

    /// Input ended where the grammar requires another line.
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEndOfInput { context: String },

    // -------------------------------------------------------------------
    // Referential
    // -------------------------------------------------------------------
    /// A program point name that is not part of the declarations.
    #[error("unknown program point: '{name}'")]
    UnknownProgramPoint { name: String },

    /// A trace record listed its variables out of declared order.
    #[error("variable order mismatch in '{ppt}': expected '{expected}', found '{actual}'")]
    VariableOrderMismatch {
        ppt: String,
        expected: String,
        actual: String,
    },

    // -------------------------------------------------------------------
    // Value-level
    // -------------------------------------------------------------------
    /// A value line could not be decoded as the variable's representation type.
    #[error("cannot decode '{raw}' as {expected} for variable '{variable}'")]
    ValueDecodeError {
        variable: String,
        raw: String,
        expected: RepType,
    },

    /// A `comparability` directive whose argument is not an integer.
    #[error("invalid comparability '{value}' for variable '{variable}'")]
    InvalidComparability { variable: String, value: String },

    /// A `this_invocation_nonce` value that is not an integer.
    #[error("invalid nonce '{raw}' in record for '{ppt}'")]
    InvalidNonce { ppt: String, raw: String },

    /// A modified flag that is not a small integer.
    #[error("invalid modified flag '{raw}' for variable '{variable}'")]
    InvalidModifiedFlag { variable: String, raw: String },

    // -------------------------------------------------------------------
    // Contractual (writer)
    // -------------------------------------------------------------------
    /// A record was written without a value for a declared variable.
    #[error("missing value for variable '{name}' of '{ppt}'")]
    MissingVariable { ppt: String, name: String },

    /// A record was written with a value for an undeclared variable.
    #[error("unexpected variable '{name}' for '{ppt}'")]
    UnexpectedVariable { ppt: String, name: String },

    /// A value whose variant cannot be encoded as the variable's rep type.
    #[error("value for variable '{variable}' is {actual}, expected {expected}")]
    ValueTypeMismatch {
        variable: String,
        expected: RepType,
        actual: &'static str,
    },

    /// Text destined for a single line of output contains a line break.
    #[error("value for variable '{variable}' contains a line break")]
    LineBreakInValue { variable: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = CodecError::VariableOrderMismatch {
            ppt: "main:::ENTER".into(),
            expected: "x".into(),
            actual: "y".into(),
        };
        assert_eq!(
            err.to_string(),
            "variable order mismatch in 'main:::ENTER': expected 'x', found 'y'"
        );

        let err = CodecError::ValueDecodeError {
            variable: "latitude".into(),
            raw: "north".into(),
            expected: RepType::Float,
        };
        assert_eq!(
            err.to_string(),
            "cannot decode 'north' as float for variable 'latitude'"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CodecError = io.into();
        assert!(matches!(err, CodecError::Io(_)));
    }
}
