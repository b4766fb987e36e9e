use thiserror::Error;

/// A leaf error from expression parsing or evaluation. These are never
/// surfaced directly to a player; `weave_core` wraps each one in a
/// `Diagnostic` and keeps rendering. See the error taxonomy in the governing
/// spec (ExpressionError, TypeError, ReferenceError).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExprError {
    /// The expression text did not match the grammar at all
    #[error("could not parse expression `{source}`: {reason}")]
    Malformed { source: String, reason: String },

    /// A function name that isn't one of the built-ins (`either`, `random`)
    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    /// Wrong number of arguments passed to a built-in function
    #[error("`{name}` expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        name: String,
        expected: &'static str,
        actual: usize,
    },

    /// An operator was applied to operand types it doesn't support, e.g. `%`
    /// on a string
    #[error("cannot apply `{op}` to {lhs} and {rhs}")]
    TypeMismatch {
        op: String,
        lhs: String,
        rhs: String,
    },

    /// Division or modulo by zero
    #[error("division by zero")]
    DivisionByZero,
}
