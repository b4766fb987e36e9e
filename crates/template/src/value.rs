//! The dynamic [Value] type and literal coercion.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A runtime value in the expression language. Untyped at the language level;
/// every operator decides for itself how to combine operands of differing
/// variants (see [crate::eval]).
#[derive(Clone, Debug, Display, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl Value {
    /// Truthiness used by logical operators and `<<if>>` conditions: zero,
    /// empty string, and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Boolean(b) => *b,
            Self::String(s) => !s.is_empty(),
        }
    }

    /// Is this value a string? Used to decide whether `+` should concatenate.
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Stringify for concatenation, `<<print>>` output, and text interpolation.
    /// This is just [ToString::to_string] via the [Display] impl, but named
    /// explicitly so call sites read as an intentional coercion.
    pub fn stringify(&self) -> String {
        self.to_string()
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// Coerce a bare (unquoted) lexeme to a [Value] by trying, in order: integer,
/// float, case-insensitive boolean, then falling back to a bare string. The
/// "stripped-quote string" stage from the spec's coercion chain is handled
/// upstream by the tokenizer, which only ever calls this function on lexemes
/// it has already determined are *not* quoted string literals.
pub fn coerce_literal(lexeme: &str) -> Value {
    if let Ok(i) = lexeme.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = lexeme.parse::<f64>() {
        return Value::Float(f);
    }
    match lexeme.to_ascii_lowercase().as_str() {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }
    Value::String(lexeme.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::integer("10", Value::Integer(10))]
    #[case::negative_integer("-10", Value::Integer(-10))]
    #[case::float("1.5", Value::Float(1.5))]
    #[case::bool_true("true", Value::Boolean(true))]
    #[case::bool_true_mixed_case("True", Value::Boolean(true))]
    #[case::bool_false("FALSE", Value::Boolean(false))]
    #[case::bare_string("Monday", Value::String("Monday".into()))]
    fn test_coerce_literal(#[case] lexeme: &str, #[case] expected: Value) {
        assert_eq!(coerce_literal(lexeme), expected);
    }

    #[rstest]
    #[case::zero_int(Value::Integer(0), false)]
    #[case::nonzero_int(Value::Integer(1), true)]
    #[case::zero_float(Value::Float(0.0), false)]
    #[case::empty_string(Value::String(String::new()), false)]
    #[case::nonempty_string(Value::String("x".into()), true)]
    #[case::false_bool(Value::Boolean(false), false)]
    fn test_truthiness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(value.is_truthy(), expected);
    }
}
