//! Expression grammar, value coercion, and evaluation for weave's macro
//! language. This crate is intentionally ignorant of passages, macros, and
//! the DSL's surrounding text format — those live in `weave_core`, which
//! treats this crate the way a host treats a template engine: hand it an
//! expression string and a variable lookup, get a [Value] back.

mod error;
mod eval;
mod expression;
mod parse;
mod value;

pub use error::ExprError;
pub use eval::{VariableLookup, combine, evaluate};
pub use expression::{BinaryOp, Expression, UnaryOp};
pub use parse::parse_expression;
pub use value::{Value, coerce_literal};

use weave_util::Entropy;

/// Parse and evaluate an expression in one step. This is the primitive
/// behind the public `evaluate_expression` host operation; `weave_core`'s
/// façade wraps it to also thread results into its own diagnostic list.
pub fn evaluate_str(
    source: &str,
    vars: &dyn VariableLookup,
    entropy: &dyn Entropy,
) -> (Value, Vec<ExprError>) {
    let mut errors = Vec::new();
    let value = match parse_expression(source) {
        Ok(expr) => evaluate(&expr, vars, entropy, &mut errors),
        Err(error) => {
            errors.push(error);
            Value::Integer(0)
        }
    };
    (value, errors)
}

/// Evaluate an expression's truthiness directly, per the spec's condition
/// evaluator (§4.3): "a thin wrapper around the expression evaluator."
pub fn evaluate_condition_str(
    source: &str,
    vars: &dyn VariableLookup,
    entropy: &dyn Entropy,
) -> (bool, Vec<ExprError>) {
    let (value, errors) = evaluate_str(source, vars, entropy);
    (value.is_truthy(), errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use weave_util::ThreadEntropy;

    struct MapLookup(HashMap<String, Value>);

    impl VariableLookup for MapLookup {
        fn lookup(&self, name: &str) -> Value {
            self.0.get(name).cloned().unwrap_or(Value::Integer(0))
        }
    }

    #[test]
    fn test_evaluate_str_reports_parse_errors() {
        let vars = MapLookup(HashMap::new());
        let (value, errors) = evaluate_str("1 +", &vars, &ThreadEntropy);
        assert_eq!(value, Value::Integer(0));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_evaluate_condition_str() {
        let vars = MapLookup(HashMap::from([(
            "H".to_owned(),
            Value::Integer(75),
        )]));
        let (truthy, errors) =
            evaluate_condition_str("$H gte 50", &vars, &ThreadEntropy);
        assert!(truthy);
        assert!(errors.is_empty());
    }
}
