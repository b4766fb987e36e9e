//! Expression evaluation against a variable store and an entropy source.

use crate::{BinaryOp, Expression, UnaryOp, Value, error::ExprError};
use tracing::trace;
use weave_util::Entropy;

/// Indirection for resolving `$NAME` references. `weave_core`'s scope
/// adapter implements this over its variable store; tests and the
/// `evaluate_expression` host operation can implement it directly over a
/// plain map.
pub trait VariableLookup {
    /// Resolve a bare variable name (without the `$` sigil) to its current
    /// value. Implementations must never fail: a missing variable reads as
    /// integer zero, per the spec.
    fn lookup(&self, name: &str) -> Value;
}

/// Evaluate `expr` against `vars`, pushing any recoverable error onto
/// `errors` and returning a best-effort value (integer zero on failure,
/// matching the spec's "a malformed expression yields integer zero"
/// failure policy).
#[tracing::instrument(level = "trace", skip(vars, entropy, errors))]
pub fn evaluate(
    expr: &Expression,
    vars: &dyn VariableLookup,
    entropy: &dyn Entropy,
    errors: &mut Vec<ExprError>,
) -> Value {
    match expr {
        Expression::Literal(value) => value.clone(),
        Expression::Variable(name) => {
            let value = vars.lookup(name);
            trace!(name, ?value, "resolved variable");
            value
        }
        Expression::Unary { op, operand } => {
            let value = evaluate(operand, vars, entropy, errors);
            eval_unary(*op, value, errors)
        }
        Expression::Binary { op, lhs, rhs } => {
            // `and`/`or` short-circuit and must not evaluate the right-hand
            // side when the left already determines the result, since that
            // side may have side-effect-free but entropy-consuming calls
            // (`either`/`random`) whose invocation order is otherwise
            // observable only through the RNG stream.
            let lhs_value = evaluate(lhs, vars, entropy, errors);
            match op {
                BinaryOp::And if !lhs_value.is_truthy() => {
                    return Value::Boolean(false);
                }
                BinaryOp::Or if lhs_value.is_truthy() => {
                    return Value::Boolean(true);
                }
                _ => {}
            }
            let rhs_value = evaluate(rhs, vars, entropy, errors);
            eval_binary(*op, lhs_value, rhs_value, errors)
        }
        Expression::Call { name, args } => {
            let values: Vec<Value> = args
                .iter()
                .map(|arg| evaluate(arg, vars, entropy, errors))
                .collect();
            eval_call(name, values, entropy, errors)
        }
    }
}

/// Combine two already-evaluated values with a binary operator. This is the
/// host's entry point for compound-assignment desugaring (`<<set $V += E>>`
/// becomes `combine(Add, current, evaluate(E))`), reusing the exact
/// arithmetic/string/comparison rules `evaluate` applies internally.
pub fn combine(op: BinaryOp, lhs: Value, rhs: Value, errors: &mut Vec<ExprError>) -> Value {
    eval_binary(op, lhs, rhs, errors)
}

fn eval_unary(op: UnaryOp, value: Value, errors: &mut Vec<ExprError>) -> Value {
    match op {
        UnaryOp::Not => Value::Boolean(!value.is_truthy()),
        UnaryOp::Negate => match value {
            Value::Integer(i) => Value::Integer(-i),
            Value::Float(f) => Value::Float(-f),
            other => {
                errors.push(ExprError::TypeMismatch {
                    op: "-".into(),
                    lhs: describe(&other),
                    rhs: String::new(),
                });
                Value::Integer(0)
            }
        },
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: Value,
    rhs: Value,
    errors: &mut Vec<ExprError>,
) -> Value {
    use BinaryOp::{Add, And, Div, Eq, Gt, Gte, Lt, Lte, Mod, Mul, Neq, Or, Sub};

    match op {
        And => Value::Boolean(lhs.is_truthy() && rhs.is_truthy()),
        Or => Value::Boolean(lhs.is_truthy() || rhs.is_truthy()),
        Eq => Value::Boolean(values_equal(&lhs, &rhs)),
        Neq => Value::Boolean(!values_equal(&lhs, &rhs)),
        Gt | Gte | Lt | Lte => eval_ordering(op, &lhs, &rhs, errors),
        Add if lhs.is_string() || rhs.is_string() => {
            Value::String(format!("{}{}", lhs.stringify(), rhs.stringify()))
        }
        Add | Sub | Mul | Div | Mod => eval_arithmetic(op, lhs, rhs, errors),
        And | Or | Eq | Neq => unreachable!("handled above"),
    }
}

/// Numeric comparison: strings are compared lexically, numbers numerically,
/// and booleans as 0/1, so the operator is always defined without erroring.
fn eval_ordering(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    _errors: &mut [ExprError],
) -> Value {
    use std::cmp::Ordering;
    let ordering = match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => as_f64(lhs)
            .partial_cmp(&as_f64(rhs))
            .unwrap_or(Ordering::Equal),
    };
    let result = match op {
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Gte => ordering != Ordering::Less,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Lte => ordering != Ordering::Greater,
        _ => unreachable!("only ordering ops reach here"),
    };
    Value::Boolean(result)
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        _ => as_f64(lhs) == as_f64(rhs),
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Integer(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => s.parse().unwrap_or(0.0),
    }
}

/// `-`, `*`, `/`, `%` are numeric; `+` falls through here only when neither
/// operand is a string. Int-preserving: int op int yields int (except `/`,
/// which promotes to float whenever the division isn't exact).
fn eval_arithmetic(
    op: BinaryOp,
    lhs: Value,
    rhs: Value,
    errors: &mut Vec<ExprError>,
) -> Value {
    if let (Value::Integer(a), Value::Integer(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        return match op {
            BinaryOp::Add => Value::Integer(a + b),
            BinaryOp::Sub => Value::Integer(a - b),
            BinaryOp::Mul => Value::Integer(a * b),
            BinaryOp::Div => {
                if b == 0 {
                    errors.push(ExprError::DivisionByZero);
                    Value::Integer(0)
                } else if a % b == 0 {
                    Value::Integer(a / b)
                } else {
                    Value::Float(a as f64 / b as f64)
                }
            }
            BinaryOp::Mod => {
                if b == 0 {
                    errors.push(ExprError::DivisionByZero);
                    Value::Integer(0)
                } else {
                    Value::Integer(a % b)
                }
            }
            _ => unreachable!("only arithmetic ops reach here"),
        };
    }

    let a = as_f64(&lhs);
    let b = as_f64(&rhs);
    match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                errors.push(ExprError::DivisionByZero);
                Value::Integer(0)
            } else {
                Value::Float(a / b)
            }
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                errors.push(ExprError::DivisionByZero);
                Value::Integer(0)
            } else {
                Value::Float(a % b)
            }
        }
        _ => unreachable!("only arithmetic ops reach here"),
    }
}

fn eval_call(
    name: &str,
    mut args: Vec<Value>,
    entropy: &dyn Entropy,
    errors: &mut Vec<ExprError>,
) -> Value {
    match name {
        "either" => {
            if args.is_empty() {
                errors.push(ExprError::ArgumentCount {
                    name: "either".into(),
                    expected: "1 or more",
                    actual: 0,
                });
                return Value::Integer(0);
            }
            let index = entropy.pick_index(args.len()).unwrap_or(0);
            args.swap_remove(index)
        }
        "random" => {
            if args.len() != 2 {
                errors.push(ExprError::ArgumentCount {
                    name: "random".into(),
                    expected: "2",
                    actual: args.len(),
                });
                return Value::Integer(0);
            }
            let min = as_f64(&args[0]) as i64;
            let max = as_f64(&args[1]) as i64;
            Value::Integer(entropy.next_range(min, max))
        }
        _ => {
            errors.push(ExprError::UnknownFunction { name: name.into() });
            Value::Integer(0)
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Integer(_) => "integer".into(),
        Value::Float(_) => "float".into(),
        Value::Boolean(_) => "boolean".into(),
        Value::String(_) => "string".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_expression;
    use rstest::rstest;
    use std::collections::HashMap;
    use weave_util::{FixedEntropy, ThreadEntropy};

    struct MapLookup(HashMap<String, Value>);

    impl VariableLookup for MapLookup {
        fn lookup(&self, name: &str) -> Value {
            self.0.get(name).cloned().unwrap_or(Value::Integer(0))
        }
    }

    fn eval(src: &str, vars: &[(&str, Value)]) -> Value {
        let expr = parse_expression(src).unwrap();
        let lookup = MapLookup(
            vars.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect(),
        );
        let mut errors = vec![];
        evaluate(&expr, &lookup, &ThreadEntropy, &mut errors)
    }

    #[rstest]
    #[case::int_add("1 + 2", Value::Integer(3))]
    #[case::string_concat("\"a\" + 1", Value::String("a1".into()))]
    #[case::concat_reversed("1 + \"a\"", Value::String("1a".into()))]
    #[case::float_div("5 / 2", Value::Float(2.5))]
    #[case::exact_div("4 / 2", Value::Integer(2))]
    #[case::modulo("7 % 3", Value::Integer(1))]
    #[case::precedence("1 + 2 * 3", Value::Integer(7))]
    #[case::unary_negate("-(1 + 2)", Value::Integer(-3))]
    #[case::logical_not("not false", Value::Boolean(true))]
    fn test_eval_literals(#[case] src: &str, #[case] expected: Value) {
        assert_eq!(eval(src, &[]), expected);
    }

    #[rstest]
    #[case::is("$H is 75", true)]
    #[case::symbolic_eq("$H == 75", true)]
    #[case::gte_lt("$H gte 50 and $H lt 100", true)]
    #[case::gte_lt_symbolic("$H >= 50 and $H < 100", true)]
    #[case::neq("$H neq 1", true)]
    fn test_operator_aliases(#[case] src: &str, #[case] expected: bool) {
        let value = eval(src, &[("H", Value::Integer(75))]);
        assert_eq!(value, Value::Boolean(expected));
    }

    #[test]
    fn test_missing_variable_reads_zero() {
        assert_eq!(eval("$Nope + 1", &[]), Value::Integer(1));
    }

    #[test]
    fn test_division_by_zero_records_error() {
        let expr = parse_expression("1 / 0").unwrap();
        let lookup = MapLookup(HashMap::new());
        let mut errors = vec![];
        let value = evaluate(&expr, &lookup, &ThreadEntropy, &mut errors);
        assert_eq!(value, Value::Integer(0));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_either_uses_injected_entropy() {
        let expr = parse_expression("either(10, 20, 30)").unwrap();
        let lookup = MapLookup(HashMap::new());
        let entropy = FixedEntropy::new(vec![0.99]);
        let mut errors = vec![];
        let value = evaluate(&expr, &lookup, &entropy, &mut errors);
        assert_eq!(value, Value::Integer(30));
    }

    #[test]
    fn test_and_short_circuits_entropy() {
        // The right-hand side would consume entropy if evaluated; since the
        // left side is false, `and` must short-circuit and never touch it.
        let expr = parse_expression("false and either(1, 2)").unwrap();
        let lookup = MapLookup(HashMap::new());
        let entropy = FixedEntropy::new(vec![]);
        let mut errors = vec![];
        let value = evaluate(&expr, &lookup, &entropy, &mut errors);
        assert_eq!(value, Value::Boolean(false));
    }

    #[test]
    fn test_no_spurious_variable_pickup() {
        // For an expression with only literals, evaluating against an empty
        // store or a populated one must agree.
        let expr = parse_expression("1 + 2 * 3").unwrap();
        let empty = MapLookup(HashMap::new());
        let populated =
            MapLookup(HashMap::from([("x".to_owned(), Value::Integer(1))]));
        let mut errors = vec![];
        let a = evaluate(&expr, &empty, &ThreadEntropy, &mut errors);
        let b = evaluate(&expr, &populated, &ThreadEntropy, &mut errors);
        assert_eq!(a, b);
    }
}
