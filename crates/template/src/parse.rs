//! Expression parsing: a small recursive-descent grammar built on `winnow`,
//! matching the precedence table from the governing spec (low to high):
//! `or`, `and`, `not`, comparison, additive, multiplicative, unary `-`,
//! primary.

use crate::{BinaryOp, Expression, UnaryOp, Value, error::ExprError, value::coerce_literal};
use winnow::{
    ModalResult, Parser,
    ascii::{dec_int, float, multispace0},
    combinator::{alt, cut_err, delimited, opt, peek, preceded, separated},
    error::{StrContext, StrContextValue},
    token::{one_of, take_while},
};

/// Parse a full expression, requiring the entire (trimmed) input to be
/// consumed. On failure, the source text is preserved in the returned error
/// so the host can show it to the author.
pub fn parse_expression(input: &str) -> Result<Expression, ExprError> {
    let mut cursor = input;
    multispace0.parse_next(&mut cursor).ok();
    let result = or_expr.parse_next(&mut cursor);
    match result {
        Ok(expr) => {
            let _ = multispace0.parse_next(&mut cursor);
            if cursor.is_empty() {
                Ok(expr)
            } else {
                Err(ExprError::Malformed {
                    source: input.to_owned(),
                    reason: format!("unexpected trailing input: `{cursor}`"),
                })
            }
        }
        Err(error) => Err(ExprError::Malformed {
            source: input.to_owned(),
            reason: error.to_string(),
        }),
    }
}

/// Skip leading whitespace, then run `parser`.
fn ws<'a, O>(
    mut parser: impl Parser<&'a str, O, winnow::error::ContextError>,
) -> impl Parser<&'a str, O, winnow::error::ContextError> {
    move |input: &mut &'a str| {
        let _ = multispace0.parse_next(input);
        parser.parse_next(input)
    }
}

/// Match a keyword operator (`or`, `and`, `not`, `is`, ...), requiring that it
/// not be immediately followed by another identifier character (so `island`
/// doesn't parse as `is` + `land`).
fn keyword<'a>(
    kw: &'static str,
) -> impl Parser<&'a str, &'a str, winnow::error::ContextError> {
    move |input: &mut &'a str| {
        let start = *input;
        let matched: &str = kw.parse_next(input)?;
        if input
            .chars()
            .next()
            .is_some_and(Identifier::is_continue_char)
        {
            *input = start;
            return Err(winnow::error::ErrMode::Backtrack(
                winnow::error::ContextError::new(),
            ));
        }
        Ok(matched)
    }
}

/// Thin namespace for identifier character classification, mirrored from
/// what a bareword/variable name is allowed to contain.
struct Identifier;

impl Identifier {
    fn is_start_char(c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }

    fn is_continue_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }
}

fn identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        winnow::token::take_while(1, Identifier::is_start_char),
        winnow::token::take_while(0.., Identifier::is_continue_char),
    )
        .take()
        .parse_next(input)
}

fn or_expr(input: &mut &str) -> ModalResult<Expression> {
    let mut expr = and_expr.parse_next(input)?;
    loop {
        let checkpoint = *input;
        if ws(keyword("or")).parse_next(input).is_err() {
            *input = checkpoint;
            break;
        }
        let rhs = cut_err(ws(and_expr)).parse_next(input)?;
        expr = Expression::Binary {
            op: BinaryOp::Or,
            lhs: Box::new(expr),
            rhs: Box::new(rhs),
        };
    }
    Ok(expr)
}

fn and_expr(input: &mut &str) -> ModalResult<Expression> {
    let mut expr = not_expr.parse_next(input)?;
    loop {
        let checkpoint = *input;
        if ws(keyword("and")).parse_next(input).is_err() {
            *input = checkpoint;
            break;
        }
        let rhs = cut_err(ws(not_expr)).parse_next(input)?;
        expr = Expression::Binary {
            op: BinaryOp::And,
            lhs: Box::new(expr),
            rhs: Box::new(rhs),
        };
    }
    Ok(expr)
}

fn not_expr(input: &mut &str) -> ModalResult<Expression> {
    let checkpoint = *input;
    if ws(keyword("not")).parse_next(input).is_ok() {
        let operand = cut_err(ws(not_expr)).parse_next(input)?;
        return Ok(Expression::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        });
    }
    *input = checkpoint;
    comparison_expr.parse_next(input)
}

fn comparison_op(input: &mut &str) -> ModalResult<BinaryOp> {
    alt((
        keyword("is").value(BinaryOp::Eq),
        keyword("neq").value(BinaryOp::Neq),
        keyword("gte").value(BinaryOp::Gte),
        keyword("gt").value(BinaryOp::Gt),
        keyword("lte").value(BinaryOp::Lte),
        keyword("lt").value(BinaryOp::Lt),
        "==".value(BinaryOp::Eq),
        "!=".value(BinaryOp::Neq),
        ">=".value(BinaryOp::Gte),
        "<=".value(BinaryOp::Lte),
        ">".value(BinaryOp::Gt),
        "<".value(BinaryOp::Lt),
    ))
    .parse_next(input)
}

fn comparison_expr(input: &mut &str) -> ModalResult<Expression> {
    let lhs = additive_expr.parse_next(input)?;
    let checkpoint = *input;
    let _ = multispace0.parse_next(input);
    match comparison_op.parse_next(input) {
        Ok(op) => {
            let rhs = cut_err(ws(additive_expr)).parse_next(input)?;
            Ok(Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            })
        }
        Err(_) => {
            *input = checkpoint;
            Ok(lhs)
        }
    }
}

fn additive_expr(input: &mut &str) -> ModalResult<Expression> {
    let mut expr = multiplicative_expr.parse_next(input)?;
    loop {
        let checkpoint = *input;
        let _ = multispace0.parse_next(input);
        let op = match one_of::<_, _, winnow::error::ContextError>(['+', '-'])
            .parse_next(input)
        {
            Ok('+') => BinaryOp::Add,
            Ok('-') => BinaryOp::Sub,
            Ok(_) => unreachable!(),
            Err(_) => {
                *input = checkpoint;
                break;
            }
        };
        let rhs = cut_err(ws(multiplicative_expr)).parse_next(input)?;
        expr = Expression::Binary {
            op,
            lhs: Box::new(expr),
            rhs: Box::new(rhs),
        };
    }
    Ok(expr)
}

fn multiplicative_expr(input: &mut &str) -> ModalResult<Expression> {
    let mut expr = unary_expr.parse_next(input)?;
    loop {
        let checkpoint = *input;
        let _ = multispace0.parse_next(input);
        let op =
            match one_of::<_, _, winnow::error::ContextError>(['*', '/', '%'])
                .parse_next(input)
            {
                Ok('*') => BinaryOp::Mul,
                Ok('/') => BinaryOp::Div,
                Ok('%') => BinaryOp::Mod,
                Ok(_) => unreachable!(),
                Err(_) => {
                    *input = checkpoint;
                    break;
                }
            };
        let rhs = cut_err(ws(unary_expr)).parse_next(input)?;
        expr = Expression::Binary {
            op,
            lhs: Box::new(expr),
            rhs: Box::new(rhs),
        };
    }
    Ok(expr)
}

fn unary_expr(input: &mut &str) -> ModalResult<Expression> {
    let checkpoint = *input;
    if ws('-').parse_next(input).is_ok() {
        let operand = cut_err(ws(unary_expr)).parse_next(input)?;
        return Ok(Expression::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(operand),
        });
    }
    *input = checkpoint;
    primary_expr.parse_next(input)
}

fn primary_expr(input: &mut &str) -> ModalResult<Expression> {
    ws(alt((
        paren_expr,
        variable_expr,
        call_or_word_expr,
        string_literal.map(|s| Expression::Literal(Value::String(s))),
        numeric_literal.map(Expression::Literal),
    )))
    .parse_next(input)
}

fn paren_expr(input: &mut &str) -> ModalResult<Expression> {
    delimited(
        '(',
        cut_err(ws(or_expr)),
        cut_err(ws(')')).context(StrContext::Expected(
            StrContextValue::CharLiteral(')'),
        )),
    )
    .parse_next(input)
}

fn variable_expr(input: &mut &str) -> ModalResult<Expression> {
    preceded('$', cut_err(identifier))
        .map(|name: &str| Expression::Variable(name.to_owned()))
        .parse_next(input)
}

/// Either a function call (`either(1, 2)`) or a bareword literal that gets
/// coerced per [coerce_literal]. Both start with an identifier, so they share
/// a parser to avoid backtracking past the (potentially expensive) argument
/// list.
fn call_or_word_expr(input: &mut &str) -> ModalResult<Expression> {
    let name = identifier.parse_next(input)?;
    let checkpoint = *input;
    if ws('(').parse_next(input).is_ok() {
        let args: Vec<Expression> =
            separated(0.., ws(or_expr), ws(',')).parse_next(input)?;
        cut_err(ws(')')).parse_next(input)?;
        return Ok(Expression::Call {
            name: name.to_owned(),
            args,
        });
    }
    *input = checkpoint;
    Ok(Expression::Literal(coerce_literal(name)))
}

fn numeric_literal(input: &mut &str) -> ModalResult<Value> {
    alt((
        // If we see a number with a `.` or `e`/`E` (scientific notation),
        // it's a float. Otherwise it's an int. The peek check is needed
        // because `float` would otherwise consume a bare int's digits first,
        // leaving us in an unrecoverable state. We can't just try `float`
        // first, since it happily parses `"42"` as `42.0`.
        preceded(
            peek((
                opt('-'),
                take_while(1.., |c: char| c.is_ascii_digit()),
                one_of(['.', 'e', 'E']),
            )),
            float.map(Value::Float),
        ),
        dec_int.map(Value::Integer),
    ))
    .parse_next(input)
}

fn string_literal(input: &mut &str) -> ModalResult<String> {
    alt((quoted('"'), quoted('\''))).parse_next(input)
}

fn quoted<'a>(
    quote: char,
) -> impl Parser<&'a str, String, winnow::error::ContextError> {
    move |input: &mut &'a str| {
        delimited(
            quote,
            take_while(0.., move |c: char| c != quote),
            cut_err(quote.context(StrContext::Expected(
                StrContextValue::CharLiteral(quote),
            ))),
        )
        .map(str::to_owned)
        .parse_next(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::integer("42", Expression::Literal(Value::Integer(42)))]
    #[case::negative("-5", Expression::Unary { op: UnaryOp::Negate, operand: Box::new(Expression::Literal(Value::Integer(5))) })]
    #[case::float("1.5", Expression::Literal(Value::Float(1.5)))]
    #[case::string_double("\"hi\"", Expression::Literal(Value::String("hi".into())))]
    #[case::string_single("'hi'", Expression::Literal(Value::String("hi".into())))]
    #[case::variable("$Health", Expression::Variable("Health".into()))]
    #[case::bareword("Monday", Expression::Literal(Value::String("Monday".into())))]
    fn test_parse_primary(#[case] src: &str, #[case] expected: Expression) {
        assert_eq!(parse_expression(src).unwrap(), expected);
    }

    #[rstest]
    #[case::add("1 + 2")]
    #[case::precedence("1 + 2 * 3")]
    #[case::aliased_comparison("$H gte 50 and $H lt 100")]
    #[case::symbolic_comparison("$H >= 50 and $H < 100")]
    #[case::call("either(1, 2, 3)")]
    #[case::nested_call("random(1, 2) + 1")]
    #[case::parens("($a + $b) * 2")]
    #[case::not_and_or("not $a and $b or $c")]
    fn test_parse_smoke(#[case] src: &str) {
        parse_expression(src).unwrap();
    }

    #[test]
    fn test_parse_error_on_trailing_garbage() {
        assert!(parse_expression("1 + ").is_err());
        assert!(parse_expression("1 2").is_err());
    }
}
