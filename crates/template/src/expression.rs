//! The expression AST. Built by [crate::parse::parse_expression], walked by
//! [crate::eval::evaluate].

use derive_more::Display;

use crate::Value;

/// A parsed expression. Grammar and precedence are documented on
/// [crate::parse::parse_expression].
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Literal(Value),
    /// A `$NAME` reference. The bare name, without the sigil; scope
    /// resolution is the caller's job (see `VariableLookup`).
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Self>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Self>,
        rhs: Box<Self>,
    },
    Call {
        name: String,
        args: Vec<Self>,
    },
}

#[derive(Clone, Copy, Debug, Display, PartialEq)]
pub enum UnaryOp {
    #[display("-")]
    Negate,
    #[display("not")]
    Not,
}

/// A binary operator. Every word-form alias (`is`, `neq`, `gt`, `gte`, `lt`,
/// `lte`) parses to the same variant as its symbolic counterpart — the
/// parser discards the spelling once it has the operator, so `evaluate`
/// never needs to know which form the author used.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
pub enum BinaryOp {
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
    #[display("/")]
    Div,
    #[display("%")]
    Mod,
    #[display("==")]
    Eq,
    #[display("!=")]
    Neq,
    #[display(">")]
    Gt,
    #[display(">=")]
    Gte,
    #[display("<")]
    Lt,
    #[display("<=")]
    Lte,
    #[display("and")]
    And,
    #[display("or")]
    Or,
}
