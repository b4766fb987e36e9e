//! The error taxonomy (§7) and the `Diagnostic` record that both
//! `ParseResult.errors` and `RenderResult.errors` accumulate into. Every
//! recoverable condition in this crate is *collected*, never raised: public
//! operations never fail outright (§7's propagation policy).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use weave_template::ExprError;

/// Leaf errors raised by the core's own logic (as opposed to
/// `weave_template::ExprError`, which covers expression parsing/evaluation).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InterpError {
    #[error("header `:: ` with no name")]
    HeaderMissingName,

    #[error("unterminated tag bracket `[` in header for `{name}`")]
    UnterminatedTagBracket { name: String },

    #[error("`display` revisited passage `{name}`, which is already on the render stack")]
    Cycle { name: String },

    #[error("`display` named unknown passage `{name}`")]
    MissingPassage { name: String },

    #[error("`<<if>>` without a matching `<<endif>>`")]
    UnterminatedIf,

    #[error("stray `<<{tag}>>` with no enclosing `<<if>>`")]
    StrayConditionalTag { tag: String },

    #[error("unterminated `<<{tag}` macro tag (missing `>>`)")]
    UnterminatedMacroTag { tag: String },

    #[error("unterminated link marker `[[` (missing `]]`)")]
    UnterminatedLink,

    #[error("`display` recursion exceeded the configured maximum depth ({max})")]
    MaxDepthExceeded { max: usize },
}

/// The kind discriminant for a [Diagnostic], mirroring the taxonomy values
/// from §7 (these are *values*, not distinct Rust types, so the whole
/// taxonomy can live in a single serializable enum for the CLI's JSON
/// framing).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    StructuralError,
    ExpressionError,
    TypeError,
    ReferenceError,
    CycleError,
    MissingPassageError,
    UnmatchedMacroError,
}

/// One accumulated error record. `position` is a byte offset into the
/// passage body being parsed/rendered, when known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub position: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
        }
    }

    #[must_use]
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl From<InterpError> for Diagnostic {
    fn from(error: InterpError) -> Self {
        let kind = match &error {
            InterpError::HeaderMissingName
            | InterpError::UnterminatedTagBracket { .. } => {
                DiagnosticKind::StructuralError
            }
            InterpError::Cycle { .. } => DiagnosticKind::CycleError,
            InterpError::MissingPassage { .. } => {
                DiagnosticKind::MissingPassageError
            }
            InterpError::UnterminatedIf
            | InterpError::StrayConditionalTag { .. }
            | InterpError::UnterminatedMacroTag { .. }
            | InterpError::UnterminatedLink
            | InterpError::MaxDepthExceeded { .. } => {
                DiagnosticKind::UnmatchedMacroError
            }
        };
        Diagnostic::new(kind, error.to_string())
    }
}

impl From<ExprError> for Diagnostic {
    fn from(error: ExprError) -> Self {
        let kind = match &error {
            ExprError::Malformed { .. }
            | ExprError::UnknownFunction { .. }
            | ExprError::ArgumentCount { .. } => DiagnosticKind::ExpressionError,
            ExprError::TypeMismatch { .. } | ExprError::DivisionByZero => {
                DiagnosticKind::TypeError
            }
        };
        Diagnostic::new(kind, error.to_string())
    }
}

/// Push a batch of expression errors into a diagnostic list, tagging each
/// with the position of the macro site that produced them.
pub(crate) fn push_expr_errors(
    errors: &mut Vec<Diagnostic>,
    expr_errors: Vec<ExprError>,
    position: usize,
) {
    errors.extend(
        expr_errors
            .into_iter()
            .map(|error| Diagnostic::from(error).at(position)),
    );
}
