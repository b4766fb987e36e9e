//! The structural data model: [Passage], [Link], and the two result types
//! returned from the public façade.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weave_template::Value;

use crate::error::Diagnostic;

/// One `:: Header [tags]` section of a document. Immutable once parsed;
/// parsing is purely syntactic (§4.1) — link and macro syntax inside
/// `raw_body` is not resolved until render.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub name: String,
    pub tags: Vec<String>,
    pub raw_body: String,
    pub image_url: Option<String>,
}

/// The operator a link's setter clause would apply, e.g. `[$flag = 1]`.
/// Captured but never executed by the core (§3: "extraction itself has no
/// side effect").
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SetterOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "to")]
    To,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
}

impl SetterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::To => "to",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
        }
    }

    pub(crate) fn parse(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Self::Assign),
            "to" => Some(Self::To),
            "+=" => Some(Self::AddAssign),
            "-=" => Some(Self::SubAssign),
            "*=" => Some(Self::MulAssign),
            "/=" => Some(Self::DivAssign),
            _ => None,
        }
    }
}

/// A setter clause attached to a link: `[$V OP VAL]`. The value is kept as
/// the raw literal text, not evaluated — setters are data for the host to
/// apply if it chooses the link, not instructions the core executes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Setter {
    pub variable: String,
    pub operator: SetterOp,
    pub value_literal: String,
}

/// A navigational marker extracted from live (non-suppressed) passage text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub display: String,
    pub target: String,
    pub setters: Vec<Setter>,
}

/// The immutable structural result of [crate::parse].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParseResult {
    pub passages: IndexMap<String, Passage>,
    pub story_init_vars: IndexMap<String, Value>,
    pub test_setup_vars: IndexMap<String, Value>,
    /// Trimmed body of the `StoryTitle` passage, if present. Additive
    /// convenience for host collaborators (editor title bars, `info`
    /// summaries); StoryTitle carries no macro-execution protocol of its own.
    pub story_title: Option<String>,
    pub errors: Vec<Diagnostic>,
}

/// The result of rendering a single passage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RenderResult {
    pub text: String,
    pub links: Vec<Link>,
    pub variable_changes: IndexMap<String, Value>,
    pub errors: Vec<Diagnostic>,
}

/// Distinguishes how a host intends to use a render call. `Preview` and
/// `Runtime` are identical for the core; the distinction exists purely so
/// host collaborators can route accordingly (§3).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Skip macro execution; only strip/surface structure.
    ParseOnly,
    Preview,
    #[default]
    Runtime,
}
