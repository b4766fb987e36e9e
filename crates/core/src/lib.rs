//! Domain model, passage parsing, macro interpretation, and the public
//! parse/render façade for weave's interactive-fiction DSL. Built on top of
//! `weave_template` (the expression grammar and value type) the way the
//! teacher's `slumber_core` builds on `slumber_template`: this crate owns
//! passages, links, macros, and the surrounding document shape, and treats
//! expression evaluation as someone else's problem.

mod config;
mod error;
mod interp;
mod model;
mod parse;
mod scan;
mod scope;
mod special;

pub use config::{DEFAULT_MAX_DISPLAY_DEPTH, StoryConfig};
pub use error::{Diagnostic, DiagnosticKind, InterpError};
pub use model::{
    ExecutionMode, Link, ParseResult, Passage, RenderResult, Setter, SetterOp,
};
pub use scope::{ScopeAdapter, ScopeMode, ScopedLookup, VariableStore};
pub use weave_template::{ExprError, Value};

use indexmap::IndexMap;
use tracing::{instrument, warn};

use crate::error::push_expr_errors;
use crate::interp::Interpreter;

/// Parse a full DSL source string into its structural representation
/// (§6's `parse` operation). Always succeeds; recoverable problems are
/// collected into `ParseResult.errors` rather than raised (§7).
///
/// `config` supplies the scope mode and entropy source used to evaluate
/// `StoryInit`/`TestSetup` (§4.5) — the rest of parsing is purely
/// syntactic and doesn't consult it.
#[instrument(level = "debug", skip(source, config), fields(len = source.len()))]
pub fn parse(source: &str, config: &StoryConfig) -> ParseResult {
    let (passages, mut errors) = parse::parse_passages(source);
    let scope_adapter = ScopeAdapter::new(config.scope_mode.clone());

    let story_init_vars = passages
        .get("StoryInit")
        .map(|passage| {
            special::story_init_vars(&passage.raw_body, &scope_adapter, config.entropy(), &mut errors)
        })
        .unwrap_or_default();

    let test_setup_vars = passages
        .get("TestSetup")
        .map(|passage| {
            special::test_setup_vars(&passage.raw_body, &scope_adapter, config.entropy(), &mut errors)
        })
        .unwrap_or_default();

    let story_title = special::story_title(&passages);

    for error in &errors {
        warn!(%error.message, kind = ?error.kind, "parse diagnostic");
    }

    ParseResult {
        passages,
        story_init_vars,
        test_setup_vars,
        story_title,
        errors,
    }
}

/// Render a single passage (§6's `render` operation). Mutates `variables`
/// in well-defined textual order and always succeeds; recoverable problems
/// accumulate into `RenderResult.errors`.
///
/// `ExecutionMode::ParseOnly` skips macro execution entirely and returns
/// the passage's raw body verbatim, per §3.
#[instrument(level = "debug", skip(variables, passages, config), fields(%passage_name, ?mode))]
pub fn render(
    passage_name: &str,
    variables: &mut VariableStore,
    passages: &IndexMap<String, Passage>,
    config: &StoryConfig,
    mode: ExecutionMode,
) -> RenderResult {
    let Some(passage) = passages.get(passage_name) else {
        let error = InterpError::MissingPassage {
            name: passage_name.to_owned(),
        };
        warn!(passage_name, "render target does not exist");
        return RenderResult {
            errors: vec![Diagnostic::from(error)],
            ..Default::default()
        };
    };

    if mode == ExecutionMode::ParseOnly {
        return RenderResult {
            text: passage.raw_body.clone(),
            ..Default::default()
        };
    }

    let interpreter = Interpreter::new(variables, passages, config, passage_name);
    let output = interpreter.finish(&passage.raw_body);
    for error in &output.errors {
        warn!(%error.message, kind = ?error.kind, "render diagnostic");
    }

    RenderResult {
        text: output.text,
        links: output.links,
        variable_changes: output.variable_changes,
        errors: output.errors,
    }
}

/// Evaluate a standalone expression against `variables` (§6's
/// `evaluate_expression` operation), for host tooling (e.g. the CLI's
/// `evaluate` subcommand) rather than as part of rendering a passage.
#[instrument(level = "trace", skip(variables, config))]
pub fn evaluate_expression(
    expr: &str,
    variables: &VariableStore,
    config: &StoryConfig,
) -> (Value, Vec<Diagnostic>) {
    let scope_adapter = ScopeAdapter::new(config.scope_mode.clone());
    let lookup = ScopedLookup {
        scope: &scope_adapter,
        store: variables,
    };
    let (value, expr_errors) =
        weave_template::evaluate_str(expr, &lookup, config.entropy());
    let mut errors = Vec::new();
    push_expr_errors(&mut errors, expr_errors, 0);
    (value, errors)
}

/// Evaluate an expression's truthiness (§6's `evaluate_condition`
/// operation) — a thin wrapper, per §4.3.
#[instrument(level = "trace", skip(variables, config))]
pub fn evaluate_condition(
    expr: &str,
    variables: &VariableStore,
    config: &StoryConfig,
) -> (bool, Vec<Diagnostic>) {
    let (value, errors) = evaluate_expression(expr, variables, config);
    (value.is_truthy(), errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weave_util::{FixedEntropy, ThreadEntropy};

    fn config() -> StoryConfig {
        StoryConfig::new(ScopeMode::Global, Arc::new(ThreadEntropy))
    }

    #[test]
    fn test_scenario_basic_assignment_and_print() {
        let result = parse(":: Start\n<<set $H = 10>><<print $H + 5>>", &config());
        let mut vars = VariableStore::new();
        let render_result = render(
            "Start",
            &mut vars,
            &result.passages,
            &config(),
            ExecutionMode::Runtime,
        );
        assert_eq!(render_result.text, "15");
        assert_eq!(vars.get("H"), Some(&Value::Integer(10)));
        assert!(render_result.links.is_empty());
    }

    #[test]
    fn test_scenario_operator_aliasing() {
        let result = parse(
            ":: P\n<<if $H gte 50 and $H lt 100>>ok<<else>>no<<endif>>",
            &config(),
        );
        let mut vars = VariableStore::new();
        vars.insert("H".to_owned(), Value::Integer(75));
        let render_result = render(
            "P",
            &mut vars,
            &result.passages,
            &config(),
            ExecutionMode::Runtime,
        );
        assert_eq!(render_result.text, "ok");
    }

    #[test]
    fn test_scenario_nested_conditional_compound_assignment() {
        let result = parse(
            ":: P\n<<set $X to 2>><<if $X is 2>><<set $X += 3>>ok<<endif>><<print $X>>",
            &config(),
        );
        let mut vars = VariableStore::new();
        let render_result = render(
            "P",
            &mut vars,
            &result.passages,
            &config(),
            ExecutionMode::Runtime,
        );
        assert_eq!(render_result.text, "ok5");
        assert_eq!(vars.get("X"), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_scenario_display_cycle() {
        let result = parse(
            ":: A\n<<display \"B\">>\n:: B\n<<display \"A\">>",
            &config(),
        );
        let mut vars = VariableStore::new();
        let render_result = render(
            "A",
            &mut vars,
            &result.passages,
            &config(),
            ExecutionMode::Runtime,
        );
        assert_eq!(render_result.errors.len(), 1);
        assert_eq!(render_result.errors[0].kind, DiagnosticKind::CycleError);
    }

    #[test]
    fn test_scenario_link_extraction_with_setter() {
        let result = parse(":: P\nGo [[North|N][$flag = 1]].", &config());
        let mut vars = VariableStore::new();
        let render_result = render(
            "P",
            &mut vars,
            &result.passages,
            &config(),
            ExecutionMode::Runtime,
        );
        assert!(render_result.text.contains("North"));
        assert_eq!(render_result.links.len(), 1);
        let link = &render_result.links[0];
        assert_eq!(link.display, "North");
        assert_eq!(link.target, "N");
        assert_eq!(link.setters[0].variable, "flag");
        assert_eq!(link.setters[0].value_literal, "1");
        assert!(vars.is_empty());
    }

    #[test]
    fn test_scenario_test_setup_three_pass() {
        let result = parse(
            ":: TestSetup\n<<set $A = 1>><<if $A is 1>><<set $B = 10>><<endif>><<set $C = $B + 1>>",
            &config(),
        );
        assert_eq!(result.test_setup_vars.get("A"), Some(&Value::Integer(1)));
        assert_eq!(result.test_setup_vars.get("B"), Some(&Value::Integer(10)));
        assert_eq!(result.test_setup_vars.get("C"), Some(&Value::Integer(11)));
    }

    #[test]
    fn test_story_init_vars_seeded_from_story_init_only() {
        let result = parse(
            ":: StoryInit\n<<set $gold = 5>>\n:: Start\n<<set $other = 1>>",
            &config(),
        );
        assert_eq!(result.story_init_vars.get("GOLD"), Some(&Value::Integer(5)));
        assert!(result.story_init_vars.get("OTHER").is_none());
    }

    #[test]
    fn test_story_title_surfaced() {
        let result = parse(":: StoryTitle\nMy Adventure\n", &config());
        assert_eq!(result.story_title.as_deref(), Some("My Adventure"));
    }

    #[test]
    fn test_parse_only_mode_skips_macro_execution() {
        let result = parse(":: P\n<<set $x = 1>>literal", &config());
        let mut vars = VariableStore::new();
        let render_result = render(
            "P",
            &mut vars,
            &result.passages,
            &config(),
            ExecutionMode::ParseOnly,
        );
        assert_eq!(render_result.text, "<<set $x = 1>>literal");
        assert!(vars.is_empty());
    }

    #[test]
    fn test_render_missing_passage_reports_error() {
        let result = parse(":: P\nbody", &config());
        let mut vars = VariableStore::new();
        let render_result = render(
            "Nope",
            &mut vars,
            &result.passages,
            &config(),
            ExecutionMode::Runtime,
        );
        assert_eq!(render_result.errors.len(), 1);
        assert_eq!(
            render_result.errors[0].kind,
            DiagnosticKind::MissingPassageError
        );
    }

    #[test]
    fn test_evaluate_expression_host_operation() {
        let mut vars = VariableStore::new();
        vars.insert("H".to_owned(), Value::Integer(10));
        let (value, errors) = evaluate_expression("$H + 5", &vars, &config());
        assert_eq!(value, Value::Integer(15));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_evaluate_condition_host_operation() {
        let mut vars = VariableStore::new();
        vars.insert("H".to_owned(), Value::Integer(75));
        let (truthy, _) = evaluate_condition("$H gte 50", &vars, &config());
        assert!(truthy);
    }

    #[test]
    fn test_either_uses_injected_entropy_through_render() {
        let result = parse(":: P\n<<print either(10, 20, 30)>>", &config());
        let seeded = StoryConfig::new(ScopeMode::Global, Arc::new(FixedEntropy::new(vec![0.99])));
        let mut vars = VariableStore::new();
        let render_result = render(
            "P",
            &mut vars,
            &result.passages,
            &seeded,
            ExecutionMode::Runtime,
        );
        assert_eq!(render_result.text, "30");
    }
}
