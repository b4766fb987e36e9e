//! The macro interpreter (§4.4): walks a passage body's raw text, executing
//! `<<...>>` tags and extracting `[[...]]` link markers as it goes. Branch
//! elision for `<<if>>` is implemented by slicing the *unevaluated* branch
//! text out of the body entirely (via [crate::scan]) rather than walking it
//! with a suppressed "skipping" flag, so a skipped branch's `<<set>>`s never
//! run and its expressions never get a chance to consume entropy.

use indexmap::IndexMap;
use weave_template::{BinaryOp, Value};

use crate::config::StoryConfig;
use crate::error::{Diagnostic, DiagnosticKind, InterpError, push_expr_errors};
use crate::model::{Link, Passage, Setter, SetterOp};
use crate::scan::{self, Boundary, Special};
use crate::scope::{ScopeAdapter, ScopedLookup, VariableStore};

/// Threads the mutable render state through one passage's body, and
/// recursively through any passages it `display`s.
pub(crate) struct Interpreter<'a> {
    store: &'a mut VariableStore,
    passages: &'a IndexMap<String, Passage>,
    scope: ScopeAdapter,
    config: &'a StoryConfig,
    /// Passage names currently being displayed, for cycle detection.
    stack: Vec<String>,
    nobr_depth: usize,
    /// Crude running cursor into the source passage, good enough to
    /// disambiguate diagnostics but not byte-exact across `display` jumps.
    position: usize,

    output: String,
    links: Vec<Link>,
    changes: IndexMap<String, Value>,
    errors: Vec<Diagnostic>,
}

/// What a completed interpreter run produced, before it's wrapped into a
/// [crate::model::RenderResult] by the façade.
pub(crate) struct InterpOutput {
    pub text: String,
    pub links: Vec<Link>,
    pub variable_changes: IndexMap<String, Value>,
    pub errors: Vec<Diagnostic>,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(
        store: &'a mut VariableStore,
        passages: &'a IndexMap<String, Passage>,
        config: &'a StoryConfig,
        root_passage: &str,
    ) -> Self {
        Self {
            store,
            passages,
            scope: ScopeAdapter::new(config.scope_mode.clone()),
            config,
            stack: vec![root_passage.to_string()],
            nobr_depth: 0,
            position: 0,
            output: String::new(),
            links: Vec::new(),
            changes: IndexMap::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn finish(self, body: &str) -> InterpOutput {
        let mut this = self;
        this.run(body);
        InterpOutput {
            text: this.output,
            links: this.links,
            variable_changes: this.changes,
            errors: this.errors,
        }
    }

    fn lookup(&self) -> ScopedLookup<'_> {
        ScopedLookup {
            scope: &self.scope,
            store: self.store,
        }
    }

    fn run(&mut self, body: &str) {
        let mut body = body;
        loop {
            match scan::next_special(body) {
                None => {
                    self.emit(body);
                    return;
                }
                Some((text, special, rest)) => {
                    self.emit(text);
                    match special {
                        Special::Macro { name, args } => {
                            body = self.handle_macro(name, args, rest);
                        }
                        Special::Link { raw } => {
                            self.handle_link(raw);
                            body = rest;
                        }
                        Special::Image { .. } => {
                            body = rest;
                        }
                        Special::UnterminatedMacro { .. } => {
                            self.push_error(InterpError::UnterminatedMacroTag {
                                tag: "<<".into(),
                            });
                            return;
                        }
                        Special::UnterminatedLink => {
                            self.push_error(InterpError::UnterminatedLink);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn emit(&mut self, text: &str) {
        self.position += text.len();
        if self.nobr_depth > 0 {
            self.output.push_str(&strip_nobr_whitespace(text));
        } else {
            self.output.push_str(text);
        }
    }

    fn push_error(&mut self, error: InterpError) {
        let position = self.position;
        self.errors.push(Diagnostic::from(error).at(position));
    }

    fn handle_macro<'b>(&mut self, name: &str, args: &str, rest: &'b str) -> &'b str {
        self.position += name.len() + args.len() + 5;
        match name {
            "if" => self.handle_if(args, rest),
            "elseif" | "else" | "endif" => {
                self.push_error(InterpError::StrayConditionalTag {
                    tag: name.to_string(),
                });
                rest
            }
            "set" => {
                self.handle_set(args);
                rest
            }
            "print" => {
                self.handle_print(args);
                rest
            }
            "display" => {
                self.handle_display(args);
                rest
            }
            "nobr" => {
                self.nobr_depth += 1;
                rest
            }
            "endnobr" => {
                self.nobr_depth = self.nobr_depth.saturating_sub(1);
                rest
            }
            other => {
                let position = self.position;
                self.errors.push(
                    Diagnostic::new(
                        DiagnosticKind::UnmatchedMacroError,
                        format!("unknown macro `<<{other}>>`"),
                    )
                    .at(position),
                );
                rest
            }
        }
    }

    /// Resolve an entire `<<if>>`/`<<elseif>>`/`<<else>>`/`<<endif>>` chain:
    /// evaluate conditions left to right, render the first branch whose
    /// condition is truthy (or the trailing `<<else>>`), and skip the rest
    /// without evaluating them at all.
    fn handle_if<'b>(&mut self, cond_src: &str, rest: &'b str) -> &'b str {
        let mut cond_src = cond_src.to_string();
        let mut rest = rest;
        loop {
            let (branch, boundary, after) = scan::scan_to_boundary(rest);
            let (cond_result, cond_errors) = weave_template::evaluate_condition_str(
                &cond_src,
                &self.lookup(),
                self.config.entropy(),
            );
            let position = self.position;
            push_expr_errors(&mut self.errors, cond_errors, position);

            if cond_result {
                self.run(branch);
                return match boundary {
                    Boundary::Endif => after,
                    Boundary::Elseif(_) | Boundary::Else => scan::skip_whole_if(after),
                    Boundary::Eof => {
                        self.push_error(InterpError::UnterminatedIf);
                        after
                    }
                };
            }

            match boundary {
                Boundary::Endif => return after,
                Boundary::Else => {
                    let (else_branch, else_boundary, else_after) =
                        scan::scan_to_boundary(after);
                    self.run(else_branch);
                    return match else_boundary {
                        Boundary::Endif => else_after,
                        _ => {
                            self.push_error(InterpError::UnterminatedIf);
                            else_after
                        }
                    };
                }
                Boundary::Elseif(next_cond) => {
                    cond_src = next_cond.to_string();
                    rest = after;
                }
                Boundary::Eof => {
                    self.push_error(InterpError::UnterminatedIf);
                    return after;
                }
            }
        }
    }

    fn handle_set(&mut self, args: &str) {
        let position = self.position;
        if let Some((key, value)) = eval_set_macro(
            args,
            self.store,
            &self.scope,
            self.config.entropy(),
            &mut self.errors,
            position,
        ) {
            self.store.insert(key.clone(), value.clone());
            self.changes.insert(key, value);
        }
    }

    fn handle_print(&mut self, args: &str) {
        let (value, expr_errors) =
            weave_template::evaluate_str(args, &self.lookup(), self.config.entropy());
        let position = self.position;
        push_expr_errors(&mut self.errors, expr_errors, position);
        self.emit(&value.stringify());
    }

    fn handle_display(&mut self, args: &str) {
        let name = args.trim().trim_matches('"').to_string();

        if self.stack.iter().any(|visited| visited == &name) {
            self.push_error(InterpError::Cycle { name });
            return;
        }
        if self.stack.len() >= self.config.max_display_depth {
            self.push_error(InterpError::MaxDepthExceeded {
                max: self.config.max_display_depth,
            });
            return;
        }

        let passages = self.passages;
        let Some(passage) = passages.get(&name) else {
            self.emit(&format!("[missing: {name}]"));
            self.push_error(InterpError::MissingPassage { name });
            return;
        };

        self.stack.push(name);
        self.run(&passage.raw_body);
        self.stack.pop();
    }

    fn handle_link(&mut self, raw: &str) {
        let (display, target, setters, diagnostics) = parse_link_raw(raw);
        let position = self.position;
        self.errors
            .extend(diagnostics.into_iter().map(|d| d.at(position)));
        self.emit(&display.clone());
        self.links.push(Link {
            display,
            target,
            setters,
        });
    }
}

/// Evaluate a `<<set>>` macro's argument text (`$VAR OP EXPR`) against
/// `store`, returning the canonical store key and new value without
/// mutating `store` itself. Shared by the live interpreter (which also
/// tracks `variable_changes`) and the special-passage driver (§4.5), which
/// folds results straight into its draft store across passes.
pub(crate) fn eval_set_macro(
    args: &str,
    store: &VariableStore,
    scope: &ScopeAdapter,
    entropy: &dyn weave_util::Entropy,
    errors: &mut Vec<Diagnostic>,
    position: usize,
) -> Option<(String, Value)> {
    let Some((name, op, expr_src)) = split_set_args(args) else {
        errors.push(
            Diagnostic::new(
                DiagnosticKind::StructuralError,
                format!("malformed `<<set>>` clause: `{args}`"),
            )
            .at(position),
        );
        return None;
    };
    let Some(operator) = SetterOp::parse(op) else {
        errors.push(
            Diagnostic::new(
                DiagnosticKind::StructuralError,
                format!("unknown `<<set>>` operator `{op}`"),
            )
            .at(position),
        );
        return None;
    };

    let lookup = ScopedLookup { scope, store };
    let (rhs, expr_errors) = weave_template::evaluate_str(expr_src, &lookup, entropy);
    push_expr_errors(errors, expr_errors, position);

    let new_value = match operator {
        SetterOp::Assign | SetterOp::To => rhs,
        SetterOp::AddAssign | SetterOp::SubAssign | SetterOp::MulAssign | SetterOp::DivAssign => {
            let current = scope.get(store, name);
            let bin_op = match operator {
                SetterOp::AddAssign => BinaryOp::Add,
                SetterOp::SubAssign => BinaryOp::Sub,
                SetterOp::MulAssign => BinaryOp::Mul,
                SetterOp::DivAssign => BinaryOp::Div,
                _ => unreachable!("only compound ops reach here"),
            };
            let mut combine_errors = Vec::new();
            let value = weave_template::combine(bin_op, current, rhs, &mut combine_errors);
            push_expr_errors(errors, combine_errors, position);
            value
        }
    };

    let key = scope.key_for(name);
    Some((key, new_value))
}

/// Split `<<set>>`'s argument text (`$VAR OP EXPR`) into its three parts.
fn split_set_args(args: &str) -> Option<(&str, &str, &str)> {
    let args = args.trim();
    let var_part = args.strip_prefix('$')?;
    let (name, after_name) = var_part.split_once(char::is_whitespace)?;
    let after_name = after_name.trim_start();
    let (op, expr_src) = after_name.split_once(char::is_whitespace)?;
    Some((name, op, expr_src.trim_start()))
}

/// Collapse any run of whitespace (including newlines) introduced inside
/// `<<nobr>>...<<endnobr>>` to a single space, per §4.4, dropping it
/// entirely at the region's leading/trailing edges. `nobr` also normalizes
/// `<<print>>` output, per the spec's resolved Open Question.
fn strip_nobr_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a `[[...]]` link marker's inner text into display/target/setters.
/// `Display|Target` (or bare `Target`, used as both) may be followed by any
/// number of `[$VAR OP VALUE]` setter clauses.
fn parse_link_raw(raw: &str) -> (String, String, Vec<Setter>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let (head, mut setters_raw) = match raw.find('[') {
        Some(pos) => (&raw[..pos], &raw[pos..]),
        None => (raw, ""),
    };
    let (display, target) = match head.split_once('|') {
        Some((display, target)) => (display.to_string(), target.to_string()),
        None => (head.to_string(), head.to_string()),
    };

    let mut setters = Vec::new();
    while let Some(after_open) = setters_raw.strip_prefix('[') {
        let Some(end) = after_open.find(']') else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::StructuralError,
                "unterminated setter clause in link marker",
            ));
            break;
        };
        let clause = &after_open[..end];
        setters_raw = &after_open[end + 1..];
        match parse_setter_clause(clause) {
            Some(setter) => setters.push(setter),
            None => diagnostics.push(Diagnostic::new(
                DiagnosticKind::StructuralError,
                format!("malformed link setter clause `{clause}`"),
            )),
        }
    }

    (display, target, setters, diagnostics)
}

fn parse_setter_clause(clause: &str) -> Option<Setter> {
    let clause = clause.trim();
    let var_part = clause.strip_prefix('$')?;
    let (name, after_name) = var_part.split_once(char::is_whitespace)?;
    let after_name = after_name.trim_start();
    let (op_token, value) = after_name.split_once(char::is_whitespace)?;
    let operator = SetterOp::parse(op_token)?;
    Some(Setter {
        variable: name.to_string(),
        operator,
        value_literal: value.trim().to_string(),
    })
}
