//! The special-passage driver (§4.5): seeds `ParseResult.story_init_vars`
//! from `StoryInit`, derives `ParseResult.test_setup_vars` from `TestSetup`
//! via the three-pass algorithm, and surfaces `StoryTitle`'s trimmed body.
//!
//! None of this executes `print`, `display`, or `nobr` — only `<<set>>` and
//! the `<<if>>` chains that guard it matter here, so this walks the body
//! with its own small state machine rather than reusing the live
//! interpreter (which also builds rendered text and a link list neither
//! pass needs).

use indexmap::IndexMap;
use weave_util::Entropy;

use crate::error::Diagnostic;
use crate::interp::eval_set_macro;
use crate::model::Passage;
use crate::scan::{self, Boundary, Special};
use crate::scope::{ScopeAdapter, ScopedLookup, VariableStore};

/// `StoryInit`: execute every top-level (unconditional) `<<set>>` against an
/// empty store. Assignments nested inside any `<<if>>` are not extracted,
/// per §4.5 — `<<if>>` chains are skipped wholesale, not recursed into.
pub(crate) fn story_init_vars(
    body: &str,
    scope: &ScopeAdapter,
    entropy: &dyn Entropy,
    errors: &mut Vec<Diagnostic>,
) -> VariableStore {
    let mut store = VariableStore::new();
    run_top_level_sets(body, &mut store, scope, entropy, errors);
    store
}

/// `TestSetup`'s three-pass algorithm (§4.5):
/// 1. collect unconditional top-level sets into a draft store;
/// 2. walk every `<<if>>` chain, evaluating conditions against the draft
///    store, and merge the selected branch's sets into it (recursively, for
///    nested conditionals);
/// 3. re-run pass 1 so top-level sets that reference pass-2 values settle
///    to their final value.
pub(crate) fn test_setup_vars(
    body: &str,
    scope: &ScopeAdapter,
    entropy: &dyn Entropy,
    errors: &mut Vec<Diagnostic>,
) -> VariableStore {
    let mut store = VariableStore::new();
    run_top_level_sets(body, &mut store, scope, entropy, errors); // pass 1
    run_conditional_sets(body, &mut store, scope, entropy, errors); // pass 2
    run_top_level_sets(body, &mut store, scope, entropy, errors); // pass 3
    store
}

/// `StoryTitle` carries no macro-execution protocol; its trimmed raw body is
/// surfaced as-is for host collaborators (§4.5).
pub(crate) fn story_title(passages: &IndexMap<String, Passage>) -> Option<String> {
    passages
        .get("StoryTitle")
        .map(|passage| passage.raw_body.trim().to_owned())
}

/// Walk `body`, executing every `<<set>>` found at nesting depth zero and
/// skipping each `<<if>>...<<endif>>` chain in its entirety without
/// evaluating any of its branches.
fn run_top_level_sets(
    body: &str,
    store: &mut VariableStore,
    scope: &ScopeAdapter,
    entropy: &dyn Entropy,
    errors: &mut Vec<Diagnostic>,
) {
    let mut rest = body;
    loop {
        match scan::next_special(rest) {
            None => return,
            Some((_, Special::Macro { name: "if", .. }, after)) => {
                rest = scan::skip_whole_if(after);
            }
            Some((_, Special::Macro { name: "set", args }, after)) => {
                apply_set(args, store, scope, entropy, errors);
                rest = after;
            }
            Some((_, Special::UnterminatedMacro { .. } | Special::UnterminatedLink, _)) => {
                return;
            }
            Some((_, _, after)) => rest = after,
        }
    }
}

/// Walk `body`, resolving every `<<if>>` chain found at nesting depth zero
/// against `store` and merging the selected branch's sets (recursively)
/// into it. Top-level `<<set>>`s are re-applied too, so later branches can
/// see earlier ones' effects within the same pass.
fn run_conditional_sets(
    body: &str,
    store: &mut VariableStore,
    scope: &ScopeAdapter,
    entropy: &dyn Entropy,
    errors: &mut Vec<Diagnostic>,
) {
    let mut rest = body;
    loop {
        match scan::next_special(rest) {
            None => return,
            Some((_, Special::Macro { name: "if", args }, after)) => {
                rest = resolve_if_chain(args, after, store, scope, entropy, errors);
            }
            Some((_, Special::Macro { name: "set", args }, after)) => {
                apply_set(args, store, scope, entropy, errors);
                rest = after;
            }
            Some((_, Special::UnterminatedMacro { .. } | Special::UnterminatedLink, _)) => {
                return;
            }
            Some((_, _, after)) => rest = after,
        }
    }
}

/// Resolve one `<<if>>...<<endif>>` chain against `store`: evaluate each
/// condition left to right, and for the first truthy one (or a trailing
/// `<<else>>`), recurse into its branch text via [run_conditional_sets] so
/// nested conditionals are resolved too. Returns the text after the whole
/// chain.
fn resolve_if_chain<'a>(
    cond_src: &str,
    rest: &'a str,
    store: &mut VariableStore,
    scope: &ScopeAdapter,
    entropy: &dyn Entropy,
    errors: &mut Vec<Diagnostic>,
) -> &'a str {
    let mut cond_src = cond_src.to_owned();
    let mut rest = rest;
    loop {
        let (branch, boundary, after) = scan::scan_to_boundary(rest);
        let lookup = ScopedLookup { scope, store };
        let (truthy, cond_errors) =
            weave_template::evaluate_condition_str(&cond_src, &lookup, entropy);
        errors.extend(cond_errors.into_iter().map(Diagnostic::from));

        if truthy {
            run_conditional_sets(branch, store, scope, entropy, errors);
            return match boundary {
                Boundary::Endif => after,
                Boundary::Elseif(_) | Boundary::Else => scan::skip_whole_if(after),
                Boundary::Eof => after,
            };
        }

        match boundary {
            Boundary::Endif => return after,
            Boundary::Else => {
                let (else_branch, _, else_after) = scan::scan_to_boundary(after);
                run_conditional_sets(else_branch, store, scope, entropy, errors);
                return else_after;
            }
            Boundary::Elseif(next_cond) => {
                cond_src = next_cond.to_owned();
                rest = after;
            }
            Boundary::Eof => return after,
        }
    }
}

fn apply_set(
    args: &str,
    store: &mut VariableStore,
    scope: &ScopeAdapter,
    entropy: &dyn Entropy,
    errors: &mut Vec<Diagnostic>,
) {
    if let Some((key, value)) = eval_set_macro(args, store, scope, entropy, errors, 0) {
        store.insert(key, value);
    }
}
