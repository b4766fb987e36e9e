//! The variable scope adapter (§4.7): translates `$NAME` references to
//! canonical store keys, either bare (GLOBAL) or username-prefixed
//! (PREFIXED). Kept as a small injected value rather than process-wide
//! state, per the spec's design notes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weave_template::{Value, VariableLookup};

/// The backing store for variables, keyed by each mode's canonical key.
/// An `IndexMap` so `RenderResult.variable_changes` preserves write order.
pub type VariableStore = IndexMap<String, Value>;

/// How `$NAME` references are translated to store keys.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ScopeMode {
    /// Canonical key is the uppercased variable name.
    #[default]
    Global,
    /// Canonical key is `<username>_<NAME>` (NAME uppercased, username
    /// casing preserved as supplied).
    Prefixed { username: String },
}

/// Configured once per parser/render call; translates names to keys but
/// holds no mutable state of its own.
#[derive(Clone, Debug, Default)]
pub struct ScopeAdapter {
    mode: ScopeMode,
}

impl ScopeAdapter {
    pub fn new(mode: ScopeMode) -> Self {
        Self { mode }
    }

    /// Derive the canonical store key for a bare variable name (no `$`
    /// sigil). Case-insensitive on the name portion in both modes, per the
    /// spec's resolved Open Question.
    pub fn key_for(&self, name: &str) -> String {
        let upper = name.to_ascii_uppercase();
        match &self.mode {
            ScopeMode::Global => upper,
            ScopeMode::Prefixed { username } => format!("{username}_{upper}"),
        }
    }

    /// Read a variable. Missing keys read as integer zero (§3: "never
    /// fail").
    pub fn get(&self, store: &VariableStore, name: &str) -> Value {
        store
            .get(&self.key_for(name))
            .cloned()
            .unwrap_or(Value::Integer(0))
    }

    /// Write a variable at its canonical key, returning the key so callers
    /// can record it in `variable_changes`.
    pub fn set(&self, store: &mut VariableStore, name: &str, value: Value) -> String {
        let key = self.key_for(name);
        store.insert(key.clone(), value);
        key
    }
}

/// Adapts a [ScopeAdapter] + [VariableStore] pair to
/// `weave_template::VariableLookup`, so the expression evaluator can resolve
/// `$NAME` references without knowing about scope modes at all.
pub struct ScopedLookup<'a> {
    pub scope: &'a ScopeAdapter,
    pub store: &'a VariableStore,
}

impl VariableLookup for ScopedLookup<'_> {
    fn lookup(&self, name: &str) -> Value {
        self.scope.get(self.store, name)
    }
}
