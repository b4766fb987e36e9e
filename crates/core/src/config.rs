//! `StoryConfig`: engine-wide knobs that live outside a single render call,
//! analogous to the teacher crate's `TemplateContext`/`Config` threading.

use std::sync::Arc;

use weave_util::{Entropy, ThreadEntropy};

use crate::scope::ScopeMode;

/// Defensive bound on `display` recursion depth (§5, §9). The cycle-detection
/// stack already prevents true infinite recursion, but a long acyclic chain
/// of distinct passages could still exhaust the call stack; this caps it.
pub const DEFAULT_MAX_DISPLAY_DEPTH: usize = 128;

/// Constructed once by the host and threaded through `parse`/`render`, the
/// way the teacher threads a render context through a template render.
#[derive(Clone)]
pub struct StoryConfig {
    pub scope_mode: ScopeMode,
    pub max_display_depth: usize,
    entropy: Arc<dyn Entropy>,
}

impl StoryConfig {
    pub fn new(scope_mode: ScopeMode, entropy: Arc<dyn Entropy>) -> Self {
        Self {
            scope_mode,
            max_display_depth: DEFAULT_MAX_DISPLAY_DEPTH,
            entropy,
        }
    }

    #[must_use]
    pub fn with_max_display_depth(mut self, max: usize) -> Self {
        self.max_display_depth = max;
        self
    }

    pub fn entropy(&self) -> &dyn Entropy {
        self.entropy.as_ref()
    }
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self::new(ScopeMode::default(), Arc::new(ThreadEntropy))
    }
}
