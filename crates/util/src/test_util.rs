use crate::Entropy;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An entropy source that cycles through a fixed list of `[0, 1)` values,
/// for deterministic assertions on `either()`/`random()` in tests.
pub struct FixedEntropy {
    values: Vec<f64>,
    index: AtomicUsize,
}

impl FixedEntropy {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            index: AtomicUsize::new(0),
        }
    }
}

impl Entropy for FixedEntropy {
    fn next_f64(&self) -> f64 {
        let i = self.index.fetch_add(1, Ordering::SeqCst) % self.values.len();
        self.values[i]
    }
}
