use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Mutex;

/// A source of randomness injected into the template engine's `either()` and
/// `random()` functions. Implementations must be usable from behind a shared
/// reference so a single [Entropy] can be threaded through nested render
/// frames without the caller needing a `&mut` chain.
///
/// Grounded in the spec's design note: "accept an injected entropy source (a
/// callable producing a uniform float in `[0,1)`) so tests can make runs
/// deterministic."
pub trait Entropy: Send + Sync {
    /// Produce a uniformly distributed float in `[0, 1)`.
    fn next_f64(&self) -> f64;

    /// Produce a uniformly distributed integer in the inclusive range
    /// `[min, max]`. If `min > max` the bounds are swapped.
    fn next_range(&self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let span = (hi - lo) as f64 + 1.0;
        lo + (self.next_f64() * span).floor() as i64
    }

    /// Pick an index in `[0, len)`, uniformly. Returns `None` for `len == 0`.
    fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some((self.next_f64() * len as f64).floor() as usize)
        }
    }
}

/// Default entropy source, backed by the thread-local RNG. Non-deterministic;
/// used when the host doesn't care about reproducibility.
#[derive(Debug, Default)]
pub struct ThreadEntropy;

impl Entropy for ThreadEntropy {
    fn next_f64(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Deterministic entropy source seeded from a fixed `u64`. The CLI's
/// `--seed` flag constructs one of these so `either()`/`random()` calls are
/// reproducible across runs.
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Entropy for SeededEntropy {
    fn next_f64(&self) -> f64 {
        self.rng
            .lock()
            .expect("entropy mutex poisoned")
            .random::<f64>()
    }
}
