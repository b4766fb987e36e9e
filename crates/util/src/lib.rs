//! Small utilities with no obvious home in `weave_template` or `weave_core`.

mod entropy;
#[cfg(any(test, feature = "test"))]
mod test_util;

pub use entropy::{Entropy, SeededEntropy, ThreadEntropy};
#[cfg(any(test, feature = "test"))]
pub use test_util::FixedEntropy;

/// Assert that a `Result` is an `Err`, and that its display/debug form
/// contains the given substring. Useful since most of this workspace's
/// errors are compared by message rather than by variant.
#[macro_export]
macro_rules! assert_err {
    ($e:expr, $msg:expr) => {{
        let err = ($e).unwrap_err();
        let actual = err.to_string();
        assert!(
            actual.contains($msg),
            "Expected error message to contain {:?}, but was {:?}",
            $msg,
            actual
        );
    }};
}
