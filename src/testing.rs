//! Testing utilities for code that runs tasks through a [`RetryExecutor`].
//!
//! Tasks handed to an executor are moved into it, so tests need a side
//! channel to see how often a task ran. [`counted`] wraps a task and hands
//! back a [`CallCounter`] for exactly that.
//!
//! # Examples
//!
//! ## Counting attempts
//!
//! ```rust
//! use steadfast::RetryExecutor;
//! use steadfast::testing::fail_first;
//! use std::time::Duration;
//!
//! let executor = RetryExecutor::builder()
//!     .with_max_attempts(5)?
//!     .with_interval(Duration::ZERO)
//!     .build();
//!
//! let (task, calls) = fail_first(2, || "flaky", 42);
//! assert_eq!(executor.run(task).unwrap(), 42);
//! assert_eq!(calls.get(), 3);
//! # Ok::<(), steadfast::InvalidConfig>(())
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use steadfast::{assert_exhausted, assert_failure_kind, FailureKind, RetryExecutor};
//! use std::time::Duration;
//!
//! let executor = RetryExecutor::builder()
//!     .with_max_attempts(2)?
//!     .with_interval(Duration::ZERO)
//!     .build();
//!
//! let result = executor.run(|| Err::<(), _>("nope"));
//! assert_failure_kind!(result, FailureKind::Execution);
//! assert_exhausted!(result, 2);
//! # Ok::<(), steadfast::InvalidConfig>(())
//! ```
//!
//! [`RetryExecutor`]: crate::RetryExecutor

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared count of task invocations.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicU32>,
}

impl CallCounter {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls recorded so far.
    pub fn get(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Record a call, returning its 1-indexed number.
    pub fn record(&self) -> u32 {
        self.calls.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Wrap `task` so every invocation is counted.
///
/// `task` receives the 1-indexed number of the current call.
///
/// # Example
///
/// ```rust
/// use steadfast::testing::counted;
///
/// let (task, calls) = counted(|n| if n < 2 { Err("early") } else { Ok(n) });
/// assert_eq!(task(), Err("early"));
/// assert_eq!(task(), Ok(2));
/// assert_eq!(calls.get(), 2);
/// ```
pub fn counted<T, E, F>(
    task: F,
) -> (
    impl Fn() -> Result<T, E> + Send + Sync + 'static,
    CallCounter,
)
where
    T: 'static,
    E: 'static,
    F: Fn(u32) -> Result<T, E> + Send + Sync + 'static,
{
    let counter = CallCounter::new();
    let calls = counter.clone();
    (move || task(calls.record()), counter)
}

/// A counted task that fails its first `failures` calls, then returns `value`.
pub fn fail_first<T, E, M>(
    failures: u32,
    make_error: M,
    value: T,
) -> (
    impl Fn() -> Result<T, E> + Send + Sync + 'static,
    CallCounter,
)
where
    T: Clone + Send + Sync + 'static,
    E: 'static,
    M: Fn() -> E + Send + Sync + 'static,
{
    counted(move |n| {
        if n <= failures {
            Err(make_error())
        } else {
            Ok(value.clone())
        }
    })
}

/// A counted task that always fails.
pub fn always_fail<T, E, M>(
    make_error: M,
) -> (
    impl Fn() -> Result<T, E> + Send + Sync + 'static,
    CallCounter,
)
where
    T: 'static,
    E: 'static,
    M: Fn() -> E + Send + Sync + 'static,
{
    counted(move |_| Err(make_error()))
}

/// Assert that a retry run gave up after the expected number of attempts.
///
/// # Example
///
/// ```rust
/// use steadfast::{assert_exhausted, RetryExecutor};
///
/// let executor = RetryExecutor::builder().build();
/// assert_exhausted!(executor.run(|| Err::<(), _>("down")), 1);
/// ```
#[macro_export]
macro_rules! assert_exhausted {
    ($result:expr, $attempts:expr) => {
        match &$result {
            Err(failure) => {
                assert_eq!(
                    failure.attempts(),
                    $attempts,
                    "unexpected attempt count ({})",
                    failure.retry_message()
                );
            }
            Ok(v) => {
                panic!("Expected RetryFailure, got Ok: {:?}", v);
            }
        }
    };
}

/// Assert that a retry run failed with a cause of the given [`FailureKind`].
///
/// [`FailureKind`]: crate::FailureKind
#[macro_export]
macro_rules! assert_failure_kind {
    ($result:expr, $kind:expr) => {
        match &$result {
            Err(failure) => {
                assert_eq!(failure.kind(), Some($kind));
            }
            Ok(v) => {
                panic!("Expected RetryFailure with kind {:?}, got Ok: {:?}", $kind, v);
            }
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl Arbitrary for crate::RetryConfig {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    // Intervals stay short so generated configs are cheap to run.
    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            1u32..=10,
            proptest::option::of(1u64..=10_000),
            0u64..=5,
        )
            .prop_filter_map("valid config", |(attempts, timeout_ms, interval_ms)| {
                crate::RetryConfig::try_new(
                    attempts,
                    timeout_ms.map(std::time::Duration::from_millis),
                    std::time::Duration::from_millis(interval_ms),
                )
                .ok()
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FailureKind, RetryExecutor};
    use std::time::Duration;

    fn quick(attempts: i64) -> RetryExecutor {
        RetryExecutor::builder()
            .with_max_attempts(attempts)
            .unwrap()
            .with_interval(Duration::ZERO)
            .build()
    }

    #[test]
    fn counter_starts_at_zero() {
        assert_eq!(CallCounter::new().get(), 0);
    }

    #[test]
    fn counter_is_shared_between_clones() {
        let counter = CallCounter::new();
        let other = counter.clone();
        assert_eq!(other.record(), 1);
        assert_eq!(counter.record(), 2);
        assert_eq!(other.get(), 2);
    }

    #[test]
    fn fail_first_fails_then_succeeds() {
        let (task, calls) = fail_first(1, || "nope", 5);
        assert_eq!(task(), Err("nope"));
        assert_eq!(task(), Ok(5));
        assert_eq!(task(), Ok(5));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn always_fail_never_succeeds() {
        let (task, calls) = always_fail::<(), _, _>(|| "down");
        for _ in 0..4 {
            assert_eq!(task(), Err("down"));
        }
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn assert_exhausted_macro() {
        let result = quick(3).run(|| Err::<(), _>("x"));
        assert_exhausted!(result, 3);
    }

    #[test]
    fn assert_failure_kind_macro() {
        let result = quick(1).run(|| Err::<(), _>("x"));
        assert_failure_kind!(result, FailureKind::Execution);
    }

    #[test]
    #[should_panic(expected = "Expected RetryFailure, got Ok")]
    fn assert_exhausted_panics_on_success() {
        let result = quick(1).run(|| Ok::<_, String>(1));
        assert_exhausted!(result, 1);
    }

    #[test]
    #[should_panic(expected = "unexpected attempt count")]
    fn assert_exhausted_panics_on_wrong_count() {
        let result = quick(2).run(|| Err::<(), _>("x"));
        assert_exhausted!(result, 5);
    }

    #[cfg(feature = "proptest")]
    mod proptest_tests {
        use crate::RetryConfig;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn retry_config_arbitrary_is_valid(config in any::<RetryConfig>()) {
                prop_assert!(config.validate().is_ok());
                prop_assert!(config.max_attempts() >= 1);
            }
        }
    }
}
