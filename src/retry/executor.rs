//! The retry loop.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::config::{RetryConfig, RetryExecutorBuilder, RetryState};
use super::error::RetryFailure;
use super::interrupt::Interrupter;
use super::outcome::{AttemptError, Outcome};
use super::pool::WorkerPool;

/// Information about a failed attempt, passed to hooks.
#[derive(Debug)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// Why it failed.
    pub error: &'a AttemptError<E>,
    /// Delay before the next attempt, or `None` if this was the last one.
    pub next_delay: Option<Duration>,
    /// Time since the first attempt started.
    pub elapsed: Duration,
}

/// Runs a fallible task until it succeeds or the attempts run out.
///
/// Attempts are strictly sequential and run on the calling thread, which
/// blocks for the whole loop, including the fixed interval between
/// attempts. With a timeout configured, each attempt runs on a worker pool
/// that is created on first use and kept until the executor is dropped.
///
/// `run` blocks the current thread, so it must not be called from inside
/// an async runtime.
///
/// # Examples
///
/// ```rust
/// use steadfast::RetryExecutor;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// let executor = RetryExecutor::builder()
///     .with_max_attempts(3)?
///     .with_interval(Duration::from_millis(1))
///     .build();
///
/// let calls = AtomicU32::new(0);
/// let value = executor
///     .run(move || match calls.fetch_add(1, Ordering::SeqCst) {
///         0 => Err("transient"),
///         n => Ok(n + 1),
///     })
///     .unwrap();
///
/// assert_eq!(value, 2);
/// # Ok::<(), steadfast::InvalidConfig>(())
/// ```
#[derive(Debug)]
pub struct RetryExecutor {
    config: RetryConfig,
    pool: Mutex<Option<Arc<WorkerPool>>>,
    interrupter: Interrupter,
}

impl RetryExecutor {
    /// Start building an executor.
    pub fn builder() -> RetryExecutorBuilder {
        RetryExecutorBuilder::new()
    }

    pub(crate) fn new(config: RetryConfig) -> Self {
        Self {
            config,
            pool: Mutex::new(None),
            interrupter: Interrupter::new(),
        }
    }

    /// The configuration this executor was built with.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Total number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts()
    }

    /// Per-attempt timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.config.timeout()
    }

    /// Delay between attempts.
    pub fn interval(&self) -> Duration {
        self.config.interval()
    }

    /// A handle that interrupts this executor's waits.
    ///
    /// Every handle from the same executor shares one flag.
    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    /// Returns true once a timeout-bounded attempt has created the pool.
    pub fn has_worker_pool(&self) -> bool {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run `task` until it succeeds or the attempts run out.
    ///
    /// Returns the first successful value. Otherwise returns a
    /// [`RetryFailure`] wrapping the cause of the last attempt; errors from
    /// earlier attempts are dropped.
    pub fn run<T, E, F>(&self, task: F) -> Result<T, RetryFailure<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        self.run_with_hooks(task, |_: &RetryEvent<'_, E>| {})
    }

    /// Like [`run`](Self::run), calling `on_retry` after every failed attempt.
    ///
    /// The hook runs synchronously on the calling thread and should not
    /// block. On the last attempt `next_delay` is `None`.
    ///
    /// ```rust
    /// use steadfast::{RetryEvent, RetryExecutor};
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::time::Duration;
    ///
    /// let executor = RetryExecutor::builder()
    ///     .with_max_attempts(3)?
    ///     .with_interval(Duration::ZERO)
    ///     .build();
    ///
    /// let hook_calls = AtomicU32::new(0);
    /// let result = executor.run_with_hooks(
    ///     || Err::<(), _>("down"),
    ///     |event: &RetryEvent<'_, &str>| {
    ///         hook_calls.fetch_add(1, Ordering::SeqCst);
    ///         assert_eq!(event.next_delay.is_none(), event.attempt == 3);
    ///     },
    /// );
    ///
    /// assert!(result.is_err());
    /// assert_eq!(hook_calls.load(Ordering::SeqCst), 3);
    /// # Ok::<(), steadfast::InvalidConfig>(())
    /// ```
    pub fn run_with_hooks<T, E, F, H>(&self, task: F, on_retry: H) -> Result<T, RetryFailure<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        H: Fn(&RetryEvent<'_, E>),
    {
        let task = Arc::new(task);
        let start = Instant::now();
        let max_attempts = self.config.max_attempts();
        let interval = self.config.interval();
        let mut attempt = 1u32;

        loop {
            let outcome = self.attempt(&task);
            let state = self.config.transition(attempt, &outcome);

            let error = match outcome {
                Outcome::Success(value) => {
                    debug!(attempt, "attempt succeeded");
                    return Ok(value);
                }
                Outcome::Failure(error) => error,
            };

            let next_delay = (state == RetryState::RetryWait).then_some(interval);
            on_retry(&RetryEvent {
                attempt,
                error: &error,
                next_delay,
                elapsed: start.elapsed(),
            });

            if state == RetryState::Exhausted {
                return Err(RetryFailure::exhausted(error, attempt, start.elapsed()));
            }

            info!(
                attempt,
                max_attempts,
                kind = %error.kind(),
                "attempt failed, retrying in {} ms",
                interval.as_millis()
            );
            if self.interrupter.sleep(interval) {
                debug!(attempt, "retry wait interrupted, starting next attempt early");
            }
            attempt = attempt.saturating_add(1);
        }
    }

    /// Release the worker pool now instead of on drop.
    ///
    /// Tasks abandoned after a timeout are not waited for.
    pub fn shutdown(mut self) {
        self.release_pool();
    }

    fn attempt<T, E, F>(&self, task: &Arc<F>) -> Outcome<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        let result = match self.config.timeout() {
            None => task().map_err(AttemptError::Execution),
            Some(timeout) => match self.worker_pool() {
                Ok(pool) => pool.run_bounded(task, timeout, &self.interrupter),
                Err(e) => Err(AttemptError::PoolUnavailable(e)),
            },
        };
        Outcome::from(result)
    }

    fn worker_pool(&self) -> std::io::Result<Arc<WorkerPool>> {
        let mut slot = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(pool) => Ok(Arc::clone(pool)),
            None => {
                let pool = Arc::new(WorkerPool::start()?);
                *slot = Some(Arc::clone(&pool));
                Ok(pool)
            }
        }
    }

    fn release_pool(&mut self) {
        let pool = self
            .pool
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pool) = pool.and_then(Arc::into_inner) {
            pool.shutdown();
        }
    }
}

impl Drop for RetryExecutor {
    fn drop(&mut self) {
        self.release_pool();
    }
}
