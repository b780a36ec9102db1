//! Worker pool backing timeout-bounded attempts.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{debug, warn};

use super::interrupt::Interrupter;
use super::outcome::AttemptError;

// tokio adds the worker count to this cap, so it must leave headroom below
// `usize::MAX`.
const MAX_BLOCKING_THREADS: usize = usize::MAX / 2;

/// Blocking-thread pool owned by one executor.
///
/// Tasks run on the runtime's blocking threads, which are spawned on demand
/// and reaped once idle. A task that outlives its deadline keeps its thread
/// until it returns; its result is dropped.
///
/// The thread count is capped at `MAX_BLOCKING_THREADS` rather than
/// tokio's default of 512, so in practice only the OS limits how many
/// abandoned tasks can pile up before a fresh attempt has to queue.
#[derive(Debug)]
pub(crate) struct WorkerPool {
    runtime: Runtime,
}

impl WorkerPool {
    pub(crate) fn start() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(MAX_BLOCKING_THREADS)
            .thread_name("steadfast-worker")
            .enable_time()
            .build()?;
        debug!("started retry worker pool");
        Ok(Self { runtime })
    }

    /// Run `task` on the pool and wait at most `timeout` for it.
    ///
    /// A panic inside the task is resumed on the calling thread.
    pub(crate) fn run_bounded<T, E, F>(
        &self,
        task: &Arc<F>,
        timeout: Duration,
        interrupter: &Interrupter,
    ) -> Result<T, AttemptError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        let task = Arc::clone(task);
        let mut handle = self.runtime.spawn_blocking(move || task());

        let waited = self.runtime.block_on(async {
            tokio::select! {
                joined = tokio::time::timeout(timeout, &mut handle) => Some(joined),
                () = interrupter.interrupted() => None,
            }
        });

        match waited {
            Some(Ok(Ok(result))) => result.map_err(AttemptError::Execution),
            Some(Ok(Err(join_error))) => {
                if join_error.is_panic() {
                    std::panic::resume_unwind(join_error.into_panic());
                }
                Err(AttemptError::Interrupted)
            }
            Some(Err(_elapsed)) => {
                // Only stops a task that has not started yet.
                handle.abort();
                warn!(
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "attempt timed out, abandoning the running task"
                );
                Err(AttemptError::timeout(timeout))
            }
            None => {
                handle.abort();
                debug!("wait for bounded attempt interrupted");
                Err(AttemptError::Interrupted)
            }
        }
    }

    /// Release the pool without waiting for abandoned tasks.
    pub(crate) fn shutdown(self) {
        self.runtime.shutdown_background();
        debug!("released retry worker pool");
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;
    use std::time::Instant;

    fn pool() -> WorkerPool {
        WorkerPool::start().unwrap()
    }

    #[test]
    fn test_bounded_success() {
        let pool = pool();
        let task = Arc::new(|| Ok::<_, String>(42));
        let result = pool.run_bounded(&task, Duration::from_secs(1), &Interrupter::new());
        assert_eq!(result.unwrap(), 42);
        pool.shutdown();
    }

    #[test]
    fn test_bounded_task_error_is_execution() {
        let pool = pool();
        let task = Arc::new(|| Err::<i32, _>("inner error".to_string()));
        let result = pool.run_bounded(&task, Duration::from_secs(1), &Interrupter::new());
        assert!(matches!(result, Err(AttemptError::Execution(e)) if e == "inner error"));
        pool.shutdown();
    }

    #[test]
    fn test_bounded_timeout_returns_early() {
        let pool = pool();
        let task = Arc::new(|| {
            std::thread::sleep(Duration::from_secs(10));
            Ok::<_, String>(42)
        });

        let start = Instant::now();
        let result = pool.run_bounded(&task, Duration::from_millis(20), &Interrupter::new());

        assert!(matches!(result, Err(AttemptError::Timeout { duration }) if duration == Duration::from_millis(20)));
        assert!(start.elapsed() < Duration::from_secs(5));
        pool.shutdown();
    }

    #[test]
    fn test_bounded_pending_interrupt() {
        let pool = pool();
        let interrupter = Interrupter::new();
        interrupter.interrupt();
        let task = Arc::new(|| {
            std::thread::sleep(Duration::from_secs(10));
            Ok::<_, String>(42)
        });

        let result = pool.run_bounded(&task, Duration::from_secs(30), &interrupter);

        assert!(matches!(result, Err(AttemptError::Interrupted)));
        assert!(!interrupter.is_pending());
        pool.shutdown();
    }

    #[test]
    fn test_abandoned_tasks_do_not_starve_new_attempts() {
        let pool = pool();
        for _ in 0..520 {
            pool.runtime.spawn_blocking(|| std::thread::sleep(Duration::from_secs(3)));
        }

        let task = Arc::new(|| Ok::<_, String>(7));
        let result = pool.run_bounded(&task, Duration::from_secs(2), &Interrupter::new());

        assert_eq!(result.unwrap(), 7);
        pool.shutdown();
    }

    #[test]
    #[should_panic(expected = "task blew up")]
    fn test_bounded_panic_is_resumed() {
        let pool = pool();
        let task = Arc::new(|| -> Result<i32, String> { panic!("task blew up") });
        let _ = pool.run_bounded(&task, Duration::from_secs(1), &Interrupter::new());
    }
}
