//! Interrupting a waiting executor from another thread.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

/// Handle that interrupts the thread running a [`RetryExecutor`].
///
/// An interrupt behaves like a thread interrupt flag:
///
/// - while the executor waits on a timeout-bounded attempt, the wait ends
///   and the attempt fails with [`AttemptError::Interrupted`];
/// - while the executor sleeps between attempts, the sleep ends early and the
///   next attempt starts;
/// - otherwise the interrupt stays pending until the next wait or sleep
///   consumes it.
///
/// The running task itself is never told; it is abandoned, not stopped.
///
/// # Examples
///
/// ```rust
/// use steadfast::RetryExecutor;
/// use std::time::Duration;
///
/// let executor = RetryExecutor::builder()
///     .with_timeout(Duration::from_secs(30))?
///     .build();
///
/// let interrupter = executor.interrupter();
/// std::thread::spawn(move || {
///     std::thread::sleep(Duration::from_millis(50));
///     interrupter.interrupt();
/// });
///
/// let failure = executor
///     .run(|| {
///         std::thread::sleep(Duration::from_secs(5));
///         Ok::<_, std::io::Error>(())
///     })
///     .unwrap_err();
/// assert!(failure.cause().unwrap().is_interrupted());
/// # Ok::<(), steadfast::InvalidConfig>(())
/// ```
///
/// [`RetryExecutor`]: crate::RetryExecutor
/// [`AttemptError::Interrupted`]: crate::AttemptError::Interrupted
#[derive(Debug, Clone, Default)]
pub struct Interrupter {
    state: Arc<InterruptState>,
}

#[derive(Debug, Default)]
struct InterruptState {
    pending: Mutex<bool>,
    wakeup: Condvar,
    notify: Notify,
}

impl InterruptState {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Interrupter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Interrupt the current wait, or the next one if nothing is waiting.
    pub fn interrupt(&self) {
        *self.state.lock() = true;
        self.state.wakeup.notify_all();
        self.state.notify.notify_waiters();
    }

    /// Returns true if an interrupt has not been consumed yet.
    pub fn is_pending(&self) -> bool {
        *self.state.lock()
    }

    /// Clear the flag, returning whether it was set.
    pub(crate) fn take(&self) -> bool {
        std::mem::take(&mut *self.state.lock())
    }

    /// Block for `duration`, returning `true` if an interrupt cut it short.
    pub(crate) fn sleep(&self, duration: Duration) -> bool {
        let guard = self.state.lock();
        let (mut pending, _) = self
            .state
            .wakeup
            .wait_timeout_while(guard, duration, |pending| !*pending)
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *pending)
    }

    /// Resolve once an interrupt arrives, consuming it.
    pub(crate) async fn interrupted(&self) {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so an interrupt landing in
            // between still wakes us.
            notified.as_mut().enable();
            if self.take() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod interrupt_tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_interrupt_sets_pending() {
        let interrupter = Interrupter::new();
        assert!(!interrupter.is_pending());
        interrupter.interrupt();
        assert!(interrupter.is_pending());
        assert!(interrupter.take());
        assert!(!interrupter.is_pending());
    }

    #[test]
    fn test_sleep_runs_full_duration_without_interrupt() {
        let interrupter = Interrupter::new();
        let start = Instant::now();
        assert!(!interrupter.sleep(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_pending_interrupt_ends_sleep_immediately() {
        let interrupter = Interrupter::new();
        interrupter.interrupt();

        let start = Instant::now();
        assert!(interrupter.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!interrupter.is_pending());
    }

    #[test]
    fn test_interrupt_from_other_thread_wakes_sleep() {
        let interrupter = Interrupter::new();
        let remote = interrupter.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.interrupt();
        });

        let start = Instant::now();
        assert!(interrupter.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_interrupted_resolves_on_pending_flag() {
        let interrupter = Interrupter::new();
        interrupter.interrupt();
        interrupter.interrupted().await;
        assert!(!interrupter.is_pending());
    }

    #[tokio::test]
    async fn test_interrupted_resolves_on_later_interrupt() {
        let interrupter = Interrupter::new();
        let remote = interrupter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            remote.interrupt();
        });

        tokio::time::timeout(Duration::from_secs(5), interrupter.interrupted())
            .await
            .unwrap();
    }
}
