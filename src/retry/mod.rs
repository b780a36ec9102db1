//! Retry-with-timeout execution for blocking, fallible tasks.
//!
//! A [`RetryExecutor`] runs a task, optionally bounds each attempt with a
//! deadline, and retries failed attempts up to a fixed count with a fixed
//! interval in between:
//!
//! - **Pure decisions**: [`RetryConfig`] is plain data. Whether another
//!   attempt follows is [`RetryConfig::transition`], a pure function.
//! - **Tagged failures**: every failed attempt becomes an [`AttemptError`]
//!   (task error, timeout, interruption). All of them are retried; the tag is
//!   kept for the caller.
//! - **One terminal error**: callers only ever see a value or a
//!   [`RetryFailure`] wrapping the last cause.
//!
//! # Quick Start
//!
//! ```rust
//! use steadfast::RetryExecutor;
//! use std::time::Duration;
//!
//! let executor = RetryExecutor::builder()
//!     .with_max_attempts(3)?
//!     .with_timeout(Duration::from_secs(1))?
//!     .with_interval(Duration::from_millis(10))
//!     .build();
//!
//! let value = executor.run(|| Ok::<_, std::io::Error>(42)).unwrap();
//! assert_eq!(value, 42);
//! # Ok::<(), steadfast::InvalidConfig>(())
//! ```
//!
//! # Timeouts
//!
//! With a timeout, each attempt runs on a worker pool owned by the executor.
//! When the deadline passes the attempt fails with
//! [`AttemptError::Timeout`] and the task is abandoned: it keeps its thread
//! until it returns and its result is thrown away. The pool is released when
//! the executor is dropped or [`RetryExecutor::shutdown`] is called.
//!
//! # Error Types
//!
//! - [`InvalidConfig`]: returned by builder setters for out-of-range values
//! - [`AttemptError`]: why a single attempt failed
//! - [`RetryFailure`]: returned by [`RetryExecutor::run`] once attempts run out

mod config;
mod error;
mod executor;
mod interrupt;
mod outcome;
mod pool;

pub use config::{
    InvalidConfig, RetryConfig, RetryExecutorBuilder, RetryState, DEFAULT_INTERVAL,
    DEFAULT_MAX_ATTEMPTS,
};
pub use error::{RetryFailure, Trace};
pub use executor::{RetryEvent, RetryExecutor};
pub use interrupt::Interrupter;
pub use outcome::{AttemptError, FailureKind, Outcome};
