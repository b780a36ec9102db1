//! # Steadfast
//!
//! > *"Try again, but not forever"*
//!
//! A small Rust library that runs a blocking, fallible task with a bounded
//! number of attempts, an optional per-attempt timeout and a fixed pause
//! between attempts.
//!
//! ## Quick Example
//!
//! ```rust
//! use steadfast::RetryExecutor;
//! use std::time::Duration;
//!
//! let executor = RetryExecutor::builder()
//!     .with_max_attempts(2)?
//!     .with_interval(Duration::from_millis(1))
//!     .build();
//!
//! match executor.run(|| std::fs::read_to_string("/definitely/not/here")) {
//!     Ok(contents) => println!("read {} bytes", contents.len()),
//!     Err(failure) => {
//!         assert_eq!(failure.attempts(), 2);
//!         println!("{}: {}", failure.retry_message(), failure);
//!     }
//! }
//! # Ok::<(), steadfast::InvalidConfig>(())
//! ```
//!
//! See the [`retry`] module for the details of timeouts and failure causes.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod retry;
pub mod testing;

// Re-exports
pub use retry::{
    AttemptError, FailureKind, Interrupter, InvalidConfig, Outcome, RetryConfig, RetryEvent,
    RetryExecutor, RetryExecutorBuilder, RetryFailure, RetryState, Trace,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::retry::{
        AttemptError, FailureKind, Interrupter, InvalidConfig, Outcome, RetryConfig,
        RetryExecutor, RetryFailure,
    };
}
