//! Long Running Task Example
//!
//! Submits a task that sleeps far longer than the executor's timeout and
//! logs the terminal failure. Shows:
//! - Building an executor with a single attempt and a 1 second timeout
//! - The attempt timing out after ~1s instead of waiting 100s
//! - Logging the failure and its cause chain
//! - A second executor that retries a flaky task
//!
//! Run with: cargo run --example long_running_task

use std::time::{Duration, Instant};

use steadfast::testing::fail_first;
use steadfast::{RetryExecutor, RetryFailure};

// ==================== Timed Out Task ====================

/// Example 1: a task that never finishes in time
fn example_long_running_task() -> Result<(), steadfast::InvalidConfig> {
    tracing::info!("=== Example 1: Long Running Task ===");

    let executor = RetryExecutor::builder()
        .with_timeout_millis(1000)?
        .with_max_attempts(1)?
        .build();

    let start = Instant::now();
    let result = executor.run(|| {
        std::thread::sleep(Duration::from_millis(100_000));
        Ok::<_, std::io::Error>(90)
    });

    match result {
        Ok(value) => tracing::info!(value, "task finished"),
        Err(failure) => report(&failure),
    }
    tracing::info!("gave up after {:?}", start.elapsed());
    Ok(())
}

// ==================== Flaky Task ====================

/// Example 2: a task that fails twice before succeeding
fn example_flaky_task() -> Result<(), steadfast::InvalidConfig> {
    tracing::info!("=== Example 2: Flaky Task ===");

    let executor = RetryExecutor::builder()
        .with_max_attempts(3)?
        .with_interval(Duration::from_millis(200))
        .build();

    let (task, calls) = fail_first(
        2,
        || std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
        "payload",
    );

    match executor.run(task) {
        Ok(value) => tracing::info!(calls = calls.get(), "got {}", value),
        Err(failure) => report(&failure),
    }
    Ok(())
}

fn report(failure: &RetryFailure<std::io::Error>) {
    tracing::error!(
        attempts = failure.attempts(),
        kind = ?failure.kind(),
        "{}",
        failure.trace()
    );
}

fn main() -> Result<(), steadfast::InvalidConfig> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    example_long_running_task()?;
    example_flaky_task()?;
    Ok(())
}
