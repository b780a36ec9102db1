//! The terminal error returned once retries are exhausted.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::time::Duration;

use super::outcome::{AttemptError, FailureKind};

/// Error returned when every attempt failed.
///
/// Wraps the cause of the last attempt. When a cause is present,
/// [`message`](Self::message) and `Display` surface the cause's message
/// instead of the generated one; the generated text stays available through
/// [`retry_message`](Self::retry_message).
///
/// # Examples
///
/// ```rust
/// use steadfast::RetryExecutor;
/// use std::time::Duration;
///
/// let executor = RetryExecutor::builder()
///     .with_max_attempts(2)?
///     .with_interval(Duration::from_millis(1))
///     .build();
///
/// let failure = executor
///     .run(|| Err::<(), _>(std::io::Error::other("connection refused")))
///     .unwrap_err();
///
/// assert_eq!(failure.attempts(), 2);
/// assert_eq!(failure.message(), "connection refused");
/// assert_eq!(failure.retry_message(), "retried 1 times, still could not obtain a result");
/// # Ok::<(), steadfast::InvalidConfig>(())
/// ```
#[derive(Debug)]
pub struct RetryFailure<E> {
    cause: Option<AttemptError<E>>,
    message: String,
    attempts: u32,
    elapsed: Duration,
    backtrace: Backtrace,
}

impl<E> RetryFailure<E> {
    /// Create a failure with an explicit message.
    ///
    /// The backtrace of the caller is captured when `RUST_BACKTRACE` or
    /// `RUST_LIB_BACKTRACE` enables it.
    pub fn new(cause: Option<AttemptError<E>>, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
            attempts: 0,
            elapsed: Duration::ZERO,
            backtrace: Backtrace::capture(),
        }
    }

    pub(crate) fn exhausted(cause: AttemptError<E>, attempts: u32, elapsed: Duration) -> Self {
        Self {
            attempts,
            elapsed,
            ..Self::new(Some(cause), exhausted_message(attempts))
        }
    }

    /// The cause of the last attempt.
    pub fn cause(&self) -> Option<&AttemptError<E>> {
        self.cause.as_ref()
    }

    /// Take the cause of the last attempt.
    pub fn into_cause(self) -> Option<AttemptError<E>> {
        self.cause
    }

    /// The tag of the last cause.
    pub fn kind(&self) -> Option<FailureKind> {
        self.cause.as_ref().map(AttemptError::kind)
    }

    /// Attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time from the first attempt to giving up.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The message stored at construction, ignoring the cause.
    pub fn retry_message(&self) -> &str {
        &self.message
    }

    /// Backtrace captured where this failure was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl<E: std::fmt::Display> RetryFailure<E> {
    /// The cause's message when there is a cause, else the stored message.
    pub fn message(&self) -> String {
        match &self.cause {
            Some(cause) => cause.to_string(),
            None => self.message.clone(),
        }
    }
}

impl<E: std::error::Error + 'static> RetryFailure<E> {
    /// Render this failure together with its cause chain.
    ///
    /// The header carries the stored retry message, followed by this
    /// failure's own frames and one entry per error in the cause chain. With
    /// no cause, only the header and own frames are present.
    pub fn trace(&self) -> Trace {
        let frames = match self.backtrace.status() {
            BacktraceStatus::Captured => self
                .backtrace
                .to_string()
                .lines()
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        };

        let mut causes = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            causes.push(err.to_string());
            source = std::error::Error::source(err);
        }

        Trace {
            header: format!("RetryFailure: {}", self.message),
            frames,
            causes,
        }
    }
}

fn exhausted_message(attempts: u32) -> String {
    format!(
        "retried {} times, still could not obtain a result",
        attempts.saturating_sub(1)
    )
}

impl<E: std::fmt::Display> std::fmt::Display for RetryFailure<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}", cause),
            None => f.write_str(&self.message),
        }
    }
}

// The task's own error is exposed directly so callers can downcast to it.
impl<E: std::error::Error + 'static> std::error::Error for RetryFailure<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.cause.as_ref()? {
            AttemptError::Execution(e) => Some(e),
            other => Some(other),
        }
    }
}

/// A rendered [`RetryFailure`] with its cause chain.
///
/// `Display` prints the header, the failure's own frames, then one
/// `caused by:` line per cause. The header holds the retry message, so the
/// cause's text only appears in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    header: String,
    frames: Vec<String>,
    causes: Vec<String>,
}

impl Trace {
    /// `RetryFailure: <retry message>`.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Backtrace lines captured where the failure was created.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Messages of the cause chain, outermost first.
    pub fn causes(&self) -> &[String] {
        &self.causes
    }
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.header)?;
        for frame in &self.frames {
            write!(f, "\n\t{}", frame)?;
        }
        for cause in &self.causes {
            write!(f, "\ncaused by: {}", cause)?;
        }
        Ok(())
    }
}
