//! Result of a single attempt.

use std::time::Duration;

/// The result of one attempt: a value, or the reason the attempt failed.
///
/// # Examples
///
/// ```rust
/// use steadfast::{AttemptError, FailureKind, Outcome};
///
/// let ok: Outcome<i32, String> = Outcome::from(Ok(42));
/// assert_eq!(ok.value(), Some(&42));
///
/// let failed: Outcome<i32, String> = Outcome::from(Err(AttemptError::Interrupted));
/// assert_eq!(failed.cause().map(AttemptError::kind), Some(FailureKind::Interrupted));
/// ```
#[derive(Debug)]
pub enum Outcome<T, E> {
    /// The attempt returned a value.
    Success(T),
    /// The attempt failed.
    Failure(AttemptError<E>),
}

impl<T, E> Outcome<T, E> {
    /// Returns true if the attempt produced a value.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if the attempt failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The value, if the attempt succeeded.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    /// The failure cause, if the attempt failed.
    pub fn cause(&self) -> Option<&AttemptError<E>> {
        match self {
            Self::Success(_) => None,
            Self::Failure(e) => Some(e),
        }
    }

    /// Convert back into a `Result`.
    pub fn into_result(self) -> Result<T, AttemptError<E>> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Failure(e) => Err(e),
        }
    }
}

impl<T, E> From<Result<T, AttemptError<E>>> for Outcome<T, E> {
    fn from(result: Result<T, AttemptError<E>>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Failure(e),
        }
    }
}

/// Why an attempt failed.
///
/// The retry loop treats every variant the same way. The tag is kept so
/// callers can tell a slow task from a broken one.
#[derive(Debug)]
pub enum AttemptError<E> {
    /// The task itself returned an error.
    Execution(E),
    /// The task did not finish within the configured timeout.
    Timeout {
        /// The timeout that was exceeded.
        duration: Duration,
    },
    /// The wait for the task was interrupted.
    Interrupted,
    /// The worker pool could not be started, so the task never ran.
    PoolUnavailable(std::io::Error),
}

/// The tag of an [`AttemptError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// See [`AttemptError::Execution`].
    Execution,
    /// See [`AttemptError::Timeout`].
    Timeout,
    /// See [`AttemptError::Interrupted`].
    Interrupted,
    /// See [`AttemptError::PoolUnavailable`].
    PoolUnavailable,
}

impl FailureKind {
    /// Short lowercase name, used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Execution => "execution",
            Self::Timeout => "timeout",
            Self::Interrupted => "interrupted",
            Self::PoolUnavailable => "pool_unavailable",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<E> AttemptError<E> {
    /// Create a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// The tag of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Execution(_) => FailureKind::Execution,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Interrupted => FailureKind::Interrupted,
            Self::PoolUnavailable(_) => FailureKind::PoolUnavailable,
        }
    }

    /// Returns true if the task returned an error.
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if the attempt timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the wait was interrupted.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    /// The task's own error, if that is what failed.
    pub fn execution(&self) -> Option<&E> {
        match self {
            Self::Execution(e) => Some(e),
            _ => None,
        }
    }

    /// Take the task's own error, if that is what failed.
    pub fn into_execution(self) -> Option<E> {
        match self {
            Self::Execution(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Execution(e) => write!(f, "{}", e),
            Self::Timeout { duration } => write!(f, "operation timed out after {:?}", duration),
            Self::Interrupted => write!(f, "interrupted while waiting for the task"),
            Self::PoolUnavailable(e) => write!(f, "worker pool unavailable: {}", e),
        }
    }
}

// `Execution` is transparent: its message is the task's message, so the
// chain continues from the task error's own source.
impl<E: std::error::Error + 'static> std::error::Error for AttemptError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Execution(e) => std::error::Error::source(e),
            Self::Timeout { .. } | Self::Interrupted => None,
            Self::PoolUnavailable(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod outcome_tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        let outcome: Outcome<i32, String> = Outcome::Success(7);
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
        assert_eq!(outcome.value(), Some(&7));
        assert!(outcome.cause().is_none());
        assert_eq!(outcome.into_result().unwrap(), 7);
    }

    #[test]
    fn test_outcome_failure() {
        let outcome: Outcome<i32, String> =
            Outcome::from(Err(AttemptError::Execution("bad".to_string())));
        assert!(outcome.is_failure());
        assert!(outcome.value().is_none());
        assert_eq!(
            outcome.cause().and_then(AttemptError::execution),
            Some(&"bad".to_string())
        );
    }

    #[test]
    fn test_attempt_error_kinds() {
        assert_eq!(
            AttemptError::Execution("x").kind(),
            FailureKind::Execution
        );
        assert_eq!(
            AttemptError::<&str>::timeout(Duration::from_secs(1)).kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            AttemptError::<&str>::Interrupted.kind(),
            FailureKind::Interrupted
        );
        assert_eq!(
            AttemptError::<&str>::PoolUnavailable(std::io::Error::other("no threads")).kind(),
            FailureKind::PoolUnavailable
        );
    }

    #[test]
    fn test_attempt_error_predicates() {
        let err = AttemptError::<&str>::timeout(Duration::from_millis(5));
        assert!(err.is_timeout());
        assert!(!err.is_execution());
        assert!(!err.is_interrupted());
        assert!(err.into_execution().is_none());

        let err = AttemptError::Execution("inner");
        assert!(err.is_execution());
        assert_eq!(err.into_execution(), Some("inner"));
    }

    #[test]
    fn test_attempt_error_display() {
        assert_eq!(AttemptError::Execution("failed").to_string(), "failed");
        assert!(AttemptError::<&str>::timeout(Duration::from_secs(1))
            .to_string()
            .contains("timed out"));
        assert!(AttemptError::<&str>::Interrupted
            .to_string()
            .contains("interrupted"));
    }

    #[test]
    fn test_execution_source_is_transparent() {
        use std::error::Error;

        let io = std::io::Error::other("disk gone");
        let err = AttemptError::Execution(io);
        assert!(err.source().is_none());

        let err = AttemptError::<std::io::Error>::PoolUnavailable(std::io::Error::other("x"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::Timeout.to_string(), "timeout");
        assert_eq!(FailureKind::PoolUnavailable.as_str(), "pool_unavailable");
    }
}
